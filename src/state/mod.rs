//! State management module
//!
//! This module resolves the current session into the signed-in user

pub mod context;
pub mod session;

// Re-export commonly used state components
pub use context::{AuthContext, SignUpReceipt, MIN_PASSWORD_LENGTH};
pub use session::AuthState;
