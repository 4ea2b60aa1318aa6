//! Registration model and its status machine

use std::fmt;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::utils::errors::{CampusError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: RegistrationStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegistrationRequest {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: RegistrationStatus,
}

impl CreateRegistrationRequest {
    /// A fresh registration always starts out pending
    pub fn pending(user_id: Uuid, event_id: Uuid) -> Self {
        Self {
            user_id,
            event_id,
            status: RegistrationStatus::Pending,
        }
    }
}

/// `unregistered -> pending -> {approved, rejected}`; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "Pending",
            RegistrationStatus::Approved => "Approved",
            RegistrationStatus::Rejected => "Rejected",
        }
    }

    pub fn is_final(&self) -> bool {
        !matches!(self, RegistrationStatus::Pending)
    }

    /// Validate a reviewer's decision against the current status
    pub fn transition(self, to: RegistrationStatus) -> Result<RegistrationStatus> {
        match (self, to) {
            (RegistrationStatus::Pending, RegistrationStatus::Approved)
            | (RegistrationStatus::Pending, RegistrationStatus::Rejected) => Ok(to),
            (from, to) => Err(CampusError::InvalidStateTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            }),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_pending_can_be_decided() {
        assert_eq!(
            RegistrationStatus::Pending.transition(RegistrationStatus::Approved).unwrap(),
            RegistrationStatus::Approved
        );
        assert_eq!(
            RegistrationStatus::Pending.transition(RegistrationStatus::Rejected).unwrap(),
            RegistrationStatus::Rejected
        );
    }

    #[test]
    fn test_decided_registrations_are_final() {
        for from in [RegistrationStatus::Approved, RegistrationStatus::Rejected] {
            assert!(from.is_final());
            for to in [RegistrationStatus::Pending, RegistrationStatus::Approved, RegistrationStatus::Rejected] {
                assert_matches!(from.transition(to), Err(CampusError::InvalidStateTransition { .. }));
            }
        }
    }

    #[test]
    fn test_pending_to_pending_is_not_a_transition() {
        assert!(RegistrationStatus::Pending.transition(RegistrationStatus::Pending).is_err());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&RegistrationStatus::Pending).unwrap(), "\"pending\"");
        let parsed: RegistrationStatus = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(parsed, RegistrationStatus::Approved);
        assert!(serde_json::from_str::<RegistrationStatus>("\"waitlisted\"").is_err());
    }
}
