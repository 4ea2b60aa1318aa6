//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::OnceLock;
use chrono::NaiveDate;
use regex::Regex;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
            .expect("email pattern is valid")
    })
}

/// Check the shape of an e-mail address before sending it to the auth service
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

/// Format an event date for display
pub fn format_event_date(date: NaiveDate) -> String {
    date.format("%a, %d %b %Y").to_string()
}

/// Truncate text to a maximum length with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Render an optional profile field the way the tracker shows it
pub fn or_not_provided<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "Not provided".to_string())
}

/// Mask the middle of a secret for logs
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "*".repeat(count);
    }
    let head: String = secret.chars().take(4).collect();
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email(" bob.smith+events@campus.edu "));
        assert!(!is_valid_email("alice@"));
        assert!(!is_valid_email("not an email"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Hello", 10), "Hello");
        assert_eq!(truncate_text("Hello, World!", 10), "Hello, ...");
    }

    #[test]
    fn test_or_not_provided() {
        assert_eq!(or_not_provided(Some("CSE")), "CSE");
        assert_eq!(or_not_provided::<String>(None), "Not provided");
        assert_eq!(or_not_provided(Some("")), "Not provided");
        assert_eq!(or_not_provided(Some(3)), "3");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret("eyJhbGciOiJIUzI1NiJ9"), "eyJh...NiJ9");
    }

    #[test]
    fn test_format_event_date() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        assert_eq!(format_event_date(date), "Sun, 01 Sep 2024");
    }
}
