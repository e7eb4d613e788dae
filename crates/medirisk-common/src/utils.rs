//! Utility functions for MediRisk
//!
//! Common helper functions used across the codebase.

use std::sync::LazyLock;

/// Regex pattern for validating account email addresses
static EMAIL_PATTERN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")
        .expect("Invalid regex pattern")
});

/// Validate an email address shape
///
/// # Examples
///
/// ```
/// use medirisk_common::is_valid_email;
///
/// assert!(is_valid_email("jane.doe@example.org"));
/// assert!(!is_valid_email("jane.doe"));
/// assert!(!is_valid_email("jane doe@example.org"));
/// ```
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Round a value to one decimal place, as displayed to patients
///
/// Rounds the exact binary value, so true ties go to the even digit and
/// values like `0.15` (stored just below the tie) round down.
///
/// # Examples
///
/// ```
/// use medirisk_common::round1;
///
/// assert_eq!(round1(27.349), 27.3);
/// assert_eq!(round1(32.25), 32.2);
/// assert_eq!(round1(0.0), 0.0);
/// ```
pub fn round1(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.1}").parse().unwrap_or(value)
}

/// Parse a JSON value as a number, accepting numeric strings
///
/// Form submissions frequently deliver numbers as strings, so `"120"` and
/// `120` are treated the same. Non-finite results are rejected.
pub fn json_as_f64(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
