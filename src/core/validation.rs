//! Email address validation and normalization
//!
//! Input lists arrive from the CLI or from files and are cleaned here before
//! the batch controller enqueues them: trim, lower-case, shape-check, and
//! drop duplicates while preserving first-occurrence order.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

/// Normalize a raw email address: trim surrounding whitespace and lower-case.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Check whether a (normalized) address has a plausible email shape.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Normalize, validate, and deduplicate an input list.
///
/// Invalid addresses and duplicates (after normalization) are silently
/// dropped; the first occurrence's position is preserved.
pub fn sanitize_email_list<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for entry in raw {
        let email = normalize_email(entry.as_ref());
        if !is_valid_email(&email) {
            log::debug!("Dropping invalid email address: '{}'", entry.as_ref());
            continue;
        }
        if seen.insert(email.clone()) {
            unique.push(email);
        }
    }

    unique
}
