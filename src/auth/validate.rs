use lazy_static::lazy_static;
use regex::Regex;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    (5..=80).contains(&email.len()) && EMAIL_RE.is_match(email)
}

/// At least 8 chars with an uppercase letter, a lowercase letter and a digit.
pub(crate) fn is_strong_password(password: &str) -> bool {
    (8..=100).contains(&password.len())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Collapses whitespace and requires at least a first and last name.
pub(crate) fn normalize_name(name: &str) -> Option<String> {
    let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if !(3..=100).contains(&normalized.len()) || normalized.split(' ').count() < 2 {
        return None;
    }
    Some(normalized)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
