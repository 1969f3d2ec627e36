//! Declarative field rules shared by the report policies and the auth and
//! user use cases.

use std::sync::LazyLock;

use regex::Regex;
use works_portal_report_models::Location;

use crate::ValidationErrors;
use crate::form::FormReader;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9][0-9 \-]{3,19}$").expect("Invalid regex pattern for phone")
});

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
        .expect("Invalid regex pattern for email")
});

static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_.]{3,32}$").expect("Invalid regex pattern for username")
});

#[must_use]
pub fn is_phone(value: &str) -> bool {
    PHONE_REGEX.is_match(value)
}

#[must_use]
pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

#[must_use]
pub fn is_username(value: &str) -> bool {
    USERNAME_REGEX.is_match(value)
}

/// Username, email and password rules for a new or updated account. Only
/// the given fields are checked.
pub fn account(
    errors: &mut ValidationErrors,
    username: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) {
    if let Some(username) = username
        && !is_username(username)
    {
        errors.push("username", "regex");
    }
    if let Some(email) = email
        && !is_email(email)
    {
        errors.push("email", "email");
    }
    if let Some(password) = password
        && password.chars().count() < MIN_PASSWORD_LEN
    {
        errors.push("password", "min");
    }
}

/// Checks the WGS84 ranges.
pub fn coordinates(errors: &mut ValidationErrors, latitude: f64, longitude: f64) {
    if !(-90.0..=90.0).contains(&latitude) {
        errors.push("latitude", "range");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        errors.push("longitude", "range");
    }
}

/// Re-validates a bound location, requiring the address when the domain
/// marks it mandatory.
pub fn location(errors: &mut ValidationErrors, location: &Location, address_required: bool) {
    coordinates(errors, location.latitude, location.longitude);
    if address_required && location.address.is_none() {
        errors.push("address", "required");
    }
}

/// Required phone number matching the phone pattern.
pub fn phone(r: &mut FormReader<'_>, key: &str) -> String {
    let value = r.text(key);
    if !value.is_empty() {
        r.check(is_phone(&value), key, "regex");
    }
    value
}

/// Records `field: min` when `value` is below `min`.
pub fn min(errors: &mut ValidationErrors, field: &str, value: f64, min: f64) {
    if value < min {
        errors.push(field, "min");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_local_and_international_phones() {
        assert!(is_phone("08123"));
        assert!(is_phone("+62 812-3456-7890"));
        assert!(!is_phone("call me"));
        assert!(!is_phone("12"));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let mut errors = ValidationErrors::new();
        coordinates(&mut errors, 90.5, -181.0);
        assert_eq!(errors.entries(), ["latitude: range", "longitude: range"]);

        let mut errors = ValidationErrors::new();
        coordinates(&mut errors, -90.0, 180.0);
        assert!(errors.is_empty());
    }

    #[test]
    fn account_rules() {
        let mut errors = ValidationErrors::new();
        account(&mut errors, Some("a b"), Some("nope"), Some("short"));
        assert_eq!(
            errors.entries(),
            ["username: regex", "email: email", "password: min"]
        );

        let mut errors = ValidationErrors::new();
        account(&mut errors, Some("budi.s"), Some("budi@example.go.id"), None);
        assert!(errors.is_empty());
    }
}
