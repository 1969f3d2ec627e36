//! Scalar form binding.
//!
//! Multipart and urlencoded submissions are collected into a [`Form`] with
//! normalized keys (`phoneNumber` and `phone_number` land on the same
//! field). A [`FormReader`] then pulls typed values out of it while
//! accumulating every failure instead of stopping at the first one.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use works_portal_report_models::normalize::{CatalogEnum, non_empty, title_case, upper_snake};

use crate::{ServiceError, ValidationErrors};

/// Submitted spellings that map onto a different canonical field.
const KEY_ALIASES: &[(&str, &str)] = &[
    ("phone_number", "phone"),
    ("report_date_time", "reported_at"),
    ("report_date", "reported_at"),
    ("damaged_length", "damaged_length_m"),
    ("damaged_width", "damaged_width_m"),
    ("damaged_area", "damaged_area_m2"),
    ("total_damaged_area", "total_damaged_area_m2"),
    ("estimated_repair_time_days", "estimated_repair_days"),
    ("urgency_category", "urgency"),
    ("traffic_impact", "traffic_condition"),
    ("estimated_length", "estimated_length_m"),
    ("estimated_width", "estimated_width_m"),
    ("estimated_depth", "estimated_depth_m"),
    ("lat", "latitude"),
    ("lon", "longitude"),
    ("lng", "longitude"),
];

/// Canonical snake_case field name for a submitted key.
#[must_use]
pub fn normalize_key(raw: &str) -> String {
    let raw = raw.trim().trim_end_matches("[]");
    let mut key = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;

    for ch in raw.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                key.push('_');
            }
            key.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else if ch == '-' || ch == ' ' {
            key.push('_');
            prev_lower = false;
        } else {
            key.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }

    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map_or(key, |(_, canonical)| (*canonical).to_string())
}

/// Submitted scalar fields. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    fields: BTreeMap<String, Vec<String>>,
}

impl Form {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.fields
            .entry(normalize_key(key))
            .or_default()
            .push(value.into());
    }

    /// Builder that replaces any values already held for `key`.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(normalize_key(key), vec![value.into()]);
        self
    }

    /// First non-blank value of `key`, trimmed.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)?
            .iter()
            .find_map(|value| non_empty(value))
    }

    /// Whether `key` carries a non-blank value.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub const fn reader(&self) -> FormReader<'_> {
        FormReader {
            form: self,
            errors: ValidationErrors::new(),
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Form {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = Self::new();
        for (key, value) in iter {
            form.insert(key.as_ref(), value);
        }
        form
    }
}

/// Parses `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or RFC 3339.
#[must_use]
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(at.and_utc());
    }
    parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|at| at.and_utc())
}

/// Parses `YYYY-MM-DD`, or the date part of a timestamp.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|at| at.with_timezone(&Utc).date_naive())
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Typed access to a [`Form`] that records every failure.
///
/// Required readers return a placeholder after recording a failure, so a
/// whole command can be bound before [`FormReader::finish`] reports the
/// full list.
#[derive(Debug)]
pub struct FormReader<'a> {
    form: &'a Form,
    errors: ValidationErrors,
}

impl<'a> FormReader<'a> {
    #[must_use]
    pub fn present(&self, key: &str) -> bool {
        self.form.has(key)
    }

    /// Records a failed rule unless `ok`.
    pub fn check(&mut self, ok: bool, field: &str, rule: &str) {
        if !ok {
            self.errors.push(field, rule);
        }
    }

    pub fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }

    /// Overwrites `slot` with `read(key)` when the form carries `key`.
    pub fn set<T>(&mut self, slot: &mut T, key: &str, read: fn(&mut Self, &str) -> T) {
        if self.present(key) {
            *slot = read(self, key);
        }
    }

    fn required(&mut self, key: &str) -> Option<&'a str> {
        let form = self.form;
        let value = form.get(key);
        if value.is_none() {
            self.errors.push(key, "required");
        }
        value
    }

    pub fn text(&mut self, key: &str) -> String {
        self.required(key).map(str::to_string).unwrap_or_default()
    }

    #[must_use]
    pub fn opt_text(&mut self, key: &str) -> Option<String> {
        self.form.get(key).map(str::to_string)
    }

    /// Required, title-cased.
    pub fn title(&mut self, key: &str) -> String {
        self.required(key).map(title_case).unwrap_or_default()
    }

    pub fn opt_title(&mut self, key: &str) -> Option<String> {
        self.form.get(key).map(title_case)
    }

    /// Required, upper-snake-cased.
    pub fn code(&mut self, key: &str) -> String {
        self.required(key).map(upper_snake).unwrap_or_default()
    }

    pub fn opt_code(&mut self, key: &str) -> Option<String> {
        self.form.get(key).map(upper_snake)
    }

    /// Required closed enumeration. Falls back to the lowest variant after
    /// recording the failure.
    pub fn enumeration<E: CatalogEnum>(&mut self, key: &str) -> E {
        self.opt_enum(key).unwrap_or_else(|| {
            if !self.present(key) {
                self.errors.push(key, "required");
            }
            E::ALL[0]
        })
    }

    pub fn opt_enum<E: CatalogEnum>(&mut self, key: &str) -> Option<E> {
        let form = self.form;
        let raw = form.get(key)?;
        match E::parse_normalized(raw) {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors.push(key, "oneof");
                None
            }
        }
    }

    pub fn float(&mut self, key: &str) -> f64 {
        if !self.present(key) {
            self.errors.push(key, "required");
            return 0.0;
        }
        self.opt_float(key).unwrap_or_default()
    }

    pub fn opt_float(&mut self, key: &str) -> Option<f64> {
        let form = self.form;
        let raw = form.get(key)?;
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Some(value),
            _ => {
                self.errors.push(key, "numeric");
                None
            }
        }
    }

    pub fn int(&mut self, key: &str) -> i32 {
        if !self.present(key) {
            self.errors.push(key, "required");
            return 0;
        }
        self.opt_int(key).unwrap_or_default()
    }

    pub fn opt_int(&mut self, key: &str) -> Option<i32> {
        let form = self.form;
        let raw = form.get(key)?;
        raw.parse::<i32>().map_or_else(
            |_| {
                self.errors.push(key, "integer");
                None
            },
            Some,
        )
    }

    /// Absent means `false`.
    pub fn flag(&mut self, key: &str) -> bool {
        let form = self.form;
        let Some(raw) = form.get(key) else {
            return false;
        };
        parse_bool(raw).unwrap_or_else(|| {
            self.errors.push(key, "boolean");
            false
        })
    }

    pub fn datetime(&mut self, key: &str) -> DateTime<Utc> {
        let Some(raw) = self.required(key) else {
            return DateTime::<Utc>::UNIX_EPOCH;
        };
        parse_datetime(raw).unwrap_or_else(|| {
            self.errors.push(key, "datetime");
            DateTime::<Utc>::UNIX_EPOCH
        })
    }

    pub fn date(&mut self, key: &str) -> NaiveDate {
        let Some(raw) = self.required(key) else {
            return NaiveDate::default();
        };
        parse_date(raw).unwrap_or_else(|| {
            self.errors.push(key, "date");
            NaiveDate::default()
        })
    }

    /// Reports every recorded failure.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] if anything failed to bind or
    /// validate.
    pub fn finish(self) -> Result<(), ServiceError> {
        self.errors.into_result()
    }
}
