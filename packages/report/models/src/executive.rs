//! Read-only executive indicator dimension tables.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::normalize::upper_snake;

/// Indicator dimension. Each maps to its own table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IndicatorDomain {
    Economy,
    Demography,
    Social,
    Employment,
    Education,
}

impl IndicatorDomain {
    /// Resolves the `<topic>` URL segment.
    #[must_use]
    pub fn from_topic(topic: &str) -> Option<Self> {
        match topic {
            "economy" => Some(Self::Economy),
            "population" => Some(Self::Demography),
            "poverty" => Some(Self::Social),
            "employment" => Some(Self::Employment),
            "education" => Some(Self::Education),
            _ => None,
        }
    }

    /// Backing table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Economy => "economy_indicators",
            Self::Demography => "demography_indicators",
            Self::Social => "social_indicators",
            Self::Employment => "employment_indicators",
            Self::Education => "education_indicators",
        }
    }
}

/// A single `(year, indicator, value)` observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub year: i32,
    pub indicator_name: String,
    pub value: f64,
}

/// Response key for an indicator name: `"Tingkat Inflasi"` → `"tingkat_inflasi"`.
#[must_use]
pub fn indicator_key(name: &str) -> String {
    upper_snake(name).to_lowercase()
}

/// Year-over-year change in percent. `None` when the previous value is
/// missing or zero.
#[must_use]
pub fn change(current: f64, previous: Option<f64>) -> Option<f64> {
    match previous {
        Some(prev) if prev != 0.0 => Some((current - prev) / prev * 100.0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_is_null_without_a_usable_baseline() {
        assert_eq!(change(3.0, None), None);
        assert_eq!(change(3.0, Some(0.0)), None);
    }

    #[test]
    fn change_is_relative_to_previous_year() {
        let delta = change(110.0, Some(100.0)).unwrap();
        assert!((delta - 10.0).abs() < 1e-9);
    }

    #[test]
    fn keys_are_lower_snake() {
        assert_eq!(indicator_key("Inflasi"), "inflasi");
        assert_eq!(indicator_key(" Tingkat  Pengangguran Terbuka"), "tingkat_pengangguran_terbuka");
    }

    #[test]
    fn topics_resolve_to_domains() {
        assert_eq!(IndicatorDomain::from_topic("poverty"), Some(IndicatorDomain::Social));
        assert_eq!(IndicatorDomain::from_topic("weather"), None);
    }
}
