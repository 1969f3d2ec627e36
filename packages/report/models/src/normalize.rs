//! Text normalization applied to every user-typed value before it is
//! persisted or used as a filter.
//!
//! Location-like strings are title-cased; enum-like strings are converted
//! to `SCREAMING_SNAKE_CASE` and resolved through each enum's alias table.
//! Both functions are idempotent.

use std::str::FromStr;

/// Trims, collapses internal whitespace and title-cases each word.
#[must_use]
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(title_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_word(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut out = String::with_capacity(word.len());
    let upper = first.to_uppercase();
    // Multi-char uppercase expansions (e.g. `ß`) would not be stable on a
    // second pass, so those keep their original form.
    if upper.len() == 1 {
        out.extend(upper);
    } else {
        out.push(first);
    }
    out.extend(chars.flat_map(char::to_lowercase));
    out
}

/// Converts free text into `UPPER_SNAKE_CASE`.
///
/// Every run of non-alphanumeric characters becomes a single `_`; leading
/// and trailing separators are dropped.
#[must_use]
pub fn upper_snake(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;

    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            // Expansions can append combining marks (`ǰ` to `J\u{30C}`),
            // which a second pass would strip.
            let upper = ch.to_uppercase();
            if upper.len() == 1 {
                out.extend(upper);
            } else {
                out.push(ch);
            }
        } else {
            pending_separator = true;
        }
    }

    out
}

/// Trims and drops the value when nothing is left.
#[must_use]
pub fn non_empty(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Error returned when a value does not resolve to any variant of a
/// closed enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// Field the value was submitted for.
    pub field: &'static str,
    /// The normalized value that failed to resolve.
    pub value: String,
}

impl std::fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: oneof ({} is not a valid value)", self.field, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// A closed enumeration with a declared ordinal order and an alias table.
///
/// `ALL` is ordered from lowest to highest ordinal; [`CatalogEnum::rank`]
/// derives from that order, which is what the priority list sorts on.
pub trait CatalogEnum:
    Sized + Copy + Eq + FromStr + AsRef<str> + Into<&'static str> + 'static
{
    /// Form field name used in validation messages.
    const FIELD: &'static str;

    /// Every variant, lowest ordinal first.
    const ALL: &'static [Self];

    /// Alternate spellings resolved to a canonical variant.
    const ALIASES: &'static [(&'static str, Self)];

    /// Normalizes `raw` and resolves it to a variant.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownVariant`] if neither the canonical names nor the
    /// alias table contain the normalized value.
    fn parse_normalized(raw: &str) -> Result<Self, UnknownVariant> {
        let key = upper_snake(raw);
        if let Some((_, variant)) = Self::ALIASES.iter().find(|(alias, _)| *alias == key) {
            return Ok(*variant);
        }
        key.parse().map_err(|_| UnknownVariant {
            field: Self::FIELD,
            value: key,
        })
    }

    /// 1-based ordinal of this variant within [`CatalogEnum::ALL`].
    fn rank(self) -> i32 {
        Self::ALL
            .iter()
            .position(|v| *v == self)
            .and_then(|i| i32::try_from(i + 1).ok())
            .unwrap_or(0)
    }

    /// Canonical wire/storage code.
    fn code(self) -> &'static str {
        self.into()
    }
}

/// Resolves `raw` to the canonical code of `E`, falling back to the plain
/// upper-snake form when it matches no variant.
#[must_use]
pub fn canonical_code<E: CatalogEnum>(raw: &str) -> String {
    E::parse_normalized(raw).map_or_else(|e| e.value, |v| v.code().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::road::RoadDamageType;
    use crate::shared::DamageLevel;

    #[test]
    fn title_cases_and_collapses_whitespace() {
        assert_eq!(title_case("  jl   MERDEKA  barat "), "Jl Merdeka Barat");
    }

    #[test]
    fn title_case_is_idempotent() {
        for raw in ["budi santoso", "KEC. CIBINONG", "desa sukamaju-2", "straße", ""] {
            let once = title_case(raw);
            assert_eq!(title_case(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn upper_snakes_free_text() {
        assert_eq!(upper_snake(" Dinas  pu-pr "), "DINAS_PU_PR");
        assert_eq!(upper_snake("__alligator cracking__"), "ALLIGATOR_CRACKING");
    }

    #[test]
    fn upper_snake_is_idempotent() {
        for raw in ["kepala sekolah", "UPT / Wilayah 3", "a--b", "  ", "ǰ", "ΐ", "straße"] {
            let once = upper_snake(raw);
            assert_eq!(upper_snake(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn upper_snake_keeps_characters_with_multi_char_uppercase() {
        assert_eq!(upper_snake("ǰalan"), "ǰALAN");
        assert_eq!(upper_snake("straße"), "STRAßE");
    }

    #[test]
    fn resolves_aliases_to_canonical_variants() {
        assert_eq!(DamageLevel::parse_normalized("moderate"), Ok(DamageLevel::Sedang));
        assert_eq!(DamageLevel::parse_normalized("Sedang"), Ok(DamageLevel::Sedang));
        assert_eq!(
            RoadDamageType::parse_normalized("pothole"),
            Ok(RoadDamageType::Lubang)
        );
    }

    #[test]
    fn rejects_unknown_variant_with_field_name() {
        let err = DamageLevel::parse_normalized("catastrophic").unwrap_err();
        assert_eq!(err.field, "damage_level");
        assert_eq!(err.value, "CATASTROPHIC");
    }

    #[test]
    fn ranks_follow_declared_order() {
        assert!(DamageLevel::Berat.rank() > DamageLevel::Sedang.rank());
        assert_eq!(DamageLevel::Ringan.rank(), 1);
    }

    #[test]
    fn canonical_code_falls_back_to_upper_snake() {
        assert_eq!(canonical_code::<DamageLevel>("severe"), "BERAT");
        assert_eq!(canonical_code::<DamageLevel>("very bad"), "VERY_BAD");
    }
}
