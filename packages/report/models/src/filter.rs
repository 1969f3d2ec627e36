//! Declared filter keys for list endpoints.

use crate::normalize::{CatalogEnum, canonical_code, title_case, upper_snake};

/// How a filter value is normalized before comparison.
#[derive(Debug, Clone, Copy)]
pub enum FilterKind {
    /// Location-like text, compared after title-casing.
    Title,
    /// Free enum-ish text, compared after upper-snake-casing.
    Code,
    /// Closed enumeration, resolved through its alias table.
    Enum(fn(&str) -> String),
    /// Boolean flag (`true`/`false`).
    Flag,
}

impl FilterKind {
    /// An [`FilterKind::Enum`] for catalog enum `E`.
    #[must_use]
    pub const fn catalog<E: CatalogEnum>() -> Self {
        Self::Enum(canonical_code::<E>)
    }

    /// Normalizes a raw filter value the same way the field is normalized
    /// on write.
    #[must_use]
    pub fn normalize(self, raw: &str) -> String {
        match self {
            Self::Title => title_case(raw),
            Self::Code => upper_snake(raw),
            Self::Enum(resolve) => resolve(raw),
            Self::Flag => matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
                .to_string(),
        }
    }
}

/// A filterable query key and the column it compares against.
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    /// Query-string key.
    pub key: &'static str,
    /// Database column.
    pub column: &'static str,
    /// Normalization applied to the submitted value.
    pub kind: FilterKind,
}

impl FilterField {
    /// Builds a filter declaration.
    #[must_use]
    pub const fn new(key: &'static str, column: &'static str, kind: FilterKind) -> Self {
        Self { key, column, kind }
    }
}
