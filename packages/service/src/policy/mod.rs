//! Per-domain policies plugged into the generic report pipeline.
//!
//! A policy says how a domain binds its form, which fields it derives,
//! how many photos it needs, when it raises a notification and which
//! overview catalog backs its dashboard. Everything else in the lifecycle
//! is shared.

mod agriculture;
mod building;
mod rice_field;
mod road;
mod spatial;
mod water;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use works_portal_cache::CacheKey;
use works_portal_database::{AnalyticsSource, DbError};
use works_portal_database_models::Condition;
use works_portal_report_models::normalize::CatalogEnum;
use works_portal_report_models::{Aggregate, Location};

use crate::form::{Form, FormReader};
use crate::notify::NotifyKind;
use crate::validate::{self, phone};
use crate::{ServiceError, ValidationErrors};

/// Identity and audit fields assigned to a new record.
#[derive(Debug, Clone)]
pub struct Origin {
    pub id: String,
    pub created_by: String,
    pub now: DateTime<Utc>,
}

/// Domain rules for aggregate `Self`.
#[async_trait]
pub trait ReportPolicy: Aggregate {
    /// Dashboard payload served by `GET /<domain>/overview`.
    type Overview: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Whether the street address is mandatory.
    const ADDRESS_REQUIRED: bool = false;

    /// Whether records carry a status and priority ordinals.
    const HAS_STATUS: bool = true;

    /// Binds a new record from the form. Status starts at the domain's
    /// initial value.
    fn build(r: &mut FormReader<'_>, origin: Origin) -> Self;

    /// Overwrites every field the form carries.
    fn apply(&mut self, r: &mut FormReader<'_>);

    /// Recomputes derived fields. `form` tells which fields the caller
    /// supplied; supplied values are never overridden.
    fn derive(&mut self, _form: &Form, _creating: bool) {}

    /// Cross-field rules checked after binding and deriving.
    fn check(&self, errors: &mut ValidationErrors) {
        validate::location(errors, self.location(), Self::ADDRESS_REQUIRED);
    }

    /// Smallest photo count accepted on create.
    fn min_photos(&self) -> usize;

    /// Notification raised after a successful create.
    fn notification(&self) -> Option<NotifyKind> {
        None
    }

    /// Resolves a submitted status to its stored code.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] if the value is not one of the
    /// domain's statuses or the domain has none.
    fn parse_status(raw: &str) -> Result<&'static str, ServiceError>;

    /// Sets status and, when given, notes on an in-memory record.
    fn set_status(&mut self, status: &'static str, notes: Option<&str>);

    /// Extra cached dashboard list and the rows it selects.
    #[must_use]
    fn dashboard() -> Option<(CacheKey, Vec<Condition>)> {
        None
    }

    /// Runs the domain's overview catalog over `scope`.
    async fn overview(
        src: &dyn AnalyticsSource,
        scope: &[Condition],
    ) -> Result<Self::Overview, DbError>;
}

/// Header fields common to every report.
pub(crate) struct Header {
    pub reporter_name: String,
    pub reporter_role: String,
    pub phone: String,
    pub reported_at: DateTime<Utc>,
    pub location: Location,
    pub notes: Option<String>,
}

/// Binds the common header. `role_key` is the form field holding the
/// reporter's role or institution.
pub(crate) fn header(r: &mut FormReader<'_>, role_key: &str) -> Header {
    Header {
        reporter_name: r.title("reporter_name"),
        reporter_role: r.code(role_key),
        phone: phone(r, "phone"),
        reported_at: r.datetime("reported_at"),
        location: location(r),
        notes: r.opt_text("notes"),
    }
}

/// Overwrites the header fields the form carries.
pub(crate) fn apply_header(
    r: &mut FormReader<'_>,
    role_key: &str,
    reporter_name: &mut String,
    reporter_role: &mut String,
    phone_slot: &mut String,
    reported_at: &mut DateTime<Utc>,
    notes: &mut Option<String>,
) {
    r.set(reporter_name, "reporter_name", FormReader::title);
    r.set(reporter_role, role_key, FormReader::code);
    r.set(phone_slot, "phone", phone);
    r.set(reported_at, "reported_at", FormReader::datetime);
    r.set(notes, "notes", FormReader::opt_text);
}

pub(crate) fn location(r: &mut FormReader<'_>) -> Location {
    Location {
        district: r.title("district"),
        village: r.opt_title("village"),
        latitude: r.float("latitude"),
        longitude: r.float("longitude"),
        address: r.opt_text("address"),
    }
}

pub(crate) fn apply_location(r: &mut FormReader<'_>, location: &mut Location) {
    r.set(&mut location.district, "district", FormReader::title);
    r.set(&mut location.village, "village", FormReader::opt_title);
    r.set(&mut location.latitude, "latitude", FormReader::float);
    r.set(&mut location.longitude, "longitude", FormReader::float);
    r.set(&mut location.address, "address", FormReader::opt_text);
}

/// Stored code of status enum `E`.
pub(crate) fn status_code<E: CatalogEnum>(raw: &str) -> Result<&'static str, ServiceError> {
    E::parse_normalized(raw)
        .map(CatalogEnum::code)
        .map_err(|_| ServiceError::invalid("status", "oneof"))
}

/// Applies a status already resolved by [`status_code`].
pub(crate) fn apply_status<E: CatalogEnum>(
    slot: &mut E,
    notes_slot: &mut Option<String>,
    status: &str,
    notes: Option<&str>,
) {
    if let Ok(value) = E::parse_normalized(status) {
        *slot = value;
    }
    if let Some(notes) = notes {
        *notes_slot = Some(notes.to_string());
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::form::Form;

    pub const NOW: &str = "2024-05-02T00:00:00Z";

    /// Header and location fields accepted by every report domain.
    pub fn header_form() -> Form {
        Form::new()
            .with("reporterName", "budi")
            .with("reporterRole", "kepala seksi")
            .with("phoneNumber", "08123")
            .with("reportDateTime", "2024-05-01T08:00:00Z")
            .with("district", "cibinong")
            .with("village", "pakansari")
            .with("latitude", "-6.2")
            .with("longitude", "106.8")
    }

    pub fn origin() -> super::Origin {
        super::Origin {
            id: "01HZXR0AD0000000000000000".into(),
            created_by: "user-a".into(),
            now: NOW.parse().unwrap(),
        }
    }
}
