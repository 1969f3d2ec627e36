//! Table mappings for the six report aggregates.

mod agriculture;
mod building;
mod rice_field;
mod road;
mod spatial;
mod water;

use chrono::{DateTime, Utc};
use switchy_database::{DatabaseValue, Row};
use works_portal_report_models::{Aggregate, Location, Photo};

use crate::DbError;
use crate::convert::{
    opt_text, opt_text_value, real, text, text_value, timestamp, timestamp_value,
};

/// A column name paired with the value bound to it.
pub type Column = (&'static str, DatabaseValue);

/// Maps an aggregate onto its table and owned photo table.
pub trait ReportRecord: Aggregate {
    /// Parent table.
    const TABLE: &'static str;

    /// Child photo table, for domains that carry photos.
    const PHOTO_TABLE: Option<&'static str>;

    /// Column the list ordering and date-range filters apply to.
    const DATE_COLUMN: &'static str = "reported_at";

    /// Whether the table has a `status` column.
    const HAS_STATUS: bool = true;

    /// Every stored column except `id` and the priority ordinals.
    fn to_columns(&self) -> Vec<Column>;

    /// Rebuilds the aggregate (without photos) from a `SELECT *` row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conversion`] if a column is missing or holds an
    /// unexpected value.
    fn from_row(row: &Row) -> Result<Self, DbError>;
}

pub(crate) fn location_columns(location: &Location) -> [Column; 5] {
    [
        ("district", text_value(&location.district)),
        ("village", opt_text_value(location.village.as_deref())),
        ("latitude", DatabaseValue::Real64(location.latitude)),
        ("longitude", DatabaseValue::Real64(location.longitude)),
        ("address", opt_text_value(location.address.as_deref())),
    ]
}

pub(crate) fn location_from_row(row: &Row) -> Result<Location, DbError> {
    Ok(Location {
        district: text(row, "district")?,
        village: opt_text(row, "village")?,
        latitude: real(row, "latitude")?,
        longitude: real(row, "longitude")?,
        address: opt_text(row, "address")?,
    })
}

pub(crate) fn audit_columns(
    created_by: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> [Column; 3] {
    [
        ("created_by", text_value(created_by)),
        ("created_at", timestamp_value(created_at)),
        ("updated_at", timestamp_value(updated_at)),
    ]
}

pub(crate) fn photo_from_row(row: &Row) -> Result<Photo, DbError> {
    Ok(Photo {
        id: text(row, "id")?,
        report_id: text(row, "report_id")?,
        url: text(row, "url")?,
        tag: text(row, "tag")?,
        sort_order: crate::convert::int(row, "sort_order")?,
        created_at: timestamp(row, "created_at")?,
    })
}
