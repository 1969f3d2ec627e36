use switchy_database::{DatabaseValue, Row};
use works_portal_report_models::rice_field::RiceField;

use super::{Column, ReportRecord, audit_columns, location_columns, location_from_row};
use crate::DbError;
use crate::convert::{opt_text, opt_text_value, real, text, timestamp};

impl ReportRecord for RiceField {
    const TABLE: &'static str = "rice_fields";
    const PHOTO_TABLE: Option<&'static str> = None;
    const DATE_COLUMN: &'static str = "observation_date";
    const HAS_STATUS: bool = false;

    fn to_columns(&self) -> Vec<Column> {
        let observed = self
            .observation_date
            .and_hms_opt(0, 0, 0)
            .map_or(DatabaseValue::Null, DatabaseValue::DateTime);

        let mut columns = vec![
            ("observation_date", observed),
            ("rainfed_ha", DatabaseValue::Real64(self.rainfed_ha)),
            ("irrigated_ha", DatabaseValue::Real64(self.irrigated_ha)),
            ("total_ha", DatabaseValue::Real64(self.total_ha)),
            ("notes", opt_text_value(self.notes.as_deref())),
        ];
        columns.extend(location_columns(&self.location));
        columns.extend(audit_columns(&self.created_by, self.created_at, self.updated_at));
        columns
    }

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: text(row, "id")?,
            location: location_from_row(row)?,
            observation_date: timestamp(row, "observation_date")?.date_naive(),
            rainfed_ha: real(row, "rainfed_ha")?,
            irrigated_ha: real(row, "irrigated_ha")?,
            total_ha: real(row, "total_ha")?,
            notes: opt_text(row, "notes")?,
            created_by: text(row, "created_by")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
        })
    }
}
