use switchy_database::{DatabaseValue, Row};
use works_portal_report_models::building::BuildingReport;

use super::{Column, ReportRecord, audit_columns, location_columns, location_from_row};
use crate::DbError;
use crate::convert::{
    catalog, code_value, int, opt_catalog, opt_code_value, opt_int, opt_int_value, opt_text,
    opt_text_value, real, text, text_value, timestamp, timestamp_value,
};

impl ReportRecord for BuildingReport {
    const TABLE: &'static str = "reports";
    const PHOTO_TABLE: Option<&'static str> = Some("report_photos");

    fn to_columns(&self) -> Vec<Column> {
        let mut columns = vec![
            ("reporter_name", text_value(&self.reporter_name)),
            ("reporter_role", text_value(&self.reporter_role)),
            ("phone", text_value(&self.phone)),
            ("reported_at", timestamp_value(self.reported_at)),
            ("building_name", text_value(&self.building_name)),
            ("building_type", code_value(self.building_type)),
            ("report_type", code_value(self.report_type)),
            ("funding_source", code_value(self.funding_source)),
            ("floor_area_m2", DatabaseValue::Real64(self.floor_area_m2)),
            ("floor_count", DatabaseValue::Int32(self.floor_count)),
            ("last_year_built", opt_int_value(self.last_year_built)),
            ("work_type", opt_code_value(self.work_type)),
            ("condition_after_rehab", opt_code_value(self.condition_after_rehab)),
            ("status", code_value(self.status)),
            ("notes", opt_text_value(self.notes.as_deref())),
        ];
        columns.extend(location_columns(&self.location));
        columns.extend(audit_columns(&self.created_by, self.created_at, self.updated_at));
        columns
    }

    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Self {
            id: text(row, "id")?,
            reporter_name: text(row, "reporter_name")?,
            reporter_role: text(row, "reporter_role")?,
            phone: text(row, "phone")?,
            reported_at: timestamp(row, "reported_at")?,
            building_name: text(row, "building_name")?,
            building_type: catalog(row, "building_type")?,
            report_type: catalog(row, "report_type")?,
            funding_source: catalog(row, "funding_source")?,
            floor_area_m2: real(row, "floor_area_m2")?,
            floor_count: int(row, "floor_count")?,
            last_year_built: opt_int(row, "last_year_built")?,
            work_type: opt_catalog(row, "work_type")?,
            condition_after_rehab: opt_catalog(row, "condition_after_rehab")?,
            location: location_from_row(row)?,
            status: catalog(row, "status")?,
            notes: opt_text(row, "notes")?,
            created_by: text(row, "created_by")?,
            created_at: timestamp(row, "created_at")?,
            updated_at: timestamp(row, "updated_at")?,
            photos: vec![],
        })
    }
}
