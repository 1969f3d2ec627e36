use switchy_database::Row;
use works_portal_report_models::spatial::SpatialReport;

use super::{Column, ReportRecord, audit_columns, location_columns, location_from_row};
use crate::DbError;
use crate::convert::{
    catalog, code_value, opt_real, opt_real_value, opt_text, opt_text_value, text, text_value,
    timestamp, timestamp_value,
};

impl ReportRecord for SpatialReport {
    const TABLE: &'static str = "spatial_planning_reports";
    const PHOTO_TABLE: Option<&'static str> = Some("spatial_planning_photos");

    fn to_columns(&self) -> Vec<Column> {
        let mut columns = vec![
            ("reporter_name", text_value(&self.reporter_name)),
            ("reporter_role", text_value(&self.reporter_role)),
            ("phone", text_value(&self.phone)),
            ("reported_at", timestamp_value(self.reported_at)),
            ("area_category", code_value(self.area_category)),
            ("violation_type", code_value(self.violation_type)),
            ("violation_level", code_value(self.violation_level)),
            ("environmental_impact", code_value(self.environmental_impact)),
            ("urgency", code_value(self.urgency)),
            ("affected_area_m2", opt_real_value(self.affected_area_m2)),
            ("description", text_value(&self.description)),
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
            area_category: catalog(row, "area_category")?,
            violation_type: catalog(row, "violation_type")?,
            violation_level: catalog(row, "violation_level")?,
            environmental_impact: catalog(row, "environmental_impact")?,
            urgency: catalog(row, "urgency")?,
            affected_area_m2: opt_real(row, "affected_area_m2")?,
            description: text(row, "description")?,
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
