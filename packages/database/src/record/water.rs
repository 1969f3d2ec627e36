use switchy_database::{DatabaseValue, Row};
use works_portal_report_models::water::WaterReport;

use super::{Column, ReportRecord, audit_columns, location_columns, location_from_row};
use crate::DbError;
use crate::convert::{
    catalog, code_value, int, opt_real, opt_real_value, opt_text, opt_text_value, real, text,
    text_value, timestamp, timestamp_value,
};

impl ReportRecord for WaterReport {
    const TABLE: &'static str = "water_resource_reports";
    const PHOTO_TABLE: Option<&'static str> = Some("water_resource_photos");

    fn to_columns(&self) -> Vec<Column> {
        let mut columns = vec![
            ("reporter_name", text_value(&self.reporter_name)),
            ("reporter_role", text_value(&self.reporter_role)),
            ("phone", text_value(&self.phone)),
            ("reported_at", timestamp_value(self.reported_at)),
            ("irrigation_area_name", text_value(&self.irrigation_area_name)),
            ("irrigation_type", code_value(self.irrigation_type)),
            ("damage_type", code_value(self.damage_type)),
            ("damage_level", code_value(self.damage_level)),
            ("estimated_length_m", DatabaseValue::Real64(self.estimated_length_m)),
            ("estimated_width_m", DatabaseValue::Real64(self.estimated_width_m)),
            ("estimated_depth_m", opt_real_value(self.estimated_depth_m)),
            (
                "affected_rice_field_ha",
                DatabaseValue::Real64(self.affected_rice_field_ha),
            ),
            ("affected_farmers", DatabaseValue::Int32(self.affected_farmers)),
            ("urgency", code_value(self.urgency)),
            ("estimated_budget", DatabaseValue::Real64(self.estimated_budget)),
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
            irrigation_area_name: text(row, "irrigation_area_name")?,
            irrigation_type: catalog(row, "irrigation_type")?,
            damage_type: catalog(row, "damage_type")?,
            damage_level: catalog(row, "damage_level")?,
            estimated_length_m: real(row, "estimated_length_m")?,
            estimated_width_m: real(row, "estimated_width_m")?,
            estimated_depth_m: opt_real(row, "estimated_depth_m")?,
            affected_rice_field_ha: real(row, "affected_rice_field_ha")?,
            affected_farmers: int(row, "affected_farmers")?,
            urgency: catalog(row, "urgency")?,
            estimated_budget: real(row, "estimated_budget")?,
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
