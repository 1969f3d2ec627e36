use switchy_database::{DatabaseValue, Row};
use works_portal_report_models::road::RoadReport;

use super::{Column, ReportRecord, audit_columns, location_columns, location_from_row};
use crate::DbError;
use crate::convert::{
    catalog, code_value, int, opt_catalog, opt_code_value, opt_text, opt_text_value, real, text,
    text_value, timestamp, timestamp_value,
};

impl ReportRecord for RoadReport {
    const TABLE: &'static str = "road_reports";
    const PHOTO_TABLE: Option<&'static str> = Some("road_report_photos");

    fn to_columns(&self) -> Vec<Column> {
        let mut columns = vec![
            ("reporter_name", text_value(&self.reporter_name)),
            ("institution_unit", text_value(&self.institution_unit)),
            ("phone", text_value(&self.phone)),
            ("reported_at", timestamp_value(self.reported_at)),
            ("road_name", text_value(&self.road_name)),
            ("road_type", code_value(self.road_type)),
            ("road_class", code_value(self.road_class)),
            ("pavement_type", code_value(self.pavement_type)),
            ("damage_type", code_value(self.damage_type)),
            ("damage_level", code_value(self.damage_level)),
            ("damaged_length_m", DatabaseValue::Real64(self.damaged_length_m)),
            ("damaged_width_m", DatabaseValue::Real64(self.damaged_width_m)),
            ("damaged_area_m2", DatabaseValue::Real64(self.damaged_area_m2)),
            (
                "total_damaged_area_m2",
                DatabaseValue::Real64(self.total_damaged_area_m2),
            ),
            ("bridge_name", opt_text_value(self.bridge_name.as_deref())),
            ("bridge_damage_level", opt_code_value(self.bridge_damage_level)),
            ("traffic_condition", code_value(self.traffic_condition)),
            ("urgency_level", code_value(self.urgency_level)),
            ("estimated_budget", DatabaseValue::Real64(self.estimated_budget)),
            (
                "estimated_repair_days",
                DatabaseValue::Int32(self.estimated_repair_days),
            ),
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
            institution_unit: text(row, "institution_unit")?,
            phone: text(row, "phone")?,
            reported_at: timestamp(row, "reported_at")?,
            road_name: text(row, "road_name")?,
            road_type: catalog(row, "road_type")?,
            road_class: catalog(row, "road_class")?,
            pavement_type: catalog(row, "pavement_type")?,
            damage_type: catalog(row, "damage_type")?,
            damage_level: catalog(row, "damage_level")?,
            damaged_length_m: real(row, "damaged_length_m")?,
            damaged_width_m: real(row, "damaged_width_m")?,
            damaged_area_m2: real(row, "damaged_area_m2")?,
            total_damaged_area_m2: real(row, "total_damaged_area_m2")?,
            bridge_name: opt_text(row, "bridge_name")?,
            bridge_damage_level: opt_catalog(row, "bridge_damage_level")?,
            traffic_condition: catalog(row, "traffic_condition")?,
            urgency_level: catalog(row, "urgency_level")?,
            estimated_budget: real(row, "estimated_budget")?,
            estimated_repair_days: int(row, "estimated_repair_days")?,
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
