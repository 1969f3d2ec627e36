use switchy_database::{DatabaseValue, Row};
use works_portal_report_models::agriculture::AgricultureReport;

use super::{Column, ReportRecord, audit_columns, location_columns, location_from_row};
use crate::DbError;
use crate::convert::{
    boolean, catalog, code_value, opt_catalog, opt_code_value, opt_real, opt_real_value,
    opt_text, opt_text_value, real, text, text_value, timestamp, timestamp_value,
};

impl ReportRecord for AgricultureReport {
    const TABLE: &'static str = "agriculture_reports";
    const PHOTO_TABLE: Option<&'static str> = Some("agriculture_photos");

    fn to_columns(&self) -> Vec<Column> {
        let mut columns = vec![
            ("reporter_name", text_value(&self.reporter_name)),
            ("reporter_role", text_value(&self.reporter_role)),
            ("phone", text_value(&self.phone)),
            ("reported_at", timestamp_value(self.reported_at)),
            ("farmer_name", text_value(&self.farmer_name)),
            ("farmer_group", opt_text_value(self.farmer_group.as_deref())),
            ("commodity_type", code_value(self.commodity_type)),
            ("commodity", text_value(&self.commodity)),
            ("land_area_ha", DatabaseValue::Real64(self.land_area_ha)),
            ("growth_phase", code_value(self.growth_phase)),
            ("pest_attack", DatabaseValue::Bool(self.pest_attack)),
            ("pest_type", opt_text_value(self.pest_type.as_deref())),
            ("pest_severity", opt_code_value(self.pest_severity)),
            ("affected_area_ha", opt_real_value(self.affected_area_ha)),
            ("main_constraint", code_value(self.main_constraint)),
            (
                "recommendation",
                opt_text_value(self.recommendation.as_deref()),
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
            reporter_role: text(row, "reporter_role")?,
            phone: text(row, "phone")?,
            reported_at: timestamp(row, "reported_at")?,
            farmer_name: text(row, "farmer_name")?,
            farmer_group: opt_text(row, "farmer_group")?,
            commodity_type: catalog(row, "commodity_type")?,
            commodity: text(row, "commodity")?,
            land_area_ha: real(row, "land_area_ha")?,
            growth_phase: catalog(row, "growth_phase")?,
            pest_attack: boolean(row, "pest_attack")?,
            pest_type: opt_text(row, "pest_type")?,
            pest_severity: opt_catalog(row, "pest_severity")?,
            affected_area_ha: opt_real(row, "affected_area_ha")?,
            main_constraint: catalog(row, "main_constraint")?,
            recommendation: opt_text(row, "recommendation")?,
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
