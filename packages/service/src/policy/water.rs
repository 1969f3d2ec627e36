use async_trait::async_trait;
use works_portal_cache::CacheKey;
use works_portal_database::overview::water_overview;
use works_portal_database::{AnalyticsSource, DbError};
use works_portal_database_models::{ColumnValue, Condition};
use works_portal_report_models::normalize::CatalogEnum as _;
use works_portal_report_models::shared::Urgency;
use works_portal_report_models::water::{WaterReport, WaterStatus};
use works_portal_server_models::ApiWaterOverview;

use super::{Origin, ReportPolicy, apply_header, apply_location, apply_status, header, status_code};
use crate::form::{Form, FormReader};
use crate::notify::NotifyKind;
use crate::validate::{self, min};
use crate::{ServiceError, ValidationErrors};

/// Fields the budget formula reads.
const BUDGET_INPUTS: &[&str] = &[
    "estimated_length_m",
    "estimated_width_m",
    "damage_level",
    "irrigation_type",
    "urgency",
];

#[async_trait]
impl ReportPolicy for WaterReport {
    type Overview = ApiWaterOverview;

    fn build(r: &mut FormReader<'_>, origin: Origin) -> Self {
        let h = header(r, "reporter_role");
        Self {
            id: origin.id,
            reporter_name: h.reporter_name,
            reporter_role: h.reporter_role,
            phone: h.phone,
            reported_at: h.reported_at,
            irrigation_area_name: r.title("irrigation_area_name"),
            irrigation_type: r.enumeration("irrigation_type"),
            damage_type: r.enumeration("damage_type"),
            damage_level: r.enumeration("damage_level"),
            estimated_length_m: r.float("estimated_length_m"),
            estimated_width_m: r.float("estimated_width_m"),
            estimated_depth_m: r.opt_float("estimated_depth_m"),
            affected_rice_field_ha: r.opt_float("affected_rice_field_ha").unwrap_or_default(),
            affected_farmers: r.opt_int("affected_farmers").unwrap_or_default(),
            urgency: r.enumeration("urgency"),
            estimated_budget: r.opt_float("estimated_budget").unwrap_or_default(),
            location: h.location,
            status: WaterStatus::Pending,
            notes: h.notes,
            created_by: origin.created_by,
            created_at: origin.now,
            updated_at: origin.now,
            photos: vec![],
        }
    }

    fn apply(&mut self, r: &mut FormReader<'_>) {
        apply_header(
            r,
            "reporter_role",
            &mut self.reporter_name,
            &mut self.reporter_role,
            &mut self.phone,
            &mut self.reported_at,
            &mut self.notes,
        );
        apply_location(r, &mut self.location);
        r.set(&mut self.irrigation_area_name, "irrigation_area_name", FormReader::title);
        r.set(&mut self.irrigation_type, "irrigation_type", FormReader::enumeration);
        r.set(&mut self.damage_type, "damage_type", FormReader::enumeration);
        r.set(&mut self.damage_level, "damage_level", FormReader::enumeration);
        r.set(&mut self.estimated_length_m, "estimated_length_m", FormReader::float);
        r.set(&mut self.estimated_width_m, "estimated_width_m", FormReader::float);
        r.set(&mut self.estimated_depth_m, "estimated_depth_m", FormReader::opt_float);
        r.set(
            &mut self.affected_rice_field_ha,
            "affected_rice_field_ha",
            FormReader::float,
        );
        r.set(&mut self.affected_farmers, "affected_farmers", FormReader::int);
        r.set(&mut self.urgency, "urgency", FormReader::enumeration);
        r.set(&mut self.estimated_budget, "estimated_budget", FormReader::float);
    }

    fn derive(&mut self, form: &Form, creating: bool) {
        if form.has("estimated_budget") {
            return;
        }
        if creating || BUDGET_INPUTS.iter().any(|key| form.has(key)) {
            self.estimated_budget = self.derived_budget();
        }
    }

    fn check(&self, errors: &mut ValidationErrors) {
        validate::location(errors, &self.location, Self::ADDRESS_REQUIRED);
        min(errors, "estimated_length_m", self.estimated_length_m, 0.0);
        min(errors, "estimated_width_m", self.estimated_width_m, 0.0);
        min(errors, "affected_rice_field_ha", self.affected_rice_field_ha, 0.0);
        min(errors, "affected_farmers", f64::from(self.affected_farmers), 0.0);
    }

    fn min_photos(&self) -> usize {
        2
    }

    fn notification(&self) -> Option<NotifyKind> {
        self.is_urgent().then_some(NotifyKind::Urgent)
    }

    fn parse_status(raw: &str) -> Result<&'static str, ServiceError> {
        status_code::<WaterStatus>(raw)
    }

    fn set_status(&mut self, status: &'static str, notes: Option<&str>) {
        apply_status(&mut self.status, &mut self.notes, status, notes);
    }

    /// Open reports flagged MENDESAK.
    fn dashboard() -> Option<(CacheKey, Vec<Condition>)> {
        let open = [WaterStatus::Pending, WaterStatus::Verified, WaterStatus::InRepair]
            .iter()
            .map(|s| s.code().to_string())
            .collect();
        Some((
            CacheKey::WaterUrgent,
            vec![
                Condition::Eq(
                    "urgency",
                    ColumnValue::Text(Urgency::Mendesak.code().to_string()),
                ),
                Condition::In("status", open),
            ],
        ))
    }

    async fn overview(
        src: &dyn AnalyticsSource,
        scope: &[Condition],
    ) -> Result<Self::Overview, DbError> {
        water_overview(src, scope).await.map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use works_portal_report_models::water::IrrigationType;

    use super::*;
    use crate::policy::fixtures::{header_form, origin};

    fn form() -> Form {
        header_form()
            .with("irrigation_area_name", "di cibinong")
            .with("irrigation_type", "saluran tersier")
            .with("damage_type", "leak")
            .with("damage_level", "moderate")
            .with("estimatedLength", "4")
            .with("estimatedWidth", "2")
            .with("urgencyCategory", "urgent")
    }

    #[test]
    fn budget_is_derived_when_omitted() {
        let form = form();
        let mut r = form.reader();
        let mut report = WaterReport::build(&mut r, origin());
        r.finish().unwrap();
        report.derive(&form, true);

        assert_eq!(report.irrigation_type, IrrigationType::SaluranTersier);
        // (1e6 + 8 × 5e5) × 1.5 + 3e5
        assert!((report.estimated_budget - 7_800_000.0).abs() < 1.0);
        assert_eq!(report.notification(), Some(NotifyKind::Urgent));
    }

    #[test]
    fn supplied_budget_wins() {
        let form = form().with("estimated_budget", "5000000");
        let mut r = form.reader();
        let mut report = WaterReport::build(&mut r, origin());
        report.derive(&form, true);
        assert!((report.estimated_budget - 5_000_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrelated_update_keeps_the_budget() {
        let form = form();
        let mut r = form.reader();
        let mut report = WaterReport::build(&mut r, origin());
        report.derive(&form, true);
        report.estimated_budget = 1.0;

        let update = Form::new().with("notes", "sudah dicek");
        let mut r = update.reader();
        report.apply(&mut r);
        report.derive(&update, false);
        assert!((report.estimated_budget - 1.0).abs() < f64::EPSILON);
        assert_eq!(report.notes.as_deref(), Some("sudah dicek"));
    }
}
