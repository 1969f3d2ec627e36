use async_trait::async_trait;
use works_portal_database::overview::agriculture_overview;
use works_portal_database::{AnalyticsSource, DbError};
use works_portal_database_models::Condition;
use works_portal_report_models::agriculture::{AgricultureReport, VisitStatus};
use works_portal_server_models::ApiAgricultureOverview;

use super::{Origin, ReportPolicy, apply_header, apply_location, apply_status, header, status_code};
use crate::form::{Form, FormReader};
use crate::validate::{self, min};
use crate::{ServiceError, ValidationErrors};

#[async_trait]
impl ReportPolicy for AgricultureReport {
    type Overview = ApiAgricultureOverview;

    fn build(r: &mut FormReader<'_>, origin: Origin) -> Self {
        let h = header(r, "reporter_role");
        Self {
            id: origin.id,
            reporter_name: h.reporter_name,
            reporter_role: h.reporter_role,
            phone: h.phone,
            reported_at: h.reported_at,
            farmer_name: r.title("farmer_name"),
            farmer_group: r.opt_title("farmer_group"),
            commodity_type: r.enumeration("commodity_type"),
            commodity: r.title("commodity"),
            land_area_ha: r.float("land_area_ha"),
            growth_phase: r.enumeration("growth_phase"),
            pest_attack: r.flag("pest_attack"),
            pest_type: r.opt_code("pest_type"),
            pest_severity: r.opt_enum("pest_severity"),
            affected_area_ha: r.opt_float("affected_area_ha"),
            main_constraint: r.enumeration("main_constraint"),
            recommendation: r.opt_text("recommendation"),
            location: h.location,
            status: VisitStatus::Pending,
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
        r.set(&mut self.farmer_name, "farmer_name", FormReader::title);
        r.set(&mut self.farmer_group, "farmer_group", FormReader::opt_title);
        r.set(&mut self.commodity_type, "commodity_type", FormReader::enumeration);
        r.set(&mut self.commodity, "commodity", FormReader::title);
        r.set(&mut self.land_area_ha, "land_area_ha", FormReader::float);
        r.set(&mut self.growth_phase, "growth_phase", FormReader::enumeration);
        r.set(&mut self.pest_attack, "pest_attack", FormReader::flag);
        r.set(&mut self.pest_type, "pest_type", FormReader::opt_code);
        r.set(&mut self.pest_severity, "pest_severity", FormReader::opt_enum);
        r.set(&mut self.affected_area_ha, "affected_area_ha", FormReader::opt_float);
        r.set(&mut self.main_constraint, "main_constraint", FormReader::enumeration);
        r.set(&mut self.recommendation, "recommendation", FormReader::opt_text);
    }

    /// Pest details only describe an attack.
    fn derive(&mut self, _form: &Form, _creating: bool) {
        if !self.pest_attack {
            self.pest_type = None;
            self.pest_severity = None;
        }
    }

    fn check(&self, errors: &mut ValidationErrors) {
        validate::location(errors, &self.location, Self::ADDRESS_REQUIRED);
        min(errors, "land_area_ha", self.land_area_ha, 0.0);
        if let Some(area) = self.affected_area_ha {
            min(errors, "affected_area_ha", area, 0.0);
        }
        if self.pest_attack && self.pest_type.is_none() {
            errors.push("pest_type", "required_if=pest_attack");
        }
    }

    fn min_photos(&self) -> usize {
        1
    }

    fn parse_status(raw: &str) -> Result<&'static str, ServiceError> {
        status_code::<VisitStatus>(raw)
    }

    fn set_status(&mut self, status: &'static str, notes: Option<&str>) {
        apply_status(&mut self.status, &mut self.notes, status, notes);
    }

    async fn overview(
        src: &dyn AnalyticsSource,
        scope: &[Condition],
    ) -> Result<Self::Overview, DbError> {
        agriculture_overview(src, scope).await.map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use works_portal_report_models::agriculture::{CommodityType, FarmConstraint, GrowthPhase};

    use super::*;
    use crate::policy::fixtures::{header_form, origin};

    fn visit_form() -> Form {
        header_form()
            .with("farmerName", "pak darto")
            .with("commodityType", "food crops")
            .with("commodity", "padi sawah")
            .with("landAreaHa", "1.5")
            .with("growthPhase", "vegetative")
            .with("mainConstraint", "pest")
    }

    #[test]
    fn binds_a_visit_with_a_pest_attack() {
        let form = visit_form()
            .with("pestAttack", "true")
            .with("pestType", "wereng batang coklat")
            .with("pestSeverity", "severe");
        let mut r = form.reader();
        let mut report = AgricultureReport::build(&mut r, origin());
        r.finish().unwrap();
        report.derive(&form, true);

        assert_eq!(report.commodity_type, CommodityType::Pangan);
        assert_eq!(report.commodity, "Padi Sawah");
        assert_eq!(report.growth_phase, GrowthPhase::Vegetatif);
        assert_eq!(report.main_constraint, FarmConstraint::HamaPenyakit);
        assert_eq!(report.pest_type.as_deref(), Some("WERENG_BATANG_COKLAT"));

        let mut errors = ValidationErrors::new();
        report.check(&mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn pest_details_are_dropped_without_an_attack() {
        let form = visit_form().with("pestType", "tikus");
        let mut r = form.reader();
        let mut report = AgricultureReport::build(&mut r, origin());
        report.derive(&form, true);
        assert!(!report.pest_attack);
        assert_eq!(report.pest_type, None);
    }

    #[test]
    fn attack_requires_a_pest_type() {
        let form = visit_form().with("pestAttack", "yes");
        let mut r = form.reader();
        let report = AgricultureReport::build(&mut r, origin());

        let mut errors = ValidationErrors::new();
        report.check(&mut errors);
        assert_eq!(errors.entries(), ["pest_type: required_if=pest_attack"]);
    }
}
