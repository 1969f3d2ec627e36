use async_trait::async_trait;
use works_portal_cache::CacheKey;
use works_portal_database::overview::road_overview;
use works_portal_database::{AnalyticsSource, DbError};
use works_portal_database_models::{ColumnValue, Condition};
use works_portal_report_models::normalize::CatalogEnum as _;
use works_portal_report_models::road::{
    self, RoadReport, RoadStatus, RoadUrgency, TrafficCondition,
};
use works_portal_server_models::ApiRoadOverview;

use super::{Origin, ReportPolicy, apply_header, apply_location, apply_status, header, status_code};
use crate::form::{Form, FormReader};
use crate::notify::NotifyKind;
use crate::validate::{self, min};
use crate::{ServiceError, ValidationErrors};

const DIMENSIONS: &[&str] = &["damaged_length_m", "damaged_width_m"];

/// Fields read by the budget and repair-time formulas.
const ESTIMATE_INPUTS: &[&str] = &[
    "damaged_length_m",
    "damaged_width_m",
    "total_damaged_area_m2",
    "damage_level",
    "road_class",
    "pavement_type",
    "damage_type",
    "bridge_name",
    "bridge_damage_level",
    "urgency_level",
];

fn any_present(form: &Form, keys: &[&str]) -> bool {
    keys.iter().any(|key| form.has(key))
}

#[async_trait]
impl ReportPolicy for RoadReport {
    type Overview = ApiRoadOverview;

    fn build(r: &mut FormReader<'_>, origin: Origin) -> Self {
        let h = header(r, "institution_unit");
        Self {
            id: origin.id,
            reporter_name: h.reporter_name,
            institution_unit: h.reporter_role,
            phone: h.phone,
            reported_at: h.reported_at,
            road_name: r.title("road_name"),
            road_type: r.enumeration("road_type"),
            road_class: r.enumeration("road_class"),
            pavement_type: r.enumeration("pavement_type"),
            damage_type: r.enumeration("damage_type"),
            damage_level: r.enumeration("damage_level"),
            damaged_length_m: r.float("damaged_length_m"),
            damaged_width_m: r.float("damaged_width_m"),
            damaged_area_m2: 0.0,
            total_damaged_area_m2: r.opt_float("total_damaged_area_m2").unwrap_or_default(),
            bridge_name: r.opt_title("bridge_name"),
            bridge_damage_level: r.opt_enum("bridge_damage_level"),
            traffic_condition: r.enumeration("traffic_condition"),
            urgency_level: r.enumeration("urgency_level"),
            estimated_budget: r.opt_float("estimated_budget").unwrap_or_default(),
            estimated_repair_days: r.opt_int("estimated_repair_days").unwrap_or_default(),
            location: h.location,
            status: RoadStatus::Pending,
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
            "institution_unit",
            &mut self.reporter_name,
            &mut self.institution_unit,
            &mut self.phone,
            &mut self.reported_at,
            &mut self.notes,
        );
        apply_location(r, &mut self.location);
        r.set(&mut self.road_name, "road_name", FormReader::title);
        r.set(&mut self.road_type, "road_type", FormReader::enumeration);
        r.set(&mut self.road_class, "road_class", FormReader::enumeration);
        r.set(&mut self.pavement_type, "pavement_type", FormReader::enumeration);
        r.set(&mut self.damage_type, "damage_type", FormReader::enumeration);
        r.set(&mut self.damage_level, "damage_level", FormReader::enumeration);
        r.set(&mut self.damaged_length_m, "damaged_length_m", FormReader::float);
        r.set(&mut self.damaged_width_m, "damaged_width_m", FormReader::float);
        r.set(
            &mut self.total_damaged_area_m2,
            "total_damaged_area_m2",
            FormReader::float,
        );
        r.set(&mut self.bridge_name, "bridge_name", FormReader::opt_title);
        r.set(
            &mut self.bridge_damage_level,
            "bridge_damage_level",
            FormReader::opt_enum,
        );
        r.set(
            &mut self.traffic_condition,
            "traffic_condition",
            FormReader::enumeration,
        );
        r.set(&mut self.urgency_level, "urgency_level", FormReader::enumeration);
        r.set(&mut self.estimated_budget, "estimated_budget", FormReader::float);
        r.set(
            &mut self.estimated_repair_days,
            "estimated_repair_days",
            FormReader::int,
        );
    }

    fn derive(&mut self, form: &Form, creating: bool) {
        self.damaged_area_m2 = road::damaged_area(self.damaged_length_m, self.damaged_width_m);

        if !form.has("total_damaged_area_m2") && (creating || any_present(form, DIMENSIONS)) {
            self.total_damaged_area_m2 = self.damaged_area_m2;
        }

        if creating || any_present(form, ESTIMATE_INPUTS) {
            let estimate = road::estimate(&self.estimate_input());
            if !form.has("estimated_budget") {
                self.estimated_budget = estimate.budget;
            }
            if !form.has("estimated_repair_days") {
                self.estimated_repair_days = estimate.repair_days;
            }
        }
    }

    fn check(&self, errors: &mut ValidationErrors) {
        validate::location(errors, &self.location, Self::ADDRESS_REQUIRED);
        min(errors, "damaged_length_m", self.damaged_length_m, 0.0);
        min(errors, "damaged_width_m", self.damaged_width_m, 0.0);
        min(errors, "total_damaged_area_m2", self.total_damaged_area_m2, 0.0);
        min(errors, "estimated_budget", self.estimated_budget, 0.0);
        if self.bridge_damage_level.is_some() && self.bridge_name.is_none() {
            errors.push("bridge_name", "required_with=bridge_damage_level");
        }
    }

    fn min_photos(&self) -> usize {
        2
    }

    fn notification(&self) -> Option<NotifyKind> {
        if self.traffic_condition == TrafficCondition::Terputus {
            Some(NotifyKind::Critical)
        } else {
            self.is_emergency().then_some(NotifyKind::Urgent)
        }
    }

    fn parse_status(raw: &str) -> Result<&'static str, ServiceError> {
        status_code::<RoadStatus>(raw)
    }

    fn set_status(&mut self, status: &'static str, notes: Option<&str>) {
        apply_status(&mut self.status, &mut self.notes, status, notes);
    }

    /// Reports flagged DARURAT or cutting off traffic.
    fn dashboard() -> Option<(CacheKey, Vec<Condition>)> {
        Some((
            CacheKey::RoadEmergency,
            vec![Condition::Any(vec![
                Condition::Eq(
                    "urgency_level",
                    ColumnValue::Text(RoadUrgency::Darurat.code().to_string()),
                ),
                Condition::Eq(
                    "traffic_condition",
                    ColumnValue::Text(TrafficCondition::Terputus.code().to_string()),
                ),
            ])],
        ))
    }

    async fn overview(
        src: &dyn AnalyticsSource,
        scope: &[Condition],
    ) -> Result<Self::Overview, DbError> {
        road_overview(src, scope).await.map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use works_portal_report_models::road::{PavementType, RoadClass, RoadDamageType};

    use super::*;
    use crate::policy::fixtures::{header_form, origin};

    fn pothole_form() -> Form {
        header_form()
            .with("institutionUnit", "upt jalan wilayah i")
            .with("roadName", "jl. raya bogor")
            .with("roadType", "kabupaten")
            .with("roadClass", "lokal")
            .with("pavementType", "asphalt")
            .with("damageType", "pothole")
            .with("damageLevel", "moderate")
            .with("damagedLength", "10")
            .with("damagedWidth", "2")
            .with("trafficImpact", "smooth")
            .with("urgencyLevel", "routine")
    }

    fn created() -> RoadReport {
        let form = pothole_form();
        let mut r = form.reader();
        let mut report = RoadReport::build(&mut r, origin());
        r.finish().unwrap();
        report.derive(&form, true);
        report
    }

    #[test]
    fn derives_area_budget_and_repair_days() {
        let report = created();

        assert_eq!(report.institution_unit, "UPT_JALAN_WILAYAH_I");
        assert_eq!(report.road_class, RoadClass::Lokal);
        assert_eq!(report.pavement_type, PavementType::AspalFlexible);
        assert_eq!(report.damage_type, RoadDamageType::Lubang);
        assert!((report.damaged_area_m2 - 20.0).abs() < f64::EPSILON);
        assert!((report.total_damaged_area_m2 - 20.0).abs() < f64::EPSILON);
        assert!((report.estimated_budget - 144_000_000.0).abs() < 1.0);
        assert_eq!(report.estimated_repair_days, 5);
        assert_eq!(report.notification(), None);
    }

    #[test]
    fn dimension_update_recomputes_estimates() {
        let mut report = created();

        let update = Form::new().with("damagedLength", "20");
        let mut r = update.reader();
        report.apply(&mut r);
        r.finish().unwrap();
        report.derive(&update, false);

        assert!((report.damaged_area_m2 - 40.0).abs() < f64::EPSILON);
        assert!((report.total_damaged_area_m2 - 40.0).abs() < f64::EPSILON);
        assert!((report.estimated_budget - 288_000_000.0).abs() < 1.0);
    }

    #[test]
    fn supplied_estimates_are_kept() {
        let form = pothole_form()
            .with("estimated_budget", "1000000")
            .with("estimatedRepairTimeDays", "30");
        let mut r = form.reader();
        let mut report = RoadReport::build(&mut r, origin());
        report.derive(&form, true);

        assert!((report.estimated_budget - 1_000_000.0).abs() < f64::EPSILON);
        assert_eq!(report.estimated_repair_days, 30);
    }

    #[test]
    fn blocked_traffic_is_critical() {
        let form = pothole_form().with("trafficImpact", "blocked");
        let mut r = form.reader();
        let report = RoadReport::build(&mut r, origin());
        assert_eq!(report.notification(), Some(NotifyKind::Critical));

        let form = pothole_form().with("urgencyLevel", "emergency");
        let mut r = form.reader();
        let report = RoadReport::build(&mut r, origin());
        assert_eq!(report.notification(), Some(NotifyKind::Urgent));
    }
}
