use async_trait::async_trait;
use works_portal_database::overview::building_overview;
use works_portal_database::{AnalyticsSource, DbError};
use works_portal_database_models::Condition;
use works_portal_report_models::building::{self, BuildingReport, BuildingStatus};
use works_portal_server_models::ApiBuildingOverview;

use super::{Origin, ReportPolicy, apply_header, apply_location, apply_status, header, status_code};
use crate::form::FormReader;
use crate::validate::{self, min};
use crate::{ServiceError, ValidationErrors};

#[async_trait]
impl ReportPolicy for BuildingReport {
    type Overview = ApiBuildingOverview;

    const ADDRESS_REQUIRED: bool = true;

    fn build(r: &mut FormReader<'_>, origin: Origin) -> Self {
        let h = header(r, "reporter_role");
        Self {
            id: origin.id,
            reporter_name: h.reporter_name,
            reporter_role: h.reporter_role,
            phone: h.phone,
            reported_at: h.reported_at,
            building_name: r.title("building_name"),
            building_type: r.enumeration("building_type"),
            report_type: r.enumeration("report_type"),
            funding_source: r.enumeration("funding_source"),
            floor_area_m2: r.float("floor_area_m2"),
            floor_count: r.int("floor_count"),
            last_year_built: r.opt_int("last_year_built"),
            work_type: r.opt_enum("work_type"),
            condition_after_rehab: r.opt_enum("condition_after_rehab"),
            location: h.location,
            status: BuildingStatus::Pending,
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
        r.set(&mut self.building_name, "building_name", FormReader::title);
        r.set(&mut self.building_type, "building_type", FormReader::enumeration);
        r.set(&mut self.report_type, "report_type", FormReader::enumeration);
        r.set(&mut self.funding_source, "funding_source", FormReader::enumeration);
        r.set(&mut self.floor_area_m2, "floor_area_m2", FormReader::float);
        r.set(&mut self.floor_count, "floor_count", FormReader::int);
        r.set(&mut self.last_year_built, "last_year_built", FormReader::opt_int);
        r.set(&mut self.work_type, "work_type", FormReader::opt_enum);
        r.set(
            &mut self.condition_after_rehab,
            "condition_after_rehab",
            FormReader::opt_enum,
        );
    }

    fn check(&self, errors: &mut ValidationErrors) {
        validate::location(errors, &self.location, Self::ADDRESS_REQUIRED);
        min(errors, "floor_area_m2", self.floor_area_m2, 0.0);
        min(errors, "floor_count", f64::from(self.floor_count), 1.0);
        if let Some(year) = self.last_year_built
            && !(1800..=2100).contains(&year)
        {
            errors.push("last_year_built", "range");
        }
    }

    fn min_photos(&self) -> usize {
        building::min_photos(self.report_type)
    }

    fn parse_status(raw: &str) -> Result<&'static str, ServiceError> {
        status_code::<BuildingStatus>(raw)
    }

    fn set_status(&mut self, status: &'static str, notes: Option<&str>) {
        apply_status(&mut self.status, &mut self.notes, status, notes);
    }

    async fn overview(
        src: &dyn AnalyticsSource,
        scope: &[Condition],
    ) -> Result<Self::Overview, DbError> {
        building_overview(src, scope).await.map(Into::into)
    }
}
