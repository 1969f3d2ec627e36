use async_trait::async_trait;
use works_portal_database::overview::spatial_overview;
use works_portal_database::{AnalyticsSource, DbError};
use works_portal_database_models::Condition;
use works_portal_report_models::spatial::{SpatialReport, SpatialStatus};
use works_portal_server_models::ApiSpatialOverview;

use super::{Origin, ReportPolicy, apply_header, apply_location, apply_status, header, status_code};
use crate::form::FormReader;
use crate::validate::{self, min};
use crate::{ServiceError, ValidationErrors};

#[async_trait]
impl ReportPolicy for SpatialReport {
    type Overview = ApiSpatialOverview;

    fn build(r: &mut FormReader<'_>, origin: Origin) -> Self {
        let h = header(r, "reporter_role");
        Self {
            id: origin.id,
            reporter_name: h.reporter_name,
            reporter_role: h.reporter_role,
            phone: h.phone,
            reported_at: h.reported_at,
            area_category: r.enumeration("area_category"),
            violation_type: r.enumeration("violation_type"),
            violation_level: r.enumeration("violation_level"),
            environmental_impact: r.enumeration("environmental_impact"),
            urgency: r.enumeration("urgency"),
            affected_area_m2: r.opt_float("affected_area_m2"),
            description: r.text("description"),
            location: h.location,
            status: SpatialStatus::Pending,
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
        r.set(&mut self.area_category, "area_category", FormReader::enumeration);
        r.set(&mut self.violation_type, "violation_type", FormReader::enumeration);
        r.set(&mut self.violation_level, "violation_level", FormReader::enumeration);
        r.set(
            &mut self.environmental_impact,
            "environmental_impact",
            FormReader::enumeration,
        );
        r.set(&mut self.urgency, "urgency", FormReader::enumeration);
        r.set(&mut self.affected_area_m2, "affected_area_m2", FormReader::opt_float);
        r.set(&mut self.description, "description", FormReader::text);
    }

    fn check(&self, errors: &mut ValidationErrors) {
        validate::location(errors, &self.location, Self::ADDRESS_REQUIRED);
        if let Some(area) = self.affected_area_m2 {
            min(errors, "affected_area_m2", area, 0.0);
        }
    }

    fn min_photos(&self) -> usize {
        1
    }

    fn parse_status(raw: &str) -> Result<&'static str, ServiceError> {
        status_code::<SpatialStatus>(raw)
    }

    fn set_status(&mut self, status: &'static str, notes: Option<&str>) {
        apply_status(&mut self.status, &mut self.notes, status, notes);
    }

    async fn overview(
        src: &dyn AnalyticsSource,
        scope: &[Condition],
    ) -> Result<Self::Overview, DbError> {
        spatial_overview(src, scope).await.map(Into::into)
    }
}
