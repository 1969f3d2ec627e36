use async_trait::async_trait;
use works_portal_database::overview::rice_field_overview;
use works_portal_database::{AnalyticsSource, DbError};
use works_portal_database_models::Condition;
use works_portal_report_models::rice_field::RiceField;
use works_portal_server_models::ApiRiceFieldOverview;

use super::{Origin, ReportPolicy, apply_location, location};
use crate::form::{Form, FormReader};
use crate::validate::{self, min};
use crate::{ServiceError, ValidationErrors};

#[async_trait]
impl ReportPolicy for RiceField {
    type Overview = ApiRiceFieldOverview;

    const HAS_STATUS: bool = false;

    fn build(r: &mut FormReader<'_>, origin: Origin) -> Self {
        Self {
            id: origin.id,
            location: location(r),
            observation_date: r.date("observation_date"),
            rainfed_ha: r.float("rainfed_ha"),
            irrigated_ha: r.float("irrigated_ha"),
            total_ha: 0.0,
            notes: r.opt_text("notes"),
            created_by: origin.created_by,
            created_at: origin.now,
            updated_at: origin.now,
        }
    }

    fn apply(&mut self, r: &mut FormReader<'_>) {
        apply_location(r, &mut self.location);
        r.set(&mut self.observation_date, "observation_date", FormReader::date);
        r.set(&mut self.rainfed_ha, "rainfed_ha", FormReader::float);
        r.set(&mut self.irrigated_ha, "irrigated_ha", FormReader::float);
        r.set(&mut self.notes, "notes", FormReader::opt_text);
    }

    fn derive(&mut self, _form: &Form, _creating: bool) {
        self.recompute_total();
    }

    fn check(&self, errors: &mut ValidationErrors) {
        validate::location(errors, &self.location, Self::ADDRESS_REQUIRED);
        min(errors, "rainfed_ha", self.rainfed_ha, 0.0);
        min(errors, "irrigated_ha", self.irrigated_ha, 0.0);
    }

    fn min_photos(&self) -> usize {
        0
    }

    fn parse_status(_raw: &str) -> Result<&'static str, ServiceError> {
        Err(ServiceError::invalid("status", "unsupported"))
    }

    fn set_status(&mut self, _status: &'static str, notes: Option<&str>) {
        if let Some(notes) = notes {
            self.notes = Some(notes.to_string());
        }
    }

    async fn overview(
        src: &dyn AnalyticsSource,
        scope: &[Condition],
    ) -> Result<Self::Overview, DbError> {
        rice_field_overview(src, scope).await.map(Into::into)
    }
}
