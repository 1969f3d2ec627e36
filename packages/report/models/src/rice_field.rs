//! Rice-field inventory rows. These are observations rather than reports:
//! they carry no status and no photos.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Aggregate, Domain, FilterField, FilterKind, Location, Photo, Priority};

/// One inventory observation for a district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiceField {
    pub id: String,
    #[serde(flatten)]
    pub location: Location,
    pub observation_date: NaiveDate,
    pub rainfed_ha: f64,
    pub irrigated_ha: f64,
    /// `rainfed_ha + irrigated_ha`.
    pub total_ha: f64,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RiceField {
    /// Recomputes the derived total.
    pub fn recompute_total(&mut self) {
        self.total_ha = self.rainfed_ha + self.irrigated_ha;
    }
}

impl Aggregate for RiceField {
    const DOMAIN: Domain = Domain::RiceField;

    const FILTERS: &'static [FilterField] =
        &[FilterField::new("district", "district", FilterKind::Title)];

    fn id(&self) -> &str {
        &self.id
    }

    fn created_by(&self) -> &str {
        &self.created_by
    }

    fn reported_at(&self) -> DateTime<Utc> {
        self.observation_date
            .and_hms_opt(0, 0, 0)
            .map_or(self.created_at, |dt| dt.and_utc())
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn status(&self) -> Option<&'static str> {
        None
    }

    fn photos(&self) -> &[Photo] {
        &[]
    }

    fn photos_mut(&mut self) -> Option<&mut Vec<Photo>> {
        None
    }

    fn priority(&self) -> Priority {
        Priority::default()
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "district" => Some(self.location.district.clone()),
            _ => None,
        }
    }

    fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "rainfed_ha" => Some(self.rainfed_ha),
            "irrigated_ha" => Some(self.irrigated_ha),
            "total_ha" => Some(self.total_ha),
            _ => None,
        }
    }

    fn map_label(&self) -> String {
        self.location.district.clone()
    }

    fn map_category(&self) -> Option<String> {
        None
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
