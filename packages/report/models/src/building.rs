//! Public building rehabilitation and new-construction reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::CatalogEnum as _;
use crate::{Aggregate, Domain, FilterField, FilterKind, Location, Photo, Priority};

catalog_enum! {
    /// Kind of public building.
    pub enum BuildingType as "building_type" {
        /// School
        Sekolah = ["SCHOOL"],
        /// Community health centre
        Puskesmas = ["HEALTH_CENTER", "CLINIC"],
        /// Government office
        KantorPemerintah = ["GOVERNMENT_OFFICE", "OFFICE"],
        /// House of worship
        RumahIbadah = ["WORSHIP", "PLACE_OF_WORSHIP"],
        /// Market
        Pasar = ["MARKET"],
        /// Other public facility
        FasilitasUmum = ["PUBLIC_FACILITY"],
        /// Anything else
        Lainnya = ["OTHER"],
    }
}

catalog_enum! {
    /// Whether the report covers an existing building or a new one.
    pub enum BuildingReportType as "report_type" {
        /// Rehabilitation of an existing building
        Rehabilitasi = ["REHABILITATION", "REHAB"],
        /// New construction
        PembangunanBaru = ["NEW_CONSTRUCTION", "NEW"],
    }
}

catalog_enum! {
    /// Funding source.
    pub enum FundingSource as "funding_source" {
        /// Regional budget
        Apbd,
        /// National budget
        Apbn,
        /// Special allocation fund
        Dak,
        /// Community self-funded
        Swadaya = ["SELF_FUNDED", "COMMUNITY"],
        /// Anything else
        Lainnya = ["OTHER"],
    }
}

catalog_enum! {
    /// Scope of the planned work, lowest severity first.
    pub enum BuildingWorkType as "work_type" {
        /// New construction
        Pembangunan = ["CONSTRUCTION"],
        /// Light rehabilitation
        RehabRingan = ["LIGHT_REHAB", "LIGHT"],
        /// Moderate rehabilitation
        RehabSedang = ["MODERATE_REHAB", "MODERATE"],
        /// Heavy rehabilitation
        RehabBerat = ["HEAVY_REHAB", "SEVERE"],
    }
}

catalog_enum! {
    /// Condition after rehabilitation.
    pub enum BuildingCondition as "condition_after_rehab" {
        /// Good
        Baik = ["GOOD"],
        /// Fair
        Cukup = ["FAIR"],
        /// Lightly damaged
        RusakRingan = ["LIGHT_DAMAGE"],
        /// Heavily damaged
        RusakBerat = ["HEAVY_DAMAGE"],
    }
}

catalog_enum! {
    /// Lifecycle status of a building report.
    pub enum BuildingStatus as "status" {
        /// Awaiting verification
        Pending,
        /// Verified by an officer
        Verified,
        /// Work in progress
        InProgress,
        /// Work completed
        Completed,
        /// Rejected
        Rejected,
    }
}

/// Minimum photo count for a building report of the given type.
#[must_use]
pub const fn min_photos(report_type: BuildingReportType) -> usize {
    match report_type {
        BuildingReportType::Rehabilitasi => 2,
        BuildingReportType::PembangunanBaru => 0,
    }
}

/// A building report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingReport {
    pub id: String,
    pub reporter_name: String,
    pub reporter_role: String,
    pub phone: String,
    pub reported_at: DateTime<Utc>,
    pub building_name: String,
    pub building_type: BuildingType,
    pub report_type: BuildingReportType,
    pub funding_source: FundingSource,
    pub floor_area_m2: f64,
    pub floor_count: i32,
    pub last_year_built: Option<i32>,
    pub work_type: Option<BuildingWorkType>,
    pub condition_after_rehab: Option<BuildingCondition>,
    #[serde(flatten)]
    pub location: Location,
    pub status: BuildingStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl Aggregate for BuildingReport {
    const DOMAIN: Domain = Domain::Building;

    const FILTERS: &'static [FilterField] = &[
        FilterField::new("district", "district", FilterKind::Title),
        FilterField::new("village", "village", FilterKind::Title),
        FilterField::new(
            "building_type",
            "building_type",
            FilterKind::catalog::<BuildingType>(),
        ),
        FilterField::new(
            "report_type",
            "report_type",
            FilterKind::catalog::<BuildingReportType>(),
        ),
        FilterField::new(
            "funding_source",
            "funding_source",
            FilterKind::catalog::<FundingSource>(),
        ),
        FilterField::new("work_type", "work_type", FilterKind::catalog::<BuildingWorkType>()),
        FilterField::new("status", "status", FilterKind::catalog::<BuildingStatus>()),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn created_by(&self) -> &str {
        &self.created_by
    }

    fn reported_at(&self) -> DateTime<Utc> {
        self.reported_at
    }

    fn location(&self) -> &Location {
        &self.location
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.into())
    }

    fn photos(&self) -> &[Photo] {
        &self.photos
    }

    fn photos_mut(&mut self) -> Option<&mut Vec<Photo>> {
        Some(&mut self.photos)
    }

    fn priority(&self) -> Priority {
        Priority {
            urgency_rank: self.report_type.rank(),
            damage_rank: self.work_type.map_or(0, |w| w.rank()),
        }
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "district" => Some(self.location.district.clone()),
            "village" => self.location.village.clone(),
            "building_type" => Some(self.building_type.to_string()),
            "report_type" => Some(self.report_type.to_string()),
            "funding_source" => Some(self.funding_source.to_string()),
            "work_type" => self.work_type.map(|w| w.to_string()),
            "status" => Some(self.status.to_string()),
            "condition_after_rehab" => self.condition_after_rehab.map(|c| c.to_string()),
            _ => None,
        }
    }

    fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "floor_area_m2" => Some(self.floor_area_m2),
            "floor_count" => Some(f64::from(self.floor_count)),
            _ => None,
        }
    }

    fn map_label(&self) -> String {
        self.building_name.clone()
    }

    fn map_category(&self) -> Option<String> {
        Some(self.building_type.to_string())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::CatalogEnum;

    #[test]
    fn new_construction_needs_no_photos() {
        assert_eq!(min_photos(BuildingReportType::Rehabilitasi), 2);
        assert_eq!(min_photos(BuildingReportType::PembangunanBaru), 0);
    }

    #[test]
    fn report_type_accepts_english_alias() {
        assert_eq!(
            BuildingReportType::parse_normalized("new construction"),
            Ok(BuildingReportType::PembangunanBaru)
        );
    }

    #[test]
    fn serializes_codes_in_screaming_snake_case() {
        let value = serde_json::to_value(BuildingType::KantorPemerintah).unwrap();
        assert_eq!(value, serde_json::json!("KANTOR_PEMERINTAH"));
        assert_eq!(FundingSource::Apbd.to_string(), "APBD");
    }
}
