//! Spatial-planning (tata ruang) violation reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::CatalogEnum as _;
use crate::shared::{DamageLevel, ImpactLevel, Urgency};
use crate::{Aggregate, Domain, FilterField, FilterKind, Location, Photo, Priority};

catalog_enum! {
    /// Zoning category of the affected area.
    pub enum AreaCategory as "area_category" {
        KawasanLindung = ["PROTECTED_AREA"],
        KawasanPertanian = ["AGRICULTURAL_AREA"],
        KawasanPermukiman = ["RESIDENTIAL_AREA", "SETTLEMENT"],
        KawasanIndustri = ["INDUSTRIAL_AREA"],
        SempadanSungai = ["RIVERBANK", "RIVER_BUFFER"],
        SempadanPantai = ["COASTAL_BUFFER", "BEACH_BUFFER"],
        RuangTerbukaHijau = ["GREEN_OPEN_SPACE", "RTH"],
        Lainnya = ["OTHER"],
    }
}

catalog_enum! {
    /// Kind of violation.
    pub enum ViolationType as "violation_type" {
        BangunanTanpaIzin = ["UNPERMITTED_BUILDING", "NO_PERMIT"],
        AlihFungsiLahan = ["LAND_CONVERSION"],
        PelanggaranSempadan = ["BUFFER_VIOLATION", "SETBACK_VIOLATION"],
        PemanfaatanTidakSesuai = ["NONCONFORMING_USE", "MISUSE"],
        Lainnya = ["OTHER"],
    }
}

catalog_enum! {
    /// Lifecycle status of a spatial-planning report.
    pub enum SpatialStatus as "status" {
        Pending,
        UnderReview = ["REVIEW", "IN_REVIEW"],
        FollowedUp = ["FOLLOW_UP"],
        Resolved,
        Rejected,
    }
}

/// A spatial-planning violation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialReport {
    pub id: String,
    pub reporter_name: String,
    pub reporter_role: String,
    pub phone: String,
    pub reported_at: DateTime<Utc>,
    pub area_category: AreaCategory,
    pub violation_type: ViolationType,
    pub violation_level: DamageLevel,
    pub environmental_impact: ImpactLevel,
    pub urgency: Urgency,
    pub affected_area_m2: Option<f64>,
    pub description: String,
    #[serde(flatten)]
    pub location: Location,
    pub status: SpatialStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl Aggregate for SpatialReport {
    const DOMAIN: Domain = Domain::Spatial;

    const FILTERS: &'static [FilterField] = &[
        FilterField::new("district", "district", FilterKind::Title),
        FilterField::new("village", "village", FilterKind::Title),
        FilterField::new(
            "area_category",
            "area_category",
            FilterKind::catalog::<AreaCategory>(),
        ),
        FilterField::new(
            "violation_type",
            "violation_type",
            FilterKind::catalog::<ViolationType>(),
        ),
        FilterField::new(
            "violation_level",
            "violation_level",
            FilterKind::catalog::<DamageLevel>(),
        ),
        FilterField::new("urgency", "urgency", FilterKind::catalog::<Urgency>()),
        FilterField::new("status", "status", FilterKind::catalog::<SpatialStatus>()),
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
            urgency_rank: self.urgency.rank(),
            damage_rank: self.violation_level.rank(),
        }
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "district" => Some(self.location.district.clone()),
            "village" => self.location.village.clone(),
            "area_category" => Some(self.area_category.to_string()),
            "violation_type" => Some(self.violation_type.to_string()),
            "violation_level" => Some(self.violation_level.to_string()),
            "urgency" => Some(self.urgency.to_string()),
            "status" => Some(self.status.to_string()),
            "environmental_impact" => Some(self.environmental_impact.to_string()),
            _ => None,
        }
    }

    fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "affected_area_m2" => self.affected_area_m2,
            _ => None,
        }
    }

    fn map_label(&self) -> String {
        self.description.chars().take(80).collect()
    }

    fn map_category(&self) -> Option<String> {
        Some(self.violation_type.to_string())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
