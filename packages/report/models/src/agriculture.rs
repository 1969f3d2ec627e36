//! Agricultural extension visit reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::CatalogEnum as _;
use crate::shared::DamageLevel;
use crate::{Aggregate, Domain, FilterField, FilterKind, Location, Photo, Priority};

catalog_enum! {
    /// Commodity group. Doubles as the overview scope.
    pub enum CommodityType as "commodity_type" {
        /// Food crops
        Pangan = ["FOOD", "FOOD_CROPS"],
        /// Horticulture
        Hortikultura = ["HORTICULTURE"],
        /// Estate crops
        Perkebunan = ["PLANTATION", "ESTATE"],
    }
}

catalog_enum! {
    /// Crop growth phase at the time of the visit.
    pub enum GrowthPhase as "growth_phase" {
        Persemaian = ["NURSERY", "SEEDLING"],
        Vegetatif = ["VEGETATIVE"],
        Generatif = ["GENERATIVE", "REPRODUCTIVE"],
        Panen = ["HARVEST"],
        PascaPanen = ["POST_HARVEST"],
        Bera = ["FALLOW"],
    }
}

catalog_enum! {
    /// Main constraint reported by the farmer.
    pub enum FarmConstraint as "main_constraint" {
        HamaPenyakit = ["PEST", "PEST_DISEASE", "DISEASE"],
        Kekeringan = ["DROUGHT"],
        Banjir = ["FLOOD"],
        Pupuk = ["FERTILIZER"],
        Benih = ["SEED"],
        Harga = ["PRICE"],
        TenagaKerja = ["LABOR", "LABOUR"],
        TidakAda = ["NONE"],
        Lainnya = ["OTHER"],
    }
}

catalog_enum! {
    /// Lifecycle status of an extension visit.
    pub enum VisitStatus as "status" {
        Pending,
        Reviewed,
        FollowedUp = ["FOLLOW_UP"],
    }
}

impl CommodityType {
    /// Resolves an overview scope into the commodity it narrows to.
    /// `all` (and anything unknown) yields `None`.
    #[must_use]
    pub fn from_scope(scope: &str) -> Option<Self> {
        match scope {
            "pangan" => Some(Self::Pangan),
            "hortikultura" => Some(Self::Hortikultura),
            "perkebunan" => Some(Self::Perkebunan),
            _ => None,
        }
    }
}

/// An extension officer's visit report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgricultureReport {
    pub id: String,
    /// Extension officer, title-cased.
    pub reporter_name: String,
    pub reporter_role: String,
    pub phone: String,
    pub reported_at: DateTime<Utc>,
    pub farmer_name: String,
    pub farmer_group: Option<String>,
    pub commodity_type: CommodityType,
    /// Commodity name, title-cased.
    pub commodity: String,
    pub land_area_ha: f64,
    pub growth_phase: GrowthPhase,
    pub pest_attack: bool,
    /// Upper-snake-cased pest name.
    pub pest_type: Option<String>,
    pub pest_severity: Option<DamageLevel>,
    pub affected_area_ha: Option<f64>,
    pub main_constraint: FarmConstraint,
    pub recommendation: Option<String>,
    #[serde(flatten)]
    pub location: Location,
    pub status: VisitStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl Aggregate for AgricultureReport {
    const DOMAIN: Domain = Domain::Agriculture;

    const FILTERS: &'static [FilterField] = &[
        FilterField::new("district", "district", FilterKind::Title),
        FilterField::new("village", "village", FilterKind::Title),
        FilterField::new(
            "commodity_type",
            "commodity_type",
            FilterKind::catalog::<CommodityType>(),
        ),
        FilterField::new("commodity", "commodity", FilterKind::Title),
        FilterField::new(
            "growth_phase",
            "growth_phase",
            FilterKind::catalog::<GrowthPhase>(),
        ),
        FilterField::new("pest_attack", "pest_attack", FilterKind::Flag),
        FilterField::new(
            "main_constraint",
            "main_constraint",
            FilterKind::catalog::<FarmConstraint>(),
        ),
        FilterField::new("status", "status", FilterKind::catalog::<VisitStatus>()),
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
            urgency_rank: i32::from(self.pest_attack),
            damage_rank: self.pest_severity.map_or(0, |s| s.rank()),
        }
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "district" => Some(self.location.district.clone()),
            "village" => self.location.village.clone(),
            "commodity_type" => Some(self.commodity_type.to_string()),
            "commodity" => Some(self.commodity.clone()),
            "growth_phase" => Some(self.growth_phase.to_string()),
            "pest_attack" => Some(self.pest_attack.to_string()),
            "main_constraint" => Some(self.main_constraint.to_string()),
            "status" => Some(self.status.to_string()),
            "pest_type" => self.pest_type.clone(),
            _ => None,
        }
    }

    fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "land_area_ha" => Some(self.land_area_ha),
            "affected_area_ha" => self.affected_area_ha,
            _ => None,
        }
    }

    fn map_label(&self) -> String {
        self.farmer_name.clone()
    }

    fn map_category(&self) -> Option<String> {
        Some(self.commodity_type.to_string())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_map_to_commodity_types() {
        assert_eq!(CommodityType::from_scope("pangan"), Some(CommodityType::Pangan));
        assert_eq!(CommodityType::from_scope("all"), None);
        for scope in &Domain::Agriculture.overview_scopes()[1..] {
            assert!(CommodityType::from_scope(scope).is_some(), "scope {scope}");
        }
    }
}
