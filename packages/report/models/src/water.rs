//! Irrigation and water-resources damage reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::CatalogEnum as _;
use crate::shared::{DamageLevel, Urgency};
use crate::{Aggregate, Domain, FilterField, FilterKind, Location, Photo, Priority};

/// Fixed mobilisation cost, in rupiah.
pub const BASE_COST: f64 = 1_000_000.0;

/// Cost per square metre of damaged structure, in rupiah.
pub const COST_PER_M2: f64 = 500_000.0;

/// Surcharge applied to urgent reports, in rupiah.
pub const URGENT_SURCHARGE: f64 = BASE_COST * 0.3;

catalog_enum! {
    /// Irrigation asset kind. Structural assets come before canals.
    pub enum IrrigationType as "irrigation_type" {
        /// Dam
        Bendungan = ["DAM"],
        /// Weir
        Bendung = ["WEIR"],
        /// Sluice gate
        PintuAir = ["SLUICE", "SLUICE_GATE", "GATE"],
        /// Small reservoir
        Embung = ["RESERVOIR", "POND"],
        /// Primary canal
        SaluranPrimer = ["PRIMARY_CANAL"],
        /// Secondary canal
        SaluranSekunder = ["SECONDARY_CANAL"],
        /// Tertiary canal
        SaluranTersier = ["TERTIARY_CANAL"],
        /// Anything else
        Lainnya = ["OTHER"],
    }
}

catalog_enum! {
    /// Observed damage kind.
    pub enum WaterDamageType as "damage_type" {
        /// Cracking
        Retak = ["CRACK"],
        /// Leakage
        Bocor = ["LEAK", "LEAKAGE"],
        /// Breach
        Jebol = ["BREACH", "COLLAPSE"],
        /// Sedimentation
        Sedimentasi = ["SEDIMENTATION", "SILTATION"],
        /// Bank landslide
        Longsor = ["LANDSLIDE"],
        /// Broken gate
        PintuRusak = ["BROKEN_GATE", "GATE_DAMAGE"],
        /// Anything else
        Lainnya = ["OTHER"],
    }
}

catalog_enum! {
    /// Lifecycle status of a water report.
    pub enum WaterStatus as "status" {
        /// Awaiting verification
        Pending,
        /// Verified by an officer
        Verified,
        /// Repair under way
        InRepair = ["IN_PROGRESS"],
        /// Repaired
        Repaired = ["COMPLETED"],
        /// Rejected
        Rejected,
    }
}

/// Irrigation asset multipliers; assets not listed use `1.0`.
pub const IRRIGATION_FACTORS: &[(IrrigationType, f64)] = &[
    (IrrigationType::Bendungan, 2.5),
    (IrrigationType::Bendung, 2.0),
    (IrrigationType::PintuAir, 1.8),
    (IrrigationType::Embung, 1.5),
    (IrrigationType::SaluranPrimer, 1.3),
    (IrrigationType::SaluranSekunder, 1.1),
];

/// Damage level multipliers.
pub const DAMAGE_LEVEL_FACTORS: &[(DamageLevel, f64)] = &[
    (DamageLevel::Ringan, 1.0),
    (DamageLevel::Sedang, 1.5),
    (DamageLevel::Berat, 2.5),
];

fn lookup<K: PartialEq + Copy>(table: &[(K, f64)], key: K) -> f64 {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(1.0, |(_, f)| *f)
}

/// Estimated repair budget for a damaged irrigation asset.
#[must_use]
pub fn estimate_budget(
    length_m: f64,
    width_m: f64,
    damage_level: DamageLevel,
    irrigation_type: IrrigationType,
    urgency: Urgency,
) -> f64 {
    let area = length_m.max(0.0) * width_m.max(0.0);
    let surcharge = if urgency == Urgency::Mendesak {
        URGENT_SURCHARGE
    } else {
        0.0
    };

    ((BASE_COST + area * COST_PER_M2)
        * lookup(DAMAGE_LEVEL_FACTORS, damage_level)
        * lookup(IRRIGATION_FACTORS, irrigation_type)
        + surcharge)
        .round()
}

/// A water-resources damage report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterReport {
    pub id: String,
    pub reporter_name: String,
    pub reporter_role: String,
    pub phone: String,
    pub reported_at: DateTime<Utc>,
    pub irrigation_area_name: String,
    pub irrigation_type: IrrigationType,
    pub damage_type: WaterDamageType,
    pub damage_level: DamageLevel,
    pub estimated_length_m: f64,
    pub estimated_width_m: f64,
    pub estimated_depth_m: Option<f64>,
    pub affected_rice_field_ha: f64,
    pub affected_farmers: i32,
    pub urgency: Urgency,
    pub estimated_budget: f64,
    #[serde(flatten)]
    pub location: Location,
    pub status: WaterStatus,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl WaterReport {
    /// Recomputes the budget from the current field values.
    #[must_use]
    pub fn derived_budget(&self) -> f64 {
        estimate_budget(
            self.estimated_length_m,
            self.estimated_width_m,
            self.damage_level,
            self.irrigation_type,
            self.urgency,
        )
    }

    /// Whether this report must trigger the urgent-notification hook.
    #[must_use]
    pub fn is_urgent(&self) -> bool {
        self.urgency == Urgency::Mendesak
    }

    /// Whether the report is still awaiting a repair.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(
            self.status,
            WaterStatus::Pending | WaterStatus::Verified | WaterStatus::InRepair
        )
    }
}

impl Aggregate for WaterReport {
    const DOMAIN: Domain = Domain::Water;

    const FILTERS: &'static [FilterField] = &[
        FilterField::new("district", "district", FilterKind::Title),
        FilterField::new("village", "village", FilterKind::Title),
        FilterField::new(
            "irrigation_area_name",
            "irrigation_area_name",
            FilterKind::Title,
        ),
        FilterField::new(
            "irrigation_type",
            "irrigation_type",
            FilterKind::catalog::<IrrigationType>(),
        ),
        FilterField::new(
            "damage_type",
            "damage_type",
            FilterKind::catalog::<WaterDamageType>(),
        ),
        FilterField::new("damage_level", "damage_level", FilterKind::catalog::<DamageLevel>()),
        FilterField::new("urgency", "urgency", FilterKind::catalog::<Urgency>()),
        FilterField::new("status", "status", FilterKind::catalog::<WaterStatus>()),
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
            damage_rank: self.damage_level.rank(),
        }
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "district" => Some(self.location.district.clone()),
            "village" => self.location.village.clone(),
            "irrigation_area_name" => Some(self.irrigation_area_name.clone()),
            "irrigation_type" => Some(self.irrigation_type.to_string()),
            "damage_type" => Some(self.damage_type.to_string()),
            "damage_level" => Some(self.damage_level.to_string()),
            "urgency" => Some(self.urgency.to_string()),
            "status" => Some(self.status.to_string()),
            _ => None,
        }
    }

    fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "estimated_budget" => Some(self.estimated_budget),
            "affected_rice_field_ha" => Some(self.affected_rice_field_ha),
            "affected_farmers" => Some(f64::from(self.affected_farmers)),
            _ => None,
        }
    }

    fn map_label(&self) -> String {
        self.irrigation_area_name.clone()
    }

    fn map_category(&self) -> Option<String> {
        Some(self.damage_type.to_string())
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
    fn structural_assets_cost_more_than_canals() {
        let dam = estimate_budget(
            4.0,
            2.0,
            DamageLevel::Sedang,
            IrrigationType::Bendungan,
            Urgency::Normal,
        );
        let canal = estimate_budget(
            4.0,
            2.0,
            DamageLevel::Sedang,
            IrrigationType::SaluranTersier,
            Urgency::Normal,
        );
        // (1e6 + 8 × 5e5) × 1.5 = 7.5e6
        assert!((canal - 7_500_000.0).abs() < 1.0);
        assert!((dam - 18_750_000.0).abs() < 1.0);
    }

    #[test]
    fn urgent_reports_carry_surcharge() {
        let budget = |urgency| {
            estimate_budget(1.0, 1.0, DamageLevel::Ringan, IrrigationType::Lainnya, urgency)
        };
        let normal = budget(Urgency::Normal);
        let urgent = budget(Urgency::Mendesak);
        assert!((urgent - normal - 300_000.0).abs() < 1.0);
    }

    #[test]
    fn english_aliases_resolve() {
        assert_eq!(IrrigationType::parse_normalized("sluice gate"), Ok(IrrigationType::PintuAir));
        assert_eq!(Urgency::parse_normalized("urgent"), Ok(Urgency::Mendesak));
    }
}
