//! Road and bridge damage reports (Bina Marga).
//!
//! Besides the aggregate, this module owns the multiplier tables used to
//! derive the estimated repair budget and repair time. The tables are
//! plain data keyed by the enums below; [`estimate`] is the single place
//! that combines them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::CatalogEnum as _;
use crate::shared::DamageLevel;
use crate::{Aggregate, Domain, FilterField, FilterKind, Location, Photo, Priority};

/// Base cost per square metre of damaged surface, in rupiah.
pub const BASE_COST_PER_M2: f64 = 2_000_000.0;

/// Repair days per square metre before multipliers.
pub const BASE_DAYS_PER_M2: f64 = 0.1;

/// Bounds applied to the derived repair time.
pub const REPAIR_DAYS_RANGE: (i32, i32) = (1, 365);

/// Extra repair days when a bridge is involved (doubled when severe).
pub const BRIDGE_EXTRA_DAYS: f64 = 14.0;

catalog_enum! {
    /// Administrative road status.
    pub enum RoadType as "road_type" {
        /// Village road
        JalanDesa = ["VILLAGE_ROAD", "DESA"],
        /// Regency road
        JalanKabupaten = ["REGENCY_ROAD", "KABUPATEN"],
        /// Provincial road
        JalanProvinsi = ["PROVINCIAL_ROAD", "PROVINSI"],
        /// National road
        JalanNasional = ["NATIONAL_ROAD", "NASIONAL"],
    }
}

catalog_enum! {
    /// Functional road class.
    pub enum RoadClass as "road_class" {
        /// Neighbourhood road
        Lingkungan = ["NEIGHBORHOOD", "ENVIRONMENTAL"],
        /// Local road
        Lokal = ["LOCAL"],
        /// Collector road
        Kolektor = ["COLLECTOR"],
        /// Arterial road
        Arteri = ["ARTERIAL"],
    }
}

catalog_enum! {
    /// Road surface type.
    pub enum PavementType as "pavement_type" {
        /// Unpaved earth
        Tanah = ["EARTH", "DIRT"],
        /// Gravel
        Kerikil = ["GRAVEL"],
        /// Flexible asphalt
        AspalFlexible = ["ASPHALT", "ASPAL", "FLEXIBLE"],
        /// Interlocking paving blocks
        Paving = ["PAVING_BLOCK"],
        /// Rigid concrete
        BetonRigid = ["CONCRETE_RIGID", "CONCRETE", "BETON", "RIGID"],
    }
}

catalog_enum! {
    /// Observed damage kind.
    pub enum RoadDamageType as "damage_type" {
        /// Other damage
        Lainnya = ["OTHER"],
        /// Linear cracking
        Retak = ["CRACK", "CRACKING"],
        /// Potholes
        Lubang = ["POTHOLE", "POTHOLES"],
        /// Alligator (fatigue) cracking
        RetakKulitBuaya = ["ALLIGATOR_CRACKING", "ALLIGATOR"],
        /// Drainage failure
        DrainaseRusak = ["DRAINAGE"],
        /// Ponding caused by drainage failure
        GenanganDrainase = ["DRAINAGE_PONDING", "PONDING"],
        /// Subsidence
        Amblas = ["SUBSIDENCE"],
        /// Landslide onto or under the carriageway
        Longsor = ["LANDSLIDE"],
        /// Bridge damage
        JembatanRusak = ["BRIDGE", "BRIDGE_DAMAGE"],
    }
}

catalog_enum! {
    /// Traffic condition at the damaged segment.
    pub enum TrafficCondition as "traffic_condition" {
        /// Flowing normally
        Lancar = ["SMOOTH", "NORMAL"],
        /// Disrupted
        Terganggu = ["DISRUPTED"],
        /// Congested
        Macet = ["CONGESTED", "JAMMED"],
        /// Closed to traffic
        Terputus = ["BLOCKED", "CLOSED"],
    }
}

catalog_enum! {
    /// Handling urgency.
    pub enum RoadUrgency as "urgency_level" {
        /// Scheduled maintenance
        Rutin = ["ROUTINE", "NORMAL"],
        /// High priority
        Tinggi = ["HIGH"],
        /// Emergency
        Darurat = ["EMERGENCY"],
    }
}

catalog_enum! {
    /// Lifecycle status of a road report.
    pub enum RoadStatus as "status" {
        /// Awaiting verification
        Pending,
        /// Verified by an officer
        Verified,
        /// Repair in progress
        InProgress,
        /// Repaired
        Completed,
        /// Rejected
        Rejected,
    }
}

/// A pair of multipliers: one for the budget formula, one for the repair
/// time formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factor {
    /// Budget multiplier.
    pub budget: f64,
    /// Repair-time multiplier.
    pub days: f64,
}

const fn factor(budget: f64, days: f64) -> Factor {
    Factor { budget, days }
}

const NEUTRAL: Factor = factor(1.0, 1.0);

/// Damage level multipliers.
pub const DAMAGE_LEVEL_FACTORS: &[(DamageLevel, Factor)] = &[
    (DamageLevel::Ringan, factor(1.0, 1.0)),
    (DamageLevel::Sedang, factor(1.5, 1.5)),
    (DamageLevel::Berat, factor(2.5, 2.5)),
];

/// Road class multipliers.
pub const ROAD_CLASS_FACTORS: &[(RoadClass, Factor)] = &[
    (RoadClass::Arteri, factor(2.0, 1.3)),
    (RoadClass::Kolektor, factor(1.5, 1.2)),
    (RoadClass::Lokal, factor(1.2, 1.0)),
];

/// Pavement multipliers.
pub const PAVEMENT_FACTORS: &[(PavementType, Factor)] = &[
    (PavementType::BetonRigid, factor(1.8, 1.5)),
    (PavementType::AspalFlexible, factor(1.0, 1.0)),
    (PavementType::Paving, factor(1.3, 1.2)),
    (PavementType::Tanah, factor(0.5, 0.8)),
];

/// Damage type multipliers.
pub const DAMAGE_TYPE_FACTORS: &[(RoadDamageType, Factor)] = &[
    (RoadDamageType::JembatanRusak, factor(3.0, 3.0)),
    (RoadDamageType::Amblas, factor(2.5, 2.0)),
    (RoadDamageType::Longsor, factor(2.5, 2.0)),
    (RoadDamageType::Lubang, factor(2.0, 1.5)),
    (RoadDamageType::RetakKulitBuaya, factor(1.8, 1.3)),
    (RoadDamageType::GenanganDrainase, factor(1.7, 1.4)),
    (RoadDamageType::DrainaseRusak, factor(1.5, 1.2)),
    (RoadDamageType::Retak, factor(1.2, 1.0)),
];

/// Urgency surcharge as a fraction of the base cost.
pub const URGENCY_SURCHARGE: &[(RoadUrgency, f64)] =
    &[(RoadUrgency::Darurat, 0.5), (RoadUrgency::Tinggi, 0.2)];

/// Bridge surcharge multiplier applied to the base cost, and the extra
/// multiplier when the bridge damage is severe.
pub const BRIDGE_SURCHARGE: (f64, f64) = (2.0, 3.0);

fn lookup<K: PartialEq + Copy>(table: &[(K, Factor)], key: K) -> Factor {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map_or(NEUTRAL, |(_, f)| *f)
}

/// Inputs to the road budget and repair-time formulas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimateInput {
    /// Damaged length in metres.
    pub damaged_length_m: f64,
    /// Damaged width in metres.
    pub damaged_width_m: f64,
    /// Caller-supplied total damaged area, if positive it wins.
    pub total_damaged_area_m2: f64,
    /// Damage level.
    pub damage_level: DamageLevel,
    /// Road class.
    pub road_class: RoadClass,
    /// Pavement type.
    pub pavement_type: PavementType,
    /// Damage type.
    pub damage_type: RoadDamageType,
    /// Whether a bridge is part of the damaged segment.
    pub bridge_present: bool,
    /// Whether the bridge damage is severe.
    pub bridge_severe: bool,
    /// Handling urgency.
    pub urgency: RoadUrgency,
}

impl EstimateInput {
    /// Area used by both formulas.
    #[must_use]
    pub fn area(&self) -> f64 {
        if self.total_damaged_area_m2 > 0.0 {
            self.total_damaged_area_m2
        } else {
            damaged_area(self.damaged_length_m, self.damaged_width_m)
        }
    }
}

/// Derived estimates for a road report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Estimated repair budget in rupiah.
    pub budget: f64,
    /// Estimated repair time in days.
    pub repair_days: i32,
}

/// `length × width` when both are positive, otherwise `0`.
#[must_use]
pub fn damaged_area(length_m: f64, width_m: f64) -> f64 {
    if length_m > 0.0 && width_m > 0.0 {
        length_m * width_m
    } else {
        0.0
    }
}

/// Computes the repair budget and repair time from the multiplier tables.
#[must_use]
pub fn estimate(input: &EstimateInput) -> Estimate {
    let area = input.area();
    let base = area * BASE_COST_PER_M2;

    let level = lookup(DAMAGE_LEVEL_FACTORS, input.damage_level);
    let class = lookup(ROAD_CLASS_FACTORS, input.road_class);
    let pavement = lookup(PAVEMENT_FACTORS, input.pavement_type);
    let kind = lookup(DAMAGE_TYPE_FACTORS, input.damage_type);

    let bridge_add = if input.bridge_present {
        let (multiplier, severe) = BRIDGE_SURCHARGE;
        base * multiplier * if input.bridge_severe { severe } else { 1.0 }
    } else {
        0.0
    };

    let urgency_add = URGENCY_SURCHARGE
        .iter()
        .find(|(u, _)| *u == input.urgency)
        .map_or(0.0, |(_, fraction)| base * fraction);

    let budget = base * level.budget * class.budget * pavement.budget * kind.budget
        + bridge_add
        + urgency_add;

    let bridge_days = if input.bridge_present {
        BRIDGE_EXTRA_DAYS * if input.bridge_severe { 2.0 } else { 1.0 }
    } else {
        0.0
    };

    let raw_days =
        area * BASE_DAYS_PER_M2 * level.days * kind.days * pavement.days * class.days + bridge_days;

    #[allow(clippy::cast_possible_truncation)]
    let repair_days = (raw_days.round() as i32).clamp(REPAIR_DAYS_RANGE.0, REPAIR_DAYS_RANGE.1);

    Estimate {
        budget: budget.round(),
        repair_days,
    }
}

/// A road or bridge damage report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadReport {
    /// Report id.
    pub id: String,
    /// Reporting officer, title-cased.
    pub reporter_name: String,
    /// Reporting institution unit, upper-snake-cased.
    pub institution_unit: String,
    /// Contact phone number.
    pub phone: String,
    /// When the damage was observed.
    pub reported_at: DateTime<Utc>,
    /// Road name, title-cased.
    pub road_name: String,
    /// Administrative road status.
    pub road_type: RoadType,
    /// Functional class.
    pub road_class: RoadClass,
    /// Surface type.
    pub pavement_type: PavementType,
    /// Damage kind.
    pub damage_type: RoadDamageType,
    /// Damage level.
    pub damage_level: DamageLevel,
    /// Damaged length in metres.
    pub damaged_length_m: f64,
    /// Damaged width in metres.
    pub damaged_width_m: f64,
    /// `length × width`.
    pub damaged_area_m2: f64,
    /// Total damaged area, defaults to `damaged_area_m2`.
    pub total_damaged_area_m2: f64,
    /// Bridge name when the segment includes a bridge.
    pub bridge_name: Option<String>,
    /// Bridge damage level.
    pub bridge_damage_level: Option<DamageLevel>,
    /// Traffic condition.
    pub traffic_condition: TrafficCondition,
    /// Handling urgency.
    pub urgency_level: RoadUrgency,
    /// Estimated repair budget in rupiah.
    pub estimated_budget: f64,
    /// Estimated repair time in days.
    pub estimated_repair_days: i32,
    /// Location.
    #[serde(flatten)]
    pub location: Location,
    /// Current status.
    pub status: RoadStatus,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creator `User.id`.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Photos in attachment order.
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl RoadReport {
    /// Formula inputs taken from the current field values.
    #[must_use]
    pub fn estimate_input(&self) -> EstimateInput {
        EstimateInput {
            damaged_length_m: self.damaged_length_m,
            damaged_width_m: self.damaged_width_m,
            total_damaged_area_m2: self.total_damaged_area_m2,
            damage_level: self.damage_level,
            road_class: self.road_class,
            pavement_type: self.pavement_type,
            damage_type: self.damage_type,
            bridge_present: self.bridge_name.is_some(),
            bridge_severe: self.bridge_damage_level == Some(DamageLevel::Berat),
            urgency: self.urgency_level,
        }
    }

    /// Whether this report must trigger the urgent-notification hook.
    #[must_use]
    pub fn is_emergency(&self) -> bool {
        self.urgency_level == RoadUrgency::Darurat
            || self.traffic_condition == TrafficCondition::Terputus
    }
}

impl Aggregate for RoadReport {
    const DOMAIN: Domain = Domain::Road;

    const FILTERS: &'static [FilterField] = &[
        FilterField::new("district", "district", FilterKind::Title),
        FilterField::new("village", "village", FilterKind::Title),
        FilterField::new("road_name", "road_name", FilterKind::Title),
        FilterField::new("road_type", "road_type", FilterKind::catalog::<RoadType>()),
        FilterField::new("road_class", "road_class", FilterKind::catalog::<RoadClass>()),
        FilterField::new("damage_type", "damage_type", FilterKind::catalog::<RoadDamageType>()),
        FilterField::new("damage_level", "damage_level", FilterKind::catalog::<DamageLevel>()),
        FilterField::new(
            "urgency_level",
            "urgency_level",
            FilterKind::catalog::<RoadUrgency>(),
        ),
        FilterField::new("status", "status", FilterKind::catalog::<RoadStatus>()),
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
            urgency_rank: self.urgency_level.rank(),
            damage_rank: self.damage_level.rank(),
        }
    }

    fn filter_value(&self, key: &str) -> Option<String> {
        match key {
            "district" => Some(self.location.district.clone()),
            "village" => self.location.village.clone(),
            "road_name" => Some(self.road_name.clone()),
            "road_type" => Some(self.road_type.to_string()),
            "road_class" => Some(self.road_class.to_string()),
            "damage_type" => Some(self.damage_type.to_string()),
            "damage_level" => Some(self.damage_level.to_string()),
            "urgency_level" => Some(self.urgency_level.to_string()),
            "status" => Some(self.status.to_string()),
            "pavement_type" => Some(self.pavement_type.to_string()),
            "traffic_condition" => Some(self.traffic_condition.to_string()),
            "bridge_name" => self.bridge_name.clone(),
            _ => None,
        }
    }

    fn metric(&self, key: &str) -> Option<f64> {
        match key {
            "total_damaged_area_m2" => Some(self.total_damaged_area_m2),
            "estimated_budget" => Some(self.estimated_budget),
            "estimated_repair_days" => Some(f64::from(self.estimated_repair_days)),
            _ => None,
        }
    }

    fn map_label(&self) -> String {
        self.road_name.clone()
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

    fn scenario_input() -> EstimateInput {
        EstimateInput {
            damaged_length_m: 10.0,
            damaged_width_m: 2.0,
            total_damaged_area_m2: 0.0,
            damage_level: DamageLevel::Sedang,
            road_class: RoadClass::Lokal,
            pavement_type: PavementType::AspalFlexible,
            damage_type: RoadDamageType::Lubang,
            bridge_present: false,
            bridge_severe: false,
            urgency: RoadUrgency::Rutin,
        }
    }

    #[test]
    fn estimates_pothole_on_local_asphalt_road() {
        let estimate = estimate(&scenario_input());
        assert!((estimate.budget - 144_000_000.0).abs() < 1.0);
        assert_eq!(estimate.repair_days, 5);
    }

    #[test]
    fn total_area_overrides_dimensions() {
        let input = EstimateInput {
            total_damaged_area_m2: 40.0,
            ..scenario_input()
        };
        assert!((input.area() - 40.0).abs() < f64::EPSILON);
        assert!((estimate(&input).budget - 288_000_000.0).abs() < 1.0);
    }

    #[test]
    fn zero_dimension_yields_zero_area() {
        assert!(damaged_area(10.0, 0.0).abs() < f64::EPSILON);
        assert!(damaged_area(-1.0, 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn repair_days_are_clamped() {
        let tiny = EstimateInput {
            damaged_length_m: 0.5,
            damaged_width_m: 0.5,
            ..scenario_input()
        };
        assert_eq!(estimate(&tiny).repair_days, 1);

        let huge = EstimateInput {
            damaged_length_m: 5_000.0,
            damaged_width_m: 10.0,
            damage_level: DamageLevel::Berat,
            ..scenario_input()
        };
        assert_eq!(estimate(&huge).repair_days, 365);
    }

    #[test]
    fn emergency_and_bridge_surcharges_add_to_budget() {
        let base = estimate(&scenario_input()).budget;
        let emergency = estimate(&EstimateInput {
            urgency: RoadUrgency::Darurat,
            ..scenario_input()
        });
        // 0.5 × area × base cost
        assert!((emergency.budget - base - 20_000_000.0).abs() < 1.0);

        let bridge = estimate(&EstimateInput {
            bridge_present: true,
            bridge_severe: true,
            ..scenario_input()
        });
        // area × base cost × 2.0 × 3.0
        assert!((bridge.budget - base - 240_000_000.0).abs() < 1.0);
        assert_eq!(bridge.repair_days, 5 + 28);
    }

    #[test]
    fn estimate_is_deterministic() {
        let input = scenario_input();
        assert_eq!(estimate(&input), estimate(&input));
    }
}
