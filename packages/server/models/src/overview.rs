//! Dashboard shapes: headline stats plus distributions carrying their
//! share of the total.

use serde::{Deserialize, Serialize};
use works_portal_database_models::{
    AgricultureOverviewRows, BasicStats, BuildingOverviewRows, GroupCount, GroupSum,
    RiceFieldOverviewRows, RoadOverviewRows, SpatialOverviewRows, WaterOverviewRows,
};

/// One bucket of a count distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiDistribution {
    pub key: String,
    pub count: i64,
    /// `count / total * 100`; `0` when the total is `0`.
    pub percentage: f64,
}

/// One bucket of a summed distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiShare {
    pub key: String,
    pub total: f64,
    pub percentage: f64,
}

fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { part / whole * 100.0 }
}

/// Attaches percentages relative to `total`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn distribution(rows: Vec<GroupCount>, total: i64) -> Vec<ApiDistribution> {
    rows.into_iter()
        .map(|row| ApiDistribution {
            percentage: percentage(row.count as f64, total as f64),
            key: row.key,
            count: row.count,
        })
        .collect()
}

/// Attaches percentages relative to `total`.
#[must_use]
pub fn shares(rows: Vec<GroupSum>, total: f64) -> Vec<ApiShare> {
    rows.into_iter()
        .map(|row| ApiShare {
            percentage: percentage(row.total, total),
            key: row.key,
            total: row.total,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiBuildingOverview {
    #[serde(flatten)]
    pub stats: BasicStats,
    pub by_building_type: Vec<ApiDistribution>,
    pub by_report_type: Vec<ApiDistribution>,
    pub by_funding_source: Vec<ApiDistribution>,
    pub by_work_type: Vec<ApiDistribution>,
    pub by_condition_after_rehab: Vec<ApiDistribution>,
    pub by_status: Vec<ApiDistribution>,
    pub by_district: Vec<ApiDistribution>,
    pub total_floor_area_m2: f64,
    pub avg_floor_area_m2: f64,
}

impl From<BuildingOverviewRows> for ApiBuildingOverview {
    fn from(rows: BuildingOverviewRows) -> Self {
        let total = rows.stats.total_reports;
        Self {
            by_building_type: distribution(rows.by_building_type, total),
            by_report_type: distribution(rows.by_report_type, total),
            by_funding_source: distribution(rows.by_funding_source, total),
            by_work_type: distribution(rows.by_work_type, total),
            by_condition_after_rehab: distribution(rows.by_condition_after_rehab, total),
            by_status: distribution(rows.by_status, total),
            by_district: distribution(rows.by_district, total),
            total_floor_area_m2: rows.total_floor_area_m2,
            avg_floor_area_m2: rows.avg_floor_area_m2,
            stats: rows.stats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSpatialOverview {
    #[serde(flatten)]
    pub stats: BasicStats,
    pub by_area_category: Vec<ApiDistribution>,
    pub by_violation_type: Vec<ApiDistribution>,
    pub by_violation_level: Vec<ApiDistribution>,
    pub by_environmental_impact: Vec<ApiDistribution>,
    pub by_urgency: Vec<ApiDistribution>,
    pub by_status: Vec<ApiDistribution>,
    pub by_district: Vec<ApiDistribution>,
    pub total_affected_area_m2: f64,
}

impl From<SpatialOverviewRows> for ApiSpatialOverview {
    fn from(rows: SpatialOverviewRows) -> Self {
        let total = rows.stats.total_reports;
        Self {
            by_area_category: distribution(rows.by_area_category, total),
            by_violation_type: distribution(rows.by_violation_type, total),
            by_violation_level: distribution(rows.by_violation_level, total),
            by_environmental_impact: distribution(rows.by_environmental_impact, total),
            by_urgency: distribution(rows.by_urgency, total),
            by_status: distribution(rows.by_status, total),
            by_district: distribution(rows.by_district, total),
            total_affected_area_m2: rows.total_affected_area_m2,
            stats: rows.stats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiWaterOverview {
    #[serde(flatten)]
    pub stats: BasicStats,
    pub by_irrigation_type: Vec<ApiDistribution>,
    pub by_damage_type: Vec<ApiDistribution>,
    pub by_damage_level: Vec<ApiDistribution>,
    pub by_urgency: Vec<ApiDistribution>,
    pub by_status: Vec<ApiDistribution>,
    pub by_district: Vec<ApiDistribution>,
    pub total_estimated_budget: f64,
    pub total_affected_rice_field_ha: f64,
    pub total_affected_farmers: f64,
}

impl From<WaterOverviewRows> for ApiWaterOverview {
    fn from(rows: WaterOverviewRows) -> Self {
        let total = rows.stats.total_reports;
        Self {
            by_irrigation_type: distribution(rows.by_irrigation_type, total),
            by_damage_type: distribution(rows.by_damage_type, total),
            by_damage_level: distribution(rows.by_damage_level, total),
            by_urgency: distribution(rows.by_urgency, total),
            by_status: distribution(rows.by_status, total),
            by_district: distribution(rows.by_district, total),
            total_estimated_budget: rows.total_estimated_budget,
            total_affected_rice_field_ha: rows.total_affected_rice_field_ha,
            total_affected_farmers: rows.total_affected_farmers,
            stats: rows.stats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRoadOverview {
    #[serde(flatten)]
    pub stats: BasicStats,
    pub by_road_type: Vec<ApiDistribution>,
    pub by_road_class: Vec<ApiDistribution>,
    pub by_pavement_type: Vec<ApiDistribution>,
    pub by_damage_type: Vec<ApiDistribution>,
    pub by_damage_level: Vec<ApiDistribution>,
    pub by_traffic_condition: Vec<ApiDistribution>,
    pub by_urgency_level: Vec<ApiDistribution>,
    pub by_status: Vec<ApiDistribution>,
    pub by_district: Vec<ApiDistribution>,
    pub total_damaged_area_m2: f64,
    pub total_estimated_budget: f64,
    pub avg_repair_days: f64,
}

impl From<RoadOverviewRows> for ApiRoadOverview {
    fn from(rows: RoadOverviewRows) -> Self {
        let total = rows.stats.total_reports;
        Self {
            by_road_type: distribution(rows.by_road_type, total),
            by_road_class: distribution(rows.by_road_class, total),
            by_pavement_type: distribution(rows.by_pavement_type, total),
            by_damage_type: distribution(rows.by_damage_type, total),
            by_damage_level: distribution(rows.by_damage_level, total),
            by_traffic_condition: distribution(rows.by_traffic_condition, total),
            by_urgency_level: distribution(rows.by_urgency_level, total),
            by_status: distribution(rows.by_status, total),
            by_district: distribution(rows.by_district, total),
            total_damaged_area_m2: rows.total_damaged_area_m2,
            total_estimated_budget: rows.total_estimated_budget,
            avg_repair_days: rows.avg_repair_days,
            stats: rows.stats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiAgricultureOverview {
    #[serde(flatten)]
    pub stats: BasicStats,
    pub by_commodity_type: Vec<ApiDistribution>,
    pub by_commodity: Vec<ApiDistribution>,
    pub by_growth_phase: Vec<ApiDistribution>,
    pub by_main_constraint: Vec<ApiDistribution>,
    /// Shares are relative to the reports with a pest attack.
    pub by_pest_type: Vec<ApiDistribution>,
    pub by_status: Vec<ApiDistribution>,
    pub by_district: Vec<ApiDistribution>,
    pub pest_attack_reports: i64,
    pub total_land_area_ha: f64,
    pub total_affected_area_ha: f64,
}

impl From<AgricultureOverviewRows> for ApiAgricultureOverview {
    fn from(rows: AgricultureOverviewRows) -> Self {
        let total = rows.stats.total_reports;
        Self {
            by_commodity_type: distribution(rows.by_commodity_type, total),
            by_commodity: distribution(rows.by_commodity, total),
            by_growth_phase: distribution(rows.by_growth_phase, total),
            by_main_constraint: distribution(rows.by_main_constraint, total),
            by_pest_type: distribution(rows.by_pest_type, rows.pest_attack_reports),
            by_status: distribution(rows.by_status, total),
            by_district: distribution(rows.by_district, total),
            pest_attack_reports: rows.pest_attack_reports,
            total_land_area_ha: rows.total_land_area_ha,
            total_affected_area_ha: rows.total_affected_area_ha,
            stats: rows.stats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRiceFieldOverview {
    #[serde(flatten)]
    pub stats: BasicStats,
    pub total_rainfed_ha: f64,
    pub total_irrigated_ha: f64,
    pub total_ha: f64,
    pub rainfed_by_district: Vec<ApiShare>,
    pub irrigated_by_district: Vec<ApiShare>,
    pub total_by_district: Vec<ApiShare>,
}

impl From<RiceFieldOverviewRows> for ApiRiceFieldOverview {
    fn from(rows: RiceFieldOverviewRows) -> Self {
        Self {
            rainfed_by_district: shares(rows.rainfed_by_district, rows.total_rainfed_ha),
            irrigated_by_district: shares(rows.irrigated_by_district, rows.total_irrigated_ha),
            total_by_district: shares(rows.total_by_district, rows.total_ha),
            total_rainfed_ha: rows.total_rainfed_ha,
            total_irrigated_ha: rows.total_irrigated_ha,
            total_ha: rows.total_ha,
            stats: rows.stats,
        }
    }
}
