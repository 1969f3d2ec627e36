//! Typed rows returned by the per-domain overview queries.

use serde::{Deserialize, Serialize};

use crate::{BasicStats, GroupCount, GroupSum};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingOverviewRows {
    pub stats: BasicStats,
    pub by_building_type: Vec<GroupCount>,
    pub by_report_type: Vec<GroupCount>,
    pub by_funding_source: Vec<GroupCount>,
    pub by_work_type: Vec<GroupCount>,
    pub by_condition_after_rehab: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
    pub by_district: Vec<GroupCount>,
    pub total_floor_area_m2: f64,
    pub avg_floor_area_m2: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialOverviewRows {
    pub stats: BasicStats,
    pub by_area_category: Vec<GroupCount>,
    pub by_violation_type: Vec<GroupCount>,
    pub by_violation_level: Vec<GroupCount>,
    pub by_environmental_impact: Vec<GroupCount>,
    pub by_urgency: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
    pub by_district: Vec<GroupCount>,
    pub total_affected_area_m2: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterOverviewRows {
    pub stats: BasicStats,
    pub by_irrigation_type: Vec<GroupCount>,
    pub by_damage_type: Vec<GroupCount>,
    pub by_damage_level: Vec<GroupCount>,
    pub by_urgency: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
    pub by_district: Vec<GroupCount>,
    pub total_estimated_budget: f64,
    pub total_affected_rice_field_ha: f64,
    pub total_affected_farmers: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadOverviewRows {
    pub stats: BasicStats,
    pub by_road_type: Vec<GroupCount>,
    pub by_road_class: Vec<GroupCount>,
    pub by_pavement_type: Vec<GroupCount>,
    pub by_damage_type: Vec<GroupCount>,
    pub by_damage_level: Vec<GroupCount>,
    pub by_traffic_condition: Vec<GroupCount>,
    pub by_urgency_level: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
    pub by_district: Vec<GroupCount>,
    pub total_damaged_area_m2: f64,
    pub total_estimated_budget: f64,
    pub avg_repair_days: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgricultureOverviewRows {
    pub stats: BasicStats,
    pub by_commodity_type: Vec<GroupCount>,
    pub by_commodity: Vec<GroupCount>,
    pub by_growth_phase: Vec<GroupCount>,
    pub by_main_constraint: Vec<GroupCount>,
    pub by_pest_type: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
    pub by_district: Vec<GroupCount>,
    pub pest_attack_reports: i64,
    pub total_land_area_ha: f64,
    pub total_affected_area_ha: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiceFieldOverviewRows {
    pub stats: BasicStats,
    pub total_rainfed_ha: f64,
    pub total_irrigated_ha: f64,
    pub total_ha: f64,
    pub rainfed_by_district: Vec<GroupSum>,
    pub irrigated_by_district: Vec<GroupSum>,
    pub total_by_district: Vec<GroupSum>,
}
