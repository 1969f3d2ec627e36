//! The per-domain overview catalog: which groupings and totals make up
//! each dashboard, and how an overview scope narrows the rows.
//!
//! The builders only talk to [`AnalyticsSource`], so the same catalog runs
//! against Postgres and against the in-memory test stores.

use works_portal_database_models::{
    AgricultureOverviewRows, BuildingOverviewRows, ColumnValue, Condition, RiceFieldOverviewRows,
    RoadOverviewRows, SpatialOverviewRows, WaterOverviewRows,
};
use works_portal_report_models::Domain;
use works_portal_report_models::agriculture::CommodityType;
use works_portal_report_models::building::BuildingReportType;
use works_portal_report_models::normalize::CatalogEnum as _;

use crate::DbError;
use crate::repository::AnalyticsSource;

/// Conditions selecting the rows of `scope`, or `None` when the domain does
/// not declare that scope.
#[must_use]
pub fn scope_conditions(domain: Domain, scope: &str) -> Option<Vec<Condition>> {
    if !domain.overview_scopes().contains(&scope) {
        return None;
    }

    let text = |column: &'static str, value: &str| {
        Condition::Eq(column, ColumnValue::Text(value.to_string()))
    };

    Some(match (domain, scope) {
        (Domain::Building, "rehabilitation") => {
            vec![text("report_type", BuildingReportType::Rehabilitasi.code())]
        }
        (Domain::Building, "new_construction") => {
            vec![text("report_type", BuildingReportType::PembangunanBaru.code())]
        }
        (Domain::Road, "road") => vec![Condition::IsNull("bridge_name")],
        (Domain::Road, "bridge") => vec![Condition::NotNull("bridge_name")],
        (Domain::Agriculture, scope) => CommodityType::from_scope(scope)
            .map(|c| vec![text("commodity_type", c.code())])
            .unwrap_or_default(),
        _ => vec![],
    })
}

/// # Errors
///
/// Returns [`DbError`] if any aggregation query fails.
pub async fn building_overview(
    src: &dyn AnalyticsSource,
    scope: &[Condition],
) -> Result<BuildingOverviewRows, DbError> {
    Ok(BuildingOverviewRows {
        stats: src.basic_stats(scope).await?,
        by_building_type: src.group_count(scope, "building_type").await?,
        by_report_type: src.group_count(scope, "report_type").await?,
        by_funding_source: src.group_count(scope, "funding_source").await?,
        by_work_type: src.group_count(scope, "work_type").await?,
        by_condition_after_rehab: src.group_count(scope, "condition_after_rehab").await?,
        by_status: src.group_count(scope, "status").await?,
        by_district: src.group_count(scope, "district").await?,
        total_floor_area_m2: src.sum(scope, "floor_area_m2").await?,
        avg_floor_area_m2: src.avg(scope, "floor_area_m2").await?,
    })
}

/// # Errors
///
/// Returns [`DbError`] if any aggregation query fails.
pub async fn spatial_overview(
    src: &dyn AnalyticsSource,
    scope: &[Condition],
) -> Result<SpatialOverviewRows, DbError> {
    Ok(SpatialOverviewRows {
        stats: src.basic_stats(scope).await?,
        by_area_category: src.group_count(scope, "area_category").await?,
        by_violation_type: src.group_count(scope, "violation_type").await?,
        by_violation_level: src.group_count(scope, "violation_level").await?,
        by_environmental_impact: src.group_count(scope, "environmental_impact").await?,
        by_urgency: src.group_count(scope, "urgency").await?,
        by_status: src.group_count(scope, "status").await?,
        by_district: src.group_count(scope, "district").await?,
        total_affected_area_m2: src.sum(scope, "affected_area_m2").await?,
    })
}

/// # Errors
///
/// Returns [`DbError`] if any aggregation query fails.
pub async fn water_overview(
    src: &dyn AnalyticsSource,
    scope: &[Condition],
) -> Result<WaterOverviewRows, DbError> {
    Ok(WaterOverviewRows {
        stats: src.basic_stats(scope).await?,
        by_irrigation_type: src.group_count(scope, "irrigation_type").await?,
        by_damage_type: src.group_count(scope, "damage_type").await?,
        by_damage_level: src.group_count(scope, "damage_level").await?,
        by_urgency: src.group_count(scope, "urgency").await?,
        by_status: src.group_count(scope, "status").await?,
        by_district: src.group_count(scope, "district").await?,
        total_estimated_budget: src.sum(scope, "estimated_budget").await?,
        total_affected_rice_field_ha: src.sum(scope, "affected_rice_field_ha").await?,
        total_affected_farmers: src.sum(scope, "affected_farmers").await?,
    })
}

/// # Errors
///
/// Returns [`DbError`] if any aggregation query fails.
pub async fn road_overview(
    src: &dyn AnalyticsSource,
    scope: &[Condition],
) -> Result<RoadOverviewRows, DbError> {
    Ok(RoadOverviewRows {
        stats: src.basic_stats(scope).await?,
        by_road_type: src.group_count(scope, "road_type").await?,
        by_road_class: src.group_count(scope, "road_class").await?,
        by_pavement_type: src.group_count(scope, "pavement_type").await?,
        by_damage_type: src.group_count(scope, "damage_type").await?,
        by_damage_level: src.group_count(scope, "damage_level").await?,
        by_traffic_condition: src.group_count(scope, "traffic_condition").await?,
        by_urgency_level: src.group_count(scope, "urgency_level").await?,
        by_status: src.group_count(scope, "status").await?,
        by_district: src.group_count(scope, "district").await?,
        total_damaged_area_m2: src.sum(scope, "total_damaged_area_m2").await?,
        total_estimated_budget: src.sum(scope, "estimated_budget").await?,
        avg_repair_days: src.avg(scope, "estimated_repair_days").await?,
    })
}

/// # Errors
///
/// Returns [`DbError`] if any aggregation query fails.
pub async fn agriculture_overview(
    src: &dyn AnalyticsSource,
    scope: &[Condition],
) -> Result<AgricultureOverviewRows, DbError> {
    let mut pest_scope = scope.to_vec();
    pest_scope.push(Condition::Eq("pest_attack", ColumnValue::Bool(true)));

    Ok(AgricultureOverviewRows {
        stats: src.basic_stats(scope).await?,
        by_commodity_type: src.group_count(scope, "commodity_type").await?,
        by_commodity: src.group_count(scope, "commodity").await?,
        by_growth_phase: src.group_count(scope, "growth_phase").await?,
        by_main_constraint: src.group_count(scope, "main_constraint").await?,
        by_pest_type: src.group_count(&pest_scope, "pest_type").await?,
        by_status: src.group_count(scope, "status").await?,
        by_district: src.group_count(scope, "district").await?,
        pest_attack_reports: src.count(&pest_scope).await?,
        total_land_area_ha: src.sum(scope, "land_area_ha").await?,
        total_affected_area_ha: src.sum(scope, "affected_area_ha").await?,
    })
}

/// # Errors
///
/// Returns [`DbError`] if any aggregation query fails.
pub async fn rice_field_overview(
    src: &dyn AnalyticsSource,
    scope: &[Condition],
) -> Result<RiceFieldOverviewRows, DbError> {
    Ok(RiceFieldOverviewRows {
        stats: src.basic_stats(scope).await?,
        total_rainfed_ha: src.sum(scope, "rainfed_ha").await?,
        total_irrigated_ha: src.sum(scope, "irrigated_ha").await?,
        total_ha: src.sum(scope, "total_ha").await?,
        rainfed_by_district: src.group_sum(scope, "district", "rainfed_ha").await?,
        irrigated_by_district: src.group_sum(scope, "district", "irrigated_ha").await?,
        total_by_district: src.group_sum(scope, "district", "total_ha").await?,
    })
}
