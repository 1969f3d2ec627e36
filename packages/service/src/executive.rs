//! Executive indicator overviews. Not cached; the tables are small and
//! rarely read.

use std::collections::BTreeMap;
use std::sync::Arc;

use works_portal_database::ExecutiveStore;
use works_portal_report_models::Principal;
use works_portal_report_models::executive::{IndicatorDomain, change, indicator_key};
use works_portal_server_models::{ApiExecutiveOverview, ApiSeriesPoint};

use crate::ServiceError;

#[derive(Clone)]
pub struct ExecutiveService {
    store: Arc<dyn ExecutiveStore>,
}

impl ExecutiveService {
    #[must_use]
    pub fn new(store: Arc<dyn ExecutiveStore>) -> Self {
        Self { store }
    }

    /// Indicator values for `year` with their change against `year - 1`,
    /// plus the full series of every indicator. Without a year the latest
    /// year on record is used.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] without a principal
    /// * [`ServiceError::NotFound`] for an unknown topic
    /// * [`ServiceError::Repository`] if a lookup fails
    pub async fn overview(
        &self,
        principal: Option<&Principal>,
        topic: &str,
        year: Option<i32>,
    ) -> Result<ApiExecutiveOverview, ServiceError> {
        if principal.is_none() {
            return Err(ServiceError::Unauthorized("Authentication required".into()));
        }
        let domain = IndicatorDomain::from_topic(topic)
            .ok_or_else(|| ServiceError::NotFound(format!("Executive topic {topic}")))?;

        let history = self.store.series(domain).await?;
        let year = year
            .or_else(|| history.iter().map(|row| row.year).max())
            .unwrap_or_default();

        let years: Vec<i32> = [Some(year), year.checked_sub(1)].into_iter().flatten().collect();
        let rows = self.store.indicators(domain, &years).await?;
        let mut current = BTreeMap::new();
        let mut previous = BTreeMap::new();
        for row in rows {
            let key = indicator_key(&row.indicator_name);
            if row.year == year {
                current.insert(key, row.value);
            } else {
                previous.insert(key, row.value);
            }
        }

        let mut values = BTreeMap::new();
        for (key, value) in &current {
            values.insert(
                format!("perubahan_{key}"),
                change(*value, previous.get(key).copied()),
            );
            values.insert(key.clone(), Some(*value));
        }

        let mut series: BTreeMap<String, Vec<ApiSeriesPoint>> = BTreeMap::new();
        for row in history {
            series
                .entry(indicator_key(&row.indicator_name))
                .or_default()
                .push(ApiSeriesPoint {
                    year: row.year,
                    value: row.value,
                });
        }
        for points in series.values_mut() {
            points.sort_by_key(|p| p.year);
        }

        Ok(ApiExecutiveOverview {
            year,
            values,
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use works_portal_report_models::executive::IndicatorRow;
    use works_portal_report_models::user::Role;

    use super::*;
    use crate::testing::{MemoryExecutiveStore, principal};

    fn row(year: i32, name: &str, value: f64) -> IndicatorRow {
        IndicatorRow {
            year,
            indicator_name: name.into(),
            value,
        }
    }

    fn service() -> ExecutiveService {
        let store = MemoryExecutiveStore::new();
        store.insert(
            IndicatorDomain::Economy,
            vec![
                row(2022, "Laju Pertumbuhan Ekonomi", 4.0),
                row(2023, "Laju Pertumbuhan Ekonomi", 5.0),
                row(2023, "Inflasi", 0.0),
                row(2024, "Laju Pertumbuhan Ekonomi", 5.5),
                row(2024, "Inflasi", 2.5),
            ],
        );
        ExecutiveService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn computes_year_over_year_change() {
        let user = principal("user-a", Role::Operator);
        let overview = service().overview(Some(&user), "economy", Some(2023)).await.unwrap();

        assert_eq!(overview.values["laju_pertumbuhan_ekonomi"], Some(5.0));
        let delta = overview.values["perubahan_laju_pertumbuhan_ekonomi"].unwrap();
        assert!((delta - 25.0).abs() < 1e-9);
        assert_eq!(overview.values["perubahan_inflasi"], None);
        assert_eq!(overview.series["inflasi"].len(), 2);
    }

    #[tokio::test]
    async fn defaults_to_the_latest_year() {
        let user = principal("user-a", Role::Operator);
        let overview = service().overview(Some(&user), "economy", None).await.unwrap();
        assert_eq!(overview.year, 2024);
        // Previous value is zero, so the change is undefined.
        assert_eq!(overview.values["perubahan_inflasi"], None);
    }

    #[tokio::test]
    async fn earliest_representable_year_has_no_previous() {
        let user = principal("user-a", Role::Operator);
        let overview = service()
            .overview(Some(&user), "economy", Some(i32::MIN))
            .await
            .unwrap();
        assert_eq!(overview.year, i32::MIN);
        assert!(overview.values.is_empty());
    }

    #[tokio::test]
    async fn rejects_unknown_topics_and_anonymous_callers() {
        let user = principal("user-a", Role::Operator);
        assert!(matches!(
            service().overview(Some(&user), "weather", None).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            service().overview(None, "economy", None).await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
    }
}
