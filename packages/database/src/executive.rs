//! Postgres [`ExecutiveStore`] over the `*_indicators` tables.

use std::sync::Arc;

use async_trait::async_trait;
use switchy_database::{Database, DatabaseValue, Row};
use works_portal_report_models::executive::{IndicatorDomain, IndicatorRow};

use crate::DbError;
use crate::convert::{int, real, text};
use crate::repository::ExecutiveStore;
use crate::sql::QueryBuilder;

pub struct PgExecutiveStore {
    db: Arc<dyn Database>,
}

impl PgExecutiveStore {
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

fn indicator_from_row(row: &Row) -> Result<IndicatorRow, DbError> {
    Ok(IndicatorRow {
        year: int(row, "year")?,
        indicator_name: text(row, "indicator_name")?,
        value: real(row, "value")?,
    })
}

#[async_trait]
impl ExecutiveStore for PgExecutiveStore {
    async fn indicators(
        &self,
        domain: IndicatorDomain,
        years: &[i32],
    ) -> Result<Vec<IndicatorRow>, DbError> {
        if years.is_empty() {
            return Ok(vec![]);
        }

        let mut q = QueryBuilder::default();
        let placeholders = years
            .iter()
            .map(|y| q.bind(DatabaseValue::Int32(*y)))
            .collect::<Vec<_>>()
            .join(", ");
        q.sql = format!(
            "SELECT year, indicator_name, value::DOUBLE PRECISION AS value
             FROM {} WHERE year IN ({placeholders})
             ORDER BY indicator_name ASC, year ASC",
            domain.table()
        );

        let rows = self.db.query_raw_params(&q.sql, &q.params).await?;
        rows.iter().map(indicator_from_row).collect()
    }

    async fn series(&self, domain: IndicatorDomain) -> Result<Vec<IndicatorRow>, DbError> {
        let rows = self
            .db
            .query_raw_params(
                &format!(
                    "SELECT year, indicator_name, value::DOUBLE PRECISION AS value
                     FROM {} ORDER BY indicator_name ASC, year ASC",
                    domain.table()
                ),
                &[],
            )
            .await?;

        rows.iter().map(indicator_from_row).collect()
    }
}
