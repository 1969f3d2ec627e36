//! Generic Postgres implementation of [`ReportStore`] and
//! [`AnalyticsSource`] for any [`ReportRecord`].

use std::fmt::Write as _;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike as _, TimeZone as _, Utc};
use switchy_database::{Database, DatabaseValue, Row};
use works_portal_database_models::{
    BasicStats, Condition, GroupCount, GroupSum, ListQuery, MapQuery, Page,
};
use works_portal_report_models::{MapPoint, Photo};

use crate::DbError;
use crate::convert::{bigint, opt_timestamp, real, text, text_value, timestamp_value};
use crate::record::{Column, ReportRecord, photo_from_row};
use crate::repository::{AnalyticsSource, ReportStore};
use crate::sql::QueryBuilder;

/// Postgres-backed store for aggregate `R`.
pub struct PgReportStore<R> {
    db: Arc<dyn Database>,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for PgReportStore<R> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: ReportRecord> PgReportStore<R> {
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    fn all_columns(record: &R) -> Vec<Column> {
        let priority = record.priority();
        let mut columns = vec![("id", text_value(record.id()))];
        columns.extend(record.to_columns());
        columns.push(("urgency_rank", DatabaseValue::Int32(priority.urgency_rank)));
        columns.push(("damage_rank", DatabaseValue::Int32(priority.damage_rank)));
        columns
    }

    /// Appends a `photos AS (INSERT ... SELECT ... FROM <source>)` CTE that
    /// inserts `photos` for whatever id `source` yields.
    fn push_photo_cte(q: &mut QueryBuilder, photo_table: &str, source: &str, photos: &[Photo]) {
        let mut rows = Vec::with_capacity(photos.len());
        for photo in photos {
            let id = q.bind(text_value(&photo.id));
            let url = q.bind(text_value(&photo.url));
            let tag = q.bind(text_value(&photo.tag));
            let order = q.bind(DatabaseValue::Int32(photo.sort_order));
            let at = q.bind(timestamp_value(photo.created_at));
            rows.push(format!(
                "({id}::text, {url}::text, {tag}::text, {order}::integer, {at}::timestamp)"
            ));
        }

        write!(
            q.sql,
            ", photos AS (
                INSERT INTO {photo_table} (id, report_id, url, tag, sort_order, created_at)
                SELECT v.id, {source}.id, v.url, v.tag, v.sort_order, v.created_at
                FROM {source}, (VALUES {}) AS v(id, url, tag, sort_order, created_at)
                RETURNING 1
            )",
            rows.join(", ")
        )
        .unwrap();
    }

    async fn photos_of(&self, id: &str) -> Result<Vec<Photo>, DbError> {
        let Some(photo_table) = R::PHOTO_TABLE else {
            return Ok(vec![]);
        };

        let rows = self
            .db
            .query_raw_params(
                &format!(
                    "SELECT id, report_id, url, tag, sort_order, created_at
                     FROM {photo_table} WHERE report_id = $1
                     ORDER BY sort_order ASC, created_at ASC"
                ),
                &[text_value(id)],
            )
            .await?;

        rows.iter().map(photo_from_row).collect()
    }

    async fn page(
        &self,
        conditions: &[Condition],
        order_by: &str,
        query: &ListQuery,
    ) -> Result<Page<R>, DbError> {
        let total = self.count(conditions).await?;

        let mut q = QueryBuilder::new(format!("SELECT * FROM {} WHERE 1=1", R::TABLE));
        q.and_all(conditions, R::DATE_COLUMN);
        let limit = q.bind(DatabaseValue::Int64(i64::from(query.limit)));
        let offset = q.bind(DatabaseValue::Int64(
            i64::try_from(query.offset()).unwrap_or(i64::MAX),
        ));
        write!(q.sql, " ORDER BY {order_by} LIMIT {limit} OFFSET {offset}").unwrap();

        let rows = self.db.query_raw_params(&q.sql, &q.params).await?;
        let items = rows.iter().map(R::from_row).collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or(0),
            page: query.page,
            per_page: query.limit,
        })
    }

    async fn scalar_f64(
        &self,
        scope: &[Condition],
        expression: &str,
    ) -> Result<f64, DbError> {
        let mut q = QueryBuilder::new(format!(
            "SELECT COALESCE({expression}, 0)::DOUBLE PRECISION AS value FROM {} WHERE 1=1",
            R::TABLE
        ));
        q.and_all(scope, R::DATE_COLUMN);

        let rows = self.db.query_raw_params(&q.sql, &q.params).await?;
        rows.first().map_or(Ok(0.0), |row| real(row, "value"))
    }
}

fn newest_first(date_column: &str) -> String {
    format!("{date_column} DESC, id DESC")
}

#[async_trait]
impl<R: ReportRecord> ReportStore<R> for PgReportStore<R> {
    async fn create(&self, record: &R) -> Result<(), DbError> {
        let columns = Self::all_columns(record);
        let names = columns.iter().map(|(n, _)| *n).collect::<Vec<_>>().join(", ");

        let mut q = QueryBuilder::default();
        let placeholders = columns
            .into_iter()
            .map(|(_, value)| q.bind(value))
            .collect::<Vec<_>>()
            .join(", ");

        let photos = record.photos();
        match R::PHOTO_TABLE {
            Some(photo_table) if !photos.is_empty() => {
                // One statement, so the parent and its photos commit together.
                q.sql = format!(
                    "WITH report AS (
                        INSERT INTO {} ({names}) VALUES ({placeholders}) RETURNING id
                    )",
                    R::TABLE
                );
                Self::push_photo_cte(&mut q, photo_table, "report", photos);
                q.sql.push_str(" SELECT COUNT(*) AS inserted FROM report");
                self.db.query_raw_params(&q.sql, &q.params).await?;
            }
            _ => {
                q.sql = format!(
                    "INSERT INTO {} ({names}) VALUES ({placeholders})",
                    R::TABLE
                );
                self.db.exec_raw_params(&q.sql, &q.params).await?;
            }
        }

        log::debug!("Inserted {} {}", R::TABLE, record.id());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<R>, DbError> {
        let rows = self
            .db
            .query_raw_params(
                &format!("SELECT * FROM {} WHERE id = $1", R::TABLE),
                &[text_value(id)],
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let mut record = R::from_row(row)?;
        let photos = self.photos_of(id).await?;
        if let Some(slot) = record.photos_mut() {
            *slot = photos;
        }

        Ok(Some(record))
    }

    async fn find_all(&self, query: &ListQuery) -> Result<Page<R>, DbError> {
        let conditions = query.conditions::<R>();
        self.page(&conditions, &newest_first(R::DATE_COLUMN), query)
            .await
    }

    async fn find_where(&self, conditions: &[Condition], limit: u32) -> Result<Vec<R>, DbError> {
        let mut q = QueryBuilder::new(format!("SELECT * FROM {} WHERE 1=1", R::TABLE));
        q.and_all(conditions, R::DATE_COLUMN);
        let limit = q.bind(DatabaseValue::Int64(i64::from(limit)));
        write!(
            q.sql,
            " ORDER BY {} LIMIT {limit}",
            newest_first(R::DATE_COLUMN)
        )
        .unwrap();

        let rows = self.db.query_raw_params(&q.sql, &q.params).await?;
        rows.iter().map(R::from_row).collect()
    }

    async fn update(&self, record: &R, new_photos: &[Photo]) -> Result<bool, DbError> {
        let mut q = QueryBuilder::default();
        let id = q.bind(text_value(record.id()));
        let assignments = Self::all_columns(record)
            .into_iter()
            .filter(|(name, _)| *name != "id")
            .map(|(name, value)| format!("{name} = {}", q.bind(value)))
            .collect::<Vec<_>>()
            .join(", ");

        q.sql = format!(
            "WITH updated AS (
                UPDATE {} SET {assignments} WHERE id = {id} RETURNING id
            )",
            R::TABLE
        );
        if let Some(photo_table) = R::PHOTO_TABLE
            && !new_photos.is_empty()
        {
            Self::push_photo_cte(&mut q, photo_table, "updated", new_photos);
        }
        q.sql.push_str(" SELECT COUNT(*) AS updated FROM updated");

        let rows = self.db.query_raw_params(&q.sql, &q.params).await?;
        let updated = rows.first().map_or(Ok(0), |row| bigint(row, "updated"))?;

        Ok(updated > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let affected = self
            .db
            .exec_raw_params(
                &format!("DELETE FROM {} WHERE id = $1", R::TABLE),
                &[text_value(id)],
            )
            .await?;

        Ok(affected > 0)
    }

    async fn update_status(
        &self,
        id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> Result<bool, DbError> {
        if !R::HAS_STATUS {
            return Ok(false);
        }

        let affected = self
            .db
            .exec_raw_params(
                &format!(
                    "UPDATE {} SET status = $2, notes = COALESCE($3::text, notes), updated_at = $4
                     WHERE id = $1",
                    R::TABLE
                ),
                &[
                    text_value(id),
                    text_value(status),
                    notes.map_or(DatabaseValue::Null, text_value),
                    timestamp_value(Utc::now()),
                ],
            )
            .await?;

        Ok(affected > 0)
    }

    async fn find_by_priority(&self, query: &ListQuery) -> Result<Page<R>, DbError> {
        let conditions = query.conditions::<R>();
        let order = format!(
            "urgency_rank DESC, damage_rank DESC, {}",
            newest_first(R::DATE_COLUMN)
        );
        self.page(&conditions, &order, query).await
    }

    async fn map_points(&self, query: &MapQuery) -> Result<Vec<MapPoint>, DbError> {
        let records = self
            .find_where(&query.conditions(), query.effective_limit())
            .await?;
        Ok(records.iter().map(works_portal_report_models::Aggregate::map_point).collect())
    }
}

#[async_trait]
impl<R: ReportRecord> AnalyticsSource for PgReportStore<R> {
    async fn basic_stats(&self, scope: &[Condition]) -> Result<BasicStats, DbError> {
        let now = Utc::now();
        let month_start = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(now);
        let year_start = Utc
            .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(now);

        let date = R::DATE_COLUMN;
        let mut q = QueryBuilder::default();
        let month = q.bind(timestamp_value(month_start));
        let year = q.bind(timestamp_value(year_start));
        let pending = if R::HAS_STATUS {
            "COUNT(*) FILTER (WHERE status = 'PENDING')"
        } else {
            "0::BIGINT"
        };

        q.sql = format!(
            "SELECT COUNT(*) AS total_reports,
                    COUNT(*) FILTER (WHERE {date} >= {month}) AS reports_this_month,
                    COUNT(*) FILTER (WHERE {date} >= {year}) AS reports_this_year,
                    {pending} AS pending_reports,
                    COUNT(DISTINCT district) AS distinct_districts,
                    MAX({date})::timestamp AS last_reported_at
             FROM {} WHERE 1=1",
            R::TABLE
        );
        q.and_all(scope, R::DATE_COLUMN);

        let rows = self.db.query_raw_params(&q.sql, &q.params).await?;
        let Some(row) = rows.first() else {
            return Ok(BasicStats::default());
        };

        Ok(BasicStats {
            total_reports: bigint(row, "total_reports")?,
            reports_this_month: bigint(row, "reports_this_month")?,
            reports_this_year: bigint(row, "reports_this_year")?,
            pending_reports: bigint(row, "pending_reports")?,
            distinct_districts: bigint(row, "distinct_districts")?,
            last_reported_at: opt_timestamp(row, "last_reported_at")?,
        })
    }

    async fn group_count(
        &self,
        scope: &[Condition],
        column: &'static str,
    ) -> Result<Vec<GroupCount>, DbError> {
        let mut q = QueryBuilder::new(format!(
            "SELECT {column}::text AS key, COUNT(*) AS count
             FROM {} WHERE {column} IS NOT NULL",
            R::TABLE
        ));
        q.and_all(scope, R::DATE_COLUMN);
        write!(q.sql, " GROUP BY {column} ORDER BY count DESC, key ASC").unwrap();

        let rows = self.db.query_raw_params(&q.sql, &q.params).await?;
        rows.iter().map(group_count_from_row).collect()
    }

    async fn group_sum(
        &self,
        scope: &[Condition],
        group_column: &'static str,
        value_column: &'static str,
    ) -> Result<Vec<GroupSum>, DbError> {
        let mut q = QueryBuilder::new(format!(
            "SELECT {group_column}::text AS key,
                    COALESCE(SUM({value_column}), 0)::DOUBLE PRECISION AS total
             FROM {} WHERE {group_column} IS NOT NULL",
            R::TABLE
        ));
        q.and_all(scope, R::DATE_COLUMN);
        write!(q.sql, " GROUP BY {group_column} ORDER BY total DESC, key ASC").unwrap();

        let rows = self.db.query_raw_params(&q.sql, &q.params).await?;
        rows.iter()
            .map(|row| {
                Ok(GroupSum {
                    key: text(row, "key")?,
                    total: real(row, "total")?,
                })
            })
            .collect()
    }

    async fn sum(&self, scope: &[Condition], column: &'static str) -> Result<f64, DbError> {
        self.scalar_f64(scope, &format!("SUM({column})")).await
    }

    async fn avg(&self, scope: &[Condition], column: &'static str) -> Result<f64, DbError> {
        self.scalar_f64(scope, &format!("AVG({column})")).await
    }

    async fn count(&self, scope: &[Condition]) -> Result<i64, DbError> {
        let mut q =
            QueryBuilder::new(format!("SELECT COUNT(*) AS total FROM {} WHERE 1=1", R::TABLE));
        q.and_all(scope, R::DATE_COLUMN);

        let rows = self.db.query_raw_params(&q.sql, &q.params).await?;
        rows.first().map_or(Ok(0), |row| bigint(row, "total"))
    }
}

fn group_count_from_row(row: &Row) -> Result<GroupCount, DbError> {
    Ok(GroupCount {
        key: text(row, "key")?,
        count: bigint(row, "count")?,
    })
}
