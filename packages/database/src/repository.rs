//! Repository ports. The Postgres implementations live in this crate;
//! in-memory implementations are provided for tests by the service crate.

use async_trait::async_trait;
use works_portal_database_models::{
    BasicStats, Condition, GroupCount, GroupSum, ListQuery, MapQuery, Page,
};
use works_portal_report_models::executive::{IndicatorDomain, IndicatorRow};
use works_portal_report_models::user::User;
use works_portal_report_models::{Aggregate, MapPoint, Photo};

use crate::DbError;

/// CRUD and read-model queries over one domain aggregate.
#[async_trait]
pub trait ReportStore<A: Aggregate>: Send + Sync {
    /// Persists the aggregate together with all of its photos. Either every
    /// row is written or none is.
    async fn create(&self, record: &A) -> Result<(), DbError>;

    /// Loads the aggregate with its photos hydrated in attachment order.
    async fn find_by_id(&self, id: &str) -> Result<Option<A>, DbError>;

    /// One filtered page ordered by report time, newest first. Photos are
    /// not hydrated.
    async fn find_all(&self, query: &ListQuery) -> Result<Page<A>, DbError>;

    /// Up to `limit` rows matching every condition, newest first.
    async fn find_where(&self, conditions: &[Condition], limit: u32) -> Result<Vec<A>, DbError>;

    /// Overwrites the stored columns and appends `new_photos`. Returns
    /// `false` if the record does not exist.
    async fn update(&self, record: &A, new_photos: &[Photo]) -> Result<bool, DbError>;

    /// Deletes the record; photos cascade. Returns `false` if it did not
    /// exist.
    async fn delete(&self, id: &str) -> Result<bool, DbError>;

    /// Sets the status code and, when given, replaces the notes.
    async fn update_status(
        &self,
        id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> Result<bool, DbError>;

    /// One page ordered by urgency, then damage level, then report time.
    async fn find_by_priority(&self, query: &ListQuery) -> Result<Page<A>, DbError>;

    /// Points inside the optional bounding box and date range.
    async fn map_points(&self, query: &MapQuery) -> Result<Vec<MapPoint>, DbError>;
}

/// Aggregation primitives the overview catalog is built from.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn basic_stats(&self, scope: &[Condition]) -> Result<BasicStats, DbError>;

    /// Row counts per distinct non-null value of `column`, largest first.
    async fn group_count(
        &self,
        scope: &[Condition],
        column: &'static str,
    ) -> Result<Vec<GroupCount>, DbError>;

    /// Sum of `value_column` per distinct non-null `group_column`, largest
    /// first.
    async fn group_sum(
        &self,
        scope: &[Condition],
        group_column: &'static str,
        value_column: &'static str,
    ) -> Result<Vec<GroupSum>, DbError>;

    /// Sum of a numeric column; `0` when no rows match.
    async fn sum(&self, scope: &[Condition], column: &'static str) -> Result<f64, DbError>;

    /// Average of a numeric column; `0` when no rows match.
    async fn avg(&self, scope: &[Condition], column: &'static str) -> Result<f64, DbError>;

    /// Number of matching rows.
    async fn count(&self, scope: &[Condition]) -> Result<i64, DbError>;
}

/// Account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), DbError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DbError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
    async fn list(&self, query: &ListQuery) -> Result<Page<User>, DbError>;
    /// Returns `false` if the user does not exist.
    async fn update(&self, user: &User) -> Result<bool, DbError>;
    /// Returns `false` if the user does not exist.
    async fn delete(&self, id: &str) -> Result<bool, DbError>;
}

/// Read access to the executive indicator tables.
#[async_trait]
pub trait ExecutiveStore: Send + Sync {
    /// Every indicator row of `domain` for the given years.
    async fn indicators(
        &self,
        domain: IndicatorDomain,
        years: &[i32],
    ) -> Result<Vec<IndicatorRow>, DbError>;

    /// Every indicator row of `domain`, ordered by name then year.
    async fn series(&self, domain: IndicatorDomain) -> Result<Vec<IndicatorRow>, DbError>;
}

/// Connectivity probe used by the health endpoint.
#[async_trait]
pub trait Health: Send + Sync {
    async fn ping(&self) -> Result<(), DbError>;
}
