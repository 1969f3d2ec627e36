#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Repository query inputs and typed aggregation rows.
//!
//! Every aggregation query returns one of the row types below instead of a
//! loosely-typed attribute map, so callers never inspect values at runtime.

pub mod overview;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use works_portal_report_models::Aggregate;

pub use overview::*;

/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest accepted page size.
pub const MAX_LIMIT: u32 = 100;

/// Largest number of points returned by a single map query.
pub const MAX_MAP_POINTS: u32 = 5_000;

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Parses `west,south,east,north`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let parts = raw
            .split(',')
            .map(|p| p.trim().parse::<f64>().ok())
            .collect::<Option<Vec<_>>>()?;

        match parts.as_slice() {
            [west, south, east, north] if west <= east && south <= north => {
                Some(Self::new(*west, *south, *east, *north))
            }
            _ => None,
        }
    }

    /// Whether the point lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.south..=self.north).contains(&latitude)
            && (self.west..=self.east).contains(&longitude)
    }
}

/// A typed value compared against a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    /// Text column.
    Text(String),
    /// Boolean column.
    Bool(bool),
}

impl std::fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// A predicate over a report table. Lists of conditions are AND-combined.
///
/// Column names are always compile-time constants taken from the
/// aggregate's declared filters or from the overview catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `column = value`
    Eq(&'static str, ColumnValue),
    /// `column IN (values)`
    In(&'static str, Vec<String>),
    /// `column IS NULL`
    IsNull(&'static str),
    /// `column IS NOT NULL`
    NotNull(&'static str),
    /// `date column >= value`
    Since(DateTime<Utc>),
    /// `date column <= value`
    Until(DateTime<Utc>),
    /// Point inside the bounding box.
    Within(BoundingBox),
    /// Any of the nested conditions holds.
    Any(Vec<Self>),
}

impl Condition {
    /// Evaluates the condition against an in-memory aggregate.
    #[must_use]
    pub fn matches<A: Aggregate>(&self, record: &A) -> bool {
        match self {
            Self::Eq(column, value) => {
                record.filter_value(column).is_some_and(|v| v == value.to_string())
            }
            Self::In(column, values) => record
                .filter_value(column)
                .is_some_and(|v| values.iter().any(|candidate| *candidate == v)),
            Self::IsNull(column) => record.filter_value(column).is_none(),
            Self::NotNull(column) => record.filter_value(column).is_some(),
            Self::Since(at) => record.reported_at() >= *at,
            Self::Until(at) => record.reported_at() <= *at,
            Self::Within(bbox) => {
                let location = record.location();
                bbox.contains(location.latitude, location.longitude)
            }
            Self::Any(conditions) => conditions.iter().any(|c| c.matches(record)),
        }
    }
}

/// Pagination plus filter map for list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Raw filter values keyed by query parameter.
    pub filters: BTreeMap<String, String>,
    /// Inclusive lower bound on the report timestamp.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the report timestamp.
    pub end_date: Option<DateTime<Utc>>,
}

impl ListQuery {
    /// A query for the given page with no filters.
    #[must_use]
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
        .clamped()
    }

    /// Clamps `page` to `>= 1` and `limit` to `1..=100` (`0` becomes the
    /// default of 10).
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = if self.limit == 0 {
            DEFAULT_LIMIT
        } else {
            self.limit.min(MAX_LIMIT)
        };
        self
    }

    /// Row offset of the first item on this page.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page.saturating_sub(1) as u64) * self.limit as u64
    }

    /// Whether this is the unfiltered first page with the default size.
    #[must_use]
    pub fn is_default_page(&self) -> bool {
        self.page == 1
            && self.limit == DEFAULT_LIMIT
            && self.filters.values().all(|v| v.trim().is_empty())
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    /// Translates the declared filters of `A` into conditions. Unknown keys
    /// and empty values are ignored; values are normalized the same way the
    /// column is normalized on write.
    #[must_use]
    pub fn conditions<A: Aggregate>(&self) -> Vec<Condition> {
        let mut conditions = Vec::new();

        for field in A::FILTERS {
            let Some(raw) = self.filters.get(field.key) else {
                continue;
            };
            if raw.trim().is_empty() {
                continue;
            }

            let normalized = field.kind.normalize(raw);
            let value = match field.kind {
                works_portal_report_models::FilterKind::Flag => {
                    ColumnValue::Bool(normalized == "true")
                }
                _ => ColumnValue::Text(normalized),
            };
            conditions.push(Condition::Eq(field.column, value));
        }

        if let Some(start) = self.start_date {
            conditions.push(Condition::Since(start));
        }
        if let Some(end) = self.end_date {
            conditions.push(Condition::Until(end));
        }

        conditions
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Total matching rows across all pages.
    pub total: u64,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
}

impl<T> Page<T> {
    /// `ceil(total / per_page)`.
    #[must_use]
    pub const fn total_pages(&self) -> u64 {
        if self.per_page == 0 {
            0
        } else {
            self.total.div_ceil(self.per_page as u64)
        }
    }

    /// Maps the items, keeping the pagination metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Map-point query parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MapQuery {
    /// Optional bounding box.
    pub bbox: Option<BoundingBox>,
    /// Inclusive lower bound on the report timestamp.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the report timestamp.
    pub end_date: Option<DateTime<Utc>>,
    /// Cap on returned points.
    pub limit: u32,
}

impl MapQuery {
    /// Conditions selecting the requested points.
    #[must_use]
    pub fn conditions(&self) -> Vec<Condition> {
        let mut conditions = Vec::new();
        if let Some(bbox) = self.bbox {
            conditions.push(Condition::Within(bbox));
        }
        if let Some(start) = self.start_date {
            conditions.push(Condition::Since(start));
        }
        if let Some(end) = self.end_date {
            conditions.push(Condition::Until(end));
        }
        conditions
    }

    /// Effective point cap.
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        if self.limit == 0 {
            MAX_MAP_POINTS
        } else {
            self.limit.min(MAX_MAP_POINTS)
        }
    }
}

/// Row count for one group key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: String,
    pub count: i64,
}

/// Sum of a numeric column for one group key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSum {
    pub key: String,
    pub total: f64,
}

/// Headline counters shared by every domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicStats {
    pub total_reports: i64,
    pub reports_this_month: i64,
    pub reports_this_year: i64,
    /// Reports still in the initial status; `0` for domains without one.
    pub pending_reports: i64,
    pub distinct_districts: i64,
    pub last_reported_at: Option<DateTime<Utc>>,
}
