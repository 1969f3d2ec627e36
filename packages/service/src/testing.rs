//! In-memory ports for tests.
//!
//! The stores mirror the Postgres semantics the service relies on: list
//! ordering, priority ordering, group ordering (`count DESC, key ASC`) and
//! photo appends on update.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike as _, TimeZone as _, Utc};
use works_portal_database::{AnalyticsSource, DbError, ExecutiveStore, ReportStore, UserStore};
use works_portal_database_models::{
    BasicStats, Condition, GroupCount, GroupSum, ListQuery, MapQuery, Page,
};
use works_portal_report_models::executive::{IndicatorDomain, IndicatorRow};
use works_portal_report_models::user::{Role, User};
use works_portal_report_models::{MapPoint, Photo, Principal};

use crate::PhotoUpload;
use crate::notify::{Notifier, NotifyError, NotifyKind, ReportSummary};
use crate::policy::ReportPolicy;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn paginate<T>(rows: Vec<T>, query: &ListQuery) -> Page<T> {
    let total = rows.len() as u64;
    let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
    Page {
        items: rows
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .collect(),
        total,
        page: query.page,
        per_page: query.limit,
    }
}

/// A bearer identity whose username equals its id.
#[must_use]
pub fn principal(user_id: &str, role: Role) -> Principal {
    Principal {
        user_id: user_id.to_string(),
        username: user_id.to_string(),
        role,
    }
}

/// A tiny JPEG part.
#[must_use]
pub fn jpeg() -> PhotoUpload {
    PhotoUpload::new("photo.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
}

/// Report rows for one domain.
#[derive(Debug)]
pub struct MemoryReportStore<A> {
    rows: Mutex<Vec<A>>,
}

impl<A> Default for MemoryReportStore<A> {
    fn default() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }
}

impl<A: ReportPolicy> MemoryReportStore<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        lock(&self.rows).len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn matching(&self, conditions: &[Condition]) -> Vec<A> {
        let mut rows: Vec<A> = lock(&self.rows)
            .iter()
            .filter(|row| conditions.iter().all(|c| c.matches(*row)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.reported_at()
                .cmp(&a.reported_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        rows
    }

    fn metrics(&self, scope: &[Condition], column: &str) -> Vec<f64> {
        self.matching(scope)
            .iter()
            .filter_map(|row| row.metric(column))
            .collect()
    }
}

#[async_trait]
impl<A: ReportPolicy> ReportStore<A> for MemoryReportStore<A> {
    async fn create(&self, record: &A) -> Result<(), DbError> {
        lock(&self.rows).push(record.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<A>, DbError> {
        Ok(lock(&self.rows).iter().find(|row| row.id() == id).cloned())
    }

    async fn find_all(&self, query: &ListQuery) -> Result<Page<A>, DbError> {
        Ok(paginate(self.matching(&query.conditions::<A>()), query))
    }

    async fn find_where(&self, conditions: &[Condition], limit: u32) -> Result<Vec<A>, DbError> {
        let mut rows = self.matching(conditions);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn update(&self, record: &A, new_photos: &[Photo]) -> Result<bool, DbError> {
        let mut rows = lock(&self.rows);
        let Some(slot) = rows.iter_mut().find(|row| row.id() == record.id()) else {
            return Ok(false);
        };

        let mut photos = slot.photos().to_vec();
        photos.extend_from_slice(new_photos);
        let mut updated = record.clone();
        if let Some(target) = updated.photos_mut() {
            *target = photos;
        }
        *slot = updated;
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let mut rows = lock(&self.rows);
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        Ok(rows.len() < before)
    }

    async fn update_status(
        &self,
        id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> Result<bool, DbError> {
        let Ok(code) = A::parse_status(status) else {
            return Ok(false);
        };
        let mut rows = lock(&self.rows);
        let Some(row) = rows.iter_mut().find(|row| row.id() == id) else {
            return Ok(false);
        };
        row.set_status(code, notes);
        row.touch(Utc::now());
        Ok(true)
    }

    async fn find_by_priority(&self, query: &ListQuery) -> Result<Page<A>, DbError> {
        let mut rows = self.matching(&query.conditions::<A>());
        // Stable sort keeps newest-first within equal priority.
        rows.sort_by_key(|row| std::cmp::Reverse(row.priority()));
        Ok(paginate(rows, query))
    }

    async fn map_points(&self, query: &MapQuery) -> Result<Vec<MapPoint>, DbError> {
        let rows = self
            .find_where(&query.conditions(), query.effective_limit())
            .await?;
        Ok(rows.iter().map(A::map_point).collect())
    }
}

/// Groups ordered by value descending, then key ascending.
fn ranked<T: PartialOrd>(groups: BTreeMap<String, T>) -> Vec<(String, T)> {
    let mut rows: Vec<(String, T)> = groups.into_iter().collect();
    rows.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    rows
}

#[async_trait]
impl<A: ReportPolicy> AnalyticsSource for MemoryReportStore<A> {
    async fn basic_stats(&self, scope: &[Condition]) -> Result<BasicStats, DbError> {
        let rows = self.matching(scope);
        let now = Utc::now();
        let month_start = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(now);
        let year_start = Utc
            .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(now);

        let count = |pred: &dyn Fn(&A) -> bool| rows.iter().filter(|&r| pred(r)).count() as i64;
        let districts = rows
            .iter()
            .map(|r| r.location().district.as_str())
            .collect::<BTreeSet<_>>();

        Ok(BasicStats {
            total_reports: rows.len() as i64,
            reports_this_month: count(&|r| r.reported_at() >= month_start),
            reports_this_year: count(&|r| r.reported_at() >= year_start),
            pending_reports: count(&|r| r.status() == Some("PENDING")),
            distinct_districts: districts.len() as i64,
            last_reported_at: rows.iter().map(A::reported_at).max(),
        })
    }

    async fn group_count(
        &self,
        scope: &[Condition],
        column: &'static str,
    ) -> Result<Vec<GroupCount>, DbError> {
        let mut groups: BTreeMap<String, i64> = BTreeMap::new();
        for row in self.matching(scope) {
            if let Some(key) = row.filter_value(column) {
                *groups.entry(key).or_default() += 1;
            }
        }
        Ok(ranked(groups)
            .into_iter()
            .map(|(key, count)| GroupCount { key, count })
            .collect())
    }

    async fn group_sum(
        &self,
        scope: &[Condition],
        group_column: &'static str,
        value_column: &'static str,
    ) -> Result<Vec<GroupSum>, DbError> {
        let mut groups: BTreeMap<String, f64> = BTreeMap::new();
        for row in self.matching(scope) {
            if let Some(key) = row.filter_value(group_column) {
                *groups.entry(key).or_default() += row.metric(value_column).unwrap_or_default();
            }
        }
        Ok(ranked(groups)
            .into_iter()
            .map(|(key, total)| GroupSum { key, total })
            .collect())
    }

    async fn sum(&self, scope: &[Condition], column: &'static str) -> Result<f64, DbError> {
        Ok(self.metrics(scope, column).iter().sum())
    }

    async fn avg(&self, scope: &[Condition], column: &'static str) -> Result<f64, DbError> {
        let values = self.metrics(scope, column);
        if values.is_empty() {
            return Ok(0.0);
        }
        #[allow(clippy::cast_precision_loss)]
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    async fn count(&self, scope: &[Condition]) -> Result<i64, DbError> {
        Ok(self.matching(scope).len() as i64)
    }
}

/// Accounts keyed by id.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<BTreeMap<String, User>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        lock(&self.users).values().find(|u| pred(u)).cloned()
    }
}

/// Mirrors the `UNIQUE` constraints on `users.username` and `users.email`.
fn check_unique(users: &BTreeMap<String, User>, user: &User) -> Result<(), DbError> {
    let clash = users
        .values()
        .any(|u| u.id != user.id && (u.username == user.username || u.email == user.email));
    if clash {
        return Err(DbError::UniqueViolation {
            message: format!("duplicate key value for user {}", user.username),
        });
    }
    Ok(())
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: &User) -> Result<(), DbError> {
        let mut users = lock(&self.users);
        check_unique(&users, user)?;
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        Ok(lock(&self.users).get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        Ok(self.find(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        Ok(self.find(|u| u.email == email))
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<User>, DbError> {
        let mut users: Vec<User> = lock(&self.users).values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(paginate(users, query))
    }

    async fn update(&self, user: &User) -> Result<bool, DbError> {
        let mut users = lock(&self.users);
        if !users.contains_key(&user.id) {
            return Ok(false);
        }
        check_unique(&users, user)?;
        let Some(slot) = users.get_mut(&user.id) else {
            return Ok(false);
        };
        *slot = user.clone();
        Ok(true)
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        Ok(lock(&self.users).remove(id).is_some())
    }
}

/// Indicator rows per domain.
#[derive(Debug, Default)]
pub struct MemoryExecutiveStore {
    rows: Mutex<HashMap<IndicatorDomain, Vec<IndicatorRow>>>,
}

impl MemoryExecutiveStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, domain: IndicatorDomain, rows: Vec<IndicatorRow>) {
        lock(&self.rows).entry(domain).or_default().extend(rows);
    }

    fn sorted(&self, domain: IndicatorDomain) -> Vec<IndicatorRow> {
        let mut rows = lock(&self.rows).get(&domain).cloned().unwrap_or_default();
        rows.sort_by(|a, b| {
            a.indicator_name
                .cmp(&b.indicator_name)
                .then_with(|| a.year.cmp(&b.year))
        });
        rows
    }
}

#[async_trait]
impl ExecutiveStore for MemoryExecutiveStore {
    async fn indicators(
        &self,
        domain: IndicatorDomain,
        years: &[i32],
    ) -> Result<Vec<IndicatorRow>, DbError> {
        let mut rows = self.sorted(domain);
        rows.retain(|row| years.contains(&row.year));
        Ok(rows)
    }

    async fn series(&self, domain: IndicatorDomain) -> Result<Vec<IndicatorRow>, DbError> {
        Ok(self.sorted(domain))
    }
}

/// Records every delivered notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<(NotifyKind, ReportSummary)>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent delivery fail after recording it.
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Waits up to a second for `count` deliveries, then returns whatever
    /// arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<(NotifyKind, ReportSummary)> {
        for _ in 0..100 {
            if lock(&self.seen).len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        lock(&self.seen).clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, kind: NotifyKind, summary: &ReportSummary) -> Result<(), NotifyError> {
        lock(&self.seen).push((kind, summary.clone()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError("injected failure".into()));
        }
        Ok(())
    }
}
