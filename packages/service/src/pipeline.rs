//! The report lifecycle shared by every domain.
//!
//! `bind → derive → validate → upload photos → persist → invalidate →
//! notify` runs the same way for all six domains; the differences live in
//! each aggregate's [`ReportPolicy`].

use std::sync::Arc;

use chrono::Utc;
use ulid::Ulid;
use works_portal_cache::{
    Cache, CacheKey, DETAIL_TTL, SUMMARY_TTL, get_json, invalidate, set_json,
};
use works_portal_database::overview::scope_conditions;
use works_portal_database::{AnalyticsSource, ReportStore};
use works_portal_database_models::{BasicStats, ListQuery, MapQuery, Page};
use works_portal_report_models::{MapPoint, Photo, Principal};
use works_portal_storage::ObjectStore;

use crate::form::Form;
use crate::notify::{self, Notifier, ReportSummary};
use crate::photo::{PhotoUpload, check_photos};
use crate::policy::{Origin, ReportPolicy};
use crate::{ServiceError, ValidationErrors};

/// Largest number of rows served by a dashboard list.
const DASHBOARD_LIMIT: u32 = 100;

/// Use cases for one report domain.
pub struct ReportService<A: ReportPolicy> {
    store: Arc<dyn ReportStore<A>>,
    analytics: Arc<dyn AnalyticsSource>,
    cache: Arc<dyn Cache>,
    objects: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
}

impl<A: ReportPolicy> Clone for ReportService<A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            analytics: self.analytics.clone(),
            cache: self.cache.clone(),
            objects: self.objects.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

fn require(principal: Option<&Principal>) -> Result<&Principal, ServiceError> {
    principal.ok_or_else(|| ServiceError::Unauthorized("Authentication required".into()))
}

impl<A: ReportPolicy> ReportService<A> {
    #[must_use]
    pub fn new(
        store: Arc<dyn ReportStore<A>>,
        analytics: Arc<dyn AnalyticsSource>,
        cache: Arc<dyn Cache>,
        objects: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            analytics,
            cache,
            objects,
            notifier,
        }
    }

    /// Creates a report from a submitted form and its photos.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] without a principal
    /// * [`ServiceError::Validation`] listing every failed field rule
    /// * [`ServiceError::Storage`] if a photo upload fails
    /// * [`ServiceError::Repository`] if the insert fails
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        form: &Form,
        photos: Vec<PhotoUpload>,
    ) -> Result<A, ServiceError> {
        let principal = require(principal)?;
        let now = Utc::now();

        let mut reader = form.reader();
        let mut record = A::build(
            &mut reader,
            Origin {
                id: Ulid::new().to_string(),
                created_by: principal.user_id.clone(),
                now,
            },
        );
        record.derive(form, true);
        record.check(reader.errors_mut());
        check_photos(reader.errors_mut(), &photos, record.min_photos());
        reader.finish()?;

        let uploaded = self.publish(record.id(), 0, photos).await?;
        if let Some(slot) = record.photos_mut() {
            slot.extend(uploaded);
        }

        if let Err(e) = self.store.create(&record).await {
            self.discard(record.photos()).await;
            return Err(e.into());
        }

        invalidate(
            self.cache.as_ref(),
            &CacheKey::invalidations(A::DOMAIN, Some(record.id())),
        )
        .await;

        if let Some(kind) = record.notification() {
            notify::dispatch(
                self.notifier.clone(),
                kind,
                ReportSummary {
                    domain: A::DOMAIN,
                    id: record.id().to_string(),
                    title: record.map_label(),
                    district: record.location().district.clone(),
                    reported_at: record.reported_at(),
                },
            );
        }

        log::info!(
            "Created {} report {} with {} photo(s)",
            A::DOMAIN,
            record.id(),
            record.photos().len()
        );
        Ok(record)
    }

    /// Uploads `photos` for report `report_id`, numbering them from
    /// `offset`.
    async fn publish(
        &self,
        report_id: &str,
        offset: usize,
        photos: Vec<PhotoUpload>,
    ) -> Result<Vec<Photo>, ServiceError> {
        let folder = A::DOMAIN.folder();
        let mut published = Vec::with_capacity(photos.len());

        for (i, photo) in photos.into_iter().enumerate() {
            let index = offset + i;
            let url = match self
                .objects
                .upload(photo.body, &photo.content_type, folder)
                .await
            {
                Ok(url) => url,
                Err(e) => {
                    self.discard(&published).await;
                    return Err(e.into());
                }
            };
            published.push(Photo {
                id: Ulid::new().to_string(),
                report_id: report_id.to_string(),
                url,
                tag: A::DOMAIN.photo_tag(index).to_string(),
                sort_order: i32::try_from(index).unwrap_or(i32::MAX),
                created_at: Utc::now(),
            });
        }

        Ok(published)
    }

    /// Best-effort removal of stored objects. Failures leave the object
    /// behind and are only logged.
    async fn discard(&self, photos: &[Photo]) {
        for photo in photos {
            if let Err(e) = self.objects.delete(&photo.url).await {
                let object = e.object_path().unwrap_or_else(|| photo.url.clone());
                log::warn!("Leaked object {object} of {} report: {e}", A::DOMAIN);
            }
        }
    }

    /// Loads one report with its photos.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::NotFound`] if no report has this id
    /// * [`ServiceError::Repository`] if the lookup fails
    pub async fn get(&self, id: &str) -> Result<A, ServiceError> {
        let key = CacheKey::Detail(A::DOMAIN, id.to_string());
        if let Some(record) = get_json::<A>(self.cache.as_ref(), &key).await {
            return Ok(record);
        }

        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} report {id}", A::DOMAIN)))?;

        set_json(self.cache.as_ref(), &key, &record, DETAIL_TTL).await;
        Ok(record)
    }

    /// One filtered page, newest first. Only the unfiltered first page is
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Repository`] if the query fails.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<A>, ServiceError> {
        if !query.is_default_page() {
            return Ok(self.store.find_all(query).await?);
        }

        let key = CacheKey::List(A::DOMAIN);
        if let Some(page) = get_json::<Page<A>>(self.cache.as_ref(), &key).await {
            return Ok(page);
        }
        let page = self.store.find_all(query).await?;
        set_json(self.cache.as_ref(), &key, &page, SUMMARY_TTL).await;
        Ok(page)
    }

    /// One page ordered by urgency, damage level, then report time.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Repository`] if the query fails.
    pub async fn priority(&self, query: &ListQuery) -> Result<Page<A>, ServiceError> {
        Ok(self.store.find_by_priority(query).await?)
    }

    /// Applies every field the form carries and appends `photos`.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] without a principal
    /// * [`ServiceError::NotFound`] if no report has this id
    /// * [`ServiceError::Forbidden`] if the principal neither owns the
    ///   report nor is a superadmin
    /// * [`ServiceError::Validation`] listing every failed field rule
    /// * [`ServiceError::Storage`] or [`ServiceError::Repository`] on I/O
    ///   failure
    pub async fn update(
        &self,
        principal: Option<&Principal>,
        id: &str,
        form: &Form,
        photos: Vec<PhotoUpload>,
    ) -> Result<A, ServiceError> {
        let principal = require(principal)?;
        let mut record = self.owned(principal, id).await?;

        let mut reader = form.reader();
        record.apply(&mut reader);
        record.derive(form, false);
        record.check(reader.errors_mut());
        check_photos(reader.errors_mut(), &photos, 0);
        if !photos.is_empty() && record.photos_mut().is_none() {
            reader.errors_mut().push("photos", "unsupported");
        }
        reader.finish()?;
        record.touch(Utc::now());

        let added = self
            .publish(record.id(), record.photos().len(), photos)
            .await?;

        match self.store.update(&record, &added).await {
            Ok(true) => {}
            Ok(false) => {
                self.discard(&added).await;
                return Err(ServiceError::NotFound(format!(
                    "{} report {id}",
                    A::DOMAIN
                )));
            }
            Err(e) => {
                self.discard(&added).await;
                return Err(e.into());
            }
        }
        if let Some(slot) = record.photos_mut() {
            slot.extend(added);
        }

        invalidate(
            self.cache.as_ref(),
            &CacheKey::invalidations(A::DOMAIN, Some(id)),
        )
        .await;
        log::info!("Updated {} report {id}", A::DOMAIN);
        Ok(record)
    }

    /// Deletes a report, then its stored photos.
    ///
    /// Photo deletion happens after the row is gone; a failing delete
    /// leaks the object and is logged with its bucket and key.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] without a principal
    /// * [`ServiceError::NotFound`] if no report has this id
    /// * [`ServiceError::Forbidden`] if the principal may not modify it
    /// * [`ServiceError::Repository`] if the delete fails
    pub async fn delete(
        &self,
        principal: Option<&Principal>,
        id: &str,
    ) -> Result<(), ServiceError> {
        let principal = require(principal)?;
        let record = self.owned(principal, id).await?;

        if !self.store.delete(id).await? {
            return Err(ServiceError::NotFound(format!(
                "{} report {id}",
                A::DOMAIN
            )));
        }

        self.discard(record.photos()).await;
        invalidate(
            self.cache.as_ref(),
            &CacheKey::invalidations(A::DOMAIN, Some(id)),
        )
        .await;
        log::info!("Deleted {} report {id}", A::DOMAIN);
        Ok(())
    }

    /// Loads a record the principal is allowed to modify.
    async fn owned(&self, principal: &Principal, id: &str) -> Result<A, ServiceError> {
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} report {id}", A::DOMAIN)))?;

        if !principal.can_modify(record.created_by()) {
            return Err(ServiceError::Forbidden(format!(
                "{} may not modify {} report {id}",
                principal.username,
                A::DOMAIN
            )));
        }
        Ok(record)
    }

    /// Moves a report to a new status.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] without a principal
    /// * [`ServiceError::Validation`] for an unknown status or a domain
    ///   without statuses
    /// * [`ServiceError::NotFound`] if no report has this id
    /// * [`ServiceError::Repository`] if the update fails
    pub async fn update_status(
        &self,
        principal: Option<&Principal>,
        id: &str,
        status: &str,
        notes: Option<&str>,
    ) -> Result<A, ServiceError> {
        let principal = require(principal)?;
        let code = A::parse_status(status)?;
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());

        if !self.store.update_status(id, code, notes).await? {
            return Err(ServiceError::NotFound(format!(
                "{} report {id}",
                A::DOMAIN
            )));
        }

        invalidate(
            self.cache.as_ref(),
            &CacheKey::invalidations(A::DOMAIN, Some(id)),
        )
        .await;
        log::info!(
            "{} set {} report {id} to {code}",
            principal.username,
            A::DOMAIN
        );

        let mut record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("{} report {id}", A::DOMAIN)))?;
        record.set_status(code, notes);
        Ok(record)
    }

    /// Headline counters, cached for five minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Repository`] if the aggregation fails.
    pub async fn statistics(&self) -> Result<BasicStats, ServiceError> {
        let key = CacheKey::Stats(A::DOMAIN);
        if let Some(stats) = get_json(self.cache.as_ref(), &key).await {
            return Ok(stats);
        }
        let stats = self.analytics.basic_stats(&[]).await?;
        set_json(self.cache.as_ref(), &key, &stats, SUMMARY_TTL).await;
        Ok(stats)
    }

    /// Points for the map view.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Repository`] if the query fails.
    pub async fn map_points(&self, query: &MapQuery) -> Result<Vec<MapPoint>, ServiceError> {
        Ok(self.store.map_points(query).await?)
    }

    /// Runs the domain's overview catalog for `scope`, cached for five
    /// minutes.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Validation`] if `scope` is not one of the
    ///   domain's overview scopes
    /// * [`ServiceError::Repository`] if an aggregation fails
    pub async fn overview(&self, scope: &str) -> Result<A::Overview, ServiceError> {
        let scope = scope.trim().to_ascii_lowercase();
        let scope = if scope.is_empty() { "all" } else { scope.as_str() };

        let Some(scope) = A::DOMAIN
            .overview_scopes()
            .iter()
            .copied()
            .find(|s| *s == scope)
        else {
            let mut errors = ValidationErrors::new();
            errors.push(
                "scope",
                format!("oneof={}", A::DOMAIN.overview_scopes().join(" ")),
            );
            return Err(ServiceError::Validation(errors));
        };
        let conditions = scope_conditions(A::DOMAIN, scope)
            .ok_or_else(|| ServiceError::invalid("scope", "oneof"))?;

        let key = CacheKey::Overview(A::DOMAIN, scope);
        if let Some(overview) = get_json::<A::Overview>(self.cache.as_ref(), &key).await {
            return Ok(overview);
        }

        let overview = A::overview(self.analytics.as_ref(), &conditions).await?;
        set_json(self.cache.as_ref(), &key, &overview, SUMMARY_TTL).await;
        Ok(overview)
    }

    /// The domain's extra dashboard list, if it has one.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::NotFound`] for domains without a dashboard list
    /// * [`ServiceError::Repository`] if the query fails
    pub async fn dashboard(&self) -> Result<Vec<A>, ServiceError> {
        let (key, conditions) = A::dashboard()
            .ok_or_else(|| ServiceError::NotFound(format!("{} dashboard", A::DOMAIN)))?;

        if let Some(rows) = get_json::<Vec<A>>(self.cache.as_ref(), &key).await {
            return Ok(rows);
        }
        let rows = self.store.find_where(&conditions, DASHBOARD_LIMIT).await?;
        set_json(self.cache.as_ref(), &key, &rows, SUMMARY_TTL).await;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use works_portal_cache::MemoryCache;
    use works_portal_report_models::road::RoadReport;
    use works_portal_report_models::rice_field::RiceField;
    use works_portal_report_models::user::Role;
    use works_portal_report_models::water::WaterReport;
    use works_portal_storage::MemoryObjectStore;

    use super::*;
    use crate::notify::NotifyKind;
    use crate::testing::{MemoryReportStore, RecordingNotifier, jpeg, principal};

    struct Harness<A: ReportPolicy> {
        service: ReportService<A>,
        store: Arc<MemoryReportStore<A>>,
        cache: Arc<MemoryCache>,
        objects: Arc<MemoryObjectStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness<A: ReportPolicy>() -> Harness<A> {
        let store = Arc::new(MemoryReportStore::<A>::new());
        let cache = Arc::new(MemoryCache::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let service = ReportService::new(
            store.clone(),
            store.clone(),
            cache.clone(),
            objects.clone(),
            notifier.clone(),
        );
        Harness {
            service,
            store,
            cache,
            objects,
            notifier,
        }
    }

    fn road_form() -> Form {
        Form::new()
            .with("reporterName", "budi")
            .with("institutionUnit", "upt jalan")
            .with("phoneNumber", "08123456789")
            .with("reportDateTime", "2024-05-01T08:00:00Z")
            .with("district", "cibinong")
            .with("latitude", "-6.2")
            .with("longitude", "106.8")
            .with("roadName", "jl. mayor oking")
            .with("roadType", "kabupaten")
            .with("roadClass", "lokal")
            .with("pavementType", "asphalt")
            .with("damageType", "pothole")
            .with("damageLevel", "moderate")
            .with("damagedLength", "10")
            .with("damagedWidth", "2")
            .with("trafficImpact", "smooth")
            .with("urgencyLevel", "routine")
    }

    fn water_form() -> Form {
        Form::new()
            .with("reporterName", "sari")
            .with("reporterRole", "mantri air")
            .with("phone", "0812 3456 789")
            .with("reportDate", "2024-05-01")
            .with("district", "ciawi")
            .with("latitude", "-6.6")
            .with("longitude", "106.9")
            .with("irrigationAreaName", "di ciawi")
            .with("irrigationType", "weir")
            .with("damageType", "breach")
            .with("damageLevel", "severe")
            .with("estimatedLength", "3")
            .with("estimatedWidth", "1")
            .with("urgencyCategory", "urgent")
    }

    #[tokio::test]
    async fn create_requires_a_principal() {
        let h = harness::<RoadReport>();
        let err = h
            .service
            .create(None, &road_form(), vec![jpeg(), jpeg()])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
        assert!(h.objects.is_empty().await);
    }

    #[tokio::test]
    async fn create_publishes_tagged_photos_and_invalidates() {
        let h = harness::<RoadReport>();
        let user = principal("user-a", Role::Operator);
        let stale = CacheKey::List(works_portal_report_models::Domain::Road);
        set_json(h.cache.as_ref(), &stale, &1, SUMMARY_TTL).await;

        let report = h
            .service
            .create(Some(&user), &road_form(), vec![jpeg(), jpeg(), jpeg()])
            .await
            .unwrap();

        assert_eq!(report.created_by, "user-a");
        let tags = report.photos.iter().map(|p| p.tag.as_str()).collect::<Vec<_>>();
        assert_eq!(tags, ["overview", "damage_detail", "measurement"]);
        for photo in &report.photos {
            assert!(photo.url.contains("/bina-marga/"));
            assert!(h.objects.contains(&photo.url).await);
        }
        assert_eq!(h.store.len().await, 1);
        assert!(!h.cache.exists(&stale.to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn invalid_form_uploads_nothing() {
        let h = harness::<RoadReport>();
        let user = principal("user-a", Role::Operator);
        let form = road_form().with("latitude", "95").with("damageLevel", "apocalyptic");

        let Err(ServiceError::Validation(errors)) =
            h.service.create(Some(&user), &form, vec![jpeg()]).await
        else {
            panic!("expected validation failure");
        };
        assert!(errors.entries().contains(&"damage_level: oneof".to_string()));
        assert!(errors.entries().contains(&"latitude: range".to_string()));
        assert!(errors.entries().contains(&"photos: min=2".to_string()));
        assert!(h.objects.is_empty().await);
        assert_eq!(h.store.len().await, 0);
    }

    #[tokio::test]
    async fn urgent_water_report_notifies() {
        let h = harness::<WaterReport>();
        let user = principal("user-a", Role::Operator);
        let report = h
            .service
            .create(Some(&user), &water_form(), vec![jpeg(), jpeg()])
            .await
            .unwrap();

        let seen = h.notifier.wait_for(1).await;
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, NotifyKind::Urgent);
        assert_eq!(seen[0].1.id, report.id);
        assert_eq!(seen[0].1.district, "Ciawi");
    }

    #[tokio::test]
    async fn failing_notifier_does_not_fail_create() {
        let h = harness::<WaterReport>();
        h.notifier.fail(true);
        let user = principal("user-a", Role::Operator);
        let created = h
            .service
            .create(Some(&user), &water_form(), vec![jpeg(), jpeg()])
            .await;
        assert!(created.is_ok());
    }

    #[tokio::test]
    async fn get_caches_the_detail_and_writes_drop_it() {
        let h = harness::<RoadReport>();
        let user = principal("user-a", Role::Operator);
        let report = h
            .service
            .create(Some(&user), &road_form(), vec![jpeg(), jpeg()])
            .await
            .unwrap();
        let key = CacheKey::Detail(works_portal_report_models::Domain::Road, report.id.clone());

        let loaded = h.service.get(&report.id).await.unwrap();
        assert_eq!(loaded.photos.len(), 2);
        assert!(h.cache.exists(&key.to_string()).await.unwrap());

        h.service
            .update(Some(&user), &report.id, &Form::new().with("notes", "cek"), vec![])
            .await
            .unwrap();
        assert!(!h.cache.exists(&key.to_string()).await.unwrap());
        assert_eq!(h.service.get(&report.id).await.unwrap().notes.as_deref(), Some("cek"));
    }

    #[tokio::test]
    async fn update_appends_photos_and_recomputes() {
        let h = harness::<RoadReport>();
        let user = principal("user-a", Role::Operator);
        let report = h
            .service
            .create(Some(&user), &road_form(), vec![jpeg(), jpeg()])
            .await
            .unwrap();

        let updated = h
            .service
            .update(
                Some(&user),
                &report.id,
                &Form::new().with("damagedWidth", "4"),
                vec![jpeg(), jpeg(), jpeg()],
            )
            .await
            .unwrap();

        assert!((updated.damaged_area_m2 - 40.0).abs() < f64::EPSILON);
        assert!((updated.estimated_budget - 288_000_000.0).abs() < 1.0);
        let orders = updated.photos.iter().map(|p| p.sort_order).collect::<Vec<_>>();
        assert_eq!(orders, [0, 1, 2, 3, 4]);
        assert_eq!(updated.photos[4].tag, "overview");
        assert_eq!(h.service.get(&report.id).await.unwrap().photos.len(), 5);
    }

    #[tokio::test]
    async fn only_owner_or_superadmin_may_modify() {
        let h = harness::<RoadReport>();
        let owner = principal("user-a", Role::Operator);
        let report = h
            .service
            .create(Some(&owner), &road_form(), vec![jpeg(), jpeg()])
            .await
            .unwrap();

        let other = principal("user-b", Role::Operator);
        let err = h.service.delete(Some(&other), &report.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let admin = principal("root", Role::Superadmin);
        h.service.delete(Some(&admin), &report.id).await.unwrap();
        assert!(matches!(
            h.service.get(&report.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn delete_removes_objects_and_tolerates_leaks() {
        let h = harness::<RoadReport>();
        let user = principal("user-a", Role::Operator);
        let first = h
            .service
            .create(Some(&user), &road_form(), vec![jpeg(), jpeg()])
            .await
            .unwrap();
        let second = h
            .service
            .create(Some(&user), &road_form(), vec![jpeg(), jpeg()])
            .await
            .unwrap();

        h.service.delete(Some(&user), &first.id).await.unwrap();
        for photo in &first.photos {
            assert!(!h.objects.contains(&photo.url).await);
        }

        h.objects.fail_deletes(true);
        h.service.delete(Some(&user), &second.id).await.unwrap();
        assert_eq!(h.store.len().await, 0);
        assert!(h.objects.contains(&second.photos[0].url).await);
    }

    #[tokio::test]
    async fn status_update_resolves_aliases() {
        let h = harness::<RoadReport>();
        let user = principal("user-a", Role::Operator);
        let report = h
            .service
            .create(Some(&user), &road_form(), vec![jpeg(), jpeg()])
            .await
            .unwrap();

        let updated = h
            .service
            .update_status(Some(&user), &report.id, "in progress", Some("crew dispatched"))
            .await
            .unwrap();
        assert_eq!(updated.status.to_string(), "IN_PROGRESS");
        assert_eq!(updated.notes.as_deref(), Some("crew dispatched"));

        let err = h
            .service
            .update_status(Some(&user), &report.id, "teleported", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = h
            .service
            .update_status(Some(&user), "missing", "verified", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn rice_fields_take_no_photos_on_update() {
        let h = harness::<RiceField>();
        let user = principal("user-a", Role::Operator);
        let form = Form::new()
            .with("district", "cibinong")
            .with("latitude", "-6.48")
            .with("longitude", "106.84")
            .with("observation_date", "2024-03-01")
            .with("rainfed_ha", "1")
            .with("irrigated_ha", "2");
        let row = h.service.create(Some(&user), &form, vec![]).await.unwrap();
        assert!((row.total_ha - 3.0).abs() < f64::EPSILON);

        let Err(ServiceError::Validation(errors)) = h
            .service
            .update(Some(&user), &row.id, &Form::new(), vec![jpeg()])
            .await
        else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.entries(), ["photos: unsupported"]);
    }

    #[tokio::test]
    async fn overview_rejects_unknown_scope() {
        let h = harness::<RoadReport>();
        let Err(ServiceError::Validation(errors)) = h.service.overview("tunnel").await else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.entries(), ["scope: oneof=all road bridge"]);

        let overview = h.service.overview("bridge").await.unwrap();
        assert_eq!(overview.stats.total_reports, 0);
    }

    #[tokio::test]
    async fn emergency_dashboard_lists_blocked_roads() {
        let h = harness::<RoadReport>();
        let user = principal("user-a", Role::Operator);
        h.service
            .create(Some(&user), &road_form(), vec![jpeg(), jpeg()])
            .await
            .unwrap();
        let blocked = h
            .service
            .create(
                Some(&user),
                &road_form().with("trafficImpact", "blocked"),
                vec![jpeg(), jpeg()],
            )
            .await
            .unwrap();

        let rows = h.service.dashboard().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, blocked.id);

        let h = harness::<RiceField>();
        assert!(matches!(
            h.service.dashboard().await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }
}
