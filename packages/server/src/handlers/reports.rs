//! Report routes, generic over the domain policy. Every domain mounts the
//! same handlers under `/api/v1/<slug>`.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use works_portal_cache::CacheKey;
use works_portal_server_models::{ApiPage, ApiResponse, ApiStatusUpdate};
use works_portal_service::ReportService;
use works_portal_service::policy::ReportPolicy;
use works_portal_service::query::{list_query, map_query};

use super::{QueryPairs, param};
use crate::error::ApiError;
use crate::middleware::Caller;
use crate::multipart::read_submission;

type Service<A> = web::Data<ReportService<A>>;
type Id = web::Path<String>;

/// Path segment of a dashboard list, taken from its cache key.
fn dashboard_segment(key: &CacheKey) -> String {
    let key = key.to_string();
    key.rsplit(':').next().unwrap_or("dashboard").to_string()
}

/// Mounts the report routes of `A` with `service` as their state.
pub fn configure<A: ReportPolicy>(
    service: ReportService<A>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let mut scope = web::scope(&format!("/{}", A::DOMAIN.slug()))
            .app_data(web::Data::new(service))
            .route("", web::post().to(create::<A>))
            .route("", web::get().to(list::<A>))
            .route("/statistics", web::get().to(statistics::<A>))
            .route("/overview", web::get().to(overview::<A>))
            .route("/map", web::get().to(map::<A>));

        if A::HAS_STATUS {
            scope = scope.route("/priority", web::get().to(priority::<A>));
        }
        if let Some((key, _)) = A::dashboard() {
            scope = scope.route(
                &format!("/{}", dashboard_segment(&key)),
                web::get().to(dashboard::<A>),
            );
        }

        scope = scope
            .route("/{id}", web::get().to(get::<A>))
            .route("/{id}", web::put().to(update::<A>))
            .route("/{id}", web::delete().to(delete::<A>));
        if A::HAS_STATUS {
            scope = scope.route("/{id}/status", web::patch().to(update_status::<A>));
        }

        cfg.service(scope);
    }
}

/// `POST /<domain>` multipart: fields + `photos[]`
pub async fn create<A: ReportPolicy>(
    service: Service<A>,
    caller: Caller,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let principal = caller.require()?;
    let (form, photos) = read_submission(payload).await?;
    let record = service.create(Some(principal), &form, photos).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok("Report created", record)))
}

/// `GET /<domain>?page&limit&start_date&end_date&<filters>`
pub async fn list<A: ReportPolicy>(
    service: Service<A>,
    query: QueryPairs,
) -> Result<HttpResponse, ApiError> {
    let query = list_query(&query)?;
    let page = service.list(&query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Reports retrieved", ApiPage::from(page))))
}

/// `GET /<domain>/priority`
pub async fn priority<A: ReportPolicy>(
    service: Service<A>,
    query: QueryPairs,
) -> Result<HttpResponse, ApiError> {
    let query = list_query(&query)?;
    let page = service.priority(&query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Priority list retrieved", ApiPage::from(page))))
}

/// `GET /<domain>/:id`
pub async fn get<A: ReportPolicy>(service: Service<A>, id: Id) -> Result<HttpResponse, ApiError> {
    let record = service.get(&id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Report retrieved", record)))
}

/// `PUT /<domain>/:id` multipart. Absent fields are left unchanged and
/// photos are appended.
pub async fn update<A: ReportPolicy>(
    service: Service<A>,
    caller: Caller,
    id: Id,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let principal = caller.require()?;
    let (form, photos) = read_submission(payload).await?;
    let record = service.update(Some(principal), &id, &form, photos).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Report updated", record)))
}

/// `DELETE /<domain>/:id`
pub async fn delete<A: ReportPolicy>(
    service: Service<A>,
    caller: Caller,
    id: Id,
) -> Result<HttpResponse, ApiError> {
    service.delete(caller.principal(), &id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::done("Report deleted")))
}

/// `PATCH /<domain>/:id/status` `{status, notes?}`
pub async fn update_status<A: ReportPolicy>(
    service: Service<A>,
    caller: Caller,
    id: Id,
    body: web::Json<ApiStatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let record = service
        .update_status(caller.principal(), &id, &body.status, body.notes.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Status updated", record)))
}

/// `GET /<domain>/statistics`
pub async fn statistics<A: ReportPolicy>(service: Service<A>) -> Result<HttpResponse, ApiError> {
    let stats = service.statistics().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Statistics retrieved", stats)))
}

/// `GET /<domain>/overview?scope=`
pub async fn overview<A: ReportPolicy>(
    service: Service<A>,
    query: QueryPairs,
) -> Result<HttpResponse, ApiError> {
    let overview = service
        .overview(param(&query, "scope").unwrap_or_default())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Overview retrieved", overview)))
}

/// `GET /<domain>/map?bbox=west,south,east,north&start_date&end_date&limit`
pub async fn map<A: ReportPolicy>(
    service: Service<A>,
    query: QueryPairs,
) -> Result<HttpResponse, ApiError> {
    let query = map_query(&query)?;
    let points = service.map_points(&query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Map points retrieved", points)))
}

/// `GET /bina-marga/emergency`, `GET /water-resources/urgent`
pub async fn dashboard<A: ReportPolicy>(service: Service<A>) -> Result<HttpResponse, ApiError> {
    let rows = service.dashboard().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Reports retrieved", rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_paths_follow_their_cache_keys() {
        assert_eq!(dashboard_segment(&CacheKey::RoadEmergency), "emergency");
        assert_eq!(dashboard_segment(&CacheKey::WaterUrgent), "urgent");
    }
}
