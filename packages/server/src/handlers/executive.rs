//! Executive indicator dashboards.

use actix_web::{HttpResponse, web};
use works_portal_server_models::ApiResponse;
use works_portal_service::executive::ExecutiveService;

use super::{QueryPairs, param};
use crate::error::ApiError;
use crate::middleware::Caller;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/executive/{topic}/overview", web::get().to(overview));
}

/// Accepted `year` values.
const YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

fn year(pairs: &[(String, String)]) -> Result<Option<i32>, ApiError> {
    param(pairs, "year")
        .map(|raw| {
            let year: i32 = raw.parse().map_err(|_| ApiError::invalid("year", "integer"))?;
            if YEARS.contains(&year) {
                Ok(year)
            } else {
                Err(ApiError::invalid("year", "range"))
            }
        })
        .transpose()
}

/// `GET /executive/{topic}/overview?year=`
pub async fn overview(
    executive: web::Data<ExecutiveService>,
    caller: Caller,
    topic: web::Path<String>,
    query: QueryPairs,
) -> Result<HttpResponse, ApiError> {
    let year = year(&query)?;
    let overview = executive.overview(caller.principal(), &topic, year).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Overview retrieved", overview)))
}
