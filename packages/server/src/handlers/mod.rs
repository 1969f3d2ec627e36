//! HTTP handler functions for the works portal API.

pub mod accounts;
pub mod executive;
pub mod reports;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, web};
use works_portal_cache::Cache;
use works_portal_database::Health;
use works_portal_server_models::{ApiHealth, ApiResponse};

/// Query string as ordered key/value pairs, repeated keys included.
pub type QueryPairs = web::Query<Vec<(String, String)>>;

/// Backends probed by the health endpoint.
#[derive(Clone)]
pub struct Probes {
    pub database: Arc<dyn Health>,
    pub cache: Arc<dyn Cache>,
}

/// First non-blank value of `key` in `pairs`.
pub(crate) fn param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.trim())
        .find(|v| !v.is_empty())
}

/// `GET /api/v1/health`
///
/// `503` when the database or the cache does not answer.
pub async fn health(probes: web::Data<Probes>) -> HttpResponse {
    let database = match probes.database.ping().await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Database health check failed: {e}");
            false
        }
    };
    let cache = match probes.cache.ping().await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Cache health check failed: {e}");
            false
        }
    };

    let healthy = database && cache;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    HttpResponse::build(status).json(ApiResponse {
        success: healthy,
        message: if healthy { "OK" } else { "Degraded" }.to_string(),
        data: Some(ApiHealth {
            healthy,
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
            cache,
        }),
        error: None,
    })
}
