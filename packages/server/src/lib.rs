#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the public works reporting portal.
//!
//! Serves the `/api/v1` REST API: six report domains (buildings, spatial
//! planning, water resources, roads, agriculture and rice fields), auth and
//! user management, executive dashboards and a health probe. Reports are
//! stored in `PostgreSQL`, read paths are cached in Redis and photos go to
//! an S3-compatible object store.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::{Logger, from_fn};
use actix_web::{App, HttpResponse, HttpServer, web};
use switchy_database::Database;
use works_portal_cache::{Cache, CacheError, RedisCache};
use works_portal_database::db::{self, PgHealth};
use works_portal_database::executive::PgExecutiveStore;
use works_portal_database::record::ReportRecord;
use works_portal_database::store::PgReportStore;
use works_portal_database::users::PgUserStore;
use works_portal_database::{DbError, run_migrations};
use works_portal_report_models::Principal;
use works_portal_report_models::agriculture::AgricultureReport;
use works_portal_report_models::building::BuildingReport;
use works_portal_report_models::rice_field::RiceField;
use works_portal_report_models::road::RoadReport;
use works_portal_report_models::spatial::SpatialReport;
use works_portal_report_models::user::{Role, User};
use works_portal_report_models::water::WaterReport;
use works_portal_server_models::ApiUserRequest;
use works_portal_service::auth::AuthService;
use works_portal_service::executive::ExecutiveService;
use works_portal_service::notify::{LogNotifier, Notifier};
use works_portal_service::policy::ReportPolicy;
use works_portal_service::users::UserService;
use works_portal_service::{ReportService, ServiceError};
use works_portal_storage::{ObjectStore, S3ObjectStore};

use crate::config::{Config, ConfigError};
use crate::error::ApiError;
use crate::handlers::Probes;
use crate::middleware::RequestDeadline;

/// Errors that stop the process before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to connect to database: {0}")]
    Connect(String),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Failed to connect to cache: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything the handlers are wired to. Cloned into each worker.
#[derive(Clone)]
pub struct AppState {
    pub buildings: ReportService<BuildingReport>,
    pub spatial: ReportService<SpatialReport>,
    pub water: ReportService<WaterReport>,
    pub roads: ReportService<RoadReport>,
    pub agriculture: ReportService<AgricultureReport>,
    pub rice_fields: ReportService<RiceField>,
    pub auth: AuthService,
    pub users: UserService,
    pub executive: ExecutiveService,
    pub probes: Probes,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
}

/// Shared backends every report domain is built on.
struct Backends {
    db: Arc<dyn Database>,
    cache: Arc<dyn Cache>,
    objects: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
}

impl Backends {
    fn reports<A: ReportPolicy + ReportRecord>(&self) -> ReportService<A> {
        let store = Arc::new(PgReportStore::<A>::new(self.db.clone()));
        ReportService::new(
            store.clone(),
            store,
            self.cache.clone(),
            self.objects.clone(),
            self.notifier.clone(),
        )
    }
}

async fn connect_database(config: &Config) -> Result<Arc<dyn Database>, ServerError> {
    log::info!("Connecting to database...");
    db::connect(&config.db)
        .await
        .map_err(|e| ServerError::Connect(e.to_string()))
}

impl AppState {
    /// Connects to `PostgreSQL`, Redis and the object store described by
    /// `config` and runs pending migrations.
    ///
    /// # Errors
    ///
    /// * If the database or the cache cannot be reached
    /// * If a migration fails
    pub async fn connect(config: &Config) -> Result<Self, ServerError> {
        let db = connect_database(config).await?;

        log::info!("Running migrations...");
        run_migrations(db.as_ref()).await?;

        log::info!("Connecting to cache...");
        let cache: Arc<dyn Cache> = Arc::new(RedisCache::connect(&config.redis).await?);

        let objects = S3ObjectStore::new(&config.s3);
        if let Err(e) = objects.ensure_bucket().await {
            log::warn!("Object store bucket {} is not ready: {e}", config.s3.bucket);
        }

        let backends = Backends {
            db: db.clone(),
            cache: cache.clone(),
            objects: Arc::new(objects),
            notifier: Arc::new(LogNotifier),
        };
        let users = Arc::new(PgUserStore::new(db.clone()));

        Ok(Self {
            buildings: backends.reports(),
            spatial: backends.reports(),
            water: backends.reports(),
            roads: backends.reports(),
            agriculture: backends.reports(),
            rice_fields: backends.reports(),
            auth: AuthService::new(users.clone(), &config.jwt_secret, config.jwt_ttl),
            users: UserService::new(users),
            executive: ExecutiveService::new(Arc::new(PgExecutiveStore::new(db.clone()))),
            probes: Probes {
                database: Arc::new(PgHealth::new(db)),
                cache,
            },
            allowed_origins: config.allowed_origins.clone(),
            request_timeout: config.request_timeout,
        })
    }
}

fn cors(allowed_origins: &[String]) -> Cors {
    if allowed_origins.is_empty() {
        return Cors::permissive();
    }
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

async fn route_not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError(ServiceError::NotFound("Route".into())))
}

/// Builds the application for one worker.
pub fn build_app(
    state: AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let cors = cors(&state.allowed_origins);

    App::new()
        .app_data(RequestDeadline(state.request_timeout))
        .app_data(web::Data::new(state.auth))
        .app_data(web::Data::new(state.users))
        .app_data(web::Data::new(state.executive))
        .app_data(web::Data::new(state.probes))
        .app_data(web::JsonConfig::default().error_handler(|err, _| {
            ApiError::invalid("body", format!("malformed: {err}")).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _| {
            ApiError::invalid("query", format!("malformed: {err}")).into()
        }))
        .wrap(from_fn(middleware::authenticate))
        .wrap(from_fn(middleware::deadline))
        .wrap(from_fn(middleware::recover))
        .wrap(cors)
        .wrap(Logger::default())
        .service(
            web::scope("/api/v1")
                .route("/health", web::get().to(handlers::health))
                .configure(handlers::accounts::configure)
                .configure(handlers::executive::configure)
                .configure(handlers::reports::configure(state.buildings))
                .configure(handlers::reports::configure(state.spatial))
                .configure(handlers::reports::configure(state.water))
                .configure(handlers::reports::configure(state.roads))
                .configure(handlers::reports::configure(state.agriculture))
                .configure(handlers::reports::configure(state.rice_fields)),
        )
        .default_service(web::to(route_not_found))
}

/// Connects the backends and serves until shutdown.
///
/// # Errors
///
/// * If a backend cannot be reached at startup
/// * If the listener fails to bind or the server stops with an error
pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let state = AppState::connect(&config).await?;

    log::info!("Starting server on 0.0.0.0:{} ({})", config.port, config.env);

    HttpServer::new(move || build_app(state.clone()))
        .bind(("0.0.0.0", config.port))?
        .run()
        .await?;

    Ok(())
}

/// Applies pending migrations and exits.
///
/// # Errors
///
/// * If the database cannot be reached
/// * If a migration fails
pub async fn migrate(config: &Config) -> Result<(), ServerError> {
    let db = connect_database(config).await?;
    run_migrations(db.as_ref()).await?;
    log::info!("Migrations applied");
    Ok(())
}

/// Creates the first superadmin account. There is no HTTP route that can
/// grant the role without an existing superadmin.
///
/// # Errors
///
/// * If the database cannot be reached
/// * If the credentials fail validation or the account already exists
pub async fn create_superadmin(
    config: &Config,
    username: String,
    email: String,
    password: String,
) -> Result<User, ServerError> {
    let db = connect_database(config).await?;
    run_migrations(db.as_ref()).await?;

    let bootstrap = Principal {
        user_id: "system".to_string(),
        username: "system".to_string(),
        role: Role::Superadmin,
    };
    let user = UserService::new(Arc::new(PgUserStore::new(db)))
        .create(
            Some(&bootstrap),
            ApiUserRequest {
                username: Some(username),
                email: Some(email),
                password: Some(password),
                role: Some(Role::Superadmin),
                is_active: Some(true),
            },
        )
        .await?;

    log::info!("Created superadmin {} ({})", user.username, user.id);
    Ok(user)
}
