//! Authentication and user management routes.

use actix_web::{HttpResponse, web};
use works_portal_server_models::{
    ApiLoginRequest, ApiPage, ApiRegisterRequest, ApiResponse, ApiUserRequest,
};
use works_portal_service::auth::AuthService;
use works_portal_service::query::list_query;
use works_portal_service::users::UserService;

use super::QueryPairs;
use crate::error::ApiError;
use crate::middleware::Caller;

/// Mounts `/auth`, `/profile` and `/users`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login)),
    )
    .route("/profile", web::get().to(profile))
    .service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("", web::post().to(create_user))
            .route("/{id}", web::get().to(get_user))
            .route("/{id}", web::put().to(update_user))
            .route("/{id}", web::delete().to(delete_user)),
    );
}

pub async fn register(
    auth: web::Data<AuthService>,
    body: web::Json<ApiRegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let token = auth.register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok("Registration successful", token)))
}

pub async fn login(
    auth: web::Data<AuthService>,
    body: web::Json<ApiLoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let token = auth.login(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Login successful", token)))
}

pub async fn profile(
    auth: web::Data<AuthService>,
    caller: Caller,
) -> Result<HttpResponse, ApiError> {
    let user = auth.profile(caller.principal()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Profile retrieved", user)))
}

pub async fn list_users(
    users: web::Data<UserService>,
    caller: Caller,
    query: QueryPairs,
) -> Result<HttpResponse, ApiError> {
    let query = list_query(&query)?;
    let page = users.list(caller.principal(), &query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("Users retrieved", ApiPage::from(page))))
}

pub async fn get_user(
    users: web::Data<UserService>,
    caller: Caller,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = users.get(caller.principal(), &id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("User retrieved", user)))
}

pub async fn create_user(
    users: web::Data<UserService>,
    caller: Caller,
    body: web::Json<ApiUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = users.create(caller.principal(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok("User created", user)))
}

pub async fn update_user(
    users: web::Data<UserService>,
    caller: Caller,
    id: web::Path<String>,
    body: web::Json<ApiUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = users.update(caller.principal(), &id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok("User updated", user)))
}

pub async fn delete_user(
    users: web::Data<UserService>,
    caller: Caller,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    users.delete(caller.principal(), &id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::done("User deleted")))
}
