#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the works portal server.
//!
//! Every response body is wrapped in [`ApiResponse`]. These types are
//! separate from the repository rows so the API contract can evolve
//! independently of the schema.

pub mod overview;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use works_portal_database_models::Page;
use works_portal_report_models::user::{Role, User};

pub use overview::*;

/// The response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// A success envelope without a payload.
    #[must_use]
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>, error: ApiErrorBody) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error),
        }
    }
}

/// `error` is a single message, or one `field: rule` entry per failed
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiErrorBody {
    Message(String),
    List(Vec<String>),
}

/// A page of items with its pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPage<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u64,
}

impl<T> From<Page<T>> for ApiPage<T> {
    fn from(page: Page<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages,
        }
    }
}

/// `PATCH /<domain>/:id/status` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiStatusUpdate {
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `POST /auth/login` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /auth/register` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiRegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Token issued by login and register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiAuthToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// `POST /users` and `PUT /users/:id` body. On update, absent fields are
/// left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// `GET /health` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    pub healthy: bool,
    pub version: String,
    pub database: bool,
    pub cache: bool,
}

/// One point of an indicator time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSeriesPoint {
    pub year: i32,
    pub value: f64,
}

/// `GET /executive/<topic>/overview` payload.
///
/// `values` is flattened into the object: each indicator appears under its
/// key, and its year-over-year change under `perubahan_<key>` (`null` when
/// the previous year is missing or zero).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiExecutiveOverview {
    pub year: i32,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
    pub series: BTreeMap<String, Vec<ApiSeriesPoint>>,
}
