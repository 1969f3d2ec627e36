#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Use cases of the works portal.
//!
//! One generic [`pipeline::ReportService`] runs the report lifecycle
//! (bind, validate, derive, publish photos, persist, invalidate, notify)
//! for every domain. Each domain contributes a [`policy::ReportPolicy`]
//! with its form binding, derived fields, photo minimum and overview
//! catalog. Auth, user management and executive indicators sit beside it.
//!
//! The service only talks to ports: [`works_portal_database`] repository
//! traits, [`works_portal_cache::Cache`], [`works_portal_storage::ObjectStore`]
//! and [`notify::Notifier`]. In-memory implementations of the repository
//! ports are available behind the `test-utils` feature.

pub mod auth;
pub mod executive;
pub mod form;
pub mod notify;
pub mod photo;
pub mod pipeline;
pub mod policy;
pub mod query;
pub mod users;
pub mod validate;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use std::fmt;

use works_portal_database::DbError;
use works_portal_storage::StorageError;

pub use form::Form;
pub use photo::PhotoUpload;
pub use pipeline::ReportService;

/// Ordered list of `field: rule` failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Records a failed rule for `field`.
    pub fn push(&mut self, field: &str, rule: impl fmt::Display) {
        self.0.push(format!("{field}: {rule}"));
    }

    /// Records an already formatted `field: rule` entry.
    pub fn push_entry(&mut self, entry: impl Into<String>) {
        self.0.push(entry.into());
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<String> {
        self.0
    }

    /// `Ok(())` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] carrying every recorded failure.
    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

/// Errors returned by every use case. The HTTP layer maps each kind to a
/// status code.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input failed to parse or validate.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Unknown id.
    #[error("{0} not found")]
    NotFound(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Role or ownership violation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unique-key collision.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Object-store upload or delete failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Database failure.
    #[error(transparent)]
    Repository(#[from] DbError),

    /// A backing service is unreachable.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The request deadline expired.
    #[error("Request timed out")]
    RequestTimeout,

    /// Anything else that should never happen.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// A single-entry validation error.
    #[must_use]
    pub fn invalid(field: &str, rule: impl fmt::Display) -> Self {
        let mut errors = ValidationErrors::new();
        errors.push(field, rule);
        Self::Validation(errors)
    }
}
