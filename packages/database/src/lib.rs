#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Database connection, repositories, and migrations for the works portal.
//!
//! Uses `switchy_database` raw parameterized queries against PostgreSQL and
//! `switchy_schema` for embedded SQL migrations. One generic store serves
//! all six report domains through the [`record::ReportRecord`] mapping.

pub mod convert;
pub mod db;
pub mod executive;
pub mod overview;
pub mod record;
pub mod repository;
pub mod sql;
pub mod store;
pub mod users;

use include_dir::{Dir, include_dir};
use switchy_database::Database;
use switchy_schema::discovery::embedded::EmbeddedMigrationSource;
use switchy_schema::runner::MigrationRunner;

pub use repository::{AnalyticsSource, ExecutiveStore, Health, ReportStore, UserStore};

/// Embedded SQL migrations from the `migrations/` directory.
static MIGRATIONS_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/../../migrations");

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] switchy_schema::MigrationError),

    /// A write collided with a unique constraint (SQLSTATE `23505`).
    #[error("Unique constraint violated: {message}")]
    UniqueViolation {
        /// The driver's description of the collision.
        message: String,
    },

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

impl DbError {
    /// Wraps a driver error, separating out unique-key collisions so
    /// callers can report them as conflicts.
    #[must_use]
    pub fn classify(error: switchy_database::DatabaseError) -> Self {
        let rendered = format!("{error} {error:?}");
        if is_unique_violation(&rendered) {
            Self::UniqueViolation {
                message: error.to_string(),
            }
        } else {
            Self::Database(error)
        }
    }
}

fn is_unique_violation(rendered: &str) -> bool {
    rendered.contains("23505") || rendered.contains("duplicate key value")
}

/// Runs all pending database migrations.
///
/// # Errors
///
/// Returns [`DbError`] if any migration fails to apply.
pub async fn run_migrations(db: &dyn Database) -> Result<(), DbError> {
    let source = EmbeddedMigrationSource::new(&MIGRATIONS_DIR);
    let runner = MigrationRunner::new(Box::new(source));
    runner.run(db).await?;
    log::info!("Database migrations completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_unique_violations_by_code_or_message() {
        assert!(is_unique_violation(
            "db error: ERROR: duplicate key value violates unique constraint \"users_email_key\""
        ));
        assert!(is_unique_violation("DbError { code: SqlState(E23505) }"));
        assert!(!is_unique_violation("DbError { code: SqlState(E23503) }"));
    }
}
