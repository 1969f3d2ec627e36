//! Row-to-type and type-to-parameter helpers shared by the repositories.

use chrono::{DateTime, NaiveDateTime, Utc};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{DatabaseValue, Row};
use works_portal_report_models::normalize::CatalogEnum;

use crate::DbError;

fn conversion(column: &str, e: impl std::fmt::Display) -> DbError {
    DbError::Conversion {
        message: format!("Failed to read column {column}: {e}"),
    }
}

pub fn text(row: &Row, column: &str) -> Result<String, DbError> {
    row.to_value(column).map_err(|e| conversion(column, e))
}

pub fn opt_text(row: &Row, column: &str) -> Result<Option<String>, DbError> {
    row.to_value(column).map_err(|e| conversion(column, e))
}

pub fn real(row: &Row, column: &str) -> Result<f64, DbError> {
    row.to_value(column).map_err(|e| conversion(column, e))
}

pub fn opt_real(row: &Row, column: &str) -> Result<Option<f64>, DbError> {
    row.to_value(column).map_err(|e| conversion(column, e))
}

pub fn int(row: &Row, column: &str) -> Result<i32, DbError> {
    row.to_value(column).map_err(|e| conversion(column, e))
}

pub fn opt_int(row: &Row, column: &str) -> Result<Option<i32>, DbError> {
    row.to_value(column).map_err(|e| conversion(column, e))
}

pub fn bigint(row: &Row, column: &str) -> Result<i64, DbError> {
    row.to_value(column).map_err(|e| conversion(column, e))
}

pub fn boolean(row: &Row, column: &str) -> Result<bool, DbError> {
    row.to_value(column).map_err(|e| conversion(column, e))
}

pub fn timestamp(row: &Row, column: &str) -> Result<DateTime<Utc>, DbError> {
    let naive: NaiveDateTime = row.to_value(column).map_err(|e| conversion(column, e))?;
    Ok(naive.and_utc())
}

pub fn opt_timestamp(row: &Row, column: &str) -> Result<Option<DateTime<Utc>>, DbError> {
    let naive: Option<NaiveDateTime> = row.to_value(column).map_err(|e| conversion(column, e))?;
    Ok(naive.map(|n| n.and_utc()))
}

/// Reads a stored enum code. Stored values are always canonical, so this
/// does not consult the alias table.
pub fn catalog<E: CatalogEnum>(row: &Row, column: &str) -> Result<E, DbError> {
    let code = text(row, column)?;
    code.parse()
        .map_err(|_| conversion(column, format!("unknown {} code {code}", E::FIELD)))
}

pub fn opt_catalog<E: CatalogEnum>(row: &Row, column: &str) -> Result<Option<E>, DbError> {
    opt_text(row, column)?
        .map(|code| {
            code.parse()
                .map_err(|_| conversion(column, format!("unknown {} code {code}", E::FIELD)))
        })
        .transpose()
}

pub fn text_value(value: &str) -> DatabaseValue {
    DatabaseValue::String(value.to_string())
}

pub fn opt_text_value(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, text_value)
}

pub fn code_value<E: CatalogEnum>(value: E) -> DatabaseValue {
    text_value(value.code())
}

pub fn opt_code_value<E: CatalogEnum>(value: Option<E>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, code_value)
}

pub fn opt_real_value(value: Option<f64>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, DatabaseValue::Real64)
}

pub fn opt_int_value(value: Option<i32>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, DatabaseValue::Int32)
}

pub fn timestamp_value(value: DateTime<Utc>) -> DatabaseValue {
    DatabaseValue::DateTime(value.naive_utc())
}
