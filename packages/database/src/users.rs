//! Postgres [`UserStore`].

use std::sync::Arc;

use async_trait::async_trait;
use switchy_database::{Database, DatabaseValue, Row};
use works_portal_database_models::{ListQuery, Page};
use works_portal_report_models::user::{Role, User};

use crate::DbError;
use crate::convert::{bigint, boolean, text, text_value, timestamp, timestamp_value};
use crate::repository::UserStore;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, is_active, created_at, updated_at";

pub struct PgUserStore {
    db: Arc<dyn Database>,
}

impl PgUserStore {
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, DbError> {
        let rows = self
            .db
            .query_raw_params(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1"),
                &[text_value(value)],
            )
            .await?;

        rows.first().map(user_from_row).transpose()
    }
}

fn user_from_row(row: &Row) -> Result<User, DbError> {
    let role = text(row, "role")?;
    Ok(User {
        id: text(row, "id")?,
        username: text(row, "username")?,
        email: text(row, "email")?,
        password_hash: text(row, "password_hash")?,
        role: role.parse::<Role>().map_err(|_| DbError::Conversion {
            message: format!("Unknown role {role}"),
        })?,
        is_active: boolean(row, "is_active")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> Result<(), DbError> {
        self.db
            .exec_raw_params(
                &format!(
                    "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
                ),
                &[
                    text_value(&user.id),
                    text_value(&user.username),
                    text_value(&user.email),
                    text_value(&user.password_hash),
                    text_value(user.role.as_ref()),
                    DatabaseValue::Bool(user.is_active),
                    timestamp_value(user.created_at),
                    timestamp_value(user.updated_at),
                ],
            )
            .await
            .map_err(DbError::classify)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        self.find_one("id", id).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        self.find_one("email", email).await
    }

    async fn list(&self, query: &ListQuery) -> Result<Page<User>, DbError> {
        let count = self
            .db
            .query_raw_params("SELECT COUNT(*) AS total FROM users", &[])
            .await?;
        let total = count.first().map_or(Ok(0), |row| bigint(row, "total"))?;

        let rows = self
            .db
            .query_raw_params(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC
                     LIMIT $1 OFFSET $2"
                ),
                &[
                    DatabaseValue::Int64(i64::from(query.limit)),
                    DatabaseValue::Int64(i64::try_from(query.offset()).unwrap_or(i64::MAX)),
                ],
            )
            .await?;

        Ok(Page {
            items: rows.iter().map(user_from_row).collect::<Result<_, _>>()?,
            total: u64::try_from(total).unwrap_or(0),
            page: query.page,
            per_page: query.limit,
        })
    }

    async fn update(&self, user: &User) -> Result<bool, DbError> {
        let affected = self
            .db
            .exec_raw_params(
                "UPDATE users SET username = $2, email = $3, password_hash = $4, role = $5,
                     is_active = $6, updated_at = $7
                 WHERE id = $1",
                &[
                    text_value(&user.id),
                    text_value(&user.username),
                    text_value(&user.email),
                    text_value(&user.password_hash),
                    text_value(user.role.as_ref()),
                    DatabaseValue::Bool(user.is_active),
                    timestamp_value(user.updated_at),
                ],
            )
            .await
            .map_err(DbError::classify)?;

        Ok(affected > 0)
    }

    async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let affected = self
            .db
            .exec_raw_params("DELETE FROM users WHERE id = $1", &[text_value(id)])
            .await?;

        Ok(affected > 0)
    }
}
