//! Superadmin-only account management.

use std::sync::Arc;

use chrono::Utc;
use ulid::Ulid;
use works_portal_database::UserStore;
use works_portal_database_models::{ListQuery, Page};
use works_portal_report_models::Principal;
use works_portal_report_models::user::{Role, User};
use works_portal_server_models::ApiUserRequest;

use crate::auth::{account_conflict, ensure_unique, hash_password};
use crate::{ServiceError, ValidationErrors, validate};

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

fn superadmin(principal: Option<&Principal>) -> Result<&Principal, ServiceError> {
    let principal =
        principal.ok_or_else(|| ServiceError::Unauthorized("Authentication required".into()))?;
    if principal.role != Role::Superadmin {
        return Err(ServiceError::Forbidden(format!(
            "{} may not manage users",
            principal.username
        )));
    }
    Ok(principal)
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl UserService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] or [`ServiceError::Forbidden`]
    ///   unless the caller is a superadmin
    /// * [`ServiceError::Repository`] if the query fails
    pub async fn list(
        &self,
        principal: Option<&Principal>,
        query: &ListQuery,
    ) -> Result<Page<User>, ServiceError> {
        superadmin(principal)?;
        Ok(self.users.list(query).await?)
    }

    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] or [`ServiceError::Forbidden`]
    ///   unless the caller is a superadmin
    /// * [`ServiceError::NotFound`] if no account has this id
    /// * [`ServiceError::Repository`] if the lookup fails
    pub async fn get(&self, principal: Option<&Principal>, id: &str) -> Result<User, ServiceError> {
        superadmin(principal)?;
        self.find(id).await
    }

    async fn find(&self, id: &str) -> Result<User, ServiceError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {id}")))
    }

    /// Creates an account with any role. Username, email and password are
    /// required; the role defaults to `OPERATOR`.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] or [`ServiceError::Forbidden`]
    ///   unless the caller is a superadmin
    /// * [`ServiceError::Validation`] for missing or malformed fields
    /// * [`ServiceError::Conflict`] if the username or email is taken
    /// * [`ServiceError::Repository`] if the insert fails
    pub async fn create(
        &self,
        principal: Option<&Principal>,
        request: ApiUserRequest,
    ) -> Result<User, ServiceError> {
        let admin = superadmin(principal)?;

        let username = trimmed(request.username.as_ref());
        let email = trimmed(request.email.as_ref()).map(|e| e.to_lowercase());
        let mut errors = ValidationErrors::new();
        for (field, value) in [
            ("username", &username),
            ("email", &email),
            ("password", &request.password),
        ] {
            if value.is_none() {
                errors.push(field, "required");
            }
        }
        validate::account(
            &mut errors,
            username.as_deref(),
            email.as_deref(),
            request.password.as_deref(),
        );
        errors.into_result()?;

        let (Some(username), Some(email), Some(password)) = (username, email, request.password)
        else {
            return Err(ServiceError::Internal("validated fields missing".into()));
        };
        ensure_unique(self.users.as_ref(), &username, &email, None).await?;

        let now = Utc::now();
        let user = User {
            id: Ulid::new().to_string(),
            username,
            email,
            password_hash: hash_password(password).await?,
            role: request.role.unwrap_or(Role::Operator),
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        self.users.create(&user).await.map_err(account_conflict)?;
        log::info!("{} created user {} as {}", admin.username, user.username, user.role);
        Ok(user)
    }

    /// Applies the fields the request carries.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] or [`ServiceError::Forbidden`]
    ///   unless the caller is a superadmin
    /// * [`ServiceError::NotFound`] if no account has this id
    /// * [`ServiceError::Validation`] for malformed fields
    /// * [`ServiceError::Conflict`] if the new username or email is taken
    /// * [`ServiceError::Repository`] if the update fails
    pub async fn update(
        &self,
        principal: Option<&Principal>,
        id: &str,
        request: ApiUserRequest,
    ) -> Result<User, ServiceError> {
        let admin = superadmin(principal)?;
        let mut user = self.find(id).await?;

        let username = trimmed(request.username.as_ref());
        let email = trimmed(request.email.as_ref()).map(|e| e.to_lowercase());
        let password = request.password.filter(|p| !p.is_empty());

        let mut errors = ValidationErrors::new();
        validate::account(
            &mut errors,
            username.as_deref(),
            email.as_deref(),
            password.as_deref(),
        );
        errors.into_result()?;

        if let Some(username) = username {
            user.username = username;
        }
        if let Some(email) = email {
            user.email = email;
        }
        ensure_unique(self.users.as_ref(), &user.username, &user.email, Some(id)).await?;

        if let Some(password) = password {
            user.password_hash = hash_password(password).await?;
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(active) = request.is_active {
            user.is_active = active;
        }
        user.updated_at = Utc::now();

        if !self.users.update(&user).await.map_err(account_conflict)? {
            return Err(ServiceError::NotFound(format!("User {id}")));
        }
        log::info!("{} updated user {}", admin.username, user.username);
        Ok(user)
    }

    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] or [`ServiceError::Forbidden`]
    ///   unless the caller is a superadmin
    /// * [`ServiceError::Conflict`] when deleting one's own account
    /// * [`ServiceError::NotFound`] if no account has this id
    /// * [`ServiceError::Repository`] if the delete fails
    pub async fn delete(
        &self,
        principal: Option<&Principal>,
        id: &str,
    ) -> Result<(), ServiceError> {
        let admin = superadmin(principal)?;
        if admin.user_id == id {
            return Err(ServiceError::Conflict("Cannot delete your own account".into()));
        }
        if !self.users.delete(id).await? {
            return Err(ServiceError::NotFound(format!("User {id}")));
        }
        log::info!("{} deleted user {id}", admin.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryUserStore, principal};

    fn request(username: &str, email: &str) -> ApiUserRequest {
        ApiUserRequest {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some("rahasia123".into()),
            ..ApiUserRequest::default()
        }
    }

    #[tokio::test]
    async fn operators_are_forbidden() {
        let service = UserService::new(Arc::new(MemoryUserStore::new()));
        let operator = principal("user-a", Role::Operator);

        let err = service
            .list(Some(&operator), &ListQuery::page(1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
        let err = service.list(None, &ListQuery::page(1, 10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn superadmin_manages_accounts() {
        let service = UserService::new(Arc::new(MemoryUserStore::new()));
        let admin = principal("root", Role::Superadmin);

        let user = service
            .create(Some(&admin), request("sari", "sari@example.com"))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Operator);
        assert!(user.is_active);

        let updated = service
            .update(
                Some(&admin),
                &user.id,
                ApiUserRequest {
                    role: Some(Role::Superadmin),
                    is_active: Some(false),
                    ..ApiUserRequest::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Superadmin);
        assert!(!updated.is_active);
        assert_eq!(updated.username, "sari");

        let page = service
            .list(Some(&admin), &ListQuery::page(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        service.delete(Some(&admin), &user.id).await.unwrap();
        assert!(matches!(
            service.get(Some(&admin), &user.id).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn create_requires_every_credential() {
        let service = UserService::new(Arc::new(MemoryUserStore::new()));
        let admin = principal("root", Role::Superadmin);

        let Err(ServiceError::Validation(errors)) = service
            .create(
                Some(&admin),
                ApiUserRequest {
                    username: Some("sari".into()),
                    ..ApiUserRequest::default()
                },
            )
            .await
        else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.entries(), ["email: required", "password: required"]);
    }

    #[tokio::test]
    async fn renaming_onto_a_taken_username_conflicts() {
        let service = UserService::new(Arc::new(MemoryUserStore::new()));
        let admin = principal("root", Role::Superadmin);
        service
            .create(Some(&admin), request("sari", "sari@example.com"))
            .await
            .unwrap();
        let budi = service
            .create(Some(&admin), request("budi", "budi@example.com"))
            .await
            .unwrap();

        let err = service
            .update(
                Some(&admin),
                &budi.id,
                ApiUserRequest {
                    username: Some("sari".into()),
                    ..ApiUserRequest::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }
}
