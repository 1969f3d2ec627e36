//! Accounts, password hashing and bearer tokens.
//!
//! Passwords are stored as Argon2id PHC strings. Tokens are HS256 JWTs
//! carrying `user_id`, `username`, `role`, `exp`, `iat` and `nbf`.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use works_portal_database::{DbError, UserStore};
use works_portal_report_models::Principal;
use works_portal_report_models::user::{Role, User};
use works_portal_server_models::{ApiAuthToken, ApiLoginRequest, ApiRegisterRequest};

use crate::{ServiceError, ValidationErrors, validate};

/// Token lifetime when none is configured.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const BAD_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    user_id: String,
    username: String,
    role: Role,
    exp: i64,
    iat: i64,
    nbf: i64,
}

/// Hashes `password` into an Argon2id PHC string.
///
/// # Errors
///
/// Returns [`ServiceError::Internal`] if hashing fails.
pub async fn hash_password(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ServiceError::Internal(format!("Password hashing failed: {e}")))
    })
    .await
    .map_err(|e| ServiceError::Internal(format!("Hashing task failed: {e}")))?
}

/// Whether `password` matches the stored PHC string. A malformed hash
/// never matches.
pub async fn verify_password(password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || {
        PasswordHash::new(&hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    })
    .await
    .unwrap_or(false)
}

/// Rejects a username or email already held by an account other than
/// `except`.
pub(crate) async fn ensure_unique(
    users: &dyn UserStore,
    username: &str,
    email: &str,
    except: Option<&str>,
) -> Result<(), ServiceError> {
    let other = |user: &User| except != Some(user.id.as_str());

    if users
        .find_by_username(username)
        .await?
        .is_some_and(|u| other(&u))
    {
        return Err(ServiceError::Conflict(format!("Username {username} is taken")));
    }
    if users.find_by_email(email).await?.is_some_and(|u| other(&u)) {
        return Err(ServiceError::Conflict(format!("Email {email} is already registered")));
    }
    Ok(())
}

/// Turns a unique-key collision into a conflict. The lookups in
/// [`ensure_unique`] miss accounts created concurrently.
pub(crate) fn account_conflict(error: DbError) -> ServiceError {
    match error {
        DbError::UniqueViolation { message } => {
            log::debug!("Account write collided: {message}");
            ServiceError::Conflict("Username or email is already registered".into())
        }
        other => other.into(),
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl AuthService {
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, secret: &str, ttl: Duration) -> Self {
        Self {
            users,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Creates an `OPERATOR` account and signs it in.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Validation`] for a malformed username, email or
    ///   password
    /// * [`ServiceError::Conflict`] if the username or email is taken
    /// * [`ServiceError::Repository`] if the insert fails
    pub async fn register(
        &self,
        request: ApiRegisterRequest,
    ) -> Result<ApiAuthToken, ServiceError> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        let mut errors = ValidationErrors::new();
        validate::account(
            &mut errors,
            Some(&username),
            Some(&email),
            Some(&request.password),
        );
        errors.into_result()?;

        ensure_unique(self.users.as_ref(), &username, &email, None).await?;

        let now = Utc::now();
        let user = User {
            id: Ulid::new().to_string(),
            username,
            email,
            password_hash: hash_password(request.password).await?,
            role: Role::Operator,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.create(&user).await.map_err(account_conflict)?;
        log::info!("Registered user {} ({})", user.username, user.id);

        self.issue(user)
    }

    /// Checks credentials and issues a token. The username may also be the
    /// account's email.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] for unknown users, wrong passwords
    ///   and deactivated accounts
    /// * [`ServiceError::Repository`] if the lookup fails
    pub async fn login(&self, request: ApiLoginRequest) -> Result<ApiAuthToken, ServiceError> {
        let login = request.username.trim();
        let user = if login.contains('@') {
            self.users.find_by_email(&login.to_lowercase()).await?
        } else {
            self.users.find_by_username(login).await?
        };
        let Some(user) = user else {
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.into()));
        };

        if !verify_password(request.password, user.password_hash.clone()).await {
            log::debug!("Rejected password for {}", user.username);
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.into()));
        }
        if !user.is_active {
            return Err(ServiceError::Unauthorized("Account is deactivated".into()));
        }

        self.issue(user)
    }

    /// The caller's own account.
    ///
    /// # Errors
    ///
    /// * [`ServiceError::Unauthorized`] without a principal
    /// * [`ServiceError::NotFound`] if the account was deleted
    /// * [`ServiceError::Repository`] if the lookup fails
    pub async fn profile(&self, principal: Option<&Principal>) -> Result<User, ServiceError> {
        let principal = principal
            .ok_or_else(|| ServiceError::Unauthorized("Authentication required".into()))?;
        self.users
            .find_by_id(&principal.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {}", principal.user_id)))
    }

    /// Signs a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Internal`] if signing fails.
    pub fn issue(&self, user: User) -> Result<ApiAuthToken, ServiceError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| ServiceError::Internal(format!("Token lifetime out of range: {e}")))?;
        let expires_at: DateTime<Utc> = now + ttl;

        let claims = Claims {
            user_id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("Token signing failed: {e}")))?;

        Ok(ApiAuthToken {
            token,
            expires_at,
            user,
        })
    }

    /// Decodes and checks a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Unauthorized`] for a malformed, forged,
    /// expired or not-yet-valid token.
    pub fn verify(&self, token: &str) -> Result<Principal, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "iat", "nbf"]);

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| ServiceError::Unauthorized(format!("Invalid token: {e}")))?;

        Ok(Principal {
            user_id: data.claims.user_id,
            username: data.claims.username,
            role: data.claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryUserStore;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryUserStore::new()), "test-secret", DEFAULT_TOKEN_TTL)
    }

    fn register(username: &str, email: &str) -> ApiRegisterRequest {
        ApiRegisterRequest {
            username: username.into(),
            email: email.into(),
            password: "rahasia123".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let auth = service();
        let token = auth.register(register("budi", "Budi@Example.com")).await.unwrap();
        assert_eq!(token.user.role, Role::Operator);
        assert_eq!(token.user.email, "budi@example.com");
        assert!(token.user.password_hash.starts_with("$argon2id$"));

        let login = auth
            .login(ApiLoginRequest {
                username: "budi".into(),
                password: "rahasia123".into(),
            })
            .await
            .unwrap();
        let principal = auth.verify(&login.token).unwrap();
        assert_eq!(principal.user_id, token.user.id);
        assert_eq!(principal.role, Role::Operator);

        let profile = auth.profile(Some(&principal)).await.unwrap();
        assert_eq!(profile.username, "budi");
    }

    #[tokio::test]
    async fn duplicate_accounts_conflict() {
        let auth = service();
        auth.register(register("budi", "budi@example.com")).await.unwrap();

        let err = auth.register(register("budi", "other@example.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        let err = auth.register(register("sari", "budi@example.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    /// Lookups that never see existing accounts, as when two
    /// registrations race past [`ensure_unique`].
    struct StaleLookups(MemoryUserStore);

    #[async_trait::async_trait]
    impl UserStore for StaleLookups {
        async fn create(&self, user: &User) -> Result<(), DbError> {
            self.0.create(user).await
        }
        async fn find_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
            self.0.find_by_id(id).await
        }
        async fn find_by_username(&self, _: &str) -> Result<Option<User>, DbError> {
            Ok(None)
        }
        async fn find_by_email(&self, _: &str) -> Result<Option<User>, DbError> {
            Ok(None)
        }
        async fn list(
            &self,
            query: &works_portal_database_models::ListQuery,
        ) -> Result<works_portal_database_models::Page<User>, DbError> {
            self.0.list(query).await
        }
        async fn update(&self, user: &User) -> Result<bool, DbError> {
            self.0.update(user).await
        }
        async fn delete(&self, id: &str) -> Result<bool, DbError> {
            self.0.delete(id).await
        }
    }

    #[tokio::test]
    async fn racing_registrations_conflict_on_the_constraint() {
        let auth = AuthService::new(
            Arc::new(StaleLookups(MemoryUserStore::new())),
            "test-secret",
            DEFAULT_TOKEN_TTL,
        );
        auth.register(register("budi", "budi@example.com")).await.unwrap();

        let err = auth.register(register("budi", "budi@example.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)), "{err:?}");
    }

    #[tokio::test]
    async fn rejects_weak_registration() {
        let err = service()
            .register(ApiRegisterRequest {
                username: "b!".into(),
                email: "nope".into(),
                password: "short".into(),
            })
            .await
            .unwrap_err();
        let ServiceError::Validation(errors) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.entries().len(), 3);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let auth = service();
        auth.register(register("budi", "budi@example.com")).await.unwrap();
        let err = auth
            .login(ApiLoginRequest {
                username: "budi".into(),
                password: "salah-sekali".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[test]
    fn rejects_foreign_and_expired_tokens() {
        let auth = service();
        let now = Utc::now();
        let user = User {
            id: "u1".into(),
            username: "budi".into(),
            email: "budi@example.com".into(),
            password_hash: String::new(),
            role: Role::Superadmin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let other = AuthService::new(Arc::new(MemoryUserStore::new()), "other", DEFAULT_TOKEN_TTL);
        let forged = other.issue(user.clone()).unwrap();
        assert!(auth.verify(&forged.token).is_err());

        let claims = Claims {
            user_id: "u1".into(),
            username: "budi".into(),
            role: Role::Superadmin,
            exp: now.timestamp() - 3_600,
            iat: now.timestamp() - 7_200,
            nbf: now.timestamp() - 7_200,
        };
        let expired = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(auth.verify(&expired), Err(ServiceError::Unauthorized(_))));
        assert!(auth.verify("not-a-token").is_err());

        let valid = auth.issue(user).unwrap();
        assert_eq!(auth.verify(&valid.token).unwrap().role, Role::Superadmin);
    }
}
