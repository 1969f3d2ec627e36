//! Process configuration read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `APP_ENV` | `development` |
//! | `APP_PORT` | `8080` |
//! | `APP_ALLOWED_ORIGINS` | `*` (comma-separated list) |
//! | `APP_REQUEST_TIMEOUT_SECS` | `10` |
//! | `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME` | `localhost`, `5432`, `postgres`, empty, `works_portal` |
//! | `REDIS_HOST`, `REDIS_PORT`, `REDIS_PASSWORD`, `REDIS_DB` | `localhost`, `6379`, none, `0` |
//! | `MINIO_ENDPOINT`, `MINIO_ACCESS_KEY`, `MINIO_SECRET_KEY`, `MINIO_USE_SSL`, `MINIO_BUCKET_NAME`, `MINIO_PUBLIC_URL` | `localhost:9000`, `minioadmin`, `minioadmin`, `false`, `works-portal`, endpoint |
//! | `JWT_SECRET` | required when `APP_ENV=production` |
//! | `JWT_EXPIRY_HOURS` | `24` |

use std::str::FromStr;
use std::time::Duration;

use works_portal_cache::RedisConfig;
use works_portal_database::db::DbConfig;
use works_portal_storage::S3Config;

const DEVELOPMENT_SECRET: &str = "works-portal-development-secret";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub env: String,
    pub port: u16,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub request_timeout: Duration,
    pub db: DbConfig,
    pub redis: RedisConfig,
    pub s3: S3Config,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn text(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        self.raw(name).map_or(Ok(default), |value| {
            value
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
    }

    fn flag(&self, name: &'static str) -> Result<bool, ConfigError> {
        match self.raw(name).map(|v| v.to_lowercase()).as_deref() {
            None | Some("false" | "0" | "no") => Ok(false),
            Some("true" | "1" | "yes") => Ok(true),
            Some(other) => Err(ConfigError::Invalid {
                name,
                value: other.to_string(),
            }),
        }
    }
}

impl Config {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Invalid`] for an unparseable number or flag
    /// * [`ConfigError::Missing`] if `JWT_SECRET` is unset in production
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup };

        let app_env = env.text("APP_ENV", "development").to_lowercase();
        let jwt_secret = match env.raw("JWT_SECRET") {
            Some(secret) => secret,
            None if app_env == "production" => return Err(ConfigError::Missing("JWT_SECRET")),
            None => {
                log::warn!("JWT_SECRET is not set; using the development secret");
                DEVELOPMENT_SECRET.to_string()
            }
        };

        let allowed_origins = env
            .text("APP_ALLOWED_ORIGINS", "*")
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty() && *o != "*")
            .map(str::to_string)
            .collect();

        Ok(Self {
            port: env.parse("APP_PORT", 8080)?,
            allowed_origins,
            request_timeout: Duration::from_secs(env.parse("APP_REQUEST_TIMEOUT_SECS", 10)?),
            db: DbConfig {
                host: env.text("DB_HOST", "localhost"),
                port: env.parse("DB_PORT", 5432)?,
                user: env.text("DB_USER", "postgres"),
                password: env.text("DB_PASSWORD", ""),
                name: env.text("DB_NAME", "works_portal"),
            },
            redis: RedisConfig {
                host: env.text("REDIS_HOST", "localhost"),
                port: env.parse("REDIS_PORT", 6379)?,
                password: env.raw("REDIS_PASSWORD"),
                db: env.parse("REDIS_DB", 0)?,
            },
            s3: S3Config {
                endpoint: env.text("MINIO_ENDPOINT", "localhost:9000"),
                access_key: env.text("MINIO_ACCESS_KEY", "minioadmin"),
                secret_key: env.text("MINIO_SECRET_KEY", "minioadmin"),
                use_ssl: env.flag("MINIO_USE_SSL")?,
                bucket: env.text("MINIO_BUCKET_NAME", "works-portal"),
                public_url: env.text("MINIO_PUBLIC_URL", ""),
            },
            jwt_secret,
            jwt_ttl: Duration::from_secs(env.parse::<u64>("JWT_EXPIRY_HOURS", 24)? * 3_600),
            env: app_env,
        })
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}
