//! S3-compatible adapter (MinIO in every deployment so far).

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::{Credentials, StalledStreamProtectionConfig};
use aws_sdk_s3::primitives::ByteStream;

use crate::{ObjectStore, StorageError, check_photo, key_from_url, object_key, public_url};

/// Connection settings for an S3-compatible endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    /// `host:port`, no scheme.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_ssl: bool,
    pub bucket: String,
    /// Base of public URLs. Falls back to the endpoint URL when empty.
    pub public_url: String,
}

impl S3Config {
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{scheme}://{}", self.endpoint)
    }

    #[must_use]
    pub fn public_base(&self) -> String {
        if self.public_url.trim().is_empty() {
            self.endpoint_url()
        } else {
            self.public_url.trim_end_matches('/').to_string()
        }
    }
}

pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base: String,
}

impl S3ObjectStore {
    /// Builds a path-style client for `config`. Does no I/O.
    #[must_use]
    pub fn new(config: &S3Config) -> Self {
        let creds = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "works-portal-static",
        );

        let sdk_config = aws_sdk_s3::Config::builder()
            .endpoint_url(config.endpoint_url())
            .region(Region::new("us-east-1"))
            .credentials_provider(creds)
            .force_path_style(true)
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled())
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(sdk_config),
            bucket: config.bucket.clone(),
            public_base: config.public_base(),
        }
    }

    /// Creates the bucket if it is missing and applies a policy allowing
    /// anonymous `GetObject` on every key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Bucket`] if the bucket cannot be created or
    /// its policy cannot be set.
    pub async fn ensure_bucket(&self) -> Result<(), StorageError> {
        let exists = self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok();

        if !exists {
            log::info!("Creating bucket {}", self.bucket);
            self.client
                .create_bucket()
                .bucket(&self.bucket)
                .send()
                .await
                .map_err(|e| self.bucket_error(e))?;
        }

        self.client
            .put_bucket_policy()
            .bucket(&self.bucket)
            .policy(public_read_policy(&self.bucket))
            .send()
            .await
            .map_err(|e| self.bucket_error(e))?;

        Ok(())
    }

    fn bucket_error(&self, e: impl std::error::Error + Send + Sync + 'static) -> StorageError {
        StorageError::Bucket {
            bucket: self.bucket.clone(),
            source: Box::new(e),
        }
    }
}

fn public_read_policy(bucket: &str) -> String {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "AWS": ["*"] },
            "Action": ["s3:GetObject"],
            "Resource": [format!("arn:aws:s3:::{bucket}/*")],
        }],
    })
    .to_string()
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(
        &self,
        body: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<String, StorageError> {
        let ext = check_photo(content_type, body.len())?;
        let key = object_key(folder, ext);
        let size = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                bucket: self.bucket.clone(),
                key: key.clone(),
                source: Box::new(e),
            })?;

        log::debug!("Uploaded {}/{key} ({size} bytes)", self.bucket);
        Ok(public_url(&self.public_base, &self.bucket, &key))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let key = key_from_url(&self.public_base, &self.bucket, url)?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                source: Box::new(e),
            })?;

        log::debug!("Deleted {}/{key}", self.bucket);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> S3Config {
        S3Config {
            endpoint: "localhost:9000".into(),
            access_key: "minio".into(),
            secret_key: "minio123".into(),
            use_ssl: false,
            bucket: "works-portal".into(),
            public_url: String::new(),
        }
    }

    #[test]
    fn public_base_defaults_to_endpoint() {
        let mut config = config();
        assert_eq!(config.public_base(), "http://localhost:9000");

        config.use_ssl = true;
        config.public_url = "https://cdn.example.go.id/".into();
        assert_eq!(config.endpoint_url(), "https://localhost:9000");
        assert_eq!(config.public_base(), "https://cdn.example.go.id");
    }

    #[test]
    fn policy_grants_anonymous_get_on_whole_bucket() {
        let policy: serde_json::Value =
            serde_json::from_str(&public_read_policy("works-portal")).unwrap();
        let statement = &policy["Statement"][0];
        assert_eq!(statement["Action"][0], "s3:GetObject");
        assert_eq!(statement["Resource"][0], "arn:aws:s3:::works-portal/*");
    }
}
