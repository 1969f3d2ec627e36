#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Object storage for report photos.
//!
//! Objects live in one world-readable bucket, one folder per domain, under
//! `<folder>/<uuid><ext>`. The public URL of an object is always
//! `<public base>/<bucket>/<key>`, so [`ObjectStore::delete`] can recover
//! the key from a URL stored on a photo row.
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |---|---|
//! | `MINIO_ENDPOINT` | `host:port` of the S3-compatible endpoint |
//! | `MINIO_ACCESS_KEY` / `MINIO_SECRET_KEY` | Static credentials |
//! | `MINIO_USE_SSL` | `true` to connect over HTTPS |
//! | `MINIO_BUCKET_NAME` | Bucket receiving every photo |
//! | `MINIO_PUBLIC_URL` | Base of public URLs; defaults to the endpoint |

pub mod memory;
pub mod s3;

use async_trait::async_trait;

pub use memory::MemoryObjectStore;
pub use s3::{S3Config, S3ObjectStore};

/// Largest accepted photo, in bytes.
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Content types accepted for photos.
pub const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Errors that can occur during object-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Content type outside [`ALLOWED_CONTENT_TYPES`].
    #[error("Unsupported content type: {content_type}")]
    UnsupportedContentType {
        /// Rejected content type.
        content_type: String,
    },

    /// Body larger than [`MAX_PHOTO_BYTES`].
    #[error("Object too large: {size} bytes")]
    TooLarge {
        /// Body size in bytes.
        size: usize,
    },

    /// URL does not point into this store's bucket.
    #[error("URL is not served by this store: {url}")]
    ForeignUrl {
        /// Offending URL.
        url: String,
    },

    /// Bucket creation or policy update failed.
    #[error("Failed to prepare bucket {bucket}: {source}")]
    Bucket {
        /// Bucket name.
        bucket: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// S3 `PutObject` failed.
    #[error("Failed to upload {bucket}/{key}: {source}")]
    Upload {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// S3 `DeleteObject` failed.
    #[error("Failed to delete {bucket}/{key}: {source}")]
    Delete {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StorageError {
    /// `<bucket>/<key>` of the object a failed upload or delete targeted.
    #[must_use]
    pub fn object_path(&self) -> Option<String> {
        match self {
            Self::Upload { bucket, key, .. } | Self::Delete { bucket, key, .. } => {
                Some(format!("{bucket}/{key}"))
            }
            _ => None,
        }
    }
}

/// Media store whose objects are publicly readable by URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under a fresh key in `folder` and returns its public
    /// URL.
    async fn upload(
        &self,
        body: Vec<u8>,
        content_type: &str,
        folder: &str,
    ) -> Result<String, StorageError>;

    /// Deletes the object behind a URL previously returned by
    /// [`ObjectStore::upload`]. Deleting a missing object succeeds.
    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

/// File extension for an accepted content type. Parameters such as
/// `; charset=binary` are ignored.
///
/// # Errors
///
/// Returns [`StorageError::UnsupportedContentType`] for anything other
/// than JPEG or PNG.
pub fn extension_for(content_type: &str) -> Result<&'static str, StorageError> {
    let essence = content_type.split(';').next().unwrap_or_default();
    match essence.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => Ok(".jpg"),
        "image/png" => Ok(".png"),
        _ => Err(StorageError::UnsupportedContentType {
            content_type: content_type.to_string(),
        }),
    }
}

/// Checks content type and size before anything is written.
///
/// # Errors
///
/// Returns [`StorageError::UnsupportedContentType`] or
/// [`StorageError::TooLarge`].
pub fn check_photo(content_type: &str, size: usize) -> Result<&'static str, StorageError> {
    let ext = extension_for(content_type)?;
    if size > MAX_PHOTO_BYTES {
        return Err(StorageError::TooLarge { size });
    }
    Ok(ext)
}

/// `<folder>/<random uuid><ext>`
#[must_use]
pub fn object_key(folder: &str, ext: &str) -> String {
    format!("{}/{}{ext}", folder.trim_matches('/'), uuid::Uuid::new_v4())
}

/// `<public base>/<bucket>/<key>`
#[must_use]
pub fn public_url(public_base: &str, bucket: &str, key: &str) -> String {
    format!("{}/{bucket}/{key}", public_base.trim_end_matches('/'))
}

/// Inverse of [`public_url`].
///
/// # Errors
///
/// Returns [`StorageError::ForeignUrl`] if `url` is not under
/// `<public base>/<bucket>/`.
pub fn key_from_url<'a>(
    public_base: &str,
    bucket: &str,
    url: &'a str,
) -> Result<&'a str, StorageError> {
    let prefix = format!("{}/{bucket}/", public_base.trim_end_matches('/'));
    url.strip_prefix(&prefix)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| StorageError::ForeignUrl {
            url: url.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_jpeg_and_png() {
        assert_eq!(extension_for("image/jpeg").unwrap(), ".jpg");
        assert_eq!(extension_for("IMAGE/PNG").unwrap(), ".png");
        assert_eq!(extension_for("image/jpeg; charset=binary").unwrap(), ".jpg");
        assert!(check_photo("image/png ;name=a.png", 1).is_ok());
        assert!(matches!(
            extension_for("image/gif"),
            Err(StorageError::UnsupportedContentType { .. })
        ));
    }

    #[test]
    fn failed_transfers_name_their_object() {
        let err = StorageError::Delete {
            bucket: "works-portal".into(),
            key: "bina-marga/a.jpg".into(),
            source: "refused".into(),
        };
        assert_eq!(err.object_path().as_deref(), Some("works-portal/bina-marga/a.jpg"));
        assert_eq!(StorageError::TooLarge { size: 1 }.object_path(), None);
    }

    #[test]
    fn rejects_photos_over_ten_mebibytes() {
        assert!(check_photo("image/png", MAX_PHOTO_BYTES).is_ok());
        assert!(matches!(
            check_photo("image/png", MAX_PHOTO_BYTES + 1),
            Err(StorageError::TooLarge { .. })
        ));
    }

    #[test]
    fn keys_are_unique_within_a_folder() {
        let a = object_key("bina-marga", ".jpg");
        let b = object_key("bina-marga", ".jpg");
        assert_ne!(a, b);
        assert!(a.starts_with("bina-marga/"));
        assert!(a.ends_with(".jpg"));
    }

    #[test]
    fn url_and_key_are_inverse() {
        let url = public_url("http://cdn.local/", "works-portal", "reports/x.png");
        assert_eq!(url, "http://cdn.local/works-portal/reports/x.png");
        assert_eq!(
            key_from_url("http://cdn.local", "works-portal", &url).unwrap(),
            "reports/x.png"
        );
        assert!(key_from_url("http://cdn.local", "other", &url).is_err());
    }
}
