//! Incoming photo parts.

use works_portal_storage::{StorageError, check_photo};

use crate::ValidationErrors;

/// One image part of a multipart submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub filename: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl PhotoUpload {
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            body,
        }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.body.len()
    }
}

/// Checks count, media type and size of every photo before anything is
/// uploaded.
pub fn check_photos(errors: &mut ValidationErrors, photos: &[PhotoUpload], min_count: usize) {
    if photos.len() < min_count {
        errors.push("photos", format!("min={min_count}"));
    }

    for photo in photos {
        match check_photo(&photo.content_type, photo.size()) {
            Ok(_) => {}
            Err(StorageError::TooLarge { .. }) => {
                errors.push("photos", format!("max_size ({})", photo.filename));
            }
            Err(_) => {
                errors.push("photos", format!("content_type ({})", photo.filename));
            }
        }
    }
}
