//! Binds a multipart submission into a [`Form`] and its photo parts.

use actix_multipart::{Field, Multipart};
use futures::TryStreamExt as _;
use works_portal_service::{Form, PhotoUpload};
use works_portal_storage::MAX_PHOTO_BYTES;

use crate::error::ApiError;

/// Part names carrying images. Any part with a filename is also treated as
/// a photo.
const PHOTO_FIELDS: &[&str] = &["photos", "photos[]", "photo", "files", "files[]"];

/// Text parts longer than this are rejected.
const MAX_TEXT_BYTES: usize = 64 * 1024;

/// Photo parts accepted per submission. Bounds buffering to
/// `MAX_PHOTOS * MAX_PHOTO_BYTES`.
pub const MAX_PHOTOS: usize = 10;

/// Text parts accepted per submission.
const MAX_TEXT_PARTS: usize = 128;

fn malformed(e: impl std::fmt::Display) -> ApiError {
    ApiError::invalid("multipart", format!("malformed: {e}"))
}

/// Reads every part of `payload`. Oversized photos are truncated just past
/// the limit so the size rule still rejects them without buffering the
/// whole body.
///
/// # Errors
///
/// Returns a `400` for a malformed body, a non-UTF-8 or oversized text
/// part, and as soon as a part past [`MAX_PHOTOS`] or `MAX_TEXT_PARTS`
/// arrives.
pub async fn read_submission(mut payload: Multipart) -> Result<(Form, Vec<PhotoUpload>), ApiError> {
    let mut form = Form::new();
    let mut photos = Vec::new();
    let mut text_parts = 0_usize;

    while let Some(field) = payload.try_next().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        if filename.is_some() || PHOTO_FIELDS.contains(&name.as_str()) {
            if photos.len() == MAX_PHOTOS {
                return Err(ApiError::invalid("photos", format!("max={MAX_PHOTOS}")));
            }
            let content_type = field
                .content_type()
                .map_or_else(|| "application/octet-stream".to_string(), ToString::to_string);
            let body = read_capped(field, MAX_PHOTO_BYTES + 1).await?;
            photos.push(PhotoUpload::new(
                filename.unwrap_or_else(|| name.clone()),
                content_type,
                body,
            ));
        } else {
            text_parts += 1;
            if text_parts > MAX_TEXT_PARTS {
                return Err(ApiError::invalid("multipart", format!("max_parts={MAX_TEXT_PARTS}")));
            }
            let body = read_capped(field, MAX_TEXT_BYTES + 1).await?;
            if body.len() > MAX_TEXT_BYTES {
                return Err(ApiError::invalid(&name, "max_length"));
            }
            let value = String::from_utf8(body).map_err(|_| ApiError::invalid(&name, "utf8"))?;
            form.insert(&name, value);
        }
    }

    Ok((form, photos))
}

/// Buffers at most `cap` bytes and drains the rest.
async fn read_capped(mut field: Field, cap: usize) -> Result<Vec<u8>, ApiError> {
    let mut body = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        let room = cap.saturating_sub(body.len());
        body.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }
    Ok(body)
}
