//! # MediaService
//!
//! Validates uploads, stores the bytes through the `MediaStorage` port and
//! records a `Media` row for each file.

use bytes::Bytes;
use chrono::Utc;
use domains::{DomainError, Media, MediaId, MediaRepo, MediaStorage, NewMedia, Result};
use std::io::Cursor;
use std::sync::Arc;
use uuid::Uuid;

/// Content types accepted for upload.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/avif",
    "image/svg+xml",
    "video/mp4",
    "video/webm",
    "audio/mpeg",
    "audio/ogg",
    "application/pdf",
];

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct MediaPolicy {
    pub max_upload_bytes: u64,
}

impl Default for MediaPolicy {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
    pub alt: Option<String>,
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

/// Resolves the effective mime type: the declared one unless it is missing
/// or generic, in which case it is guessed from the file name.
fn resolve_mime(upload: &Upload) -> Option<String> {
    let declared = upload
        .content_type
        .as_deref()
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .filter(|m| *m != mime::APPLICATION_OCTET_STREAM);

    declared
        .or_else(|| mime_guess::from_path(&upload.original_name).first())
        .map(|m| m.essence_str().to_string())
}

/// Best-effort pixel dimensions of raster images.
fn probe_dimensions(mime: &str, data: &[u8]) -> Option<(i64, i64)> {
    if !mime.starts_with("image/") || mime == "image/svg+xml" {
        return None;
    }
    let (w, h) = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()?;
    Some((i64::from(w), i64::from(h)))
}

/// Last path component of a client-supplied name, capped in length.
fn sanitize_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let base = if base.is_empty() { "upload" } else { base };
    base.chars().take(255).collect()
}

pub struct MediaService {
    media: Arc<dyn MediaRepo>,
    storage: Arc<dyn MediaStorage>,
    policy: MediaPolicy,
}

impl MediaService {
    pub fn new(
        media: Arc<dyn MediaRepo>,
        storage: Arc<dyn MediaStorage>,
        policy: MediaPolicy,
    ) -> Self {
        Self {
            media,
            storage,
            policy,
        }
    }

    pub async fn upload(&self, upload: Upload) -> Result<Media> {
        if upload.data.is_empty() {
            return Err(DomainError::validation("uploaded file is empty"));
        }
        let size = upload.data.len() as u64;
        if size > self.policy.max_upload_bytes {
            return Err(DomainError::validation(format!(
                "file is {size} bytes, the limit is {} bytes",
                self.policy.max_upload_bytes
            )));
        }

        let mime = resolve_mime(&upload)
            .filter(|m| ALLOWED_MIME_TYPES.contains(&m.as_str()))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unsupported file type for '{}'",
                    upload.original_name
                ))
            })?;

        let now = Utc::now();
        let filename = format!("{}.{}", Uuid::new_v4(), extension_for(&mime));
        let key = format!("media/{}/{}", now.format("%Y/%m"), filename);
        let dimensions = probe_dimensions(&mime, &upload.data);

        self.storage
            .put_object(&key, upload.data.clone(), &mime)
            .await?;

        let record = NewMedia {
            filename,
            original_name: sanitize_name(&upload.original_name),
            mime_type: mime,
            size: upload.data.len() as i64,
            r2_key: key.clone(),
            width: dimensions.map(|d| d.0),
            height: dimensions.map(|d| d.1),
            alt: upload.alt.filter(|a| !a.trim().is_empty()),
            created_at: now,
        };

        match self.media.insert_media(record).await {
            Ok(media) => {
                tracing::info!(media_id = media.id, key = %media.r2_key, size = media.size, "media uploaded");
                Ok(media)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete_object(&key).await {
                    tracing::warn!(key = %key, error = %cleanup, "failed to remove orphaned upload");
                }
                Err(e)
            }
        }
    }

    pub async fn get(&self, id: MediaId) -> Result<Media> {
        self.media
            .get_media(id)
            .await?
            .ok_or_else(|| DomainError::not_found("media", id))
    }

    pub async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Media>> {
        self.media.list_media(limit.clamp(1, 100), offset).await
    }

    /// Removes the stored object, then the record.
    pub async fn delete(&self, id: MediaId) -> Result<()> {
        let media = self.get(id).await?;
        self.storage.delete_object(&media.r2_key).await?;
        self.media.delete_media(id).await?;
        tracing::info!(media_id = id, key = %media.r2_key, "media deleted");
        Ok(())
    }

    pub fn url(&self, media: &Media) -> String {
        self.storage.public_url(&media.r2_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{MockMediaRepo, MockMediaStorage};

    fn png_bytes() -> Bytes {
        let img = image::RgbImage::new(3, 2);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        Bytes::from(out.into_inner())
    }

    fn upload(name: &str, content_type: Option<&str>, data: Bytes) -> Upload {
        Upload {
            original_name: name.into(),
            content_type: content_type.map(str::to_string),
            data,
            alt: None,
        }
    }

    fn stored(new: NewMedia) -> Media {
        Media {
            id: 1,
            filename: new.filename,
            original_name: new.original_name,
            mime_type: new.mime_type,
            size: new.size,
            r2_key: new.r2_key,
            width: new.width,
            height: new.height,
            alt: new.alt,
            created_at: new.created_at,
        }
    }

    #[tokio::test]
    async fn image_upload_is_stored_with_dimensions() {
        let mut storage = MockMediaStorage::new();
        storage
            .expect_put_object()
            .withf(|key, _, ct| key.starts_with("media/") && key.ends_with(".png") && ct == "image/png")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut repo = MockMediaRepo::new();
        repo.expect_insert_media().returning(|m| Ok(stored(m)));

        let svc = MediaService::new(Arc::new(repo), Arc::new(storage), MediaPolicy::default());
        let media = svc
            .upload(upload("C:\\photos\\cat.png", None, png_bytes()))
            .await
            .unwrap();
        assert_eq!(media.original_name, "cat.png");
        assert_eq!((media.width, media.height), (Some(3), Some(2)));
    }

    #[tokio::test]
    async fn oversized_and_unsupported_uploads_are_rejected() {
        let mut storage = MockMediaStorage::new();
        storage.expect_put_object().never();
        let svc = MediaService::new(
            Arc::new(MockMediaRepo::new()),
            Arc::new(storage),
            MediaPolicy { max_upload_bytes: 4 },
        );

        let too_big = svc
            .upload(upload("a.txt", Some("text/plain"), Bytes::from_static(b"12345")))
            .await;
        assert!(matches!(too_big, Err(DomainError::ValidationError(_))));

        let unsupported = svc
            .upload(upload("a.exe", Some("application/x-msdownload"), Bytes::from_static(b"MZ")))
            .await;
        assert!(matches!(unsupported, Err(DomainError::ValidationError(_))));

        let empty = svc.upload(upload("a.png", None, Bytes::new())).await;
        assert!(matches!(empty, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn failed_insert_removes_stored_object() {
        let mut storage = MockMediaStorage::new();
        storage.expect_put_object().returning(|_, _, _| Ok(()));
        storage.expect_delete_object().times(1).returning(|_| Ok(()));

        let mut repo = MockMediaRepo::new();
        repo.expect_insert_media()
            .returning(|_| Err(DomainError::internal("disk full")));

        let svc = MediaService::new(Arc::new(repo), Arc::new(storage), MediaPolicy::default());
        let result = svc
            .upload(upload("doc.pdf", Some("application/pdf"), Bytes::from_static(b"%PDF-1.7")))
            .await;
        assert!(matches!(result, Err(DomainError::Internal(_))));
    }
}
