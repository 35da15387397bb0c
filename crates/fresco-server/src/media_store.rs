//! Image files on disk, grouped into named buckets (`posts`, `profile`).
//!
//! The database stores relative paths (`posts/1712345_ab12cd34.jpg`); URLs
//! are derived from those paths at serialization time.  Uploads are written
//! before the owning row is committed, and the caller removes the file again
//! when the row write fails.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;

/// Bucket for post images.
pub const POSTS_BUCKET: &str = "posts";
/// Bucket for profile pictures.
pub const PROFILE_BUCKET: &str = "profile";

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Verify that a resolved path stays within the expected base directory.
/// Prevents path traversal attacks.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, ApiError> {
    // Canonicalize base; target may not exist yet so normalize manually
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let mut resolved = canonical_base.clone();
    for component in target
        .strip_prefix(&canonical_base)
        .unwrap_or(target)
        .components()
    {
        match component {
            std::path::Component::Normal(c) => resolved.push(c),
            std::path::Component::ParentDir => {
                return Err(ApiError::BadState("Path traversal detected".to_string()));
            }
            _ => {} // RootDir, CurDir, Prefix — skip
        }
    }
    if !resolved.starts_with(&canonical_base) {
        return Err(ApiError::BadState("Path traversal detected".to_string()));
    }
    Ok(resolved)
}

/// Extract a lowercased, allow-listed image extension from an uploaded
/// filename.
pub fn image_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Content type for a stored image, from its extension.
pub fn content_type_for(filename: &str) -> &'static str {
    match Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    base_path: PathBuf,
    max_size: usize,
}

impl MediaStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ApiError> {
        for bucket in [POSTS_BUCKET, PROFILE_BUCKET] {
            let dir = base_path.join(bucket);
            fs::create_dir_all(&dir).await.map_err(|e| {
                ApiError::Storage(format!(
                    "Failed to create media directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        info!(path = %base_path.display(), "Media store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Store an uploaded image under `bucket` and return its relative path
    /// (`bucket/filename`).  The filename is time-prefixed with a random
    /// suffix so concurrent uploads in the same second cannot collide.
    pub async fn store_image(
        &self,
        bucket: &str,
        discriminator: &str,
        ext: &str,
        data: &[u8],
    ) -> Result<String, ApiError> {
        if data.is_empty() {
            return Err(ApiError::Storage("Empty image upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ApiError::field(
                "image",
                "The image may not be greater than 2048 kilobytes.",
            ));
        }

        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        let filename = if discriminator.is_empty() {
            format!("{}_{}.{}", chrono::Utc::now().timestamp(), suffix, ext)
        } else {
            format!(
                "{}_{}_{}.{}",
                chrono::Utc::now().timestamp(),
                discriminator,
                suffix,
                ext
            )
        };

        let path = self.safe_path(bucket, &filename)?;
        fs::write(&path, data).await.map_err(|e| {
            ApiError::Storage(format!("Failed to write image {}: {}", filename, e))
        })?;

        debug!(bucket, %filename, size = data.len(), "Stored image");
        Ok(format!("{bucket}/{filename}"))
    }

    /// Read a stored image back for serving.
    pub async fn read_image(&self, bucket: &str, filename: &str) -> Result<Vec<u8>, ApiError> {
        let path = self.safe_path(bucket, filename)?;

        if !path.exists() {
            return Err(ApiError::NotFound("Image not found".to_string()));
        }

        fs::read(&path)
            .await
            .map_err(|e| ApiError::Storage(format!("Failed to read image {}: {}", filename, e)))
    }

    /// Delete a stored image by its relative path.  A file that is already
    /// gone is not an error; the row referencing it has priority.
    pub async fn delete_image(&self, rel_path: &str) -> Result<(), ApiError> {
        let (bucket, filename) = rel_path
            .split_once('/')
            .ok_or_else(|| ApiError::Storage(format!("Malformed image path: {rel_path}")))?;
        let path = self.safe_path(bucket, filename)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%rel_path, "Deleted image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Storage(format!(
                "Failed to delete image {}: {}",
                rel_path, e
            ))),
        }
    }

    /// Build a safe path for a file inside a bucket.
    fn safe_path(&self, bucket: &str, filename: &str) -> Result<PathBuf, ApiError> {
        // Reject any path separator or traversal characters in inputs
        if bucket.contains('/')
            || bucket.contains('\\')
            || bucket.contains("..")
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(ApiError::BadState("Path traversal detected".to_string()));
        }
        let target = self.base_path.join(bucket).join(filename);
        ensure_within(&self.base_path, &target)
    }
}
