// Media Storage - uploaded images under the media root
// Stored paths are relative to the root, e.g. `posts/small.gif`

use image::ImageError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub use image::ImageFormat;

/// Directory (relative to the media root) post images are uploaded to.
pub const POST_IMAGE_DIR: &str = "posts";

/// An uploaded file as received from a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    /// Browsers submit an empty part when no file was chosen.
    pub fn is_empty(&self) -> bool {
        self.file_name.is_empty() && self.data.is_empty()
    }
}

/// Decode `data` completely and return its format. A file whose header
/// looks like an image but whose body does not decode is rejected.
pub fn decode_image(data: &[u8]) -> Result<ImageFormat, ImageError> {
    let format = image::guess_format(data)?;
    image::load_from_memory_with_format(data, format)?;
    Ok(format)
}

/// Keep only the base name and replace anything outside `[A-Za-z0-9._-]`.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// `small.gif` becomes `small_<7 random hex chars>.gif`.
fn with_random_suffix(name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    match name.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, &suffix[..7], ext),
        None => format!("{}_{}", name, &suffix[..7]),
    }
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Store `file` under `dir`, returning the path relative to the media root.
    /// An existing file is never overwritten; a random suffix is appended instead.
    pub async fn save(&self, dir: &str, file: &UploadedFile) -> AppResult<String> {
        let target_dir = self.root.join(dir);
        tokio::fs::create_dir_all(&target_dir).await.map_err(|e| {
            AppError::Io(format!("Failed to create {}: {}", target_dir.display(), e))
        })?;

        let base = sanitize_file_name(&file.file_name);
        let mut name = base.clone();
        let mut handle = loop {
            let open = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(target_dir.join(&name))
                .await;
            match open {
                Ok(handle) => break handle,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => name = with_random_suffix(&base),
                Err(e) => return Err(e.into()),
            }
        };
        handle.write_all(&file.data).await?;
        handle.flush().await?;

        let stored = format!("{}/{}", dir, name);
        info!("Stored upload {} ({} bytes)", stored, file.data.len());
        Ok(stored)
    }

    pub async fn read(&self, name: &str) -> AppResult<Vec<u8>> {
        Ok(tokio::fs::read(self.path(name)).await?)
    }
}

/// A 2x1 GIF.
#[cfg(test)]
pub(crate) const SMALL_GIF: &[u8] = b"\x47\x49\x46\x38\x39\x61\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\
\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\
\x0A\x00\x3B";
