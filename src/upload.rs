//! Upload collaborators: validation, pre-upload compression, storage, and
//! per-asset progress tracking.
//!
//! Compression and storage sit behind the [`Compressor`] and [`Uploader`]
//! traits. The bundled implementations keep everything on the local disk:
//! [`PassThrough`] hands the file on unchanged and [`LocalUploader`] copies it
//! into the asset directory.
//!
//! ## Progress
//!
//! A single 0–100 figure per asset: compression occupies 0–70 and the upload
//! 70–100. The remap lives here, at the boundary; the collaborators report
//! their own 0–100.

use crate::naming::asset_relative_path;
use crate::types::AssetKind;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// Largest file accepted before compression (100 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Raster formats that can be decoded for the canvas.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Share of the progress bar given to compression.
const COMPRESSION_SHARE: u32 = 70;

/// A file refused before any upstream work.
#[derive(Error, Debug, PartialEq)]
pub enum UploadRejection {
    #[error("{}: not a supported image (jpg, png or webp)", .0.display())]
    UnsupportedType(PathBuf),
    #[error("{}: {size} bytes exceeds the {limit} byte limit", .path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    #[error("{}: cannot read file", .0.display())]
    Unreadable(PathBuf),
}

/// Compression, storage or registry failure.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Registry error: {0}")]
    Registry(#[from] crate::registry::RegistryError),
    #[error("{0}")]
    Failed(String),
}

/// Why one item of a batch did not make it into the library.
#[derive(Error, Debug)]
pub enum UploadFailure {
    #[error(transparent)]
    Rejected(#[from] UploadRejection),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Whether `path` has one of the [`SUPPORTED_EXTENSIONS`], in any case.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Check type and size; returns the file size in bytes.
pub fn validate_upload(path: &Path) -> Result<u64, UploadRejection> {
    if !is_supported_image(path) {
        return Err(UploadRejection::UnsupportedType(path.to_path_buf()));
    }
    let size = std::fs::metadata(path)
        .map_err(|_| UploadRejection::Unreadable(path.to_path_buf()))?
        .len();
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(size)
}

/// Expand directories into the supported images beneath them, sorted by
/// path. Plain files are kept as given so validation can report them.
pub fn collect_uploads(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        files.extend(
            WalkDir::new(path)
                .follow_links(true)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .filter(|p| is_supported_image(p)),
        );
    }
    files
}

// =========================================================================
// Compression
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Compressed {
    /// File to upload; may be the original.
    pub path: PathBuf,
    pub original_size: u64,
    pub compressed_size: u64,
}

pub trait Compressor: Sync {
    /// `progress` receives 0–100.
    fn compress(&self, path: &Path, progress: &mut dyn FnMut(u8)) -> Result<Compressed, UpstreamError>;
}

/// Leaves every file as it is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Compressor for PassThrough {
    fn compress(&self, path: &Path, progress: &mut dyn FnMut(u8)) -> Result<Compressed, UpstreamError> {
        let size = std::fs::metadata(path)?.len();
        progress(100);
        Ok(Compressed {
            path: path.to_path_buf(),
            original_size: size,
            compressed_size: size,
        })
    }
}

// =========================================================================
// Storage
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub url: String,
    /// Handle for [`Uploader::delete`].
    pub public_id: String,
    pub width: u32,
    pub height: u32,
}

pub trait Uploader: Sync {
    /// `progress` receives 0–100.
    fn upload(
        &self,
        file: &Path,
        kind: AssetKind,
        asset_id: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<UploadReceipt, UpstreamError>;

    fn delete(&self, public_id: &str) -> Result<(), UpstreamError>;
}

/// Stores uploads as `<asset_dir>/<kind>s/<id>.<ext>`.
///
/// The receipt's URL and public id are both the path relative to the asset
/// directory, which is what [`AssetStore`](crate::assets::AssetStore)
/// resolves against.
#[derive(Debug, Clone)]
pub struct LocalUploader {
    asset_dir: PathBuf,
}

impl LocalUploader {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
        }
    }
}

impl Uploader for LocalUploader {
    fn upload(
        &self,
        file: &Path,
        kind: AssetKind,
        asset_id: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<UploadReceipt, UpstreamError> {
        let (width, height) = image::image_dimensions(file)?;
        let relative = asset_relative_path(kind, asset_id, file);
        let dest = self.asset_dir.join(&relative);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(file, &dest)?;
        progress(100);
        debug!(source = %file.display(), dest = %dest.display(), "asset stored");

        let key = relative.to_string_lossy().replace('\\', "/");
        Ok(UploadReceipt {
            url: key.clone(),
            public_id: key,
            width,
            height,
        })
    }

    fn delete(&self, public_id: &str) -> Result<(), UpstreamError> {
        let path = self.asset_dir.join(public_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =========================================================================
// Progress
// =========================================================================

/// Overall progress when compression reports `pct`.
pub fn compression_progress(pct: u8) -> u8 {
    (u32::from(pct.min(100)) * COMPRESSION_SHARE / 100) as u8
}

/// Overall progress when the upload reports `pct`.
pub fn upload_progress(pct: u8) -> u8 {
    (COMPRESSION_SHARE + u32::from(pct.min(100)) * (100 - COMPRESSION_SHARE) / 100) as u8
}

/// In-flight uploads keyed by asset id, 0–100 each.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressMap {
    entries: BTreeMap<String, u8>,
}

impl ProgressMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &str) {
        self.entries.insert(id.to_string(), 0);
    }

    /// Progress never moves backwards.
    pub fn update(&mut self, id: &str, pct: u8) {
        let entry = self.entries.entry(id.to_string()).or_insert(0);
        *entry = (*entry).max(pct.min(100));
    }

    pub fn remove(&mut self, id: &str) -> Option<u8> {
        self.entries.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<u8> {
        self.entries.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
