//! The loaded image library and its decoded-bitmap cache.
//!
//! Bitmaps are located by resolving each image's `url` against the asset
//! directory, decoded in parallel with rayon, and cached by image id. The
//! cache is what the renderer reads through [`BitmapSource`]: an image that
//! is unknown, unresolvable or not yet decoded is simply absent from the
//! frame.
//!
//! ## Frame tokens
//!
//! Each load pass is tagged with a [`FrameToken`]. A completion whose token
//! is older than the latest one still fills the cache (the bitmap is the
//! same either way) but reports [`LoadOutcome::Stale`], telling the host not
//! to repaint a frame that has already been superseded. A completion for an
//! image that has since left the library is dropped.

use crate::canvas::raster::{Bitmap, MAX_SURFACE_SIDE};
use crate::canvas::render::BitmapSource;
use crate::types::{AssetKind, MockupProject, UploadedImage};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Cannot resolve image URL: {0}")]
    Unresolvable(String),
    #[error("Unknown image id: {0}")]
    UnknownImage(String),
    #[error("Image is {0}x{1}; neither side may exceed {max}", max = MAX_SURFACE_SIDE)]
    TooLarge(u32, u32),
}

/// Monotonic id of a render/load pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Cached, and the pass that asked for it is still current.
    Ready,
    /// Cached, but a newer pass has started since.
    Stale,
    Failed,
    /// The image left the library while it was loading; nothing was cached.
    Removed,
}

/// Decode a bitmap from disk.
pub fn decode_bitmap(path: &Path) -> Result<Bitmap, AssetError> {
    let img = image::open(path)?.to_rgba8();
    Bitmap::from_rgba(&img).ok_or(AssetError::TooLarge(img.width(), img.height()))
}

#[derive(Debug, Default)]
pub struct AssetStore {
    asset_dir: PathBuf,
    images: Vec<UploadedImage>,
    bitmaps: HashMap<String, Bitmap>,
    generation: u64,
}

impl AssetStore {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            ..Default::default()
        }
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    /// Replace the library. Cached bitmaps of images no longer present are
    /// dropped.
    pub fn set_images(&mut self, images: Vec<UploadedImage>) {
        self.images = images;
        let ids: BTreeSet<&str> = self.images.iter().map(|i| i.id.as_str()).collect();
        self.bitmaps.retain(|id, _| ids.contains(id.as_str()));
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    pub fn image(&self, id: &str) -> Option<&UploadedImage> {
        self.images.iter().find(|i| i.id == id)
    }

    pub fn of_kind(&self, kind: AssetKind) -> impl Iterator<Item = &UploadedImage> {
        self.images.iter().filter(move |i| i.kind == kind)
    }

    /// Add or replace an image by id.
    pub fn insert(&mut self, image: UploadedImage) {
        self.bitmaps.remove(&image.id);
        match self.images.iter_mut().find(|i| i.id == image.id) {
            Some(slot) => *slot = image,
            None => self.images.push(image),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<UploadedImage> {
        self.bitmaps.remove(id);
        let index = self.images.iter().position(|i| i.id == id)?;
        Some(self.images.remove(index))
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.bitmaps.contains_key(id)
    }

    /// Local file backing `url`, if it has one.
    ///
    /// `file://` URLs and absolute paths are used as-is, relative paths are
    /// taken from the asset directory, other schemes are unresolvable.
    pub fn resolve_path(&self, url: &str) -> Option<PathBuf> {
        if let Some(path) = url.strip_prefix("file://") {
            return Some(PathBuf::from(path));
        }
        if url.contains("://") {
            return None;
        }
        let path = Path::new(url);
        if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            Some(self.asset_dir.join(path))
        }
    }

    /// Start a new pass; earlier tokens become stale.
    pub fn begin_frame(&mut self) -> FrameToken {
        self.generation += 1;
        FrameToken(self.generation)
    }

    pub fn is_current(&self, token: FrameToken) -> bool {
        token.0 == self.generation
    }

    /// Record the result of loading `image_id` for the pass `token`.
    pub fn complete_load(
        &mut self,
        token: FrameToken,
        image_id: &str,
        result: Result<Bitmap, AssetError>,
    ) -> LoadOutcome {
        if self.image(image_id).is_none() {
            debug!(image_id, "image removed before its load finished, dropping bitmap");
            return LoadOutcome::Removed;
        }
        match result {
            Ok(bitmap) => {
                self.bitmaps.insert(image_id.to_string(), bitmap);
                if self.is_current(token) {
                    LoadOutcome::Ready
                } else {
                    debug!(image_id, "load finished after a newer frame started");
                    LoadOutcome::Stale
                }
            }
            Err(e) => {
                warn!(image_id, error = %e, "bitmap load failed");
                LoadOutcome::Failed
            }
        }
    }

    /// Images referenced by `project` that still need decoding, with their
    /// resolved paths. Unknown ids and remote URLs are skipped.
    pub fn pending(&self, project: &MockupProject) -> Vec<(String, PathBuf)> {
        let referenced: BTreeSet<&str> = std::iter::once(project.blank_id.as_str())
            .chain(project.designs.iter().map(|d| d.image_id.as_str()))
            .collect();

        referenced
            .into_iter()
            .filter(|id| !self.bitmaps.contains_key(*id))
            .filter_map(|id| {
                let Some(image) = self.image(id) else {
                    debug!(image_id = id, "referenced image is not in the library");
                    return None;
                };
                let Some(path) = self.resolve_path(&image.url) else {
                    debug!(image_id = id, url = %image.url, "no local file for image");
                    return None;
                };
                Some((id.to_string(), path))
            })
            .collect()
    }

    /// Decode everything `project` needs, in parallel, under a new token.
    pub fn load_project(&mut self, project: &MockupProject) -> (FrameToken, Vec<(String, LoadOutcome)>) {
        let token = self.begin_frame();
        let decoded: Vec<(String, Result<Bitmap, AssetError>)> = self
            .pending(project)
            .into_par_iter()
            .map(|(id, path)| {
                let result = decode_bitmap(&path);
                (id, result)
            })
            .collect();

        let outcomes = decoded
            .into_iter()
            .map(|(id, result)| {
                let outcome = self.complete_load(token, &id, result);
                (id, outcome)
            })
            .collect();
        (token, outcomes)
    }
}

impl BitmapSource for AssetStore {
    fn bitmap(&self, image_id: &str) -> Option<&Bitmap> {
        self.bitmaps.get(image_id)
    }
}
