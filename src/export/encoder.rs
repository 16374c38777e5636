//! Encoder trait behind the size-fitter.
//!
//! The production implementation is
//! [`RustEncoder`](super::rust_encoder::RustEncoder). Tests drive the fitter
//! with a mock whose output size is a function of the requested quality.

use super::params::{ExportFormat, Quality};
use crate::canvas::raster::Surface;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Image encode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("WebP encode failed: {0}")]
    Webp(String),
    #[error("Nothing to encode: surface is {0}x{1}")]
    EmptySurface(u32, u32),
}

/// Turns a rendered surface into file bytes.
///
/// `quality` is ignored by lossless formats.
pub trait Encoder: Sync {
    fn encode(&self, surface: &Surface, format: ExportFormat, quality: Quality) -> Result<Vec<u8>, EncodeError>;
}
