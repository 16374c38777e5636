//! Fit an encoded export under a byte budget.
//!
//! - **png**: one lossless encode. If it is over budget the format is
//!   switched to jpg at quality 0.95; there is no second search.
//! - **jpg / webp**: start at quality 0.98. While the output is over budget
//!   and the quality is still more than 0.01 above the 0.1 floor, retry at the
//!   midpoint of `[0.1, current]`. That is at most seven retries.
//!
//! The last encode is returned even when it is still over budget; the caller
//! learns that from [`FittedExport::within_budget`].

use super::encoder::{EncodeError, Encoder};
use super::params::{
    ExportFormat, PNG_FALLBACK_QUALITY, QUALITY_CEILING, QUALITY_FLOOR, QUALITY_RESOLUTION, Quality,
};
use crate::canvas::raster::Surface;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct FittedExport {
    pub bytes: Vec<u8>,
    /// Format actually produced; png may come back as jpg.
    pub format: ExportFormat,
    /// Quality of the final encode; `None` for lossless png.
    pub quality: Option<Quality>,
    /// Number of quality reductions after the first encode.
    pub iterations: u32,
    pub within_budget: bool,
}

impl FittedExport {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

pub fn fit_to_budget(
    encoder: &impl Encoder,
    surface: &Surface,
    format: ExportFormat,
    budget: usize,
) -> Result<FittedExport, EncodeError> {
    match format {
        ExportFormat::Png => fit_png(encoder, surface, budget),
        ExportFormat::Jpg | ExportFormat::Webp => search_quality(encoder, surface, format, budget),
    }
}

fn fit_png(encoder: &impl Encoder, surface: &Surface, budget: usize) -> Result<FittedExport, EncodeError> {
    let bytes = encoder.encode(surface, ExportFormat::Png, Quality::default())?;
    if bytes.len() <= budget {
        return Ok(FittedExport {
            bytes,
            format: ExportFormat::Png,
            quality: None,
            iterations: 0,
            within_budget: true,
        });
    }

    info!(size = bytes.len(), budget, "png over budget, falling back to jpg");
    let quality = Quality::new(PNG_FALLBACK_QUALITY);
    let bytes = encoder.encode(surface, ExportFormat::Jpg, quality)?;
    let within_budget = bytes.len() <= budget;
    Ok(FittedExport {
        bytes,
        format: ExportFormat::Jpg,
        quality: Some(quality),
        iterations: 0,
        within_budget,
    })
}

fn search_quality(
    encoder: &impl Encoder,
    surface: &Surface,
    format: ExportFormat,
    budget: usize,
) -> Result<FittedExport, EncodeError> {
    let mut quality = QUALITY_CEILING;
    let mut bytes = encoder.encode(surface, format, Quality::new(quality))?;
    let mut iterations = 0;

    while bytes.len() > budget && quality - QUALITY_FLOOR > QUALITY_RESOLUTION {
        let upper = quality;
        quality = (QUALITY_FLOOR + upper) / 2.0;
        iterations += 1;
        debug!(quality, previous_size = bytes.len(), "retrying at lower quality");
        bytes = encoder.encode(surface, format, Quality::new(quality))?;
    }

    let within_budget = bytes.len() <= budget;
    if !within_budget {
        info!(size = bytes.len(), budget, "export still over budget at lowest quality");
    }
    Ok(FittedExport {
        bytes,
        format,
        quality: Some(Quality::new(quality)),
        iterations,
        within_budget,
    })
}
