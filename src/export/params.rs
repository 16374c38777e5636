//! Export constants and the format/quality value types.
//!
//! - [`ExportFormat`]: png, jpg or webp; also the file extension.
//! - [`Quality`]: lossy quality as a fraction in `[0, 1]`, clamped on construction.
//!
//! The export scale and byte budget are fixed, not configurable.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device pixels per logical canvas pixel in an export render.
pub const EXPORT_SCALE: f64 = 4.0;

/// Byte budget an export tries to stay under (15 MiB).
pub const MAX_EXPORT_BYTES: usize = 15 * 1024 * 1024;

/// First quality tried by the lossy search.
pub const QUALITY_CEILING: f64 = 0.98;

/// Fixed lower bound of the lossy search.
pub const QUALITY_FLOOR: f64 = 0.1;

/// Quality used when an oversized PNG is re-encoded as JPEG.
pub const PNG_FALLBACK_QUALITY: f64 = 0.95;

/// The search stops once the remaining interval is this narrow.
pub const QUALITY_RESOLUTION: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    #[default]
    Jpg,
    Webp,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
            ExportFormat::Webp => "webp",
        }
    }

    /// Whether a quality setting changes the encoded size.
    pub fn is_lossy(self) -> bool {
        !matches!(self, ExportFormat::Png)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            "webp" => Ok(ExportFormat::Webp),
            other => Err(format!("unsupported export format: {other} (expected png, jpg or webp)")),
        }
    }
}

/// Lossy encoding quality in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f64);

impl Quality {
    pub fn new(value: f64) -> Self {
        Self(if value.is_nan() { QUALITY_CEILING } else { value.clamp(0.0, 1.0) })
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// The 1–100 scale encoders take.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(QUALITY_CEILING)
    }
}
