//! High-resolution export.
//!
//! An export is the render pipeline run at [`EXPORT_SCALE`] with no selection
//! chrome, followed by the size-fitter. The result is a byte stream plus a
//! suggested file name; saving it is up to the caller.
//!
//! ## Module Structure
//!
//! ```text
//! export/
//! ├── params.rs        # formats, quality, fixed scale and byte budget
//! ├── encoder.rs       # Encoder trait
//! ├── rust_encoder.rs  # png/jpg/webp via the image crate
//! └── fitter.rs        # quality search under the budget
//! ```

pub mod encoder;
pub mod fitter;
pub mod params;
pub mod rust_encoder;

pub use encoder::{EncodeError, Encoder};
pub use fitter::{FittedExport, fit_to_budget};
pub use params::{EXPORT_SCALE, ExportFormat, MAX_EXPORT_BYTES, Quality};
pub use rust_encoder::RustEncoder;

use crate::canvas::preview::PreviewSettings;
use crate::canvas::render::{BitmapSource, RenderRequest, render};
use crate::geometry::Size;
use crate::naming::export_file_name;
use crate::types::MockupProject;
use std::path::{Path, PathBuf};
use tracing::info;

/// A finished export ready for download or saving.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub fitted: FittedExport,
    pub width: u32,
    pub height: u32,
}

impl ExportArtifact {
    pub fn bytes(&self) -> &[u8] {
        &self.fitted.bytes
    }

    pub fn format(&self) -> ExportFormat {
        self.fitted.format
    }

    /// Write the artifact into `dir` under its suggested name.
    pub fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.bytes())?;
        Ok(path)
    }
}

/// Render `project` at export resolution and fit it under the byte budget.
pub fn export_project(
    project: &MockupProject,
    bitmaps: &impl BitmapSource,
    preview: PreviewSettings,
    canvas: Size,
    format: ExportFormat,
    encoder: &impl Encoder,
) -> Result<ExportArtifact, EncodeError> {
    let request = RenderRequest::export(project, preview, canvas);
    let surface = render(&request, bitmaps);
    let fitted = fit_to_budget(encoder, &surface, format, MAX_EXPORT_BYTES)?;
    let file_name = export_file_name(&project.name, fitted.size(), fitted.format);
    info!(
        project = %project.id,
        file = %file_name,
        size = fitted.size(),
        requested = %format,
        produced = %fitted.format,
        within_budget = fitted.within_budget,
        "export ready"
    );
    Ok(ExportArtifact {
        file_name,
        width: surface.width(),
        height: surface.height(),
        fitted,
    })
}
