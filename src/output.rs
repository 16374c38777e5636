//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Entities lead with a positional index and their human name; ids, paths and
//! sizes follow as indented context lines. Ids are what the other commands
//! take as arguments, so they are always shown.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! Blanks
//! 001 tee-white.png (1200x1400)
//!     Id: 4f0c…
//!
//! Designs
//! 001 logo.png (600x600)
//!     Id: 91ab…
//!
//! Projects
//! 001 Summer Tee (2 designs)
//!     Id: 7d2e…
//!     Blank: tee-white.png
//!     Updated: 2024-05-01 12:00
//! ```
//!
//! ## Import
//!
//! ```text
//! 001 logo.png → design 91ab… (600x600)
//! 002 notes.txt: not a supported image (jpg, png or webp)
//! Imported 1 of 2 files
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::export::ExportArtifact;
use crate::session::{CheckReport, Notice};
use crate::types::{AssetKind, MockupProject, UploadedImage};
use crate::upload::UploadFailure;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1200x1400`, or `?` for an axis that was never measured.
fn dimensions(width: Option<u32>, height: Option<u32>) -> String {
    let axis = |v: Option<u32>| v.map_or_else(|| "?".to_string(), |v| v.to_string());
    format!("{}x{}", axis(width), axis(height))
}

/// Bytes as megabytes with one decimal.
fn megabytes(bytes: usize) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// List
// ============================================================================

fn image_lines(index: usize, image: &UploadedImage) -> Vec<String> {
    vec![
        format!(
            "{} {} ({})",
            format_index(index),
            image.name,
            dimensions(image.original_width, image.original_height)
        ),
        format!("{}Id: {}", indent(1), image.id),
    ]
}

/// Format the library and project list.
pub fn format_list(images: &[UploadedImage], projects: &[MockupProject]) -> Vec<String> {
    let mut lines = Vec::new();

    for (kind, heading) in [(AssetKind::Blank, "Blanks"), (AssetKind::Design, "Designs")] {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(heading.to_string());
        let of_kind: Vec<&UploadedImage> = images.iter().filter(|i| i.kind == kind).collect();
        if of_kind.is_empty() {
            lines.push(format!("{}(none)", indent(1)));
        }
        for (i, image) in of_kind.into_iter().enumerate() {
            lines.extend(image_lines(i + 1, image));
        }
    }

    lines.push(String::new());
    lines.push("Projects".to_string());
    if projects.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, project) in projects.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            project.name,
            plural(project.designs.len(), "design", "designs")
        ));
        lines.push(format!("{}Id: {}", indent(1), project.id));
        let blank = images
            .iter()
            .find(|img| img.id == project.blank_id)
            .map_or(project.blank_id.as_str(), |img| img.name.as_str());
        lines.push(format!("{}Blank: {}", indent(1), blank));
        lines.push(format!(
            "{}Updated: {}",
            indent(1),
            project.updated_at.format("%Y-%m-%d %H:%M")
        ));
    }
    lines
}

pub fn print_list(images: &[UploadedImage], projects: &[MockupProject]) {
    for line in format_list(images, projects) {
        println!("{}", line);
    }
}

/// Format the element stack of one project, bottom to top.
pub fn format_project(project: &MockupProject, images: &[UploadedImage]) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", project.name, project.id)];
    for (i, element) in project.designs.iter().enumerate() {
        let name = images
            .iter()
            .find(|img| img.id == element.image_id)
            .map_or("(missing image)", |img| img.name.as_str());
        lines.push(format!("{}{} {}", indent(1), format_index(i + 1), name));
        lines.push(format!("{}Id: {}", indent(2), element.id));
        lines.push(format!(
            "{}At: {:.1},{:.1}  Size: {:.1}x{:.1}  Rotation: {:.1}°  Opacity: {:.0}%",
            indent(2),
            element.x,
            element.y,
            element.width,
            element.height,
            element.rotation,
            element.alpha() * 100.0
        ));
    }
    lines
}

pub fn print_project(project: &MockupProject, images: &[UploadedImage]) {
    for line in format_project(project, images) {
        println!("{}", line);
    }
}

// ============================================================================
// Import
// ============================================================================

/// Format per-file upload results, in input order.
pub fn format_import(files: &[PathBuf], results: &[Result<UploadedImage, UploadFailure>]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (file, result)) in files.iter().zip(results).enumerate() {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        match result {
            Ok(image) => lines.push(format!(
                "{} {} \u{2192} {} {} ({})",
                format_index(i + 1),
                name,
                image.kind.as_str(),
                image.id,
                dimensions(image.original_width, image.original_height)
            )),
            Err(e) => lines.push(format!("{} {}: {}", format_index(i + 1), name, e)),
        }
    }
    let ok = results.iter().filter(|r| r.is_ok()).count();
    lines.push(format!("Imported {} of {}", ok, plural(results.len(), "file", "files")));
    lines
}

pub fn print_import(files: &[PathBuf], results: &[Result<UploadedImage, UploadFailure>]) {
    for line in format_import(files, results) {
        println!("{}", line);
    }
}

// ============================================================================
// Export
// ============================================================================

pub fn format_export(artifact: &ExportArtifact, saved: &Path) -> Vec<String> {
    let fitted = &artifact.fitted;
    let mut lines = vec![format!("{} \u{2192} {}", artifact.file_name, saved.display())];
    lines.push(format!(
        "{}{}x{} {}, {}",
        indent(1),
        artifact.width,
        artifact.height,
        fitted.format,
        megabytes(fitted.size())
    ));
    if let Some(quality) = fitted.quality {
        lines.push(format!(
            "{}Quality: {}% after {}",
            indent(1),
            quality.percent(),
            plural(fitted.iterations as usize, "step", "steps")
        ));
    }
    if !fitted.within_budget {
        lines.push(format!("{}Over the size limit; saved best effort", indent(1)));
    }
    lines
}

pub fn print_export(artifact: &ExportArtifact, saved: &Path) {
    for line in format_export(artifact, saved) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Checked {} and {}",
        plural(report.projects, "project", "projects"),
        plural(report.assets, "image", "images")
    )];
    if report.is_clean() {
        lines.push(format!("{}No problems found", indent(1)));
    }
    for problem in &report.problems {
        lines.push(format!("{}{}", indent(1), problem));
    }
    lines
}

pub fn print_check(report: &CheckReport) {
    for line in format_check(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Notices
// ============================================================================

pub fn format_notices(notices: &[Notice]) -> Vec<String> {
    notices.iter().map(|n| format!("! {}", n)).collect()
}

/// Notices go to stderr so they never mix with command output.
pub fn print_notices(notices: &[Notice]) {
    for line in format_notices(notices) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
