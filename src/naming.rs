//! File naming for exports and stored assets.
//!
//! ## Export artifacts
//!
//! `<project>-hd-<size>MB.<ext>`, size in MiB with one decimal:
//! - `"Summer Tee"`, 3_250_000 bytes, jpg → `Summer Tee-hd-3.1MB.jpg`
//! - `"a/b"`, 512 bytes, png → `a_b-hd-0.0MB.png`
//!
//! ## Stored assets
//!
//! Uploaded files are stored as `<kind>s/<id>.<ext>` relative to the asset
//! directory (`blanks/…`, `designs/…`).

use crate::export::ExportFormat;
use crate::types::AssetKind;
use std::path::{Path, PathBuf};

const MIB: f64 = 1024.0 * 1024.0;

/// Replace characters that would escape or break a single path component.
pub fn sanitize_file_stem(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "mockup".to_string(),
        _ => cleaned,
    }
}

/// Suggested download name for an export of `size_bytes` bytes.
pub fn export_file_name(project_name: &str, size_bytes: usize, format: ExportFormat) -> String {
    let size_mb = size_bytes as f64 / MIB;
    format!(
        "{}-hd-{size_mb:.1}MB.{}",
        sanitize_file_stem(project_name),
        format.extension()
    )
}

/// Where an uploaded asset lives, relative to the asset directory.
pub fn asset_relative_path(kind: AssetKind, id: &str, source: &Path) -> PathBuf {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "bin".to_string());
    PathBuf::from(format!("{}s", kind.as_str())).join(format!("{id}.{ext}"))
}
