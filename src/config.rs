//! Studio configuration.
//!
//! Loaded from `config.toml` in the workspace directory and merged over the
//! stock defaults, so a file only needs the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [canvas]
//! width = 800               # Logical canvas width in pixels
//! height = 800              # Logical canvas height in pixels
//!
//! [editor]
//! aspect_locked = true      # Corner handles keep the element's aspect ratio
//!
//! [export]
//! format = "jpg"            # png, jpg or webp
//!
//! [storage]
//! registry = "registry.json" # Registry document, relative to the workspace
//! assets = "assets"          # Uploaded images, relative to the workspace
//!
//! [processing]
//! max_processes = 4         # Max parallel decoders (omit for auto = CPU cores)
//! ```
//!
//! The export scale (4×) and size budget (15 MB) are fixed and not
//! configurable. Unknown keys are rejected to catch typos early.

use crate::export::ExportFormat;
use crate::geometry::Size;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest logical canvas side accepted; exports render at four times this.
pub const MAX_CANVAS_SIDE: u32 = 4096;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    pub canvas: CanvasConfig,
    pub editor: EditorConfig,
    pub export: ExportConfig,
    pub storage: StorageConfig,
    pub processing: ProcessingConfig,
}

impl StudioConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let CanvasConfig { width, height } = self.canvas;
        if width == 0 || height == 0 {
            return Err(ConfigError::Validation("canvas width and height must be non-zero".into()));
        }
        if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(ConfigError::Validation(format!(
                "canvas sides must be at most {MAX_CANVAS_SIDE}"
            )));
        }
        if self.storage.registry.as_os_str().is_empty() {
            return Err(ConfigError::Validation("storage.registry must not be empty".into()));
        }
        if self.storage.assets.as_os_str().is_empty() {
            return Err(ConfigError::Validation("storage.assets must not be empty".into()));
        }
        Ok(())
    }

    pub fn canvas_size(&self) -> Size {
        Size::new(f64::from(self.canvas.width), f64::from(self.canvas.height))
    }

    /// Registry path, relative paths taken from `root`.
    pub fn registry_path(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.registry)
    }

    /// Asset directory, relative paths taken from `root`.
    pub fn asset_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.assets)
    }
}

/// Logical canvas size; element coordinates live in this space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Corner-handle resizes keep the aspect ratio of the element at drag start.
    pub aspect_locked: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { aspect_locked: true }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub format: ExportFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub registry: PathBuf,
    pub assets: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            registry: PathBuf::from("registry.json"),
            assets: PathBuf::from("assets"),
        }
    }
}

/// Parallel decoding settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel bitmap decoders.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never below one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.clamp(1, cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(StudioConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse config text, merge it over the defaults, and validate.
pub fn parse_config(content: &str) -> Result<StudioConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let config: StudioConfig = merge_toml(stock_defaults_value(), overlay).try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `config.toml` from the workspace directory.
///
/// A missing file yields the stock defaults.
pub fn load_config(root: &Path) -> Result<StudioConfig, ConfigError> {
    let config_path = root.join("config.toml");
    if !config_path.exists() {
        return Ok(StudioConfig::default());
    }
    parse_config(&fs::read_to_string(&config_path)?)
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Mockup Studio Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Canvas
# ---------------------------------------------------------------------------
[canvas]
# Logical canvas size in pixels. Element positions and sizes are stored in
# this space; exports render at four times these dimensions.
width = 800
height = 800

# ---------------------------------------------------------------------------
# Editor
# ---------------------------------------------------------------------------
[editor]
# Corner handles keep the element's aspect ratio while resizing.
# Edge handles always resize a single dimension.
aspect_locked = true

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Default export format: "png", "jpg" or "webp".
# Exports are kept under 15 MB; an oversized png is re-encoded as jpg.
format = "jpg"

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Registry document holding every asset and project.
registry = "registry.json"

# Directory uploaded images are copied into.
assets = "assets"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel bitmap decoders.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
