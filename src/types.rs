//! Shared types persisted in the registry document and passed between the
//! editor, the renderer and the session.
//!
//! Field names serialize as camelCase so documents written by earlier
//! front-ends load unchanged.

use crate::geometry::Rect;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generate a fresh opaque identifier for an asset, project or element.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Whether an uploaded image is a product template or a placeable design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Blank,
    Design,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Blank => "blank",
            AssetKind::Design => "design",
        }
    }
}

/// An image supplied by the asset collaborator. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub id: String,
    pub name: String,
    /// Bitmap location: a local path, a `file://` URL or a remote URL.
    pub url: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_height: Option<u32>,
    /// Handle used by the storage collaborator to delete the stored file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

/// A placed, transformable instance of a design bitmap.
///
/// Coordinates are logical canvas pixels; `(x, y)` is the top-left corner of
/// the unrotated box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignElement {
    pub id: String,
    /// Non-owning reference to an [`UploadedImage`] of kind design.
    pub image_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees, clockwise. Not normalized.
    #[serde(default)]
    pub rotation: f64,
    /// Advisory only: paint and hit-test order always follow list order.
    #[serde(default)]
    pub z_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_height: Option<f64>,
    /// Percentage 0–100; `None` paints fully opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl DesignElement {
    /// Paint alpha in `[0, 1]`.
    pub fn alpha(&self) -> f64 {
        self.opacity.unwrap_or(100.0).clamp(0.0, 100.0) / 100.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// The unrotated box.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size((self.x, self.y), (self.width, self.height))
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.x = bounds.x0;
        self.y = bounds.y0;
        self.width = bounds.width();
        self.height = bounds.height();
    }
}

/// One blank plus an ordered stack of design elements.
///
/// List order is paint order: later elements paint on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockupProject {
    pub id: String,
    pub name: String,
    pub blank_id: String,
    #[serde(default)]
    pub designs: Vec<DesignElement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}
