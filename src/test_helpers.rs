//! Shared fixtures for the unit tests.
//!
//! Projects built here reference three image ids that [`bitmaps`] resolves:
//! `"blank"` (opaque white), `"red"` and `"blue"`. Anything else is a dangling
//! reference and is skipped by the renderer.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let project = project_with(vec![element("e1", "red", 10.0, 10.0, 20.0, 20.0)]);
//! let frame = render(&RenderRequest::interactive(&project, Default::default(), size, None), &bitmaps());
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use image::{Rgba, RgbaImage};

use crate::canvas::raster::Bitmap;
use crate::types::{AssetKind, DesignElement, MockupProject, UploadedImage};

// =========================================================================
// Model fixtures
// =========================================================================

/// A design element with unset opacity and no rotation.
pub fn element(id: &str, image_id: &str, x: f64, y: f64, width: f64, height: f64) -> DesignElement {
    DesignElement {
        id: id.into(),
        image_id: image_id.into(),
        x,
        y,
        width,
        height,
        rotation: 0.0,
        z_index: 0,
        original_width: None,
        original_height: None,
        opacity: None,
    }
}

/// A project over the `"blank"` bitmap with the given designs.
pub fn project_with(designs: Vec<DesignElement>) -> MockupProject {
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    MockupProject {
        id: "p1".into(),
        name: "Test Tee".into(),
        blank_id: "blank".into(),
        designs,
        created_at: at,
        updated_at: at,
        thumbnail: None,
    }
}

fn uploaded(id: &str, kind: AssetKind, width: u32, height: u32) -> UploadedImage {
    UploadedImage {
        id: id.into(),
        name: format!("{id}.png"),
        url: format!("{}s/{id}.png", kind.as_str()),
        kind,
        uploaded_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        original_width: Some(width),
        original_height: Some(height),
        public_id: Some(format!("{}s/{id}", kind.as_str())),
    }
}

pub fn design_image(id: &str, width: u32, height: u32) -> UploadedImage {
    uploaded(id, AssetKind::Design, width, height)
}

pub fn blank_image(id: &str, width: u32, height: u32) -> UploadedImage {
    uploaded(id, AssetKind::Blank, width, height)
}

// =========================================================================
// Bitmaps
// =========================================================================

/// Decoded bitmaps for the ids used by [`project_with`] fixtures.
pub fn bitmaps() -> HashMap<String, Bitmap> {
    HashMap::from([
        ("blank".to_string(), Bitmap::solid(8, 8, [255, 255, 255, 255])),
        ("red".to_string(), Bitmap::solid(4, 4, [255, 0, 0, 255])),
        ("blue".to_string(), Bitmap::solid(4, 4, [0, 0, 255, 255])),
    ])
}

/// Write a solid-color PNG and return its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32, color: [u8; 4]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    RgbaImage::from_pixel(width, height, Rgba(color)).save(&path).unwrap();
    path
}
