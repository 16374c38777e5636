//! Preview settings: non-persisted visual transforms applied to both the live
//! and the export render.

use crate::geometry::{Affine, Size};

/// Alpha applied to every draw under dim lighting.
pub const DIM_ALPHA: f32 = 0.8;

/// Studio backdrop gradient stops (center → edge).
pub const STUDIO_INNER: u32 = 0xf8f9fa;
pub const STUDIO_OUTER: u32 = 0xe9ecef;

/// Oblique product view as canvas-style `[a, b, c, d]`; translation is
/// `(0.1 × width, 0.05 × height)`.
const ANGLED_MATRIX: [f64; 4] = [1.0, 0.0, -0.2, 0.9];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    /// Plain editing view; the only mode that accepts manipulation.
    #[default]
    Normal,
    Studio,
    Angled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lighting {
    #[default]
    Bright,
    Dim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewSide {
    #[default]
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreviewSettings {
    pub mode: PreviewMode,
    pub lighting: Lighting,
    pub side: ViewSide,
}

impl PreviewSettings {
    pub fn global_alpha(&self) -> f32 {
        match self.lighting {
            Lighting::Bright => 1.0,
            Lighting::Dim => DIM_ALPHA,
        }
    }

    /// Pointer manipulation and selection chrome are live only on the plain
    /// front view; every other combination is decorative.
    pub fn is_interactive(&self) -> bool {
        self.mode == PreviewMode::Normal && self.side == ViewSide::Front
    }

    /// Transform shared by the blank and every design, in logical pixels.
    ///
    /// Angled view first, then the back-side mirror.
    pub fn scene_transform(&self, canvas: Size) -> Affine {
        let mut scene = Affine::IDENTITY;
        if self.mode == PreviewMode::Angled {
            let [a, b, c, d] = ANGLED_MATRIX;
            scene = scene * Affine::new([a, b, c, d, canvas.width * 0.1, canvas.height * 0.05]);
        }
        if self.side == ViewSide::Back {
            scene = scene * Affine::scale_non_uniform(-1.0, 1.0) * Affine::translate((-canvas.width, 0.0));
        }
        scene
    }
}
