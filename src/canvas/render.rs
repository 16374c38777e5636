//! The render pipeline: project + bitmaps + preview settings → raster.
//!
//! The same function produces the live editing frame and the export frame.
//! Only two inputs differ between them: the device scale (1× live, 4× export)
//! and whether selection chrome is drawn. Steps, in order:
//!
//! 1. clear to transparent
//! 2. dim lighting lowers the alpha of every later draw
//! 3. studio mode paints a radial backdrop
//! 4. the scene transform (angled view, back-side mirror) is computed once
//! 5. the blank is stretched over the full canvas under the scene transform
//! 6. each design paints in list order, rotated about its own center
//! 7. selection chrome, untransformed, only on the plain front view
//!
//! Missing bitmaps (unknown id, still loading, failed decode) are skipped;
//! a frame never fails.

use super::preview::{PreviewMode, PreviewSettings, STUDIO_INNER, STUDIO_OUTER};
use super::raster::{Bitmap, Painter, Surface, rgb};
use crate::export::EXPORT_SCALE;
use crate::geometry::{
    Affine, DELETE_HOTSPOT_SIZE, HANDLE_SIZE, Handle, Point, Rect, Size, delete_hotspot_center,
    rotate_about_center,
};
use crate::types::MockupProject;
use std::collections::HashMap;
use tracing::debug;

const SELECTION_COLOR: u32 = 0x3b82f6;
const DELETE_COLOR: u32 = 0xef4444;
const OUTLINE_WIDTH: f64 = 2.0;
const OUTLINE_GAP: f64 = 2.0;
const GLYPH_HALF: f64 = 5.0;

/// Lookup of decoded bitmaps by image id.
///
/// Returning `None` means "not drawable right now": the caller skips that
/// draw and carries on with the rest of the frame.
pub trait BitmapSource {
    fn bitmap(&self, image_id: &str) -> Option<&Bitmap>;
}

impl BitmapSource for HashMap<String, Bitmap> {
    fn bitmap(&self, image_id: &str) -> Option<&Bitmap> {
        self.get(image_id)
    }
}

/// Everything a frame depends on besides the bitmaps themselves.
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub project: &'a MockupProject,
    pub preview: PreviewSettings,
    /// Logical canvas size; element geometry lives in this space.
    pub canvas: Size,
    /// Device pixels per logical pixel.
    pub scale: f64,
    /// Element to decorate with selection chrome, if any.
    pub selected: Option<&'a str>,
}

impl<'a> RenderRequest<'a> {
    /// Live editing frame at 1:1 with optional selection chrome.
    pub fn interactive(
        project: &'a MockupProject,
        preview: PreviewSettings,
        canvas: Size,
        selected: Option<&'a str>,
    ) -> Self {
        Self {
            project,
            preview,
            canvas,
            scale: 1.0,
            selected,
        }
    }

    /// High-resolution export frame, never decorated.
    pub fn export(project: &'a MockupProject, preview: PreviewSettings, canvas: Size) -> Self {
        Self {
            project,
            preview,
            canvas,
            scale: EXPORT_SCALE,
            selected: None,
        }
    }

    pub fn surface_size(&self) -> (u32, u32) {
        let px = |v: f64| (v * self.scale).round().max(0.0) as u32;
        (px(self.canvas.width), px(self.canvas.height))
    }
}

fn scale_rect(rect: Rect, scale: f64) -> Rect {
    Rect::new(rect.x0 * scale, rect.y0 * scale, rect.x1 * scale, rect.y1 * scale)
}

/// Paint one frame.
pub fn render(request: &RenderRequest<'_>, bitmaps: &impl BitmapSource) -> Surface {
    let (width, height) = request.surface_size();
    let mut painter = Painter::new(width, height);
    let project = request.project;
    let canvas = request.canvas;
    let global_alpha = request.preview.global_alpha();

    if request.preview.mode == PreviewMode::Studio {
        let center = Point::new(canvas.width / 2.0, canvas.height / 2.0);
        let radius = canvas.width.max(canvas.height) / 2.0;
        painter.fill_radial_gradient(
            Point::new(center.x * request.scale, center.y * request.scale),
            radius * request.scale,
            rgb(STUDIO_INNER),
            rgb(STUDIO_OUTER),
            global_alpha,
        );
    }

    let device = Affine::scale(request.scale) * request.preview.scene_transform(canvas);

    match bitmaps.bitmap(&project.blank_id) {
        Some(blank) => {
            let full = Rect::new(0.0, 0.0, canvas.width, canvas.height);
            painter.draw_bitmap(blank, full, device, global_alpha);
        }
        None => debug!(blank_id = %project.blank_id, "blank not drawable, skipping"),
    }

    for element in &project.designs {
        let Some(bitmap) = bitmaps.bitmap(&element.image_id) else {
            debug!(element = %element.id, image_id = %element.image_id, "design not drawable, skipping");
            continue;
        };
        let bounds = element.bounds();
        let transform = device * rotate_about_center(bounds, element.rotation);
        let alpha = global_alpha * element.alpha() as f32;
        painter.draw_bitmap(bitmap, bounds, transform, alpha);
    }

    if request.preview.is_interactive()
        && let Some(selected) = request.selected
        && let Some(element) = project.designs.iter().find(|d| d.id == selected)
    {
        draw_selection(&mut painter, element.bounds(), request.scale);
    }

    painter.finish()
}

/// Outline, eight handles and the delete button, in plain canvas space.
fn draw_selection(painter: &mut Painter, bounds: Rect, scale: f64) {
    let accent = rgb(SELECTION_COLOR);
    let outline = bounds.inflate(OUTLINE_GAP, OUTLINE_GAP);
    painter.stroke_rect(scale_rect(outline, scale), OUTLINE_WIDTH * scale, accent);

    let half = HANDLE_SIZE / 2.0;
    for handle in Handle::ALL {
        let a = handle.anchor(bounds);
        let square = Rect::new(a.x - half, a.y - half, a.x + half, a.y + half);
        painter.fill_rect(scale_rect(square, scale), accent, 1.0);
    }

    let c = delete_hotspot_center(bounds);
    let device_c = Point::new(c.x * scale, c.y * scale);
    painter.fill_circle(device_c, DELETE_HOTSPOT_SIZE / 2.0 * scale, rgb(DELETE_COLOR));
    let g = GLYPH_HALF * scale;
    let white = rgb(0xffffff);
    painter.stroke_segment(
        Point::new(device_c.x - g, device_c.y - g),
        Point::new(device_c.x + g, device_c.y + g),
        OUTLINE_WIDTH * scale,
        white,
    );
    painter.stroke_segment(
        Point::new(device_c.x + g, device_c.y - g),
        Point::new(device_c.x - g, device_c.y + g),
        OUTLINE_WIDTH * scale,
        white,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::preview::{Lighting, ViewSide};
    use crate::test_helpers::{bitmaps, element, project_with};

    const CANVAS: Size = Size::new(64.0, 64.0);

    fn frame(project: &MockupProject, preview: PreviewSettings, selected: Option<&str>) -> Surface {
        let request = RenderRequest::interactive(project, preview, CANVAS, selected);
        render(&request, &bitmaps())
    }

    #[test]
    fn blank_fills_the_canvas() {
        let project = project_with(vec![]);
        let s = frame(&project, PreviewSettings::default(), None);
        assert_eq!((s.width(), s.height()), (64, 64));
        assert_eq!(s.pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(s.pixel(63, 63), [255, 255, 255, 255]);
    }

    #[test]
    fn missing_blank_and_designs_are_skipped() {
        let mut project = project_with(vec![element("e1", "nope", 10.0, 10.0, 20.0, 20.0)]);
        project.blank_id = "gone".into();
        let s = frame(&project, PreviewSettings::default(), None);
        assert_eq!(s.diff_count(&Surface::new(64, 64)), 0);
    }

    #[test]
    fn design_paints_inside_its_box() {
        let project = project_with(vec![element("e1", "red", 10.0, 10.0, 20.0, 20.0)]);
        let s = frame(&project, PreviewSettings::default(), None);
        assert_eq!(s.pixel(15, 15), [255, 0, 0, 255]);
        assert_eq!(s.pixel(35, 35), [255, 255, 255, 255]);
    }

    #[test]
    fn later_designs_paint_on_top() {
        let project = project_with(vec![
            element("below", "red", 10.0, 10.0, 30.0, 30.0),
            element("above", "blue", 20.0, 20.0, 30.0, 30.0),
        ]);
        let s = frame(&project, PreviewSettings::default(), None);
        assert_eq!(s.pixel(25, 25), [0, 0, 255, 255]);
        assert_eq!(s.pixel(12, 12), [255, 0, 0, 255]);
    }

    #[test]
    fn zero_opacity_matches_empty_project() {
        let mut hidden = element("e1", "red", 10.0, 10.0, 20.0, 20.0);
        hidden.opacity = Some(0.0);
        let with = frame(&project_with(vec![hidden]), PreviewSettings::default(), None);
        let without = frame(&project_with(vec![]), PreviewSettings::default(), None);
        assert_eq!(with.diff_count(&without), 0);
    }

    #[test]
    fn full_opacity_matches_unset() {
        let mut full = element("e1", "red", 10.0, 10.0, 20.0, 20.0);
        full.opacity = Some(100.0);
        let mut unset = full.clone();
        unset.opacity = None;
        let a = frame(&project_with(vec![full]), PreviewSettings::default(), None);
        let b = frame(&project_with(vec![unset]), PreviewSettings::default(), None);
        assert_eq!(a.diff_count(&b), 0);
    }

    #[test]
    fn full_turn_renders_identically() {
        let mut a = element("e1", "red", 12.0, 18.0, 30.0, 14.0);
        a.rotation = 33.0;
        let mut b = a.clone();
        b.rotation = 393.0;
        let fa = frame(&project_with(vec![a]), PreviewSettings::default(), None);
        let fb = frame(&project_with(vec![b]), PreviewSettings::default(), None);
        assert_eq!(fa.diff_count(&fb), 0);
    }

    #[test]
    fn quarter_turn_swaps_extent() {
        let mut e = element("e1", "red", 12.0, 27.0, 40.0, 10.0);
        e.rotation = 90.0;
        let s = frame(&project_with(vec![e]), PreviewSettings::default(), None);
        // center (32, 32): now 10 wide, 40 tall
        assert_eq!(s.pixel(32, 14), [255, 0, 0, 255]);
        assert_eq!(s.pixel(20, 32), [255, 255, 255, 255]);
    }

    #[test]
    fn selection_chrome_only_in_normal_mode() {
        let project = project_with(vec![element("e1", "red", 20.0, 20.0, 20.0, 20.0)]);
        let plain = frame(&project, PreviewSettings::default(), None);
        let selected = frame(&project, PreviewSettings::default(), Some("e1"));
        assert!(selected.diff_count(&plain) > 0);
        // handle at the se corner
        assert_eq!(selected.pixel(40, 40), rgb(SELECTION_COLOR));

        let studio = PreviewSettings {
            mode: PreviewMode::Studio,
            ..Default::default()
        };
        let a = frame(&project, studio, None);
        let b = frame(&project, studio, Some("e1"));
        assert_eq!(a.diff_count(&b), 0);
    }

    #[test]
    fn export_request_is_four_times_and_undecorated() {
        let project = project_with(vec![element("e1", "red", 20.0, 20.0, 20.0, 20.0)]);
        let request = RenderRequest::export(&project, PreviewSettings::default(), CANVAS);
        assert_eq!(request.surface_size(), (256, 256));
        assert!(request.selected.is_none());
        let s = render(&request, &bitmaps());
        assert_eq!(s.pixel(100, 100), [255, 0, 0, 255]);
        assert_eq!(s.pixel(200, 200), [255, 255, 255, 255]);
    }

    #[test]
    fn back_view_mirrors_designs() {
        let project = project_with(vec![element("e1", "red", 0.0, 0.0, 16.0, 64.0)]);
        let back = PreviewSettings {
            side: ViewSide::Back,
            ..Default::default()
        };
        let s = frame(&project, back, None);
        assert_eq!(s.pixel(60, 30), [255, 0, 0, 255]);
        assert_eq!(s.pixel(4, 30), [255, 255, 255, 255]);
    }

    #[test]
    fn back_view_draws_no_selection_chrome() {
        let project = project_with(vec![element("e1", "red", 8.0, 8.0, 16.0, 16.0)]);
        let back = PreviewSettings {
            side: ViewSide::Back,
            ..Default::default()
        };
        let plain = frame(&project, back, None);
        let selected = frame(&project, back, Some("e1"));
        assert_eq!(selected.diff_count(&plain), 0);
    }

    #[test]
    fn dim_lighting_lowers_alpha() {
        let project = project_with(vec![]);
        let dim = PreviewSettings {
            lighting: Lighting::Dim,
            ..Default::default()
        };
        let s = frame(&project, dim, None);
        assert!((203..=205).contains(&s.pixel(5, 5)[3]));
    }

    #[test]
    fn studio_backdrop_shows_under_transparent_regions() {
        let mut project = project_with(vec![]);
        project.blank_id = "gone".into();
        let studio = PreviewSettings {
            mode: PreviewMode::Studio,
            ..Default::default()
        };
        let s = frame(&project, studio, None);
        let corner = s.pixel(0, 0);
        let outer = rgb(STUDIO_OUTER);
        assert!((0..3).all(|i| corner[i].abs_diff(outer[i]) <= 1), "corner {corner:?}");
        assert_eq!(s.pixel(32, 32)[3], 255);
    }
}
