//! Raster surfaces and the paint calls the render pipeline makes, on top of
//! `vello_cpu`.
//!
//! A [`Painter`] records one frame into a `vello_cpu::RenderContext`;
//! [`Painter::finish`] rasterizes it into a [`Surface`]. Geometry handed to
//! the paint calls is in device pixels. Colors are straight-alpha RGBA8;
//! surface and bitmap storage is premultiplied.

use crate::geometry::{Affine, Point, Rect};
use image::{Rgb, RgbImage, RgbaImage};
use std::fmt;
use std::sync::Arc;
use vello_cpu::kurbo::{self as cpu, Shape};
use vello_cpu::peniko::{self, Color};
use vello_cpu::{Pixmap, RenderContext};

pub type PremulRgba8 = [u8; 4];

/// Largest side a surface or bitmap can have.
pub const MAX_SURFACE_SIDE: u32 = u16::MAX as u32;

/// Flattening tolerance for curved chrome (the delete button).
const PATH_TOLERANCE: f64 = 0.1;

/// Opaque color from a `0xRRGGBB` literal.
pub const fn rgb(hex: u32) -> [u8; 4] {
    [(hex >> 16) as u8, (hex >> 8) as u8, hex as u8, 255]
}

/// Premultiply a straight-alpha RGBA8 color.
pub fn premultiply(px: [u8; 4]) -> PremulRgba8 {
    let a = u16::from(px[3]);
    [
        mul_div255(u16::from(px[0]), a),
        mul_div255(u16::from(px[1]), a),
        mul_div255(u16::from(px[2]), a),
        px[3],
    ]
}

fn unpremultiply(px: PremulRgba8) -> [u8; 4] {
    let a = u32::from(px[3]);
    if a == 0 {
        return [0, 0, 0, 0];
    }
    let un = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
    [un(px[0]), un(px[1]), un(px[2]), px[3]]
}

/// Source-over composite of `src` onto `dst`, with `src` scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn fits(width: u32, height: u32) -> bool {
    width <= MAX_SURFACE_SIDE && height <= MAX_SURFACE_SIDE
}

fn side(v: u32) -> u16 {
    v.min(MAX_SURFACE_SIDE) as u16
}

/// Wrap premultiplied RGBA8 bytes as a pixmap. `data` must hold exactly
/// `width × height` pixels.
fn pixmap_from_premul(data: &[u8], width: u16, height: u16) -> Pixmap {
    let mut may_have_opacities = false;
    let pixels: Vec<peniko::color::PremulRgba8> = data
        .chunks_exact(4)
        .map(|px| {
            may_have_opacities |= px[3] != 255;
            peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a: px[3],
            }
        })
        .collect();
    Pixmap::from_parts_with_opacity(pixels, width, height, may_have_opacities)
}

fn to_cpu_affine(a: Affine) -> cpu::Affine {
    cpu::Affine::new(a.as_coeffs())
}

fn to_cpu_rect(r: Rect) -> cpu::Rect {
    cpu::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn color(c: [u8; 4]) -> Color {
    Color::from_rgba8(c[0], c[1], c[2], c[3])
}

/// A decoded design or blank, premultiplied and shared between frames.
#[derive(Clone)]
pub struct Bitmap {
    pixmap: Arc<Pixmap>,
}

impl Bitmap {
    /// `None` when either side exceeds [`MAX_SURFACE_SIDE`].
    pub fn from_rgba(img: &RgbaImage) -> Option<Self> {
        if !fits(img.width(), img.height()) {
            return None;
        }
        let mut data = img.as_raw().clone();
        for px in data.chunks_exact_mut(4) {
            let p = premultiply([px[0], px[1], px[2], px[3]]);
            px.copy_from_slice(&p);
        }
        let pixmap = pixmap_from_premul(&data, side(img.width()), side(img.height()));
        Some(Self {
            pixmap: Arc::new(pixmap),
        })
    }

    /// Single-color bitmap; `color` is straight alpha.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let (w, h) = (side(width), side(height));
        let data = premultiply(color).repeat(usize::from(w) * usize::from(h));
        Self {
            pixmap: Arc::new(pixmap_from_premul(&data, w, h)),
        }
    }

    pub fn width(&self) -> u32 {
        u32::from(self.pixmap.width())
    }

    pub fn height(&self) -> u32 {
        u32::from(self.pixmap.height())
    }

    fn paint(&self) -> vello_cpu::Image {
        vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::clone(&self.pixmap)),
            sampler: peniko::ImageSampler::default(),
        }
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// A finished frame: premultiplied RGBA8 pixels.
#[derive(Clone)]
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    /// A fully transparent surface. Sides are capped at [`MAX_SURFACE_SIDE`].
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: Pixmap::new(side(width), side(height)),
        }
    }

    pub fn width(&self) -> u32 {
        u32::from(self.pixmap.width())
    }

    pub fn height(&self) -> u32 {
        u32::from(self.pixmap.height())
    }

    fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn pixel(&self, x: u32, y: u32) -> PremulRgba8 {
        let i = ((y as usize) * (self.width() as usize) + x as usize) * 4;
        let d = self.data();
        [d[i], d[i + 1], d[i + 2], d[i + 3]]
    }

    /// Number of pixels that differ from `other`. Surfaces of different size
    /// differ everywhere.
    pub fn diff_count(&self, other: &Surface) -> usize {
        if self.width() != other.width() || self.height() != other.height() {
            return (self.width() as usize) * (self.height() as usize);
        }
        self.data()
            .chunks_exact(4)
            .zip(other.data().chunks_exact(4))
            .filter(|(a, b)| a != b)
            .count()
    }

    /// Straight-alpha copy for encoders that keep transparency.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.width(), self.height());
        for (dst, src) in img.pixels_mut().zip(self.data().chunks_exact(4)) {
            dst.0 = unpremultiply([src[0], src[1], src[2], src[3]]);
        }
        img
    }

    /// Composite onto an opaque `background` for encoders without alpha.
    pub fn flatten(&self, background: [u8; 3]) -> RgbImage {
        let mut img = RgbImage::new(self.width(), self.height());
        let bg = [background[0], background[1], background[2], 255];
        for (dst, src) in img.pixels_mut().zip(self.data().chunks_exact(4)) {
            let px = over(bg, [src[0], src[1], src[2], src[3]], 1.0);
            *dst = Rgb([px[0], px[1], px[2]]);
        }
        img
    }
}

impl PartialEq for Surface {
    fn eq(&self, other: &Self) -> bool {
        self.width() == other.width() && self.height() == other.height() && self.data() == other.data()
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Records the draws of one frame.
pub struct Painter {
    ctx: RenderContext,
    width: u16,
    height: u16,
}

impl Painter {
    /// Sides are capped at [`MAX_SURFACE_SIDE`].
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (side(width), side(height));
        Self {
            ctx: RenderContext::new(width, height),
            width,
            height,
        }
    }

    fn begin(&mut self, transform: Affine) {
        self.ctx.set_paint_transform(cpu::Affine::IDENTITY);
        self.ctx.set_transform(to_cpu_affine(transform));
    }

    /// Run `draw` inside an opacity layer when `opacity` is below one.
    fn with_opacity(&mut self, opacity: f32, draw: impl FnOnce(&mut RenderContext)) {
        if opacity <= 0.0 {
            return;
        }
        let layered = opacity < 1.0;
        if layered {
            self.ctx.push_opacity_layer(opacity);
        }
        draw(&mut self.ctx);
        if layered {
            self.ctx.pop_layer();
        }
    }

    pub fn fill_rect(&mut self, rect: Rect, fill: [u8; 4], opacity: f32) {
        self.begin(Affine::IDENTITY);
        self.ctx.set_paint(color(fill));
        let rect = to_cpu_rect(rect.abs());
        self.with_opacity(opacity, |ctx| ctx.fill_rect(&rect));
    }

    /// Stroke the outline of `rect` with a line of `width` centered on it.
    pub fn stroke_rect(&mut self, rect: Rect, width: f64, stroke: [u8; 4]) {
        self.begin(Affine::IDENTITY);
        self.ctx.set_paint(color(stroke));
        self.ctx.set_stroke(cpu::Stroke::new(width));
        self.ctx.stroke_rect(&to_cpu_rect(rect.abs()));
    }

    pub fn fill_circle(&mut self, center: Point, radius: f64, fill: [u8; 4]) {
        self.begin(Affine::IDENTITY);
        self.ctx.set_paint(color(fill));
        let circle = cpu::Circle::new((center.x, center.y), radius).to_path(PATH_TOLERANCE);
        self.ctx.fill_path(&circle);
    }

    /// Stroke the segment `a`–`b` with butt caps.
    pub fn stroke_segment(&mut self, a: Point, b: Point, width: f64, stroke: [u8; 4]) {
        self.begin(Affine::IDENTITY);
        self.ctx.set_paint(color(stroke));
        self.ctx.set_stroke(cpu::Stroke::new(width).with_caps(cpu::Cap::Butt));
        let mut path = cpu::BezPath::new();
        path.move_to((a.x, a.y));
        path.line_to((b.x, b.y));
        self.ctx.stroke_path(&path);
    }

    /// Cover the whole frame with a radial gradient from `inner` at `center`
    /// to `outer` at `radius`, padding with `outer` beyond it.
    pub fn fill_radial_gradient(
        &mut self,
        center: Point,
        radius: f64,
        inner: [u8; 4],
        outer: [u8; 4],
        opacity: f32,
    ) {
        self.begin(Affine::IDENTITY);
        let gradient =
            peniko::Gradient::new_radial((center.x, center.y), radius as f32).with_stops([color(inner), color(outer)]);
        self.ctx.set_paint(gradient);
        let full = cpu::Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height));
        self.with_opacity(opacity, |ctx| ctx.fill_rect(&full));
    }

    /// Draw `bitmap` stretched into `dest` (local coordinates), with
    /// `transform` mapping local coordinates to device pixels.
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, dest: Rect, transform: Affine, opacity: f32) {
        let (bw, bh) = (f64::from(bitmap.width()), f64::from(bitmap.height()));
        let dest = dest.abs();
        if bw == 0.0 || bh == 0.0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
            return;
        }
        if transform.determinant() == 0.0 {
            return;
        }

        let placement = transform
            * Affine::translate((dest.x0, dest.y0))
            * Affine::scale_non_uniform(dest.width() / bw, dest.height() / bh);
        self.begin(placement);
        self.ctx.set_paint(bitmap.paint());
        let source = cpu::Rect::new(0.0, 0.0, bw, bh);
        self.with_opacity(opacity, |ctx| ctx.fill_rect(&source));
    }

    /// Rasterize everything recorded so far onto a transparent surface.
    pub fn finish(mut self) -> Surface {
        let mut pixmap = Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        Surface { pixmap }
    }
}
