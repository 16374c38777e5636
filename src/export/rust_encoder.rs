//! Production encoders.
//!
//! | Format | Encoder | Notes |
//! |---|---|---|
//! | png | `image::codecs::png::PngEncoder` | straight-alpha RGBA, transparency kept |
//! | jpg | `image::codecs::jpeg::JpegEncoder` | flattened onto white, quality 1–100 |
//! | webp | `webp::Encoder` | lossy, straight-alpha RGBA, quality 0–100 |

use super::encoder::{EncodeError, Encoder};
use super::params::{ExportFormat, Quality};
use crate::canvas::raster::Surface;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// Background transparent pixels are composited onto for JPEG.
const JPEG_BACKGROUND: [u8; 3] = [255, 255, 255];

#[derive(Debug, Clone, Copy, Default)]
pub struct RustEncoder;

impl RustEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for RustEncoder {
    fn encode(&self, surface: &Surface, format: ExportFormat, quality: Quality) -> Result<Vec<u8>, EncodeError> {
        let (width, height) = (surface.width(), surface.height());
        if width == 0 || height == 0 {
            return Err(EncodeError::EmptySurface(width, height));
        }

        let mut buf = Vec::new();
        match format {
            ExportFormat::Png => {
                let rgba = surface.to_rgba_image();
                PngEncoder::new(&mut buf).write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)?;
            }
            ExportFormat::Jpg => {
                let rgb = surface.flatten(JPEG_BACKGROUND);
                JpegEncoder::new_with_quality(&mut buf, quality.percent()).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )?;
            }
            ExportFormat::Webp => {
                let rgba = surface.to_rgba_image();
                let encoded = webp::Encoder::from_rgba(rgba.as_raw(), width, height)
                    .encode_simple(false, quality.value() as f32 * 100.0)
                    .map_err(|e| EncodeError::Webp(format!("{e:?}")))?;
                buf.extend_from_slice(&encoded);
            }
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::raster::{Painter, rgb};
    use crate::geometry::Rect;
    use image::ImageFormat;

    fn sample_surface() -> Surface {
        let mut p = Painter::new(32, 24);
        p.fill_rect(Rect::new(4.0, 4.0, 20.0, 16.0), rgb(0x336699), 1.0);
        p.finish()
    }

    /// Vertical stripes of shifting color; compresses badly enough for
    /// quality to matter.
    fn striped_surface() -> Surface {
        let mut p = Painter::new(64, 64);
        for i in 0..64 {
            p.fill_rect(Rect::new(f64::from(i), 0.0, f64::from(i) + 1.0, 64.0), rgb(i * 0x030507), 1.0);
        }
        p.finish()
    }

    #[test]
    fn png_roundtrips_dimensions_and_alpha() {
        let bytes = RustEncoder.encode(&sample_surface(), ExportFormat::Png, Quality::default()).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (32, 24));
        assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
        assert_eq!(decoded.get_pixel(5, 5).0, [0x33, 0x66, 0x99, 255]);
    }

    #[test]
    fn jpeg_is_flattened_onto_white() {
        let bytes = RustEncoder.encode(&sample_surface(), ExportFormat::Jpg, Quality::new(0.95)).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert!(decoded.get_pixel(0, 0).0.iter().all(|&c| c > 240));
    }

    #[test]
    fn lower_jpeg_quality_is_not_larger() {
        let s = striped_surface();
        let high = RustEncoder.encode(&s, ExportFormat::Jpg, Quality::new(0.98)).unwrap();
        let low = RustEncoder.encode(&s, ExportFormat::Jpg, Quality::new(0.1)).unwrap();
        assert!(low.len() <= high.len());
    }

    #[test]
    fn webp_encodes() {
        let bytes = RustEncoder.encode(&sample_surface(), ExportFormat::Webp, Quality::default()).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::WebP);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn lower_webp_quality_is_not_larger() {
        let s = striped_surface();
        let high = RustEncoder.encode(&s, ExportFormat::Webp, Quality::new(0.98)).unwrap();
        let low = RustEncoder.encode(&s, ExportFormat::Webp, Quality::new(0.1)).unwrap();
        assert!(low.len() <= high.len());
        assert_ne!(low, high);
    }

    #[test]
    fn empty_surface_is_an_error() {
        let err = RustEncoder.encode(&Surface::new(0, 10), ExportFormat::Png, Quality::default());
        assert!(matches!(err, Err(EncodeError::EmptySurface(0, 10))));
    }
}
