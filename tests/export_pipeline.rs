//! Export pipeline: render at 4×, encode, fit under the byte budget, name and
//! save the artifact.

use chrono::Utc;
use mockup_studio::canvas::{Bitmap, Lighting, PreviewMode, PreviewSettings, Surface, ViewSide};
use mockup_studio::export::{
    EncodeError, Encoder, ExportFormat, Quality, RustEncoder, export_project, fit_to_budget,
};
use mockup_studio::geometry::Size;
use mockup_studio::types::{DesignElement, MockupProject};
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

const CANVAS: Size = Size::new(20.0, 10.0);

fn project() -> MockupProject {
    let now = Utc::now();
    MockupProject {
        id: "p".to_string(),
        name: "Summer Tee".to_string(),
        blank_id: "blank".to_string(),
        designs: vec![DesignElement {
            id: "logo".to_string(),
            image_id: "red".to_string(),
            x: 0.0,
            y: 0.0,
            width: 5.0,
            height: 10.0,
            rotation: 0.0,
            z_index: 0,
            original_width: None,
            original_height: None,
            opacity: None,
        }],
        created_at: now,
        updated_at: now,
        thumbnail: None,
    }
}

fn bitmaps() -> HashMap<String, Bitmap> {
    HashMap::from([
        ("blank".to_string(), Bitmap::solid(4, 4, [255, 255, 255, 255])),
        ("red".to_string(), Bitmap::solid(2, 2, [255, 0, 0, 255])),
    ])
}

fn decode(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

/// Output size shrinks linearly with quality; every request is recorded.
struct LinearEncoder {
    bytes_at_full: f64,
    lossless_size: usize,
    requests: Mutex<Vec<(ExportFormat, f64)>>,
}

impl LinearEncoder {
    fn new(bytes_at_full: f64, lossless_size: usize) -> Self {
        Self {
            bytes_at_full,
            lossless_size,
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl Encoder for LinearEncoder {
    fn encode(&self, _surface: &Surface, format: ExportFormat, quality: Quality) -> Result<Vec<u8>, EncodeError> {
        self.requests.lock().unwrap().push((format, quality.value()));
        let size = match format {
            ExportFormat::Png => self.lossless_size,
            _ => (self.bytes_at_full * quality.value()) as usize,
        };
        Ok(vec![0; size])
    }
}

#[test]
fn png_export_is_four_times_the_canvas() {
    let artifact = export_project(
        &project(),
        &bitmaps(),
        PreviewSettings::default(),
        CANVAS,
        ExportFormat::Png,
        &RustEncoder,
    )
    .unwrap();

    let img = decode(artifact.bytes());
    assert_eq!(img.dimensions(), (80, 40));
    assert_eq!(img.get_pixel(10, 20).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(60, 20).0, [255, 255, 255, 255]);
    assert!(artifact.file_name.starts_with("Summer Tee-hd-0.0MB"));
    assert!(artifact.file_name.ends_with(".png"));
}

#[test]
fn jpg_and_webp_decode_to_the_same_scene() {
    for format in [ExportFormat::Jpg, ExportFormat::Webp] {
        let artifact = export_project(
            &project(),
            &bitmaps(),
            PreviewSettings::default(),
            CANVAS,
            format,
            &RustEncoder,
        )
        .unwrap();
        assert_eq!(artifact.format(), format);
        let img = decode(artifact.bytes());
        assert_eq!(img.dimensions(), (80, 40));
        let [r, g, b, _] = img.get_pixel(8, 20).0;
        assert!(r > 200 && g < 60 && b < 60, "{format}: got {r},{g},{b}");
        let [r, g, b, _] = img.get_pixel(70, 20).0;
        assert!(r > 220 && g > 220 && b > 220, "{format}: got {r},{g},{b}");
    }
}

#[test]
fn back_view_mirrors_the_export() {
    let preview = PreviewSettings {
        side: ViewSide::Back,
        ..Default::default()
    };
    let artifact = export_project(&project(), &bitmaps(), preview, CANVAS, ExportFormat::Png, &RustEncoder).unwrap();
    let img = decode(artifact.bytes());
    assert_eq!(img.get_pixel(70, 20).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(10, 20).0, [255, 255, 255, 255]);
}

#[test]
fn dim_lighting_lowers_every_draw() {
    let preview = PreviewSettings {
        lighting: Lighting::Dim,
        ..Default::default()
    };
    let artifact = export_project(&project(), &bitmaps(), preview, CANVAS, ExportFormat::Png, &RustEncoder).unwrap();
    let img = decode(artifact.bytes());
    let blank_alpha = img.get_pixel(60, 20).0[3];
    assert!((200..=208).contains(&blank_alpha), "alpha {blank_alpha}");
}

#[test]
fn studio_backdrop_fills_behind_a_missing_blank() {
    let mut project = project();
    project.blank_id = "not-loaded".to_string();
    let preview = PreviewSettings {
        mode: PreviewMode::Studio,
        ..Default::default()
    };
    let artifact = export_project(&project, &bitmaps(), preview, CANVAS, ExportFormat::Png, &RustEncoder).unwrap();
    let img = decode(artifact.bytes());
    let [r, g, b, a] = img.get_pixel(40, 20).0;
    assert_eq!(a, 255);
    assert!(r >= 0xe9 && g >= 0xec && b >= 0xef);
}

#[test]
fn lossy_search_halves_toward_the_floor() {
    let encoder = LinearEncoder::new(1000.0, 0);
    let fitted = fit_to_budget(&encoder, &Surface::new(1, 1), ExportFormat::Jpg, 400).unwrap();

    let qualities: Vec<f64> = encoder.requests.lock().unwrap().iter().map(|(_, q)| *q).collect();
    assert_eq!(qualities.len(), 3);
    assert!((qualities[0] - 0.98).abs() < 1e-9);
    assert!((qualities[1] - 0.54).abs() < 1e-9);
    assert!((qualities[2] - 0.32).abs() < 1e-9);
    assert_eq!(fitted.iterations, 2);
    assert!(fitted.within_budget);
    assert!((300..=400).contains(&fitted.size()));
}

#[test]
fn unreachable_budget_returns_best_effort() {
    let encoder = LinearEncoder::new(1_000_000.0, 0);
    let fitted = fit_to_budget(&encoder, &Surface::new(1, 1), ExportFormat::Webp, 10).unwrap();
    assert!(!fitted.within_budget);
    assert_eq!(fitted.format, ExportFormat::Webp);
    assert_eq!(fitted.iterations, 7);
    assert_eq!(encoder.requests.lock().unwrap().len(), 8);
}

#[test]
fn oversized_png_falls_back_to_jpg() {
    let encoder = LinearEncoder::new(100.0, 500);
    let fitted = fit_to_budget(&encoder, &Surface::new(1, 1), ExportFormat::Png, 400).unwrap();
    assert_eq!(fitted.format, ExportFormat::Jpg);
    assert_eq!(fitted.quality, Some(Quality::new(0.95)));
    let formats: Vec<ExportFormat> = encoder.requests.lock().unwrap().iter().map(|(f, _)| *f).collect();
    assert_eq!(formats, vec![ExportFormat::Png, ExportFormat::Jpg]);
}

#[test]
fn artifact_saves_under_its_suggested_name() {
    let tmp = TempDir::new().unwrap();
    let encoder = LinearEncoder::new(2.0 * 1024.0 * 1024.0, 0);
    let artifact = export_project(
        &project(),
        &bitmaps(),
        PreviewSettings::default(),
        CANVAS,
        ExportFormat::Jpg,
        &encoder,
    )
    .unwrap();
    let path = artifact.save_to(tmp.path()).unwrap();
    assert_eq!(artifact.file_name, "Summer Tee-hd-2.0MB.jpg");
    assert_eq!(path, tmp.path().join("Summer Tee-hd-2.0MB.jpg"));
    assert_eq!(std::fs::metadata(path).unwrap().len(), artifact.bytes().len() as u64);
}
