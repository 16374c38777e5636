//! A whole session against a workspace directory on disk: import, compose,
//! export, reopen.

use image::{Rgba, RgbaImage};
use mockup_studio::canvas::PreviewSettings;
use mockup_studio::config::{StudioConfig, load_config};
use mockup_studio::export::{ExportFormat, RustEncoder, export_project};
use mockup_studio::project::DesignEdit;
use mockup_studio::registry::{FileRegistry, RegistryStore};
use mockup_studio::session::Studio;
use mockup_studio::types::AssetKind;
use mockup_studio::upload::collect_uploads;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32, color: [u8; 4]) -> PathBuf {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbaImage::from_pixel(width, height, Rgba(color)).save(path).unwrap();
    path.to_path_buf()
}

#[test]
fn import_compose_export_and_reopen() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("studio");
    let incoming = tmp.path().join("incoming");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("config.toml"), "[canvas]\nwidth = 40\nheight = 40\n").unwrap();
    let config = load_config(&root).unwrap();

    let blank = write_png(&incoming.join("tee.png"), 40, 40, [255, 255, 255, 255]);
    write_png(&incoming.join("art/a-logo.png"), 600, 300, [255, 0, 0, 255]);
    std::fs::write(incoming.join("art/readme.txt"), "not an image").unwrap();

    let project_id = {
        let mut studio = Studio::open(&root, &config);
        let blanks = studio.upload_batch(&[blank], AssetKind::Blank);
        let blank_id = blanks[0].as_ref().unwrap().id.clone();

        let designs = collect_uploads(&[incoming.join("art")]);
        assert_eq!(designs.len(), 1);
        let uploaded = studio.upload_batch(&designs, AssetKind::Design);
        let design = uploaded[0].as_ref().unwrap().clone();
        assert_eq!((design.original_width, design.original_height), (Some(600), Some(300)));

        let project = studio.create_project("Launch Tee", &blank_id).unwrap();
        let element_id = studio.add_design_to_project(&project.id, &design.id).unwrap();

        let mut stored = studio.project(&project.id).unwrap().clone();
        let element = stored.design(&element_id).unwrap();
        assert_eq!((element.width, element.height), (300.0, 150.0));
        stored.apply_edit(&element_id, DesignEdit::X(0.0), true).unwrap();
        stored.apply_edit(&element_id, DesignEdit::Y(0.0), true).unwrap();
        stored.apply_edit(&element_id, DesignEdit::Width(20.0), true).unwrap();
        studio.update_project(stored);

        assert!(studio.take_notices().is_empty());
        project.id
    };

    let mut studio = Studio::open(&root, &config);
    assert!(studio.notices().is_empty());
    assert_eq!(studio.assets().images().len(), 2);
    let project = studio.project(&project_id).unwrap().clone();
    assert_eq!(project.designs.len(), 1);
    assert_eq!((project.designs[0].width, project.designs[0].height), (20.0, 20.0));

    studio.assets_mut().load_project(&project);
    let artifact = export_project(
        &project,
        studio.assets(),
        PreviewSettings::default(),
        config.canvas_size(),
        ExportFormat::Png,
        &RustEncoder,
    )
    .unwrap();
    let img = image::load_from_memory(artifact.bytes()).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (160, 160));
    assert_eq!(img.get_pixel(40, 40).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(120, 120).0, [255, 255, 255, 255]);
    assert!(studio.check().is_clean());
}

#[test]
fn corrupt_registry_starts_empty_with_a_notice() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("registry.json"), "{ truncated").unwrap();
    let studio = Studio::open(tmp.path(), &StudioConfig::default());
    assert!(studio.projects().is_empty());
    assert_eq!(studio.notices().len(), 1);
}

#[test]
fn deleting_an_image_is_persisted() {
    let tmp = TempDir::new().unwrap();
    let config = StudioConfig::default();
    let file = write_png(&tmp.path().join("in/logo.png"), 8, 8, [0, 0, 0, 255]);

    let mut studio = Studio::open(tmp.path(), &config);
    let image = studio.upload_batch(&[file], AssetKind::Design).remove(0).unwrap();
    let stored = tmp.path().join("assets").join(&image.url);
    assert!(stored.exists());

    studio.delete_image(&image.id).unwrap();
    assert!(!stored.exists());

    let registry = FileRegistry::new(tmp.path().join("registry.json")).load().unwrap();
    assert!(registry.assets.is_empty());
}
