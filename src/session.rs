//! Session orchestration: the layer between the editor and the outside world.
//!
//! [`Studio`] owns the registry document, the image library, in-flight upload
//! progress and the notices raised along the way. Upstream failures never
//! abort an operation: local state stays authoritative and the failure is
//! recorded as a [`Notice`] for the host to show.
//!
//! ## Persistence
//!
//! Every change to a project goes through [`Studio::update_project`], which
//! replaces the in-memory copy first and then writes the registry. Editor
//! drags emit a project per pointer move, so each move is a registry write.
//! That is fine for a local file; a networked store would want coalescing.

use crate::assets::AssetStore;
use crate::canvas::editor::{Action, CanvasEditor};
use crate::config::StudioConfig;
use crate::project::EditError;
use crate::registry::{AssetEntry, FileRegistry, LOCAL_USER_ID, Registry, RegistryStore};
use crate::types::{AssetKind, MockupProject, UploadedImage, generate_id};
use crate::upload::{
    Compressor, LocalUploader, PassThrough, ProgressMap, UploadFailure, Uploader, UpstreamError,
    compression_progress, upload_progress, validate_upload,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, PartialEq)]
pub enum SessionError {
    #[error("no project with id {0}")]
    UnknownProject(String),
    #[error("no image with id {0}")]
    UnknownImage(String),
    #[error("image {id} is a {actual}, expected a {expected}")]
    WrongKind {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// A non-blocking, user-visible message about a degraded operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

impl Notice {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raised_at: Utc::now(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of a consistency sweep over the library and projects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckReport {
    pub projects: usize,
    pub assets: usize,
    pub problems: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

pub struct Studio<S, C = PassThrough, U = LocalUploader> {
    store: S,
    compressor: C,
    uploader: U,
    user_id: String,
    registry: Registry,
    assets: AssetStore,
    progress: ProgressMap,
    notices: Vec<Notice>,
}

impl Studio<FileRegistry, PassThrough, LocalUploader> {
    /// A studio over the workspace at `root`, laid out per `config`, already
    /// loaded.
    pub fn open(root: &Path, config: &StudioConfig) -> Self {
        let asset_dir = config.asset_dir(root);
        let mut studio = Studio::new(
            FileRegistry::new(config.registry_path(root)),
            PassThrough,
            LocalUploader::new(&asset_dir),
            &asset_dir,
        );
        studio.load();
        studio
    }
}

impl<S: RegistryStore, C: Compressor, U: Uploader> Studio<S, C, U> {
    /// An empty studio. Call [`load`](Self::load) to read the registry.
    pub fn new(store: S, compressor: C, uploader: U, asset_dir: &Path) -> Self {
        Self {
            store,
            compressor,
            uploader,
            user_id: LOCAL_USER_ID.to_string(),
            registry: Registry::empty(),
            assets: AssetStore::new(asset_dir),
            progress: ProgressMap::new(),
            notices: Vec::new(),
        }
    }

    /// Read the registry and populate the library with this user's assets.
    ///
    /// An unreadable registry leaves the studio empty and raises a notice.
    pub fn load(&mut self) {
        match self.store.load() {
            Ok(registry) => {
                for project in &registry.projects {
                    if let Err(e) = project.validate() {
                        warn!(project = %project.id, error = %e, "loaded project is inconsistent");
                        self.notices.push(Notice::new(format!("Project {}: {e}", project.name)));
                    }
                }
                self.registry = registry;
            }
            Err(e) => {
                warn!(error = %e, "registry load failed, starting empty");
                self.notices.push(Notice::new(format!("Could not load registry: {e}")));
                self.registry = Registry::empty();
            }
        }
        self.assets.set_images(self.registry.images_for_user(&self.user_id));
        info!(
            version = self.registry.version,
            assets = self.assets.images().len(),
            projects = self.registry.projects.len(),
            "studio loaded"
        );
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn projects(&self) -> &[MockupProject] {
        self.registry.projects()
    }

    pub fn project(&self, id: &str) -> Option<&MockupProject> {
        self.registry.project(id)
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetStore {
        &mut self.assets
    }

    pub fn progress(&self) -> &ProgressMap {
        &self.progress
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Hand the accumulated notices to the host and clear them.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn persist(&mut self) {
        if let Err(e) = self.store.save(&self.registry) {
            warn!(error = %e, "registry save failed, keeping local state");
            self.notices.push(Notice::new(format!("Could not save registry: {e}")));
        }
    }

    fn image_of_kind(&self, id: &str, kind: AssetKind) -> Result<&UploadedImage, SessionError> {
        let image = self
            .assets
            .image(id)
            .ok_or_else(|| SessionError::UnknownImage(id.to_string()))?;
        if image.kind != kind {
            return Err(SessionError::WrongKind {
                id: id.to_string(),
                expected: kind.as_str(),
                actual: image.kind.as_str(),
            });
        }
        Ok(image)
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Start a new empty project over an existing blank.
    pub fn create_project(&mut self, name: &str, blank_id: &str) -> Result<MockupProject, SessionError> {
        self.image_of_kind(blank_id, AssetKind::Blank)?;
        let project = MockupProject::new(name, blank_id);
        info!(project = %project.id, name, "project created");
        self.update_project(project.clone());
        Ok(project)
    }

    /// Replace the stored copy of `project`, then write the registry.
    ///
    /// A failed write is reported as a notice; the in-memory copy is kept.
    pub fn update_project(&mut self, project: MockupProject) {
        debug!(project = %project.id, designs = project.designs.len(), "project updated");
        self.registry.upsert_project(project);
        self.persist();
    }

    pub fn delete_project(&mut self, id: &str) -> bool {
        let removed = self.registry.remove_project(id);
        if removed {
            info!(project = id, "project deleted");
        }
        self.persist();
        removed
    }

    /// Place a library design on top of a project. Returns the new element's id.
    pub fn add_design_to_project(&mut self, project_id: &str, image_id: &str) -> Result<String, SessionError> {
        let image = self.image_of_kind(image_id, AssetKind::Design)?.clone();
        let mut project = self
            .project(project_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownProject(project_id.to_string()))?;
        let element_id = project.add_design(&image).id.clone();
        self.update_project(project);
        Ok(element_id)
    }

    /// An editor over a stored project, configured for this workspace.
    pub fn editor(&self, project_id: &str, config: &StudioConfig) -> Result<CanvasEditor, SessionError> {
        let project = self
            .project(project_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownProject(project_id.to_string()))?;
        let mut editor = CanvasEditor::new(project, config.canvas_size());
        editor.aspect_locked = config.editor.aspect_locked;
        Ok(editor)
    }

    /// Apply editor output. Only project updates concern the session;
    /// selection and cursor changes belong to the host.
    pub fn apply_actions(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::ProjectUpdated(project) => self.update_project(project),
                Action::SelectionChanged(_) | Action::SetCursor(_) => {}
            }
        }
    }

    // =========================================================================
    // Library
    // =========================================================================

    /// Remove an image from the library, the registry and storage.
    ///
    /// Design elements placed from it are removed from every project. A
    /// project whose blank it was keeps the dangling reference and renders
    /// without a blank. A storage failure is a notice.
    pub fn delete_image(&mut self, image_id: &str) -> Result<(), SessionError> {
        let image = self
            .assets
            .remove(image_id)
            .ok_or_else(|| SessionError::UnknownImage(image_id.to_string()))?;
        self.registry.remove_asset(image_id);

        let affected: Vec<MockupProject> = self
            .registry
            .projects
            .iter()
            .filter(|p| p.designs.iter().any(|d| d.image_id == image_id))
            .cloned()
            .collect();
        for mut project in affected {
            let removed = project.remove_designs_of_image(image_id);
            debug!(project = %project.id, removed, "dropped elements of deleted image");
            self.registry.upsert_project(project);
        }

        let public_id = image.public_id.as_deref().unwrap_or(&image.id);
        if let Err(e) = self.uploader.delete(public_id) {
            warn!(image = image_id, error = %e, "storage delete failed");
            self.notices.push(Notice::new(format!("Could not delete {} from storage: {e}", image.name)));
        }
        info!(image = image_id, name = %image.name, "image deleted");
        self.persist();
        Ok(())
    }

    /// Validate, compress, upload and register each file independently.
    ///
    /// Results line up with `files`. A failed compression falls back to the
    /// original file; any other failure skips that file only. The registry
    /// is written once at the end if anything was added.
    pub fn upload_batch(
        &mut self,
        files: &[PathBuf],
        kind: AssetKind,
    ) -> Vec<Result<UploadedImage, UploadFailure>> {
        let results: Vec<_> = files.iter().map(|file| self.upload_one(file, kind)).collect();

        for (file, result) in files.iter().zip(&results) {
            if let Err(e) = result {
                warn!(file = %file.display(), error = %e, "upload failed");
                self.notices.push(Notice::new(format!("Upload failed: {e}")));
            }
        }
        if results.iter().any(Result::is_ok) {
            self.persist();
        }
        results
    }

    fn upload_one(&mut self, file: &Path, kind: AssetKind) -> Result<UploadedImage, UploadFailure> {
        validate_upload(file)?;
        let id = generate_id();
        self.progress.insert(&id);
        let result = self.compress_and_upload(file, kind, &id);
        self.progress.remove(&id);
        let image = result?;

        self.registry.upsert_asset(AssetEntry::from_image(&image, &self.user_id));
        self.assets.insert(image.clone());
        info!(image = %image.id, name = %image.name, kind = kind.as_str(), "image uploaded");
        Ok(image)
    }

    fn compress_and_upload(&mut self, file: &Path, kind: AssetKind, id: &str) -> Result<UploadedImage, UpstreamError> {
        let progress = &mut self.progress;
        let source = match self
            .compressor
            .compress(file, &mut |pct| progress.update(id, compression_progress(pct)))
        {
            Ok(compressed) => {
                debug!(
                    file = %file.display(),
                    original = compressed.original_size,
                    compressed = compressed.compressed_size,
                    "compressed"
                );
                compressed.path
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "compression failed, uploading original");
                file.to_path_buf()
            }
        };
        progress.update(id, compression_progress(100));

        let receipt = self
            .uploader
            .upload(&source, kind, id, &mut |pct| progress.update(id, upload_progress(pct)))?;

        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| id.to_string());
        Ok(UploadedImage {
            id: id.to_string(),
            name,
            url: receipt.url,
            kind,
            uploaded_at: Utc::now(),
            original_width: Some(receipt.width),
            original_height: Some(receipt.height),
            public_id: Some(receipt.public_id),
        })
    }

    // =========================================================================
    // Consistency
    // =========================================================================

    /// Look for dangling references, inconsistent projects and missing files.
    pub fn check(&self) -> CheckReport {
        let mut problems = Vec::new();

        for image in self.assets.images() {
            match self.assets.resolve_path(&image.url) {
                Some(path) if !path.exists() => {
                    problems.push(format!("image {} ({}): missing file {}", image.id, image.name, path.display()))
                }
                Some(_) => {}
                None => debug!(image = %image.id, url = %image.url, "remote image not checked"),
            }
        }

        for project in self.projects() {
            if let Err(e) = project.validate() {
                problems.push(format!("project {}: {e}", project.name));
            }
            if self.assets.image(&project.blank_id).is_none() {
                problems.push(format!("project {}: unknown blank {}", project.name, project.blank_id));
            }
            for element in &project.designs {
                if self.assets.image(&element.image_id).is_none() {
                    problems.push(format!(
                        "project {}: element {} references unknown image {}",
                        project.name, element.id, element.image_id
                    ));
                }
            }
        }

        CheckReport {
            projects: self.projects().len(),
            assets: self.assets.images().len(),
            problems,
        }
    }
}
