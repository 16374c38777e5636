//! The registry document: every asset and project a user owns, in one JSON
//! file used for cross-session sync.
//!
//! ```json
//! {
//!   "version": 7,
//!   "lastUpdated": "2024-05-01T12:00:00Z",
//!   "assets": [{ "id": "…", "name": "tee.png", "type": "blank", "publicId": "…", "url": "…", … }],
//!   "projects": [{ "id": "…", "name": "Summer Tee", "blankId": "…", "designs": [ … ], … }]
//! }
//! ```
//!
//! Every mutation bumps `version` and `lastUpdated`. Upserts replace by id and
//! move the entry to the end of its list. Storage goes through the
//! [`RegistryStore`] trait; [`FileRegistry`] keeps the document on disk.

use crate::types::{AssetKind, MockupProject, UploadedImage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Owner recorded on assets uploaded from this machine.
pub const LOCAL_USER_ID: &str = "local-user";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Registry JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One uploaded asset as recorded in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[serde(alias = "cloudinaryPublicId")]
    pub public_id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub uploaded_at: DateTime<Utc>,
    pub user_id: String,
}

impl AssetEntry {
    pub fn from_image(image: &UploadedImage, user_id: &str) -> Self {
        Self {
            id: image.id.clone(),
            name: image.name.clone(),
            kind: image.kind,
            public_id: image.public_id.clone().unwrap_or_else(|| image.id.clone()),
            url: image.url.clone(),
            width: image.original_width,
            height: image.original_height,
            uploaded_at: image.uploaded_at,
            user_id: user_id.to_string(),
        }
    }

    pub fn to_image(&self) -> UploadedImage {
        UploadedImage {
            id: self.id.clone(),
            name: self.name.clone(),
            url: self.url.clone(),
            kind: self.kind,
            uploaded_at: self.uploaded_at,
            original_width: self.width,
            original_height: self.height,
            public_id: Some(self.public_id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub version: u64,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub assets: Vec<AssetEntry>,
    #[serde(default)]
    pub projects: Vec<MockupProject>,
}

impl Registry {
    pub fn empty() -> Self {
        Self {
            version: 1,
            last_updated: Utc::now(),
            assets: Vec::new(),
            projects: Vec::new(),
        }
    }

    fn bump(&mut self) {
        self.version += 1;
        self.last_updated = Utc::now();
    }

    pub fn upsert_asset(&mut self, entry: AssetEntry) {
        self.assets.retain(|a| a.id != entry.id);
        self.assets.push(entry);
        self.bump();
    }

    /// Returns whether an entry was removed. The version is bumped either way.
    pub fn remove_asset(&mut self, id: &str) -> bool {
        let before = self.assets.len();
        self.assets.retain(|a| a.id != id);
        self.bump();
        self.assets.len() != before
    }

    pub fn upsert_project(&mut self, project: MockupProject) {
        self.projects.retain(|p| p.id != project.id);
        self.projects.push(project);
        self.bump();
    }

    pub fn remove_project(&mut self, id: &str) -> bool {
        let before = self.projects.len();
        self.projects.retain(|p| p.id != id);
        self.bump();
        self.projects.len() != before
    }

    pub fn projects(&self) -> &[MockupProject] {
        &self.projects
    }

    pub fn project(&self, id: &str) -> Option<&MockupProject> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn assets_for_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a AssetEntry> {
        self.assets.iter().filter(move |a| a.user_id == user_id)
    }

    /// The user's assets as library images.
    pub fn images_for_user(&self, user_id: &str) -> Vec<UploadedImage> {
        self.assets_for_user(user_id).map(AssetEntry::to_image).collect()
    }
}

/// Load/save boundary for the registry document.
pub trait RegistryStore {
    fn load(&self) -> Result<Registry, RegistryError>;
    fn save(&self, registry: &Registry) -> Result<(), RegistryError>;
}

/// Registry stored as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct FileRegistry {
    path: PathBuf,
}

impl FileRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegistryStore for FileRegistry {
    /// A missing file is an empty registry; an unreadable or corrupt one is
    /// an error.
    fn load(&self) -> Result<Registry, RegistryError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no registry yet, starting empty");
                return Ok(Registry::empty());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, registry: &Registry) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(registry)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(
            path = %self.path.display(),
            version = registry.version,
            assets = registry.assets.len(),
            projects = registry.projects.len(),
            "registry saved"
        );
        Ok(())
    }
}
