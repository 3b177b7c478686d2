//! Retrieval of historical dashboard content and re-application.
//!
//! Content travels: git revision -> validated bytes -> staged temp file ->
//! live artifact (atomic rename) -> dashboard service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use super::staging::StagedFile;
use crate::adapters::{DashboardService, VersionControl};
use crate::error::{Error, Result};

/// Where the dashboard lives inside the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    /// Root of the git working tree
    pub repo_dir: PathBuf,

    /// Repository-relative path, `/`-separated as git expects
    pub dashboard_path: String,
}

impl ArtifactLayout {
    pub fn new(repo_dir: impl Into<PathBuf>, dashboard_path: impl Into<String>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            dashboard_path: dashboard_path.into(),
        }
    }

    /// Absolute path of the live artifact file
    pub fn live_path(&self) -> PathBuf {
        self.repo_dir.join(&self.dashboard_path)
    }
}

/// Parse `bytes` as JSON
pub fn parse_document(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).map_err(|e| Error::Validation(format!("invalid JSON: {}", e)))
}

/// The `dashboard` object inside an export envelope
pub fn dashboard_of(envelope: &Value) -> Result<&Value> {
    envelope
        .get("dashboard")
        .filter(|dashboard| dashboard.is_object())
        .ok_or_else(|| Error::Validation("envelope has no \"dashboard\" object".to_string()))
}

/// Artifact fetcher/applier
pub struct ArtifactApplier {
    vcs: Arc<dyn VersionControl>,
    service: Arc<dyn DashboardService>,
    layout: ArtifactLayout,
}

impl ArtifactApplier {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        service: Arc<dyn DashboardService>,
        layout: ArtifactLayout,
    ) -> Self {
        Self {
            vcs,
            service,
            layout,
        }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Artifact bytes as stored at `revision`
    #[instrument(skip(self))]
    pub async fn fetch_at(&self, revision: &str) -> Result<Vec<u8>> {
        let content = self
            .vcs
            .show(revision, &self.layout.dashboard_path)
            .await?;

        if content.is_empty() {
            return Err(Error::NotFound(format!(
                "{} is empty at revision {}",
                self.layout.dashboard_path, revision
            )));
        }

        parse_document(&content)?;
        debug!(bytes = content.len(), "fetched dashboard");

        Ok(content)
    }

    /// Stage `content` as the live artifact and push it to the service
    #[instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn stage_and_apply(&self, content: &[u8]) -> Result<()> {
        let live_path = self.layout.live_path();
        let staged = StagedFile::stage(&live_path, content)?;

        let envelope = parse_document(&staged.read_back()?)?;
        let dashboard = dashboard_of(&envelope)?;

        staged.commit()?;
        info!(path = %live_path.display(), "live dashboard replaced");

        self.service.upsert(dashboard).await
    }

    /// Path of the live artifact
    pub fn live_path(&self) -> PathBuf {
        self.layout.live_path()
    }

    /// Repository root
    pub fn repo_dir(&self) -> &Path {
        &self.layout.repo_dir
    }
}
