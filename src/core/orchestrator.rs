//! Export and rollback flows.
//!
//! Coordinates the dashboard service, the git history, the live artifact
//! file, and the current version pointer. Each flow is a straight sequence
//! of steps that stops at the first failure; nothing is retried.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::adapters::{
    DashboardService, GitCli, GrafanaClient, UnconfiguredGrafana, VersionControl,
};
use crate::config::ResolvedConfig;
use crate::domain::{
    next_tag, ExportOutcome, ResolvedVersion, Revision, RollbackError, RollbackOutcome,
    RollbackStage, VersionTag,
};
use crate::error::{Error, Result};

use super::applier::{dashboard_of, ArtifactApplier, ArtifactLayout};
use super::digest::{digest, hash_bytes};
use super::history::list_versions;
use super::pointer::{FilePointer, PointerStore};
use super::staging::write_atomic;

/// Main dashboard version orchestrator
pub struct Orchestrator {
    vcs: Arc<dyn VersionControl>,
    service: Arc<dyn DashboardService>,
    pointer: Arc<dyn PointerStore>,
    applier: ArtifactApplier,
}

impl Orchestrator {
    /// Create an orchestrator over explicit collaborators
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        service: Arc<dyn DashboardService>,
        pointer: Arc<dyn PointerStore>,
        layout: ArtifactLayout,
    ) -> Self {
        let applier = ArtifactApplier::new(vcs.clone(), service.clone(), layout);
        Self {
            vcs,
            service,
            pointer,
            applier,
        }
    }

    /// Wire up git, Grafana, and the pointer file from configuration
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let service: Arc<dyn DashboardService> = match config.grafana_url.as_deref() {
            Some(url) => Arc::new(GrafanaClient::with_timeout(
                url,
                config.grafana_token.clone(),
                &config.dashboard_uid,
                Duration::from_secs(config.timeouts.http_seconds),
            )?),
            None => Arc::new(UnconfiguredGrafana),
        };
        let vcs = GitCli::new(&config.repo_dir)
            .with_timeout(Duration::from_secs(config.timeouts.git_seconds));
        let pointer = FilePointer::new(&config.state_file);
        let layout = ArtifactLayout::new(&config.repo_dir, config.dashboard_path.clone());

        Ok(Self::new(Arc::new(vcs), service, Arc::new(pointer), layout))
    }

    /// Pull the live dashboard, and commit + tag it if it changed
    #[instrument(skip(self), fields(service = self.service.name()))]
    pub async fn export(&self) -> Result<ExportOutcome> {
        let envelope = self.service.fetch().await?;
        dashboard_of(&envelope)?;

        let layout = self.applier.layout();
        let live_path = layout.live_path();
        let previous_content = read_existing(&live_path)?;
        let previous = previous_content.as_deref().map(hash_bytes);

        let content = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| Error::Validation(format!("cannot serialize dashboard: {}", e)))?;
        write_atomic(&live_path, &content)?;

        let current = digest(&live_path)?.ok_or_else(|| {
            Error::NotFound(format!("{} vanished after export", live_path.display()))
        })?;

        if previous.as_deref() == Some(current.as_str()) {
            info!("No changes detected");
            return Ok(ExportOutcome::NoChange { digest: current });
        }

        // Until the commit lands, the previous file stays the change baseline
        let tag = match self.commit_export(&layout.dashboard_path).await {
            Ok(tag) => tag,
            Err(err) => {
                restore(&live_path, previous_content.as_deref());
                return Err(err);
            }
        };
        self.pointer.write(&tag.to_string())?;

        info!(%tag, "Dashboard exported");
        Ok(ExportOutcome::Exported {
            tag,
            digest: current,
        })
    }

    async fn commit_export(&self, dashboard_path: &str) -> Result<VersionTag> {
        let history = self.vcs.log().await?;
        let tag = next_tag(history.iter().map(|rev| rev.message.as_str()))?;
        let message = format!("{} Dashboard update", tag);

        self.vcs
            .commit_and_tag(dashboard_path, &message, &tag)
            .await?;
        Ok(tag)
    }

    /// Tagged revisions, newest first
    pub async fn list_versions(&self) -> Result<Vec<Revision>> {
        list_versions(self.vcs.as_ref()).await
    }

    /// Value of the current version pointer
    pub fn current(&self) -> Result<Option<String>> {
        self.pointer.read()
    }

    /// Pin a version tag or raw revision identifier to a revision
    pub async fn resolve(&self, version: &str) -> Result<ResolvedVersion> {
        let token = version.trim();
        if token.is_empty() {
            return Err(Error::Input("version is required".to_string()));
        }
        if token.starts_with('-') || token.contains(char::is_whitespace) {
            return Err(Error::Input(format!("invalid version: {:?}", token)));
        }

        let versions = self.list_versions().await?;

        if let Ok(tag) = token.parse::<VersionTag>() {
            return versions
                .iter()
                .find(|rev| tag.appears_in(&rev.message))
                .map(|rev| ResolvedVersion {
                    revision: rev.id.clone(),
                    tag: Some(tag),
                })
                .ok_or_else(|| Error::NotFound(format!("no revision tagged {}", tag)));
        }

        let tag = versions
            .iter()
            .find(|rev| rev.id == token)
            .and_then(Revision::tag);

        Ok(ResolvedVersion {
            revision: token.to_string(),
            tag,
        })
    }

    /// Roll back to a version tag or raw revision identifier
    #[instrument(skip(self))]
    pub async fn rollback(&self, version: &str) -> Result<RollbackOutcome, RollbackError> {
        let resolved = self
            .resolve(version)
            .await
            .map_err(|e| halt(RollbackStage::Selecting, e))?;

        self.apply_resolved(resolved).await
    }

    /// Roll back to a revision chosen from [`Orchestrator::list_versions`]
    #[instrument(skip(self, revision), fields(revision = %revision.id))]
    pub async fn rollback_to(&self, revision: &Revision) -> Result<RollbackOutcome, RollbackError> {
        let resolved = ResolvedVersion {
            revision: revision.id.clone(),
            tag: revision.tag(),
        };

        self.apply_resolved(resolved).await
    }

    async fn apply_resolved(
        &self,
        resolved: ResolvedVersion,
    ) -> Result<RollbackOutcome, RollbackError> {
        info!(revision = %resolved.revision, tag = ?resolved.tag, "Rolling back");

        let content = self
            .applier
            .fetch_at(&resolved.revision)
            .await
            .map_err(|e| halt(RollbackStage::Resolved, e))?;

        self.applier
            .stage_and_apply(&content)
            .await
            .map_err(|e| halt(RollbackStage::Fetched, e))?;

        let current = resolved.pointer_value();
        self.pointer
            .write(&current)
            .map_err(|e| halt(RollbackStage::Applied, e))?;

        info!(%current, "Rollback complete");
        Ok(RollbackOutcome { resolved, current })
    }
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Put the live file back the way it was before a failed export
fn restore(path: &Path, previous: Option<&[u8]>) {
    let restored = match previous {
        Some(content) => write_atomic(path, content),
        None => fs::remove_file(path),
    };

    if let Err(e) = restored {
        warn!(path = %path.display(), error = %e, "Failed to restore live dashboard");
    }
}

fn halt(stage: RollbackStage, error: Error) -> RollbackError {
    warn!(?stage, error = %error, "Rollback halted");
    RollbackError::new(stage, error)
}
