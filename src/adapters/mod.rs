//! Adapter interfaces for external systems.
//!
//! Adapters provide narrow interfaces over the two collaborators the flows
//! depend on: the git history and the dashboard service.

pub mod git;
pub mod grafana;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{Revision, VersionTag};
use crate::error::Result;

// Re-export the concrete adapters
pub use git::GitCli;
pub use grafana::{GrafanaClient, UnconfiguredGrafana};

/// Access to the version-control history holding the dashboard
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// All commits, newest first
    async fn log(&self) -> Result<Vec<Revision>>;

    /// Bytes of `path` as stored at `revision`
    async fn show(&self, revision: &str, path: &str) -> Result<Vec<u8>>;

    /// Stage `path`, commit it with `message`, and tag the new commit
    async fn commit_and_tag(&self, path: &str, message: &str, tag: &VersionTag) -> Result<()>;
}

/// The service hosting the live dashboard
#[async_trait]
pub trait DashboardService: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Current dashboard envelope (a JSON object with a `dashboard` key)
    async fn fetch(&self) -> Result<Value>;

    /// Create or overwrite the dashboard with `dashboard`
    async fn upsert(&self, dashboard: &Value) -> Result<()>;
}
