//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashver::adapters::{DashboardService, VersionControl};
use dashver::core::ArtifactLayout;
use dashver::{Error, MemoryPointer, Orchestrator, Result, Revision, VersionTag};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const DASHBOARD_PATH: &str = "dashboards/node-exporter.json";

/// A commit with a full snapshot of the tracked files
#[derive(Debug, Clone)]
pub struct FakeCommit {
    pub id: String,
    pub message: String,
    pub tree: HashMap<String, Vec<u8>>,
}

/// Git history held in memory; commits read the working tree from disk
pub struct FakeVcs {
    repo_dir: PathBuf,
    /// Oldest first
    commits: Mutex<Vec<FakeCommit>>,
    tags: Mutex<Vec<String>>,
    commit_failure: Mutex<Option<String>>,
}

impl FakeVcs {
    pub fn new(repo_dir: &Path) -> Self {
        Self {
            repo_dir: repo_dir.to_path_buf(),
            commits: Mutex::new(Vec::new()),
            tags: Mutex::new(Vec::new()),
            commit_failure: Mutex::new(None),
        }
    }

    /// Make `commit_and_tag` fail with `stderr` until cleared
    pub fn fail_commits(&self, stderr: &str) {
        *self.commit_failure.lock().unwrap() = Some(stderr.to_string());
    }

    pub fn allow_commits(&self) {
        *self.commit_failure.lock().unwrap() = None;
    }

    /// Record a commit whose tree sets `path` to `content`; returns its id
    pub fn seed(&self, message: &str, path: &str, content: &[u8]) -> String {
        let mut commits = self.commits.lock().unwrap();
        let mut tree = commits.last().map(|c| c.tree.clone()).unwrap_or_default();
        tree.insert(path.to_string(), content.to_vec());

        let id = format!("c{:06x}", commits.len() + 1);
        commits.push(FakeCommit {
            id: id.clone(),
            message: message.to_string(),
            tree,
        });
        id
    }

    pub fn commit_count(&self) -> usize {
        self.commits.lock().unwrap().len()
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.commits
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.message.clone())
            .collect()
    }
}

#[async_trait]
impl VersionControl for FakeVcs {
    fn name(&self) -> &str {
        "fake-git"
    }

    async fn log(&self) -> Result<Vec<Revision>> {
        Ok(self
            .commits
            .lock()
            .unwrap()
            .iter()
            .rev()
            .map(|c| Revision::new(c.id.clone(), c.message.clone()))
            .collect())
    }

    async fn show(&self, revision: &str, path: &str) -> Result<Vec<u8>> {
        let commits = self.commits.lock().unwrap();
        let commit = commits
            .iter()
            .find(|c| c.id == revision)
            .ok_or_else(|| Error::NotFound(format!("unknown revision {}", revision)))?;

        commit
            .tree
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{} not in {}", path, revision)))
    }

    async fn commit_and_tag(&self, path: &str, message: &str, tag: &VersionTag) -> Result<()> {
        if let Some(stderr) = self.commit_failure.lock().unwrap().clone() {
            return Err(Error::VersionControl {
                command: format!("commit -m {} -- {}", message, path),
                stderr,
            });
        }

        let content = std::fs::read(self.repo_dir.join(path))?;
        let tag = tag.to_string();

        if self.tags().contains(&tag) {
            return Err(Error::VersionControl {
                command: format!("tag {}", tag),
                stderr: format!("fatal: tag '{}' already exists", tag),
            });
        }

        self.seed(message, path, &content);
        self.tags.lock().unwrap().push(tag);
        Ok(())
    }
}

/// Dashboard service holding one envelope in memory
pub struct FakeService {
    envelope: Mutex<Value>,
    upserts: Mutex<Vec<Value>>,
    fail_status: Mutex<Option<u16>>,
}

impl FakeService {
    pub fn new(envelope: Value) -> Self {
        Self {
            envelope: Mutex::new(envelope),
            upserts: Mutex::new(Vec::new()),
            fail_status: Mutex::new(None),
        }
    }

    /// Replace what the service reports as live
    pub fn set_envelope(&self, envelope: Value) {
        *self.envelope.lock().unwrap() = envelope;
    }

    /// Make every subsequent call fail with `status`
    pub fn fail_with(&self, status: u16) {
        *self.fail_status.lock().unwrap() = Some(status);
    }

    pub fn upserts(&self) -> Vec<Value> {
        self.upserts.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        match *self.fail_status.lock().unwrap() {
            Some(status) => Err(Error::ExternalService {
                status,
                body: "{\"message\":\"boom\"}".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DashboardService for FakeService {
    fn name(&self) -> &str {
        "fake-grafana"
    }

    async fn fetch(&self) -> Result<Value> {
        self.check()?;
        Ok(self.envelope.lock().unwrap().clone())
    }

    async fn upsert(&self, dashboard: &Value) -> Result<()> {
        self.check()?;
        self.upserts.lock().unwrap().push(dashboard.clone());
        self.envelope.lock().unwrap()["dashboard"] = dashboard.clone();
        Ok(())
    }
}

/// Export envelope as Grafana returns it
pub fn envelope(title: &str, version: u64) -> Value {
    json!({
        "dashboard": {
            "uid": "rYdddlPWk",
            "title": title,
            "version": version,
            "panels": []
        },
        "meta": { "slug": "node-exporter" }
    })
}

/// Bytes as they would be stored in history
pub fn stored(envelope: &Value) -> Vec<u8> {
    serde_json::to_vec_pretty(envelope).unwrap()
}

/// Orchestrator over fakes in a temp repository
pub struct Harness {
    pub temp: TempDir,
    pub vcs: Arc<FakeVcs>,
    pub service: Arc<FakeService>,
    pub pointer: Arc<MemoryPointer>,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new(remote: Value) -> Self {
        Self::with_pointer(remote, MemoryPointer::new())
    }

    pub fn with_pointer(remote: Value, pointer: MemoryPointer) -> Self {
        let temp = TempDir::new().unwrap();
        let vcs = Arc::new(FakeVcs::new(temp.path()));
        let service = Arc::new(FakeService::new(remote));
        let pointer = Arc::new(pointer);

        let orchestrator = Orchestrator::new(
            vcs.clone(),
            service.clone(),
            pointer.clone(),
            ArtifactLayout::new(temp.path(), DASHBOARD_PATH),
        );

        Self {
            temp,
            vcs,
            service,
            pointer,
            orchestrator,
        }
    }

    pub fn live_path(&self) -> PathBuf {
        self.temp.path().join(DASHBOARD_PATH)
    }

    pub fn write_live(&self, content: &[u8]) {
        let path = self.live_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    pub fn read_live(&self) -> Option<Vec<u8>> {
        std::fs::read(self.live_path()).ok()
    }
}
