//! dashver - GitOps version manager for Grafana dashboards
//!
//! Keeps a single dashboard definition under git: every export that changes
//! the dashboard becomes a commit tagged `v<N>`, and any tagged version can
//! be pushed back to Grafana.
//!
//! # Architecture
//!
//! - Export: fetch the live dashboard, compare content digests with the
//!   local copy, commit and tag when it changed
//! - Rollback: resolve a tag or revision, read the file at that revision,
//!   validate it, replace the local copy atomically, upsert it to Grafana
//! - A current version pointer records what is believed to be live
//!
//! # Modules
//!
//! - `adapters`: External system integrations (git CLI, Grafana API)
//! - `core`: Versioning logic (digests, history, applier, orchestrator)
//! - `domain`: Data structures (VersionTag, Revision, flow outcomes)
//! - `http_server`: HTTP API
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Export the live dashboard (commits + tags only on change)
//! dashver export
//!
//! # List tagged versions
//! dashver --list
//!
//! # Roll back without prompting
//! dashver --apply v3
//!
//! # Serve the HTTP API
//! dashver serve --port 5000
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod http_server;

// Re-export main types at crate root for convenience
pub use crate::core::{MemoryPointer, Orchestrator, PointerStore};
pub use domain::{ExportOutcome, Revision, RollbackOutcome, RollbackStage, VersionTag};
pub use error::{Error, Result};
