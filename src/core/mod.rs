//! Core versioning logic.
//!
//! This module contains:
//! - Digest: content fingerprints for change detection
//! - History: tagged commit listing and menu selection
//! - Applier: historical content retrieval and re-application
//! - Pointer: the current version pointer
//! - Orchestrator: export and rollback flows

pub mod applier;
pub mod digest;
pub mod history;
pub mod orchestrator;
pub mod pointer;
pub mod staging;

// Re-export commonly used types
pub use applier::{ArtifactApplier, ArtifactLayout};
pub use digest::{digest, hash_bytes};
pub use history::{filter_versioned, list_versions, select_by_position};
pub use orchestrator::Orchestrator;
pub use pointer::{FilePointer, MemoryPointer, PointerStore};
pub use staging::{write_atomic, StagedFile};
