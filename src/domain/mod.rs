//! Domain types for dashboard versioning.
//!
//! This module contains the core data structures:
//! - Version: version tags, revisions, and tag allocation
//! - Outcome: results of the export and rollback flows

pub mod outcome;
pub mod version;

// Re-export commonly used types
pub use outcome::{ExportOutcome, ResolvedVersion, RollbackError, RollbackOutcome, RollbackStage};
pub use version::{next_tag, tags_in, Revision, VersionTag};
