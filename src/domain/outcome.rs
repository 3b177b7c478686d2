//! Results of the export and rollback flows.

use serde::{Deserialize, Serialize};

use super::version::VersionTag;
use crate::error::Error;

/// What an export run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ExportOutcome {
    /// Remote dashboard changed; a new revision was committed and tagged
    Exported { tag: VersionTag, digest: String },

    /// Local copy already matched the remote; nothing committed
    NoChange { digest: String },
}

impl ExportOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, ExportOutcome::Exported { .. })
    }

    /// Human-readable summary for API responses and CLI output
    pub fn message(&self) -> String {
        match self {
            ExportOutcome::Exported { tag, .. } => {
                format!("Dashboard exported and versioned as {}.", tag)
            }
            ExportOutcome::NoChange { .. } => {
                "No changes detected. Dashboard already up to date.".to_string()
            }
        }
    }
}

/// Linear progress of a rollback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackStage {
    /// Choosing which version to restore
    Selecting,

    /// Version resolved to a concrete revision
    Resolved,

    /// Historical content retrieved and validated
    Fetched,

    /// Content staged locally and pushed to the service
    Applied,

    /// Current version pointer recorded
    PointerUpdated,
}

/// A version request pinned to a revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedVersion {
    /// Revision identifier handed to git
    pub revision: String,

    /// Version tag, when known
    pub tag: Option<VersionTag>,
}

impl ResolvedVersion {
    /// Value recorded in the current version pointer
    pub fn pointer_value(&self) -> String {
        match self.tag {
            Some(tag) => tag.to_string(),
            None => self.revision.clone(),
        }
    }
}

/// A completed rollback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackOutcome {
    pub resolved: ResolvedVersion,

    /// Pointer value after the rollback
    pub current: String,
}

/// A rollback that halted before recording the pointer
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RollbackError {
    /// Last stage reached before the failure
    pub stage: RollbackStage,

    #[source]
    pub error: Error,
}

impl RollbackError {
    pub fn new(stage: RollbackStage, error: Error) -> Self {
        Self { stage, error }
    }

    pub fn into_inner(self) -> Error {
        self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_prefers_tag() {
        let tagged = ResolvedVersion {
            revision: "abc1234".to_string(),
            tag: Some(VersionTag::new(3)),
        };
        assert_eq!(tagged.pointer_value(), "v3");

        let raw = ResolvedVersion {
            revision: "abc1234".to_string(),
            tag: None,
        };
        assert_eq!(raw.pointer_value(), "abc1234");
    }

    #[test]
    fn test_export_outcome_serialization() {
        let outcome = ExportOutcome::Exported {
            tag: VersionTag::new(2),
            digest: "ff".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "exported");
        assert_eq!(json["tag"], "v2");
        assert!(outcome.is_changed());

        let unchanged = ExportOutcome::NoChange {
            digest: "ff".to_string(),
        };
        assert_eq!(serde_json::to_value(&unchanged).unwrap()["status"], "no_change");
        assert!(!unchanged.is_changed());
    }

    #[test]
    fn test_rollback_error_displays_inner() {
        let err = RollbackError::new(RollbackStage::Resolved, Error::NotFound("deadbee".into()));
        assert_eq!(err.to_string(), "Not found: deadbee");
        assert_eq!(err.stage, RollbackStage::Resolved);
    }
}
