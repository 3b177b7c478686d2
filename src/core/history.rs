//! Commit history reader.
//!
//! Narrows the full git log to the commits that carry a version tag and
//! resolves interactive menu choices against that list.

use crate::adapters::VersionControl;
use crate::domain::Revision;
use crate::error::{Error, Result};

/// Keep only revisions whose message carries a version tag, preserving order
pub fn filter_versioned(revisions: Vec<Revision>) -> Vec<Revision> {
    revisions.into_iter().filter(Revision::is_versioned).collect()
}

/// Tagged revisions, newest first
pub async fn list_versions(vcs: &dyn VersionControl) -> Result<Vec<Revision>> {
    Ok(filter_versioned(vcs.log().await?))
}

/// Pick a revision by a 1-based menu position typed by the user
pub fn select_by_position<'a>(versions: &'a [Revision], input: &str) -> Result<&'a Revision> {
    let input = input.trim();
    let position: usize = input
        .parse()
        .map_err(|_| Error::Input(format!("not a number: {:?}", input)))?;

    position
        .checked_sub(1)
        .and_then(|index| versions.get(index))
        .ok_or_else(|| {
            Error::Input(format!(
                "selection {} is out of range (1-{})",
                position,
                versions.len()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Revision> {
        vec![
            Revision::new("c3c3c3c", "v2 Dashboard update"),
            Revision::new("b2b2b2b", "fix typo"),
            Revision::new("a1a1a1a", "v1 Dashboard update"),
        ]
    }

    #[test]
    fn test_filter_keeps_tagged_in_order() {
        let versions = filter_versioned(sample());
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].id, "c3c3c3c");
        assert_eq!(versions[1].id, "a1a1a1a");
    }

    #[test]
    fn test_filter_empty_when_nothing_tagged() {
        let versions = filter_versioned(vec![Revision::new("a", "initial commit")]);
        assert!(versions.is_empty());
    }

    #[test]
    fn test_select_by_position() {
        let versions = filter_versioned(sample());
        assert_eq!(select_by_position(&versions, "1").unwrap().id, "c3c3c3c");
        assert_eq!(select_by_position(&versions, " 2\n").unwrap().id, "a1a1a1a");
    }

    #[test]
    fn test_select_rejects_bad_input() {
        let versions = filter_versioned(sample());
        assert!(matches!(select_by_position(&versions, "0"), Err(Error::Input(_))));
        assert!(matches!(select_by_position(&versions, "3"), Err(Error::Input(_))));
        assert!(matches!(select_by_position(&versions, "two"), Err(Error::Input(_))));
        assert!(matches!(select_by_position(&[], "1"), Err(Error::Input(_))));
    }
}
