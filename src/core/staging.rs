//! Temp-then-rename file replacement.
//!
//! Content is written next to its destination first and only renamed over
//! the target on [`StagedFile::commit`]. Dropping an uncommitted stage
//! removes the temp file and leaves the target untouched.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Content waiting to replace a file
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Write `contents` to a temp file in `target`'s directory
    pub fn stage(target: &Path, contents: &[u8]) -> io::Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp = tempfile::Builder::new()
            .prefix(".dashver-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;

        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Location of the staged bytes
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Read the staged bytes back from disk
    pub fn read_back(&self) -> io::Result<Vec<u8>> {
        fs::read(self.temp.path())
    }

    /// Atomically rename the staged file over the target
    pub fn commit(self) -> io::Result<()> {
        let Self { temp, target } = self;
        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Replace `target` with `contents` in one rename
pub fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    StagedFile::stage(target, contents)?.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_commit_replaces_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("dash.json");
        fs::write(&target, b"old").unwrap();

        let staged = StagedFile::stage(&target, b"new").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"old");
        assert_eq!(staged.read_back().unwrap(), b"new");

        staged.commit().unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn test_drop_without_commit_leaves_target() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("dash.json");
        fs::write(&target, b"old").unwrap();

        let staged_path = {
            let staged = StagedFile::stage(&target, b"new").unwrap();
            staged.path().to_path_buf()
        };

        assert!(!staged_path.exists());
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn test_write_atomic_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("state").join("current_version.txt");

        write_atomic(&target, b"v1").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "v1");
    }
}
