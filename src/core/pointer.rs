//! Current version pointer.
//!
//! A single value naming the version believed to be live. It is injected
//! into the orchestrator rather than read from ambient state, so flows can
//! run against [`MemoryPointer`] in tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::staging::write_atomic;
use crate::error::Result;

/// Storage for the current version pointer
pub trait PointerStore: Send + Sync {
    /// Current value, `None` before the first export
    fn read(&self) -> Result<Option<String>>;

    /// Replace the value
    fn write(&self, value: &str) -> Result<()>;
}

/// Pointer persisted as a one-line text file
#[derive(Debug, Clone)]
pub struct FilePointer {
    path: PathBuf,
}

impl FilePointer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PointerStore for FilePointer {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let value = std::fs::read_to_string(&self.path)?;
        let value = value.trim();
        Ok((!value.is_empty()).then(|| value.to_string()))
    }

    fn write(&self, value: &str) -> Result<()> {
        write_atomic(&self.path, value.as_bytes())?;
        Ok(())
    }
}

/// In-process pointer
#[derive(Debug, Default)]
pub struct MemoryPointer {
    value: Mutex<Option<String>>,
}

impl MemoryPointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer that already holds `value`
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
        }
    }
}

impl PointerStore for MemoryPointer {
    fn read(&self) -> Result<Option<String>> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn write(&self, value: &str) -> Result<()> {
        *self
            .value
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(value.to_string());
        Ok(())
    }
}
