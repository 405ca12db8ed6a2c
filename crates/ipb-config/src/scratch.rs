//! Process-scoped scratch directory for staged document writes.
//!
//! Constructed once at process start, passed by reference to whatever
//! needs staging space, torn down explicitly from the owner's shutdown
//! path. No process-global state and no Drop-based cleanup: the owner
//! decides when the directory dies.

use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::ConfigError;

/// A uniquely named directory for short-lived staging files.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh scratch directory under `root`.
    pub fn create(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(format!("ipb-scratch-{}", Uuid::new_v4()));
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A fresh, unused file path inside the scratch directory. The file
    /// itself is not created.
    pub fn scratch_file(&self) -> PathBuf {
        self.path.join(Uuid::new_v4().to_string())
    }

    /// Remove the directory and everything staged in it.
    pub fn teardown(self) -> Result<(), ConfigError> {
        fs::remove_dir_all(&self.path)?;
        Ok(())
    }
}
