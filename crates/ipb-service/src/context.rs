//! Explicit per-process context: where the store and document live, plus
//! scratch space for staged writes.
//!
//! Constructed once at process start by the embedding process and passed
//! by reference into every operation. Teardown is an explicit call from
//! the owner's shutdown path, not a finalizer.

use std::path::{Path, PathBuf};

use ipb_config::{ConfigEditor, ScratchDir};

use crate::ServiceError;

/// File locations of the externally owned resources.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    /// The ban engine's SQLite store.
    pub database_path: PathBuf,
    /// The ban engine's XML configuration document.
    pub config_path: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        // The ban engine's own file names.
        Self {
            database_path: PathBuf::from("ipban.sqlite"),
            config_path: PathBuf::from("ipban.config"),
        }
    }
}

/// Everything an operation needs. Holds no open handles; operations open
/// and release per request.
pub struct AppContext {
    settings: ServiceSettings,
    scratch: ScratchDir,
}

impl AppContext {
    pub fn new(settings: ServiceSettings, scratch_root: &Path) -> Result<Self, ServiceError> {
        let scratch = ScratchDir::create(scratch_root)?;
        Ok(Self { settings, scratch })
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// An editor over the configured document, staging through this
    /// context's scratch directory.
    pub fn editor(&self) -> ConfigEditor<'_> {
        ConfigEditor::new(&self.settings.config_path, &self.scratch)
    }

    /// Release the scratch directory. Called from the owning process's
    /// shutdown path.
    pub fn teardown(self) -> Result<(), ServiceError> {
        self.scratch.teardown()?;
        Ok(())
    }
}
