//! Scoped working directory for one conversion call.
//!
//! Engines may stage the document and their output here. The directory is
//! unique per call (so concurrent conversions never collide) and is removed
//! when the [`Workspace`] is closed or dropped, which covers success, error,
//! timeout and cancellation alike.

use crate::error::ConversionError;
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

const PREFIX: &str = "pdf2img-";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh directory under `root`.
    pub fn create(root: &Path) -> Result<Self, ConversionError> {
        let dir = tempfile::Builder::new()
            .prefix(PREFIX)
            .tempdir_in(root)
            .map_err(|e| {
                ConversionError::EngineFailure(format!(
                    "cannot create working directory in '{}': {e}",
                    root.display()
                ))
            })?;
        debug!("Working directory: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory now, reporting failure instead of ignoring it.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}
