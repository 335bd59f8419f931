//! File writer for generated configuration artifacts.

use std::path::Path;

use crate::error::ConfigdError;

/// Replaces a file's content wholesale.
pub trait FileWriter {
    fn write(&self, path: &Path, contents: &str) -> Result<(), ConfigdError>;
}

/// Writes straight to the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFiles;

impl FileWriter for HostFiles {
    fn write(&self, path: &Path, contents: &str) -> Result<(), ConfigdError> {
        std::fs::write(path, contents).map_err(|source| ConfigdError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
        Ok(())
    }
}
