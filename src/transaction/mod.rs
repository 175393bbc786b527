//! Transaction support for atomic packaging output
//!
//! Every file of a packaged artifact is written into a staging directory
//! next to the final output. Committing swaps the staging directory into
//! place; the previous output, if any, is kept aside until the swap succeeds
//! and restored if it does not.
//!
//! ## Usage
//!
//! ```ignore
//! let transaction = Transaction::begin(component_dir, "_package")?;
//! transaction.write_file("template.js", &script)?;
//! transaction.write_file("package.json", &manifest)?;
//!
//! // On success:
//! let output_dir = transaction.commit()?;
//!
//! // On error (automatic via Drop if not committed):
//! // the staging directory is removed and the old output is untouched
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{OcpackError, Result};

const STAGING_PREFIX: &str = ".ocpack-staging-";
const BACKUP_PREFIX: &str = ".ocpack-previous-";

/// A staged write of one output directory
#[derive(Debug)]
pub struct Transaction {
    /// Final location of the output
    target: PathBuf,

    /// Directory receiving the files until commit
    staging: TempDir,

    /// Whether the transaction has been committed
    committed: bool,
}

impl Transaction {
    /// Start staging output for `<parent>/<output_dir>`
    pub fn begin(parent: &Path, output_dir: &str) -> Result<Self> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| OcpackError::FileWriteFailed {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!(staging = %staging.path().display(), "staging output");

        Ok(Self {
            target: parent.join(output_dir),
            staging,
            committed: false,
        })
    }

    /// Final output directory
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Directory currently receiving files
    pub fn staging_path(&self) -> &Path {
        self.staging.path()
    }

    /// Write a file into the staging directory
    pub fn write_file(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.staging.path().join(name);
        fs::write(&path, contents).map_err(|e| OcpackError::FileWriteFailed {
            path: self.target.join(name).display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(path)
    }

    /// Move the staged files into place, replacing any previous output
    pub fn commit(mut self) -> Result<PathBuf> {
        let parent = self.target.parent().unwrap_or_else(|| Path::new("."));

        // Kept alive until the swap is done; dropping it deletes the old output.
        let backup = if self.target.exists() {
            let holder = tempfile::Builder::new()
                .prefix(BACKUP_PREFIX)
                .tempdir_in(parent)
                .map_err(|e| self.write_error(&e))?;
            let previous = holder.path().join("previous");
            fs::rename(&self.target, &previous).map_err(|e| self.write_error(&e))?;
            Some((holder, previous))
        } else {
            None
        };

        if let Err(e) = fs::rename(self.staging.path(), &self.target) {
            if let Some((_, previous)) = &backup {
                if let Err(restore) = fs::rename(previous, &self.target) {
                    tracing::warn!(
                        target = %self.target.display(),
                        error = %restore,
                        "failed to restore previous output"
                    );
                }
            }
            return Err(self.write_error(&e));
        }

        self.committed = true;
        drop(backup);
        tracing::debug!(target = %self.target.display(), "committed output");
        Ok(self.target.clone())
    }

    fn write_error(&self, err: &std::io::Error) -> OcpackError {
        OcpackError::FileWriteFailed {
            path: self.target.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.committed {
            // The staging TempDir removes itself
            tracing::debug!(target = %self.target.display(), "discarding staged output");
        }
    }
}

#[cfg(test)]
mod tests;
