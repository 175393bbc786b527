//! Component directory discovery
//!
//! Lists the immediate children of a directory that hold a component
//! manifest. Scanning never fails: unreadable entries, foreign
//! `package.json` files and half-written output are skipped.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ManifestState;

/// Which components [`discover`] returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PackagedState {
    /// Components not yet marked as packaged
    #[default]
    Unpackaged,
    /// Components marked as packaged
    Packaged,
    /// Every component
    Any,
}

impl PackagedState {
    fn matches(self, state: &ManifestState) -> bool {
        match self {
            PackagedState::Unpackaged => !state.is_packaged(),
            PackagedState::Packaged => state.is_packaged(),
            PackagedState::Any => true,
        }
    }
}

/// Component directories directly under `parent`, sorted by name
///
/// Returned paths are `parent` joined with the entry name, so a relative
/// `parent` yields relative paths.
pub fn discover(parent: &Path, state: PackagedState) -> Vec<PathBuf> {
    let walker = WalkDir::new(parent)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(parent = %parent.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = parent.join(entry.file_name());
        let Some(manifest) = ManifestState::read(&dir) else {
            tracing::debug!(dir = %dir.display(), "no readable manifest");
            continue;
        };
        if !manifest.is_component() {
            tracing::debug!(dir = %dir.display(), "manifest has no oc section");
            continue;
        }
        if state.matches(&manifest) {
            found.push(dir);
        }
    }

    found
}
