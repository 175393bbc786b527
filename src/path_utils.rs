//! Path utilities for component directories
//!
//! Component manifests name files relative to the component directory. These
//! helpers resolve such names without touching the filesystem (lexical) and,
//! for files that exist, through symlinks (`normpath`), so a component can
//! never reach outside its own directory.

use normpath::PathExt;
use std::path::{Component, Path, PathBuf};

/// Convert a path to a forward-slash string
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ocpack::path_utils::to_forward_slashes;
///
/// assert_eq!(to_forward_slashes(Path::new("a\\b/c.js")), "a/b/c.js");
/// ```
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Resolve `.` and `..` components without consulting the filesystem
///
/// A `..` that would climb above the start of a relative path is kept, so the
/// result still compares as outside any root it escapes.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use ocpack::path_utils::normalize_lexically;
///
/// assert_eq!(normalize_lexically(Path::new("/c/./src/../t.html")), PathBuf::from("/c/t.html"));
/// assert_eq!(normalize_lexically(Path::new("../x")), PathBuf::from("../x"));
/// ```
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Join `relative` onto `root` and return it only if it stays inside `root`
pub fn resolve_within(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    if relative.is_absolute() || relative.has_root() {
        return None;
    }

    let root = normalize_lexically(root);
    let joined = normalize_lexically(&root.join(relative));
    (joined != root && joined.starts_with(&root)).then_some(joined)
}

/// Resolve a path through symlinks
///
/// For paths that do not exist yet, the longest existing ancestor is resolved
/// and the remaining components are appended.
pub fn resolve_existing(path: &Path) -> PathBuf {
    if let Ok(norm) = path.normalize() {
        return norm.into_path_buf();
    }

    let mut current = path;
    let mut missing = Vec::new();
    while !current.exists() {
        match (current.file_name(), current.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name);
                current = parent;
            }
            _ => return normalize_lexically(path),
        }
    }

    let mut resolved = current
        .normalize()
        .map_or_else(|_| current.to_path_buf(), normpath::BasePathBuf::into_path_buf);
    for name in missing.iter().rev() {
        resolved.push(name);
    }
    resolved
}

/// Whether `path` lies inside `root` once symlinks are resolved
pub fn is_contained(path: &Path, root: &Path) -> bool {
    resolve_existing(path).starts_with(resolve_existing(root))
}
