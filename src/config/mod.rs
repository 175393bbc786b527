//! Configuration file handling for ocpack
//!
//! This module contains data structures for:
//! - `package.json` - Component manifest
//! - `ocpack.yaml` - Packager settings

pub mod manifest;
pub mod settings;

// Re-export commonly used types
pub use manifest::{
    ComponentFiles, ComponentManifest, ComponentSection, MANIFEST_FILE, ManifestState,
    PackagedFile, TemplateFile,
};
pub use settings::{PackagerSettings, VersionSetting};
