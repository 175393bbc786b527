//! Component manifest (package.json) data structures
//!
//! Only the fields ocpack reads or stamps are typed; everything else in the
//! file is carried through `extra` so a packaged manifest keeps the author's
//! metadata untouched.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{OcpackError, Result};

/// File name of the component manifest
pub const MANIFEST_FILE: &str = "package.json";

/// Component manifest from package.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentManifest {
    /// Component name, unique within a registry
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Author-facing package version (not the packaged `oc.version`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// External modules the data handler may require, with version ranges
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    pub oc: ComponentSection,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `oc` block of a manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSection {
    pub files: ComponentFiles,

    /// Version stamped at package time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub packaged: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// File references of a component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentFiles {
    pub template: TemplateFile,

    /// Path to the server-side data-logic module
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Compiled data handler, present only in packaged manifests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_provider: Option<PackagedFile>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Template reference: language tag plus source path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateFile {
    #[serde(rename = "type")]
    pub template_type: String,

    pub src: String,

    /// Content key, present only in packaged manifests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_key: Option<String>,
}

/// A derived file inside a packaged artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PackagedFile {
    #[serde(rename = "type")]
    pub file_type: String,
    pub src: String,
    pub hash_key: String,
}

impl ComponentManifest {
    /// Parse a manifest from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Read and parse the manifest of a component directory
    pub fn load(component_dir: &Path) -> Result<Self> {
        let path = component_dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(OcpackError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let json = std::fs::read_to_string(&path).map_err(|e| OcpackError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&json).map_err(|e| OcpackError::InvalidManifest {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Serialize the manifest to pretty JSON with a trailing newline
    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(self)?;
        Ok(format!("{json}\n"))
    }
}

/// Packaged-state view of a manifest
///
/// Parsing this never fails on missing component fields, which lets the
/// scanner classify directories that hold half-written or foreign manifests.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestState {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub oc: Option<StateSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StateSection {
    #[serde(default)]
    pub packaged: Option<bool>,

    #[serde(default)]
    pub version: Option<String>,
}

impl ManifestState {
    /// Read the packaged state of a component directory, if it has a manifest
    pub fn read(component_dir: &Path) -> Option<Self> {
        let json = std::fs::read_to_string(component_dir.join(MANIFEST_FILE)).ok()?;
        serde_json::from_str(&json).ok()
    }

    /// Whether the manifest declares a component at all
    pub fn is_component(&self) -> bool {
        self.oc.is_some()
    }

    /// Whether the manifest is marked as packaged
    pub fn is_packaged(&self) -> bool {
        self.oc
            .as_ref()
            .and_then(|oc| oc.packaged)
            .unwrap_or(false)
    }
}
