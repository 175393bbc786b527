//! Version stamping sources
//!
//! The version written into `oc.version` comes from a [`VersionSource`]. The
//! default is the packager's own version, which is what a registry expects
//! when it checks which tool produced an artifact.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::{ComponentManifest, VersionSetting};
use crate::error::{OcpackError, Result};

/// Supplies the version stamped into a packaged manifest
pub trait VersionSource: Send + Sync {
    /// Human-readable origin, for logs and errors
    fn describe(&self) -> String;

    /// Produce the raw version string for a component
    fn version_for(&self, manifest: &ComponentManifest) -> Result<String>;
}

/// Version of this packager
#[derive(Debug, Default, Clone, Copy)]
pub struct ToolVersion;

impl VersionSource for ToolVersion {
    fn describe(&self) -> String {
        "packager version".to_string()
    }

    fn version_for(&self, _manifest: &ComponentManifest) -> Result<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }
}

/// The component's own `version` field
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentVersion;

impl VersionSource for ComponentVersion {
    fn describe(&self) -> String {
        "component version".to_string()
    }

    fn version_for(&self, manifest: &ComponentManifest) -> Result<String> {
        manifest
            .version
            .clone()
            .ok_or_else(|| OcpackError::VersionUnresolved {
                reason: format!("component '{}' has no version field", manifest.name),
            })
    }
}

/// The `version` field of a JSON descriptor file, read on each call
#[derive(Debug, Clone)]
pub struct DescriptorVersion {
    path: PathBuf,
}

#[derive(Deserialize)]
struct Descriptor {
    version: Option<String>,
}

impl DescriptorVersion {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl VersionSource for DescriptorVersion {
    fn describe(&self) -> String {
        format!("descriptor {}", self.path.display())
    }

    fn version_for(&self, _manifest: &ComponentManifest) -> Result<String> {
        let unresolved = |reason: String| OcpackError::VersionUnresolved {
            reason: format!("{}: {reason}", self.path.display()),
        };

        let json = std::fs::read_to_string(&self.path).map_err(|e| unresolved(e.to_string()))?;
        let descriptor: Descriptor =
            serde_json::from_str(&json).map_err(|e| unresolved(e.to_string()))?;
        descriptor
            .version
            .ok_or_else(|| unresolved("no version field".to_string()))
    }
}

/// A version given explicitly
#[derive(Debug, Clone)]
pub struct FixedVersion(pub String);

impl VersionSource for FixedVersion {
    fn describe(&self) -> String {
        format!("fixed version {}", self.0)
    }

    fn version_for(&self, _manifest: &ComponentManifest) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Build the source configured in settings
///
/// Relative descriptor paths resolve against `base_dir`.
pub fn from_setting(setting: &VersionSetting, base_dir: &Path) -> Box<dyn VersionSource> {
    match setting {
        VersionSetting::Tool => Box::new(ToolVersion),
        VersionSetting::Component => Box::new(ComponentVersion),
        VersionSetting::Descriptor { path } => Box::new(DescriptorVersion::new(base_dir.join(path))),
        VersionSetting::Fixed { version } => Box::new(FixedVersion(version.clone())),
    }
}

/// Resolve a version and check that it is valid semver
pub fn resolve(source: &dyn VersionSource, manifest: &ComponentManifest) -> Result<semver::Version> {
    let raw = source.version_for(manifest)?;
    let version = semver::Version::parse(raw.trim()).map_err(|e| OcpackError::InvalidVersion {
        version: raw.clone(),
        reason: e.to_string(),
    })?;
    tracing::debug!(source = %source.describe(), %version, "resolved version");
    Ok(version)
}
