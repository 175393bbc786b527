//! Packager settings (ocpack.yaml)
//!
//! Resolution order, lowest to highest: built-in defaults, `ocpack.yaml`,
//! environment variables (`OCPACK_JOBS`, `OCPACK_OUTPUT_DIR`), command line
//! flags (applied by the caller).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{OcpackError, Result};

/// Default settings file name
pub const SETTINGS_FILE: &str = "ocpack.yaml";

/// Default name of the output directory inside each component
pub const DEFAULT_OUTPUT_DIR: &str = "_package";

/// Where the stamped `oc.version` comes from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum VersionSetting {
    /// Version of the packager itself
    #[default]
    Tool,
    /// The component's own `version` field
    Component,
    /// `version` field of a JSON package descriptor
    Descriptor { path: PathBuf },
    /// A fixed version
    Fixed { version: String },
}

/// Packager settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PackagerSettings {
    /// Output directory name inside each component
    pub output_dir: String,

    /// Whether compiled output is minified
    pub minify: bool,

    /// Upper bound on components packaged at the same time
    pub jobs: usize,

    /// Modules every data handler may require without declaring them
    pub allowed_modules: Vec<String>,

    pub version: VersionSetting,
}

impl Default for PackagerSettings {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            minify: true,
            jobs: default_jobs(),
            allowed_modules: Vec::new(),
            version: VersionSetting::Tool,
        }
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

impl PackagerSettings {
    /// Parse and validate settings from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings = Self::parse_yaml(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    fn parse_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load settings from an explicit file, or from `ocpack.yaml` in `dir` if present,
    /// then apply environment overrides
    ///
    /// Validation runs once, on the merged result. The `OCPACK_CONFIG`
    /// variable is resolved by the command line into `explicit`.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| Some(dir.join(SETTINGS_FILE)).filter(|p| p.is_file()));

        let mut settings = match path {
            Some(path) => {
                let yaml =
                    std::fs::read_to_string(&path).map_err(|e| OcpackError::FileReadFailed {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?;
                tracing::debug!(path = %path.display(), "loading settings");
                Self::parse_yaml(&yaml).map_err(|e| match e {
                    OcpackError::ConfigParseFailed { reason, .. } => {
                        OcpackError::ConfigParseFailed {
                            path: path.display().to_string(),
                            reason,
                        }
                    }
                    other => other,
                })?
            }
            None => Self::default(),
        };

        settings.apply_env()?;
        Ok(settings)
    }

    /// Apply `OCPACK_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(jobs) = std::env::var("OCPACK_JOBS") {
            self.jobs = jobs.parse().map_err(|_| OcpackError::ConfigInvalid {
                message: format!("OCPACK_JOBS must be a positive integer, got '{jobs}'"),
            })?;
        }
        if let Ok(output_dir) = std::env::var("OCPACK_OUTPUT_DIR") {
            self.output_dir = output_dir;
        }
        self.validate()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(OcpackError::ConfigInvalid {
                message: "jobs must be at least 1".to_string(),
            });
        }

        let single_component = Path::new(&self.output_dir).components().count() == 1;
        if self.output_dir.is_empty()
            || !single_component
            || self.output_dir == "."
            || self.output_dir == ".."
        {
            return Err(OcpackError::ConfigInvalid {
                message: format!(
                    "output_dir must be a plain directory name, got '{}'",
                    self.output_dir
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = PackagerSettings::default();
        assert_eq!(settings.output_dir, "_package");
        assert!(settings.minify);
        assert!(settings.jobs >= 1);
        assert_eq!(settings.version, VersionSetting::Tool);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
output_dir: dist
minify: false
jobs: 2
allowed_modules: [fs, path]
version:
  source: fixed
  version: 1.2.3
"#;
        let settings = PackagerSettings::from_yaml(yaml).unwrap();
        assert_eq!(settings.output_dir, "dist");
        assert!(!settings.minify);
        assert_eq!(settings.jobs, 2);
        assert_eq!(settings.allowed_modules, vec!["fs", "path"]);
        assert_eq!(
            settings.version,
            VersionSetting::Fixed {
                version: "1.2.3".to_string()
            }
        );
    }

    #[test]
    fn test_from_yaml_partial_uses_defaults() {
        let settings = PackagerSettings::from_yaml("version:\n  source: component\n").unwrap();
        assert_eq!(settings.output_dir, "_package");
        assert_eq!(settings.version, VersionSetting::Component);
    }

    #[test]
    fn test_rejects_nested_output_dir() {
        assert!(PackagerSettings::from_yaml("output_dir: a/b\n").is_err());
        assert!(PackagerSettings::from_yaml("output_dir: ..\n").is_err());
        assert!(PackagerSettings::from_yaml("jobs: 0\n").is_err());
    }

    #[test]
    #[serial]
    fn test_load_from_dir_and_env() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(SETTINGS_FILE), "jobs: 3\n").unwrap();

        let original = std::env::var("OCPACK_JOBS").ok();
        unsafe {
            std::env::remove_var("OCPACK_CONFIG");
            std::env::remove_var("OCPACK_JOBS");
        }
        let settings = PackagerSettings::load(None, temp.path()).unwrap();
        assert_eq!(settings.jobs, 3);

        unsafe {
            std::env::set_var("OCPACK_JOBS", "7");
        }
        let settings = PackagerSettings::load(None, temp.path()).unwrap();
        assert_eq!(settings.jobs, 7);

        unsafe {
            match original {
                Some(v) => std::env::set_var("OCPACK_JOBS", v),
                None => std::env::remove_var("OCPACK_JOBS"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_env_override_applies_before_validation() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(SETTINGS_FILE), "jobs: 0\n").unwrap();

        let original = std::env::var("OCPACK_JOBS").ok();
        unsafe {
            std::env::remove_var("OCPACK_JOBS");
        }
        assert!(PackagerSettings::load(None, temp.path()).is_err());

        unsafe {
            std::env::set_var("OCPACK_JOBS", "2");
        }
        let settings = PackagerSettings::load(None, temp.path()).unwrap();
        assert_eq!(settings.jobs, 2);

        unsafe {
            match original {
                Some(v) => std::env::set_var("OCPACK_JOBS", v),
                None => std::env::remove_var("OCPACK_JOBS"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_ignores_config_env_without_explicit_path() {
        let temp = TempDir::new().unwrap();
        let elsewhere = temp.path().join("elsewhere.yaml");
        std::fs::write(&elsewhere, "jobs: 9\n").unwrap();

        unsafe {
            std::env::set_var("OCPACK_CONFIG", &elsewhere);
            std::env::remove_var("OCPACK_JOBS");
        }
        let settings = PackagerSettings::load(None, temp.path()).unwrap();
        unsafe {
            std::env::remove_var("OCPACK_CONFIG");
        }
        assert_eq!(settings, PackagerSettings::default());

        let settings = PackagerSettings::load(Some(&elsewhere), temp.path()).unwrap();
        assert_eq!(settings.jobs, 9);
    }

    #[test]
    #[serial]
    fn test_load_reports_file_path_on_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        std::fs::write(&path, "jobs: [unclosed").unwrap();

        let err = PackagerSettings::load(Some(&path), temp.path()).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}
