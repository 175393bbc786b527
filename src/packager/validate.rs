//! Manifest validation and normalization

use std::path::{Path, PathBuf};

use crate::config::ComponentManifest;
use crate::config::manifest::MANIFEST_FILE;
use crate::error::{OcpackError, Result};
use crate::path_utils;
use crate::template::EngineRegistry;

/// A component whose manifest passed validation
///
/// Source paths are resolved under the component directory and exist.
#[derive(Debug, Clone)]
pub struct ValidatedComponent {
    pub dir: PathBuf,
    pub manifest: ComponentManifest,
    pub template_type: String,
    pub template_path: PathBuf,
    pub data_path: Option<PathBuf>,
}

/// Read, check and normalize the manifest of `component_dir`
pub fn validate(component_dir: &Path, engines: &EngineRegistry) -> Result<ValidatedComponent> {
    let manifest = ComponentManifest::load(component_dir)?;
    let manifest_path = component_dir.join(MANIFEST_FILE);
    let invalid = |reason: String| OcpackError::InvalidManifest {
        path: manifest_path.display().to_string(),
        reason,
    };

    check_name(&manifest.name).map_err(invalid)?;
    if manifest.oc.packaged {
        return Err(invalid(
            "component is already packaged; package its source directory".to_string(),
        ));
    }

    let template = &manifest.oc.files.template;
    if template.template_type.trim().is_empty() {
        return Err(invalid("oc.files.template.type is empty".to_string()));
    }
    if template.src.trim().is_empty() {
        return Err(invalid("oc.files.template.src is empty".to_string()));
    }
    engines.resolve(&template.template_type)?;

    let template_path = source_file(component_dir, "oc.files.template.src", &template.src)
        .map_err(|e| e.into_error(&invalid))?;

    let data_path = match manifest.oc.files.data.as_deref() {
        None => None,
        Some(src) if src.trim().is_empty() => {
            return Err(invalid("oc.files.data is empty".to_string()));
        }
        Some(src) => Some(
            source_file(component_dir, "oc.files.data", src)
                .map_err(|e| e.into_error(&invalid))?,
        ),
    };

    tracing::debug!(
        component = %manifest.name,
        template = %template_path.display(),
        data = ?data_path,
        "validated manifest"
    );

    Ok(ValidatedComponent {
        dir: component_dir.to_path_buf(),
        template_type: template.template_type.clone(),
        manifest,
        template_path,
        data_path,
    })
}

enum SourceError {
    Escapes(String),
    Fatal(OcpackError),
}

impl SourceError {
    fn into_error(self, invalid: &dyn Fn(String) -> OcpackError) -> OcpackError {
        match self {
            SourceError::Escapes(reason) => invalid(reason),
            SourceError::Fatal(err) => err,
        }
    }
}

fn source_file(component_dir: &Path, field: &str, src: &str) -> std::result::Result<PathBuf, SourceError> {
    let path = path_utils::resolve_within(component_dir, src).ok_or_else(|| {
        SourceError::Escapes(format!("{field} '{src}' is outside the component directory"))
    })?;

    if !path.is_file() {
        return Err(SourceError::Fatal(OcpackError::FileNotFound {
            path: path.display().to_string(),
        }));
    }
    if !path_utils::is_contained(&path, component_dir) {
        return Err(SourceError::Escapes(format!(
            "{field} '{src}' resolves outside the component directory"
        )));
    }

    Ok(path)
}

/// Registry-safe component names: `[A-Za-z0-9._-]`, not starting with `.` or `_`
fn check_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err(format!("name '{name}' must not start with '.' or '_'"));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!("name '{name}' contains invalid character '{bad}'"));
    }
    Ok(())
}
