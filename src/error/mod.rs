//! Error types and handling for ocpack
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//! Every packaging phase reports through [`OcpackError`]; the orchestrator
//! returns the first error unchanged.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for ocpack operations
#[derive(Error, Diagnostic, Debug)]
pub enum OcpackError {
    // Manifest errors
    #[error("Invalid manifest at {path}: {reason}")]
    #[diagnostic(
        code(ocpack::manifest::invalid),
        help("A component needs `name`, `oc.files.template.type` and `oc.files.template.src`")
    )]
    InvalidManifest { path: String, reason: String },

    // Template errors
    #[error("Unsupported template type: {template_type}")]
    #[diagnostic(
        code(ocpack::template::unsupported_type),
        help("Registered template types: {supported}")
    )]
    UnsupportedTemplateType {
        template_type: String,
        supported: String,
    },

    #[error("Failed to compile {template_type} template {path}: {diagnostic}")]
    #[diagnostic(code(ocpack::template::compile_failed))]
    TemplateCompileError {
        template_type: String,
        path: String,
        diagnostic: String,
    },

    // Data handler errors
    #[error("Requiring local js files is not allowed. Keep it small.")]
    #[diagnostic(
        code(ocpack::bundle::local_require),
        help("`{specifier}` is local code; only JSON files may be required relatively")
    )]
    DisallowedLocalRequire { specifier: String },

    #[error("Missing dependencies from package.json => {}", format_module_list(.modules))]
    #[diagnostic(
        code(ocpack::bundle::missing_dependencies),
        help("Declare every required module under `dependencies` in package.json")
    )]
    MissingDependencies { modules: Vec<String> },

    #[error("Invalid JSON in {path}: {reason}")]
    #[diagnostic(code(ocpack::bundle::invalid_json))]
    InvalidInlineJson { path: String, reason: String },

    #[error("Failed to minify {target}: {reason}")]
    #[diagnostic(code(ocpack::minify::failed))]
    MinifyError { target: String, reason: String },

    #[error("{failed} of {total} components failed to package")]
    #[diagnostic(code(ocpack::package::batch_failed))]
    PackagingFailed { failed: usize, total: usize },

    // Version errors
    #[error("Could not resolve component version: {reason}")]
    #[diagnostic(
        code(ocpack::version::unresolved),
        help("Check the `version` section of ocpack.yaml")
    )]
    VersionUnresolved { reason: String },

    #[error("Invalid version '{version}': {reason}")]
    #[diagnostic(code(ocpack::version::invalid))]
    InvalidVersion { version: String, reason: String },

    // Configuration errors
    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(ocpack::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(ocpack::config::invalid))]
    ConfigInvalid { message: String },

    // Rendering client errors
    #[error("Registry request to {href} failed: {reason}")]
    #[diagnostic(code(ocpack::client::request_failed))]
    RegistryRequestFailed { href: String, reason: String },

    #[error("Invalid registry response: {reason}")]
    #[diagnostic(code(ocpack::client::invalid_response))]
    InvalidRegistryResponse { reason: String },

    #[error("Failed to fetch template {src}: {reason}")]
    #[diagnostic(code(ocpack::client::template_fetch_failed))]
    TemplateFetchFailed { src: String, reason: String },

    #[error("Failed to execute template {key}: {reason}")]
    #[diagnostic(code(ocpack::client::template_execution_failed))]
    TemplateExecutionFailed { key: String, reason: String },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(ocpack::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(ocpack::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}: {reason}")]
    #[diagnostic(code(ocpack::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(ocpack::fs::io_error))]
    IoError { message: String },
}

/// Renders module names the way the registry reports them: `["a","b"]`
fn format_module_list(modules: &[String]) -> String {
    serde_json::to_string(modules).unwrap_or_else(|_| format!("{modules:?}"))
}

impl From<std::io::Error> for OcpackError {
    fn from(err: std::io::Error) -> Self {
        OcpackError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for OcpackError {
    fn from(err: serde_yaml::Error) -> Self {
        OcpackError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OcpackError {
    fn from(err: serde_json::Error) -> Self {
        OcpackError::InvalidManifest {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, OcpackError>;
