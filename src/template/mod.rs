//! Template engines and the compiler adapter
//!
//! This module provides:
//! - The [`TemplateEngine`] capability every template language implements
//! - [`EngineRegistry`], mapping a manifest `type` tag to its engine
//! - [`compile_template`], which turns a template source into a
//!   content-addressed [`TemplateArtifact`]

mod html;
mod mustache;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

pub use html::HtmlEngine;
pub use mustache::MustacheEngine;

use crate::error::{OcpackError, Result};
use crate::hash;

/// Diagnostic reported by a template engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileDiagnostic {
    pub message: String,
    /// 1-based line and column of the offending token
    pub position: Option<(usize, usize)>,
}

impl CompileDiagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    pub fn at(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            position: Some((line, column)),
        }
    }
}

impl fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some((line, column)) => write!(f, "{} at {}:{}", self.message, line, column),
            None => f.write_str(&self.message),
        }
    }
}

/// A template language compiler
///
/// `compile` returns a JavaScript expression evaluating to the render object
/// `{compiler, useData, main}`. Output must be a pure function of the source
/// and the engine version.
pub trait TemplateEngine: Send + Sync {
    /// Manifest `type` tag handled by this engine
    fn type_tag(&self) -> &str;

    /// Engine version, embedded in compiled output
    fn version(&self) -> &str;

    /// Compile template source into a render object expression
    fn compile(&self, source: &str) -> std::result::Result<String, CompileDiagnostic>;
}

/// Compiled template plus metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateArtifact {
    pub template_type: String,
    /// Render object expression produced by the engine
    pub compiled: String,
    /// Content key over `compiled`
    pub key: String,
}

impl TemplateArtifact {
    /// Script that registers the render object under its key on the client
    pub fn registration_script(&self) -> String {
        format!(
            "var oc=oc||{{}};oc.components=oc.components||{{}};oc.components[\"{}\"]={};",
            self.key, self.compiled
        )
    }
}

/// Registry of template engines keyed by type tag
pub struct EngineRegistry {
    engines: Vec<Arc<dyn TemplateEngine>>,
    by_type: HashMap<String, usize>,
}

impl EngineRegistry {
    /// Create a registry with the given engines
    pub fn new(engines: Vec<Arc<dyn TemplateEngine>>) -> Self {
        let by_type = engines
            .iter()
            .enumerate()
            .map(|(idx, e)| (e.type_tag().to_string(), idx))
            .collect();

        Self { engines, by_type }
    }

    /// Create a registry with the built-in engines
    pub fn with_defaults() -> Self {
        Self::new(default_engines())
    }

    /// Register an engine, replacing any engine with the same tag
    pub fn register(&mut self, engine: Arc<dyn TemplateEngine>) {
        let tag = engine.type_tag().to_string();
        if let Some(&idx) = self.by_type.get(&tag) {
            self.engines[idx] = engine;
        } else {
            self.by_type.insert(tag, self.engines.len());
            self.engines.push(engine);
        }
    }

    /// Get an engine by type tag
    pub fn get(&self, template_type: &str) -> Option<&dyn TemplateEngine> {
        self.by_type
            .get(template_type)
            .and_then(|&idx| self.engines.get(idx))
            .map(|engine| &**engine)
    }

    /// Get an engine by type tag, failing closed on unknown tags
    pub fn resolve(&self, template_type: &str) -> Result<&dyn TemplateEngine> {
        self.get(template_type)
            .ok_or_else(|| OcpackError::UnsupportedTemplateType {
                template_type: template_type.to_string(),
                supported: self.types().join(", "),
            })
    }

    /// Registered type tags in registration order
    pub fn types(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.type_tag()).collect()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Built-in engines
pub fn default_engines() -> Vec<Arc<dyn TemplateEngine>> {
    vec![Arc::new(HtmlEngine), Arc::new(MustacheEngine)]
}

/// Compile a template file with the engine registered for `template_type`
pub fn compile_template(
    engines: &EngineRegistry,
    template_type: &str,
    path: &Path,
) -> Result<TemplateArtifact> {
    let engine = engines.resolve(template_type)?;
    let source = std::fs::read_to_string(path).map_err(|e| OcpackError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    compile_source(engine, &source).map_err(|diagnostic| OcpackError::TemplateCompileError {
        template_type: template_type.to_string(),
        path: path.display().to_string(),
        diagnostic: diagnostic.to_string(),
    })
}

/// Compile template source with a specific engine
pub fn compile_source(
    engine: &dyn TemplateEngine,
    source: &str,
) -> std::result::Result<TemplateArtifact, CompileDiagnostic> {
    let compiled = engine.compile(source)?;
    let key = hash::content_key(&compiled);
    tracing::debug!(engine = engine.type_tag(), %key, "compiled template");

    Ok(TemplateArtifact {
        template_type: engine.type_tag().to_string(),
        compiled,
        key,
    })
}

/// Quote text as a JavaScript string literal
pub(crate) fn js_string(text: &str) -> String {
    // JSON strings are valid JS literals; U+2028/2029 are escaped for older parsers.
    serde_json::to_string(text)
        .unwrap_or_default()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}
