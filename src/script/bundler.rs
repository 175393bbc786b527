//! Data handler bundling
//!
//! Produces the server-side bundle for a component: local JSON is inlined,
//! external modules are checked against the manifest and left for the
//! registry to resolve, and any other local code is refused.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use super::analyzer::{self, DependencyKind, DependencyReference};
use super::lexer::{self, TokenKind};
use crate::error::{OcpackError, Result};
use crate::path_utils;
use crate::template::js_string;

/// Bundled data handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBundle {
    /// Executable bundle text
    pub source: String,
    /// Specifiers whose JSON content was inlined, in discovery order
    pub inlined: Vec<String>,
    /// External modules the bundle still requires at runtime
    pub external: Vec<String>,
}

/// Inputs that decide which requires a data handler may keep
#[derive(Debug, Clone, Copy)]
pub struct BundlePolicy<'a> {
    /// Root no inlined file may leave
    pub component_dir: &'a Path,
    /// Manifest `dependencies`
    pub dependencies: &'a IndexMap<String, String>,
    /// Modules the registry provides without declaration
    pub allowed_modules: &'a [String],
}

impl BundlePolicy<'_> {
    fn permits(&self, module: &str) -> bool {
        self.dependencies.contains_key(module) || self.allowed_modules.iter().any(|m| m == module)
    }
}

/// Bundle a data handler source
///
/// `base_dir` is the directory of the handler file; relative requires
/// resolve against it.
pub fn bundle(source: &str, base_dir: &Path, policy: &BundlePolicy<'_>) -> Result<DataBundle> {
    let references = analyzer::dependencies(source, base_dir);
    tracing::debug!(count = references.len(), "analyzed data handler requires");

    if let Some(local) = references
        .iter()
        .find(|r| r.kind == DependencyKind::LocalCode)
    {
        return Err(OcpackError::DisallowedLocalRequire {
            specifier: local.specifier.clone(),
        });
    }

    let external = external_modules(&references);
    let missing: Vec<String> = external
        .iter()
        .filter(|module| !policy.permits(module))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(OcpackError::MissingDependencies { modules: missing });
    }

    let inlined = inline_json(&references, policy.component_dir)?;
    let source = if inlined.is_empty() {
        source.to_string()
    } else {
        format!("{}{}", prelude(source, &inlined), source)
    };

    Ok(DataBundle {
        source,
        inlined: inlined.into_keys().collect(),
        external,
    })
}

/// Distinct external module names in first-occurrence order
fn external_modules(references: &[DependencyReference]) -> Vec<String> {
    let mut modules: Vec<String> = Vec::new();
    for reference in references {
        if let DependencyKind::ExternalModule { module } = &reference.kind {
            if !modules.contains(module) {
                modules.push(module.clone());
            }
        }
    }
    modules
}

fn inline_json(
    references: &[DependencyReference],
    component_dir: &Path,
) -> Result<IndexMap<String, Value>> {
    let mut inlined = IndexMap::new();
    for reference in references {
        let DependencyKind::InlineJson { path } = &reference.kind else {
            continue;
        };
        if inlined.contains_key(&reference.specifier) {
            continue;
        }

        let value = read_json(path, &reference.specifier, component_dir)?;
        tracing::debug!(specifier = %reference.specifier, "inlining json");
        inlined.insert(reference.specifier.clone(), value);
    }
    Ok(inlined)
}

fn read_json(path: &Path, specifier: &str, component_dir: &Path) -> Result<Value> {
    let lexical = path_utils::normalize_lexically(path);
    if !lexical.starts_with(path_utils::normalize_lexically(component_dir))
        || !path_utils::is_contained(path, component_dir)
    {
        return Err(OcpackError::DisallowedLocalRequire {
            specifier: specifier.to_string(),
        });
    }

    let text = std::fs::read_to_string(path).map_err(|e| OcpackError::FileReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| OcpackError::InvalidInlineJson {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Prelude shadowing `require` for the inlined specifiers only
fn prelude(source: &str, inlined: &IndexMap<String, Value>) -> String {
    let entries: Vec<String> = inlined
        .iter()
        .map(|(specifier, value)| format!("{}:{}", js_string(specifier), json_expression(value)))
        .collect();

    // A leading directive stops being one once code precedes it, so repeat it.
    let directive = if has_use_strict(source) {
        "\"use strict\";"
    } else {
        ""
    };

    format!(
        "{directive}var __ocInlined={{{}}},__ocRequire=require;require=function(m){{return Object.prototype.hasOwnProperty.call(__ocInlined,m)?__ocInlined[m]:__ocRequire(m)}};",
        entries.join(",")
    )
}

fn json_expression(value: &Value) -> String {
    value
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

fn has_use_strict(source: &str) -> bool {
    lexer::tokenize(source)
        .into_iter()
        .find(lexer::Token::is_significant)
        .is_some_and(|token| {
            token.kind == TokenKind::Str && matches!(token.text, "'use strict'" | "\"use strict\"")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SERVER_JS: &str = "var data=require('./someJson');\nvar _ = require('underscore');\nmodule.exports.data=function(context,cb){return cb(null,data); };";

    struct Fixture {
        temp: TempDir,
        dependencies: IndexMap<String, String>,
        allowed: Vec<String>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            std::fs::write(temp.path().join("someJson.json"), r#"{ "hello": "world" }"#).unwrap();
            let mut dependencies = IndexMap::new();
            dependencies.insert("underscore".to_string(), "1.8.3".to_string());
            Self {
                temp,
                dependencies,
                allowed: Vec::new(),
            }
        }

        fn bundle(&self, source: &str) -> Result<DataBundle> {
            let policy = BundlePolicy {
                component_dir: self.temp.path(),
                dependencies: &self.dependencies,
                allowed_modules: &self.allowed,
            };
            bundle(source, self.temp.path(), &policy)
        }
    }

    #[test]
    fn test_bundle_keeps_source_and_inlines_json() {
        let fixture = Fixture::new();
        let bundled = fixture.bundle(SERVER_JS).unwrap();

        assert!(bundled.source.contains(SERVER_JS));
        assert!(bundled.source.contains(r#"{"hello":"world"}"#));
        assert!(bundled.source.contains(r#"var __ocInlined={"./someJson":{"hello":"world"}}"#));
        assert_eq!(bundled.inlined, vec!["./someJson"]);
        assert_eq!(bundled.external, vec!["underscore"]);
    }

    #[test]
    fn test_bundle_without_json_is_identity() {
        let fixture = Fixture::new();
        let source = "var _ = require('underscore');\nmodule.exports.data = function(c, cb){ cb(null, {}); };\n";
        let bundled = fixture.bundle(source).unwrap();
        assert_eq!(bundled.source, source);
        assert!(bundled.inlined.is_empty());
    }

    #[test]
    fn test_bundle_missing_dependency() {
        let fixture = Fixture::new();
        let source = "var request = require('request');\nvar _ = require('underscore');";
        let err = fixture.bundle(source).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Missing dependencies from package.json => ["request"]"#
        );
    }

    #[test]
    fn test_bundle_missing_dependency_after_regex_statement() {
        let fixture = Fixture::new();
        let source = "if (ok) /'/.test(s); var r = require('request');\nmodule.exports.data = function(c, cb){ cb(null, r); };";
        match fixture.bundle(source).unwrap_err() {
            OcpackError::MissingDependencies { modules } => assert_eq!(modules, vec!["request"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bundle_missing_dependencies_ordered_and_deduped() {
        let fixture = Fixture::new();
        let source = "require('zlib-sync'); require('async'); require('zlib-sync/inflate'); require('async')";
        match fixture.bundle(source).unwrap_err() {
            OcpackError::MissingDependencies { modules } => {
                assert_eq!(modules, vec!["zlib-sync", "async"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bundle_allowed_modules() {
        let mut fixture = Fixture::new();
        fixture.allowed.push("fs".to_string());
        let bundled = fixture.bundle("var fs = require('node:fs');").unwrap();
        assert_eq!(bundled.external, vec!["fs"]);
    }

    #[test]
    fn test_bundle_rejects_local_code() {
        let fixture = Fixture::new();
        let source = "var hi = require('./hi.js');\nvar request = require('request');";
        let err = fixture.bundle(source).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Requiring local js files is not allowed. Keep it small."
        );
    }

    #[test]
    fn test_bundle_rejects_json_outside_component() {
        let parent = TempDir::new().unwrap();
        let comp = parent.path().join("comp");
        std::fs::create_dir_all(&comp).unwrap();
        std::fs::write(parent.path().join("secret.json"), "{}").unwrap();

        let dependencies = IndexMap::new();
        let policy = BundlePolicy {
            component_dir: &comp,
            dependencies: &dependencies,
            allowed_modules: &[],
        };
        let err = bundle("require('../secret.json')", &comp, &policy).unwrap_err();
        assert!(matches!(err, OcpackError::DisallowedLocalRequire { .. }));
    }

    #[test]
    fn test_bundle_invalid_json() {
        let fixture = Fixture::new();
        std::fs::write(fixture.temp.path().join("broken.json"), "{ nope").unwrap();
        let err = fixture.bundle("require('./broken.json')").unwrap_err();
        assert!(matches!(err, OcpackError::InvalidInlineJson { .. }));
    }

    #[test]
    fn test_bundle_unreadable_json() {
        let fixture = Fixture::new();
        let err = fixture.bundle("require('./absent.json')").unwrap_err();
        assert!(matches!(err, OcpackError::FileReadFailed { .. }));
    }

    #[test]
    fn test_bundle_inlines_each_file_once() {
        let fixture = Fixture::new();
        let bundled = fixture
            .bundle("var a = require('./someJson'); var b = require('./someJson');")
            .unwrap();
        assert_eq!(bundled.inlined, vec!["./someJson"]);
        assert_eq!(bundled.source.matches(r#"{"hello":"world"}"#).count(), 1);
    }

    #[test]
    fn test_bundle_repeats_use_strict() {
        let fixture = Fixture::new();
        let source = "'use strict';\nvar data = require('./someJson.json');";
        let bundled = fixture.bundle(source).unwrap();
        assert!(bundled.source.starts_with("\"use strict\";var __ocInlined="));
        assert!(bundled.source.ends_with(source));
    }
}
