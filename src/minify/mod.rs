//! Minifier adapter
//!
//! A [`Minifier`] shrinks JavaScript text. Packaging applies one to the
//! template registration script and to the data handler bundle; failures
//! surface as [`OcpackError::MinifyError`] naming the file being produced.

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::error::{OcpackError, Result};

/// JavaScript minifier capability
pub trait Minifier: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Minify code, or describe why it cannot be minified
    fn minify(&self, code: &str) -> std::result::Result<String, String>;
}

/// Apply a minifier, attributing failures to `target`
pub fn minify_target(minifier: &dyn Minifier, target: &str, code: &str) -> Result<String> {
    let minified = minifier
        .minify(code)
        .map_err(|reason| OcpackError::MinifyError {
            target: target.to_string(),
            reason,
        })?;
    tracing::debug!(
        minifier = minifier.name(),
        target,
        before = code.len(),
        after = minified.len(),
        "minified"
    );
    Ok(minified)
}

/// Leaves code unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughMinifier;

impl Minifier for PassthroughMinifier {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn minify(&self, code: &str) -> std::result::Result<String, String> {
        Ok(code.to_string())
    }
}

/// Parses with oxc and prints the tree back without comments or whitespace
///
/// Code is parsed as a CommonJS script. Identifiers are not mangled, so
/// `require` calls and exported names survive unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcMinifier;

impl Minifier for OxcMinifier {
    fn name(&self) -> &str {
        "oxc"
    }

    fn minify(&self, code: &str) -> std::result::Result<String, String> {
        let allocator = Allocator::default();
        let parsed = Parser::new(&allocator, code, SourceType::cjs()).parse();

        if let Some(error) = parsed.errors.first() {
            return Err(error.to_string());
        }
        if parsed.panicked {
            return Err("parser gave up before the end of input".to_string());
        }

        Ok(Codegen::new()
            .with_options(CodegenOptions::minify())
            .build(&parsed.program)
            .code)
    }
}
