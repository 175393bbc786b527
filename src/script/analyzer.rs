//! Static dependency analysis of data handler sources
//!
//! Finds every `require("literal")` call without executing the module and
//! classifies its target. Paths built at runtime (`require(name)`,
//! concatenation, template interpolation) are invisible to this scan.

use std::path::{Component, Path, PathBuf};

use super::lexer::{self, Token, TokenKind};

/// A `require` call discovered in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    /// The literal module specifier
    pub specifier: String,
    /// 1-based line of the call
    pub line: usize,
}

/// How a discovered dependency is resolved at package time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyKind {
    /// Relative JSON file, inlined into the bundle
    InlineJson { path: PathBuf },
    /// Any other local file, rejected
    LocalCode,
    /// Bare module name, resolved by the registry at runtime
    ExternalModule { module: String },
}

/// A classified dependency of a data handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyReference {
    pub specifier: String,
    pub line: usize,
    pub kind: DependencyKind,
}

/// Scan source text for `require` calls with a literal argument
pub fn analyze(source: &str) -> Vec<ImportSpecifier> {
    let tokens: Vec<Token<'_>> = lexer::tokenize(source)
        .into_iter()
        .filter(Token::is_significant)
        .collect();

    let mut found = Vec::new();
    for (idx, window) in tokens.windows(4).enumerate() {
        let [callee, open, argument, close] = window else {
            continue;
        };
        if callee.kind != TokenKind::Ident
            || callee.text != "require"
            || !open.is_punct("(")
            || !close.is_punct(")")
        {
            continue;
        }
        // `obj.require(...)` is a method call, not the module loader
        if idx > 0 && tokens[idx - 1].is_punct(".") {
            continue;
        }
        if let Some(specifier) = literal_value(argument) {
            let (line, _) = lexer::line_col(source, callee.offset);
            found.push(ImportSpecifier { specifier, line });
        }
    }

    found
}

/// Classify a specifier relative to the directory of the requiring module
pub fn classify(specifier: &str, base_dir: &Path) -> DependencyKind {
    if !is_local(specifier) {
        return DependencyKind::ExternalModule {
            module: module_name(specifier).to_string(),
        };
    }

    let target = base_dir.join(specifier);
    match Path::new(specifier).extension() {
        Some(ext) if ext.eq_ignore_ascii_case("json") => DependencyKind::InlineJson { path: target },
        Some(_) => DependencyKind::LocalCode,
        None => {
            let json = with_suffix(&target, ".json");
            let shadowed = target.is_file() || with_suffix(&target, ".js").is_file();
            if json.is_file() && !shadowed {
                DependencyKind::InlineJson { path: json }
            } else {
                DependencyKind::LocalCode
            }
        }
    }
}

/// Scan and classify in one pass
pub fn dependencies(source: &str, base_dir: &Path) -> Vec<DependencyReference> {
    analyze(source)
        .into_iter()
        .map(|import| DependencyReference {
            kind: classify(&import.specifier, base_dir),
            specifier: import.specifier,
            line: import.line,
        })
        .collect()
}

fn is_local(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier.starts_with('/')
        || specifier.starts_with("file:")
        || Path::new(specifier)
            .components()
            .next()
            .is_some_and(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
}

/// Package name of a bare specifier: `lodash/fp` -> `lodash`, `@scope/pkg/x` -> `@scope/pkg`
pub fn module_name(specifier: &str) -> &str {
    let specifier = specifier.strip_prefix("node:").unwrap_or(specifier);
    let mut slashes = specifier.match_indices('/').map(|(idx, _)| idx);
    let cut = if specifier.starts_with('@') {
        slashes.nth(1)
    } else {
        slashes.next()
    };
    cut.map_or(specifier, |idx| &specifier[..idx])
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

fn literal_value(token: &Token<'_>) -> Option<String> {
    if !token.terminated || token.text.len() < 2 {
        return None;
    }
    let inner = &token.text[1..token.text.len() - 1];
    match token.kind {
        TokenKind::Str => Some(unescape(inner)),
        TokenKind::Template if !inner.contains("${") => Some(unescape(inner)),
        _ => None,
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
