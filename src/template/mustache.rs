//! Logic-less mustache subset
//!
//! Supported tags: `{{path}}` (escaped), `{{{path}}}` and `{{& path}}` (raw),
//! `{{#path}}`/`{{^path}}` sections closed by `{{/path}}`, and `{{! comments}}`.
//! Partials and delimiter changes are not supported.

use super::{CompileDiagnostic, TemplateEngine, js_string};
use crate::script::lexer::line_col;

/// Runtime helpers shared by every compiled mustache template
const RUNTIME: &str = r##"var __esc=function(v){if(v==null)return"";var t=String(v),o="";for(var i=0;i<t.length;i++){var c=t.charAt(i);o+=c==="&"?"&amp;":c==="<"?"&lt;":c===">"?"&gt;":c==="\""?"&quot;":c==="'"?"&#39;":c}return o},__raw=function(v){return v==null?"":String(v)},__get=function(s,p){if(p===".")return s[s.length-1];var k=p.split(".");for(var i=s.length-1;i>=0;i--){var c=s[i];if(c!=null&&typeof c==="object"&&k[0]in c){for(var j=0;j<k.length;j++){if(c==null)return undefined;c=c[k[j]]}return c}}return undefined},__sec=function(s,v,n,f){var e=!v||(Array.isArray(v)&&v.length===0);if(n)return e?f(s):"";if(e)return"";if(Array.isArray(v)){var o="";for(var i=0;i<v.length;i++)o+=f(s.concat([v[i]]));return o}return typeof v==="object"?f(s.concat([v])):f(s)};"##;

/// Mustache template engine
pub struct MustacheEngine;

impl TemplateEngine for MustacheEngine {
    fn type_tag(&self) -> &str {
        "mustache"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn compile(&self, source: &str) -> Result<String, CompileDiagnostic> {
        let nodes = parse(source)?;
        Ok(format!(
            "(function(){{{RUNTIME}return{{compiler:[{},{}],useData:true,main:function(data){{var s=[data];return {}}}}}}})()",
            js_string(self.type_tag()),
            js_string(self.version()),
            render_nodes(&nodes)
        ))
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Node {
    Text(String),
    Value {
        path: String,
        escape: bool,
    },
    Section {
        path: String,
        inverted: bool,
        children: Vec<Node>,
    },
}

struct OpenSection {
    path: String,
    inverted: bool,
    offset: usize,
    siblings: Vec<Node>,
}

fn parse(source: &str) -> Result<Vec<Node>, CompileDiagnostic> {
    let mut stack: Vec<OpenSection> = Vec::new();
    let mut nodes = Vec::new();
    let mut cursor = 0;

    while let Some(found) = source[cursor..].find("{{") {
        let open = cursor + found;
        if open > cursor {
            nodes.push(Node::Text(source[cursor..open].to_string()));
        }

        let triple = source[open + 2..].starts_with('{');
        let (body_start, closer) = if triple {
            (open + 3, "}}}")
        } else {
            (open + 2, "}}")
        };
        let Some(len) = source[body_start..].find(closer) else {
            return Err(error_at(source, open, "unclosed tag"));
        };
        let body = source[body_start..body_start + len].trim();
        cursor = body_start + len + closer.len();

        if triple {
            let path = checked_path(source, open, body)?;
            nodes.push(Node::Value {
                path,
                escape: false,
            });
            continue;
        }

        let mut chars = body.chars();
        match chars.next() {
            Some('!') => {}
            Some(sigil @ ('#' | '^')) => {
                let path = checked_path(source, open, chars.as_str().trim())?;
                stack.push(OpenSection {
                    path,
                    inverted: sigil == '^',
                    offset: open,
                    siblings: std::mem::take(&mut nodes),
                });
            }
            Some('/') => {
                let path = chars.as_str().trim();
                let Some(section) = stack.pop() else {
                    return Err(error_at(
                        source,
                        open,
                        &format!("unexpected closing tag '{path}'"),
                    ));
                };
                if section.path != path {
                    return Err(error_at(
                        source,
                        open,
                        &format!(
                            "closing tag '{path}' does not match open section '{}'",
                            section.path
                        ),
                    ));
                }
                let children = std::mem::replace(&mut nodes, section.siblings);
                nodes.push(Node::Section {
                    path: section.path,
                    inverted: section.inverted,
                    children,
                });
            }
            Some('&') => {
                let path = checked_path(source, open, chars.as_str().trim())?;
                nodes.push(Node::Value {
                    path,
                    escape: false,
                });
            }
            Some('>' | '=') => {
                return Err(error_at(source, open, "partials and delimiter changes are not supported"));
            }
            _ => {
                let path = checked_path(source, open, body)?;
                nodes.push(Node::Value { path, escape: true });
            }
        }
    }

    if let Some(section) = stack.pop() {
        return Err(error_at(
            source,
            section.offset,
            &format!("unclosed section '{}'", section.path),
        ));
    }

    if cursor < source.len() {
        nodes.push(Node::Text(source[cursor..].to_string()));
    }

    Ok(nodes)
}

fn checked_path(source: &str, offset: usize, path: &str) -> Result<String, CompileDiagnostic> {
    let valid_segment = |segment: &str| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-'))
    };

    if path == "." || path.split('.').all(valid_segment) {
        Ok(path.to_string())
    } else if path.is_empty() {
        Err(error_at(source, offset, "empty tag"))
    } else {
        Err(error_at(source, offset, &format!("invalid name '{path}'")))
    }
}

fn error_at(source: &str, offset: usize, message: &str) -> CompileDiagnostic {
    let (line, column) = line_col(source, offset);
    CompileDiagnostic::at(message, line, column)
}

fn render_nodes(nodes: &[Node]) -> String {
    if nodes.is_empty() {
        return "\"\"".to_string();
    }

    nodes
        .iter()
        .map(|node| match node {
            Node::Text(text) => js_string(text),
            Node::Value { path, escape: true } => format!("__esc(__get(s,{}))", js_string(path)),
            Node::Value {
                path,
                escape: false,
            } => format!("__raw(__get(s,{}))", js_string(path)),
            Node::Section {
                path,
                inverted,
                children,
            } => format!(
                "__sec(s,__get(s,{}),{},function(s){{return {}}})",
                js_string(path),
                inverted,
                render_nodes(children)
            ),
        })
        .collect::<Vec<_>>()
        .join("+")
}
