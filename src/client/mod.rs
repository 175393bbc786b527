//! Rendering client for registry responses
//!
//! A registry answers a component request either with finished markup
//! (`rendered`) or with data plus a pointer to the compiled template
//! (`pre-rendered`). This module turns either answer into HTML. Network
//! access and script execution stay behind traits so embedders can plug in
//! their own HTTP stack and JavaScript runtime.

mod cache;

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use cache::TemplateCache;

use crate::error::{OcpackError, Result};

/// `Accept` header asking the registry for pre-rendered responses
pub const PRERENDERED_ACCEPT: &str = "application/vnd.oc.prerendered+json";

/// Content type of registry requests
pub const REQUEST_CONTENT_TYPE: &str = "text/plain";

static CONTAINER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*<oc-component\b([^>]*)>(.*)</oc-component>\s*\z").ok()
});

static DATA_HASH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"\bdata-hash="([^"]*)""#).ok());

/// A registry response for one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryResponse {
    pub href: String,
    #[serde(rename = "type", default)]
    pub response_type: Option<String>,
    pub version: String,
    #[serde(default)]
    pub request_version: Option<String>,
    #[serde(flatten)]
    pub payload: RenderPayload,
}

/// Response body by render mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "renderMode")]
pub enum RenderPayload {
    #[serde(rename = "pre-rendered")]
    PreRendered {
        #[serde(default)]
        data: Value,
        template: TemplateRef,
    },
    #[serde(rename = "rendered")]
    Rendered { html: String },
}

/// Location and identity of a compiled template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub src: String,
    #[serde(rename = "type")]
    pub template_type: String,
    pub key: String,
}

impl RegistryResponse {
    /// Parse a registry response body
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OcpackError::InvalidRegistryResponse {
            reason: e.to_string(),
        })
    }
}

/// A request to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRequest {
    pub href: String,
    pub accept: &'static str,
    pub content_type: &'static str,
}

impl RegistryRequest {
    pub fn prerendered(href: &str) -> Self {
        Self {
            href: href.to_string(),
            accept: PRERENDERED_ACCEPT,
            content_type: REQUEST_CONTENT_TYPE,
        }
    }
}

/// Sends requests to a component registry
pub trait RegistryTransport: Send + Sync {
    /// Send a request and return the response body
    fn send(&self, request: &RegistryRequest) -> std::result::Result<String, String>;
}

/// Downloads compiled template scripts
pub trait TemplateFetcher: Send + Sync {
    fn fetch(&self, src: &str) -> std::result::Result<String, String>;
}

/// A template ready to render
pub trait CompiledTemplate: Send + Sync {
    fn render(&self, data: &Value) -> std::result::Result<String, String>;
}

/// Evaluates template scripts
pub trait TemplateRuntime: Send + Sync {
    /// Load the render object registered by `script` under `key`
    fn load(&self, key: &str, script: &str) -> std::result::Result<Arc<dyn CompiledTemplate>, String>;
}

/// Markup produced for a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedComponent {
    pub html: String,
    pub version: String,
    /// Template key, when the response identifies one
    pub key: Option<String>,
}

/// Renders components from registry responses
pub struct RenderClient<'a> {
    transport: &'a dyn RegistryTransport,
    fetcher: &'a dyn TemplateFetcher,
    runtime: &'a dyn TemplateRuntime,
    cache: &'a TemplateCache,
    wrap: bool,
}

impl<'a> RenderClient<'a> {
    /// Create a client using the process-wide template cache
    pub fn new(
        transport: &'a dyn RegistryTransport,
        fetcher: &'a dyn TemplateFetcher,
        runtime: &'a dyn TemplateRuntime,
    ) -> Self {
        Self {
            transport,
            fetcher,
            runtime,
            cache: TemplateCache::global(),
            wrap: false,
        }
    }

    /// Use a specific template cache
    #[must_use]
    pub fn with_cache(mut self, cache: &'a TemplateCache) -> Self {
        self.cache = cache;
        self
    }

    /// Wrap client-rendered markup in an `<oc-component>` container
    #[must_use]
    pub fn wrap_output(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    /// Request a component from the registry and render it
    pub fn render_by_href(&self, href: &str) -> Result<RenderedComponent> {
        let request = RegistryRequest::prerendered(href);
        tracing::debug!(href, accept = request.accept, "requesting component");
        let body = self
            .transport
            .send(&request)
            .map_err(|reason| OcpackError::RegistryRequestFailed {
                href: href.to_string(),
                reason,
            })?;
        let response = RegistryResponse::from_json(&body)?;
        self.render_response(&response)
    }

    /// Render a registry response
    pub fn render_response(&self, response: &RegistryResponse) -> Result<RenderedComponent> {
        match &response.payload {
            RenderPayload::Rendered { html } => Ok(unwrap_container(html, &response.version)),
            RenderPayload::PreRendered { data, template } => {
                let compiled = self.cache.get_or_register(&template.key, || {
                    let script =
                        self.fetcher
                            .fetch(&template.src)
                            .map_err(|reason| OcpackError::TemplateFetchFailed {
                                src: template.src.clone(),
                                reason,
                            })?;
                    self.runtime.load(&template.key, &script).map_err(|reason| {
                        OcpackError::TemplateExecutionFailed {
                            key: template.key.clone(),
                            reason,
                        }
                    })
                })?;

                let html = compiled
                    .render(data)
                    .map_err(|reason| OcpackError::TemplateExecutionFailed {
                        key: template.key.clone(),
                        reason,
                    })?;
                let html = if self.wrap {
                    wrap_container(&response.href, &template.key, &response.version, &html)
                } else {
                    html
                };

                Ok(RenderedComponent {
                    html,
                    version: response.version.clone(),
                    key: Some(template.key.clone()),
                })
            }
        }
    }
}

/// Surface the inner markup of a server-rendered container
fn unwrap_container(html: &str, version: &str) -> RenderedComponent {
    let captures = CONTAINER.as_ref().and_then(|re| re.captures(html));
    let Some(captures) = captures else {
        return RenderedComponent {
            html: html.to_string(),
            version: version.to_string(),
            key: None,
        };
    };

    let attributes = captures.get(1).map_or("", |m| m.as_str());
    let key = DATA_HASH
        .as_ref()
        .and_then(|re| re.captures(attributes))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    RenderedComponent {
        html: captures.get(2).map_or("", |m| m.as_str()).to_string(),
        version: version.to_string(),
        key,
    }
}

fn wrap_container(href: &str, key: &str, version: &str, html: &str) -> String {
    format!(
        r#"<oc-component href="{}" data-hash="{}" data-rendered="true" data-version="{}">{html}</oc-component>"#,
        escape_attribute(href),
        escape_attribute(key),
        escape_attribute(version),
    )
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
