//! Process-wide cache of loaded templates

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::CompiledTemplate;
use crate::error::Result;

static GLOBAL: OnceLock<TemplateCache> = OnceLock::new();

/// Loaded templates by content key
///
/// Keys are content hashes, so an entry never goes stale and nothing is
/// evicted. Registration is first-wins when two threads load the same key.
#[derive(Default)]
pub struct TemplateCache {
    templates: RwLock<HashMap<String, Arc<dyn CompiledTemplate>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the whole process
    pub fn global() -> &'static TemplateCache {
        GLOBAL.get_or_init(TemplateCache::new)
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn CompiledTemplate>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the template cached under `key`, loading it with `load` if absent
    ///
    /// `load` runs without the lock held, so a slow fetch does not block
    /// readers of other keys.
    pub fn get_or_register<F>(&self, key: &str, load: F) -> Result<Arc<dyn CompiledTemplate>>
    where
        F: FnOnce() -> Result<Arc<dyn CompiledTemplate>>,
    {
        if let Some(template) = self.get(key) {
            tracing::debug!(key, "template cache hit");
            return Ok(template);
        }

        let loaded = load()?;
        let mut templates = self
            .templates
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(templates
            .entry(key.to_string())
            .or_insert(loaded)
            .clone())
    }
}
