use std::{
    collections::HashMap,
    hash::{DefaultHasher, Hash, Hasher},
    sync::{Arc, LazyLock, RwLock}
};

use tracing::debug;

use crate::{
    context::PlaceholderContext,
    error::TemplateResult,
    template::{PreparedTemplate, prepare}
};

/// Default number of prepared templates kept by the global cache
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Global prepared-template cache
static TEMPLATE_CACHE: LazyLock<RwLock<TemplateCache>> =
    LazyLock::new(|| RwLock::new(TemplateCache::new(DEFAULT_CACHE_SIZE)));

/// LRU-like cache for prepared templates keyed by (template, context)
#[derive(Debug)]
pub struct TemplateCache {
    cache:    HashMap<u64, CacheEntry>,
    max_size: usize
}

/// Stored alongside the prepared template so a hash collision is a miss
#[derive(Debug)]
struct CacheEntry {
    template: String,
    ctx:      PlaceholderContext,
    prepared: Arc<PreparedTemplate>
}

impl CacheEntry {
    fn matches(&self, template: &str, ctx: &PlaceholderContext) -> bool {
        self.template == template && self.ctx == *ctx
    }
}

impl TemplateCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            cache: HashMap::with_capacity(max_size),
            max_size: max_size.max(1)
        }
    }

    fn hash_key(template: &str, ctx: &PlaceholderContext) -> u64 {
        let mut hasher = DefaultHasher::new();
        template.hash(&mut hasher);
        ctx.hash(&mut hasher);
        hasher.finish()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn get(&self, template: &str, ctx: &PlaceholderContext) -> Option<Arc<PreparedTemplate>> {
        let key = Self::hash_key(template, ctx);
        self.cache
            .get(&key)
            .filter(|entry| entry.matches(template, ctx))
            .map(|entry| Arc::clone(&entry.prepared))
    }

    pub fn insert(&mut self, template: &str, ctx: &PlaceholderContext, prepared: Arc<PreparedTemplate>) {
        // Simple eviction: clear half when full
        if self.cache.len() >= self.max_size {
            let keys: Vec<_> = self
                .cache
                .keys()
                .take((self.max_size / 2).max(1))
                .copied()
                .collect();
            for key in keys {
                self.cache.remove(&key);
            }
        }

        let key = Self::hash_key(template, ctx);
        self.cache.insert(
            key,
            CacheEntry {
                template: template.to_string(),
                ctx: ctx.clone(),
                prepared
            }
        );
    }

    /// Cached template, preparing and storing it on a miss.
    ///
    /// Errors are not cached.
    pub fn get_or_prepare(
        &mut self,
        template: &str,
        ctx: &PlaceholderContext
    ) -> TemplateResult<Arc<PreparedTemplate>> {
        if let Some(prepared) = self.get(template, ctx) {
            return Ok(prepared);
        }
        let prepared = Arc::new(prepare(template, ctx)?);
        self.insert(template, ctx, Arc::clone(&prepared));
        Ok(prepared)
    }
}

/// Get cached template or None
pub fn get_cached(template: &str, ctx: &PlaceholderContext) -> Option<Arc<PreparedTemplate>> {
    TEMPLATE_CACHE.read().ok()?.get(template, ctx)
}

/// Cache a prepared template
pub fn cache_template(template: &str, ctx: &PlaceholderContext, prepared: Arc<PreparedTemplate>) {
    if let Ok(mut cache) = TEMPLATE_CACHE.write() {
        cache.insert(template, ctx, prepared);
    }
}

/// Replace the global cache with an empty one holding at most `max_size`
/// templates
pub fn configure_cache(max_size: usize) {
    if let Ok(mut cache) = TEMPLATE_CACHE.write() {
        *cache = TemplateCache::new(max_size);
    }
}

/// Prepare through the global cache
///
/// A poisoned cache lock degrades to uncached preparation.
pub fn prepare_cached(
    template: &str,
    ctx: &PlaceholderContext
) -> TemplateResult<Arc<PreparedTemplate>> {
    if let Some(prepared) = get_cached(template, ctx) {
        debug!(table = %ctx.table_name, "template cache hit");
        return Ok(prepared);
    }
    debug!(table = %ctx.table_name, "template cache miss");
    let prepared = Arc::new(prepare(template, ctx)?);
    cache_template(template, ctx, Arc::clone(&prepared));
    Ok(prepared)
}
