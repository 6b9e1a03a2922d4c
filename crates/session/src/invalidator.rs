//! Cross-domain cache invalidation.

use std::collections::HashMap;
use std::sync::Arc;

use vendorhub_cache::{CacheDomain, CacheDomainId, QueryCache};

/// Flushes every registered cache domain at once.
///
/// Query keys are not scoped by account, so selective invalidation can't
/// tell one identity's results from another's; every domain is reset whole.
#[derive(Clone, Default)]
pub struct CacheInvalidator {
    domains: Vec<Arc<dyn CacheDomain>>,
}

impl CacheInvalidator {
    pub fn new(domains: Vec<Arc<dyn CacheDomain>>) -> Self {
        Self { domains }
    }

    /// One [`QueryCache`] per [`CacheDomainId::ALL`], plus handles to them.
    pub fn with_default_domains() -> (Self, DomainCaches) {
        let caches = DomainCaches::new();
        let domains = caches
            .iter()
            .map(|cache| cache.clone() as Arc<dyn CacheDomain>)
            .collect();
        (Self { domains }, caches)
    }

    pub fn register(&mut self, domain: Arc<dyn CacheDomain>) {
        self.domains.push(domain);
    }

    pub fn domain_ids(&self) -> Vec<CacheDomainId> {
        self.domains.iter().map(|d| d.id()).collect()
    }

    /// Reset every domain; returns how many were reset.
    pub fn invalidate_all(&self) -> usize {
        for domain in &self.domains {
            domain.reset();
        }
        tracing::debug!(domains = self.domains.len(), "invalidated all cache domains");
        self.domains.len()
    }
}

impl core::fmt::Debug for CacheInvalidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CacheInvalidator")
            .field("domains", &self.domain_ids())
            .finish()
    }
}

/// The default per-domain query caches, addressable by id.
#[derive(Debug, Clone)]
pub struct DomainCaches {
    caches: HashMap<CacheDomainId, Arc<QueryCache>>,
}

impl DomainCaches {
    fn new() -> Self {
        Self {
            caches: CacheDomainId::ALL
                .into_iter()
                .map(|id| (id, Arc::new(QueryCache::new(id))))
                .collect(),
        }
    }

    pub fn get(&self, id: CacheDomainId) -> Arc<QueryCache> {
        // Every id in ALL is inserted by `new`.
        self.caches
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Arc::new(QueryCache::new(id)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<QueryCache>> {
        CacheDomainId::ALL.iter().filter_map(|id| self.caches.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vendorhub_cache::QueryKey;

    #[test]
    fn default_domains_cover_every_resource_group() {
        let (invalidator, _) = CacheInvalidator::with_default_domains();
        assert_eq!(invalidator.domain_ids(), CacheDomainId::ALL.to_vec());
    }

    #[test]
    fn invalidate_all_flushes_each_cache() {
        let (invalidator, caches) = CacheInvalidator::with_default_domains();
        for cache in caches.iter() {
            cache.insert(QueryKey::endpoint("x"), json!(1));
        }

        assert_eq!(invalidator.invalidate_all(), 5);
        assert!(caches.iter().all(|c| c.is_empty() && c.generation() == 1));
    }

    #[test]
    fn registered_domains_are_included() {
        let mut invalidator = CacheInvalidator::default();
        let extra = Arc::new(QueryCache::new(CacheDomainId::Blog));
        extra.insert(QueryKey::endpoint("getMyBlogs"), json!([]));
        invalidator.register(extra.clone());

        invalidator.invalidate_all();
        assert!(extra.is_empty());
    }
}
