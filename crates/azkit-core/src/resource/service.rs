//! Per-family service façade: one subscription root per subscription id.

use std::{collections::HashMap, sync::Arc, time::Duration};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::CloudResult;

/// Tunables shared by every service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AzureConfiguration {
    /// Items requested per listing page.
    pub page_size: usize,
    /// Run registered warm-up functions after subscriptions are selected.
    pub enable_preloading: bool,
    /// Expiry of lookup caches after last access, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for AzureConfiguration {
    fn default() -> Self {
        Self {
            page_size: 100,
            enable_preloading: true,
            cache_ttl_secs: super::cache::DEFAULT_TTL.as_secs(),
        }
    }
}

impl AzureConfiguration {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

type Factory<S> = Box<dyn Fn(&str) -> CloudResult<S> + Send + Sync>;

/// Caches the per-subscription root `S` of one resource family.
///
/// `S` typically holds the vendor manager for that subscription and the
/// modules built on it.
pub struct AzureService<S> {
    namespace: &'static str,
    type_name: &'static str,
    factory: Factory<S>,
    subscriptions: RwLock<HashMap<String, Arc<S>>>,
}

impl<S> AzureService<S> {
    pub fn new<F>(namespace: &'static str, type_name: &'static str, factory: F) -> Self
    where
        F: Fn(&str) -> CloudResult<S> + Send + Sync + 'static,
    {
        Self {
            namespace,
            type_name,
            factory: Box::new(factory),
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    /// Provider namespace, e.g. `Microsoft.Web`.
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The root for `subscription_id`, created on first use.
    pub fn get(&self, subscription_id: &str) -> CloudResult<Arc<S>> {
        let key = subscription_id.to_lowercase();
        if let Some(root) = self.subscriptions.read().get(&key) {
            return Ok(Arc::clone(root));
        }

        debug!(service = self.type_name, subscription = subscription_id, "Connecting");
        let root = Arc::new((self.factory)(subscription_id)?);
        Ok(Arc::clone(
            self.subscriptions.write().entry(key).or_insert(root),
        ))
    }

    /// Roots for each of `subscription_ids`, in order.
    pub fn for_subscriptions(&self, subscription_ids: &[String]) -> CloudResult<Vec<Arc<S>>> {
        subscription_ids.iter().map(|id| self.get(id)).collect()
    }

    /// Roots created so far.
    pub fn connected(&self) -> Vec<Arc<S>> {
        self.subscriptions.read().values().cloned().collect()
    }

    pub fn invalidate(&self) {
        self.subscriptions.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn subscription_roots_are_cached_case_insensitively() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let service = AzureService::new("Microsoft.Web", "App Services", move |sub| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(sub.to_string())
        });

        let a = service.get("ABC").unwrap();
        let b = service.get("abc").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 1);

        service.invalidate();
        service.get("abc").unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }
}
