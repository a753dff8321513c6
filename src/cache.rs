use crate::schema::SchemaNode;
use log::debug;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

static GLOBAL_CACHE: Lazy<Arc<SchemaCache>> = Lazy::new(|| Arc::new(SchemaCache::new()));

/// Compiled schemas keyed by type identity.
///
/// Shared between concurrent compilations. Population is idempotent: two threads
/// compiling the same identity store equal nodes, so last-writer-wins is harmless.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<String, SchemaNode>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-lifetime instance used when no cache is injected
    pub fn global() -> Arc<SchemaCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    pub fn get(&self, identity: &str) -> Option<SchemaNode> {
        self.entries.read().get(identity).cloned()
    }

    pub fn insert(&self, identity: &str, node: SchemaNode) {
        self.entries.write().insert(identity.to_string(), node);
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.entries.read().contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.write();
        debug!("Clearing schema cache ({} entries)", entries.len());
        entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaType;
    use std::thread;

    #[test]
    fn test_insert_get_clear() {
        let cache = SchemaCache::new();
        assert!(cache.is_empty());

        cache.insert("User", SchemaNode::of_type(SchemaType::Object));
        assert!(cache.contains("User"));
        assert_eq!(
            cache.get("User").unwrap().schema_type,
            Some(SchemaType::Object)
        );
        assert!(cache.get("Post").is_none());

        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(SchemaCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..50 {
                        cache.insert(
                            &format!("T{}", j % 10),
                            SchemaNode::of_type(SchemaType::String),
                        );
                        let _ = cache.get(&format!("T{}", (i + j) % 10));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 10);
    }

    #[test]
    fn test_global_is_shared() {
        let a = SchemaCache::global();
        let b = SchemaCache::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
