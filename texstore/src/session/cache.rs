use crate::textures::TextureKey;
use std::collections::HashMap;
use tracing::{debug, trace};

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Source identity to texture, at most one live texture per identity.
#[derive(Debug, Default)]
pub struct TextureCache {
    entries: HashMap<String, TextureKey>,
    stats: CacheStats,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `identity`, counting the hit or miss.
    pub fn get(&mut self, identity: &str) -> Option<TextureKey> {
        match self.entries.get(identity) {
            Some(&key) => {
                self.stats.hits += 1;
                trace!("[Texture Cache] Hit: {identity} -> {key:?}");
                Some(key)
            }
            None => {
                self.stats.misses += 1;
                let misses = self.stats.misses;
                if misses % 1000 == 0 {
                    debug!(
                        "[Texture Cache] Misses: {misses}, Hits: {}, Entries: {}",
                        self.stats.hits,
                        self.entries.len()
                    );
                }
                None
            }
        }
    }

    pub fn peek(&self, identity: &str) -> Option<TextureKey> {
        self.entries.get(identity).copied()
    }

    pub fn insert(&mut self, identity: String, key: TextureKey) {
        trace!("[Texture Cache] Added entry: {identity} -> {key:?}");
        self.entries.insert(identity, key);
    }

    /// Drops every identity pointing at `key`.
    pub fn evict(&mut self, key: TextureKey) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, cached| *cached != key);
        before - self.entries.len()
    }

    pub fn remove(&mut self, identity: &str) -> Option<TextureKey> {
        self.entries.remove(identity)
    }

    pub fn clear(&mut self) -> usize {
        let cleared = self.entries.len();
        self.entries.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn counts_hits_and_misses() {
        let mut keys = SlotMap::<TextureKey, ()>::with_key();
        let key = keys.insert(());
        let mut cache = TextureCache::new();

        assert_eq!(cache.get("red"), None);
        cache.insert("red".to_string(), key);
        assert_eq!(cache.get("red"), Some(key));
        assert_eq!(cache.get("red"), Some(key));

        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 1 });
    }

    #[test]
    fn eviction_drops_every_alias() {
        let mut keys = SlotMap::<TextureKey, ()>::with_key();
        let a = keys.insert(());
        let b = keys.insert(());
        let mut cache = TextureCache::new();

        cache.insert("a".to_string(), a);
        cache.insert("a-again".to_string(), a);
        cache.insert("b".to_string(), b);

        assert_eq!(cache.evict(a), 2);
        assert_eq!(cache.peek("b"), Some(b));
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
    }
}
