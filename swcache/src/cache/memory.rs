use super::{Cache, CacheError, CacheKey, CacheStorage, CachedResponse};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// An in-memory [`CacheStorage`]. Nothing is persisted.
///
/// Clones share the same namespaces. Locks are only held for the duration of a single
/// operation, never across an `.await`.
#[derive(Clone, Debug, Default)]
pub struct MemoryCacheStorage {
    namespaces: Arc<RwLock<Vec<(String, MemoryCache)>>>,
}

impl MemoryCacheStorage {
    /// Create an empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    type Cache = MemoryCache;

    async fn open(&self, name: &str) -> Result<MemoryCache, CacheError> {
        let mut namespaces = self.namespaces.write();
        if let Some((_, cache)) = namespaces.iter().find(|(n, _)| n == name) {
            return Ok(cache.clone());
        }
        let cache = MemoryCache::default();
        namespaces.push((name.to_owned(), cache.clone()));
        Ok(cache)
    }

    async fn lookup(
        &self,
        name: &str,
        key: &CacheKey,
    ) -> Result<Option<CachedResponse>, CacheError> {
        let namespaces = self.namespaces.read();
        Ok(namespaces
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, cache)| cache.entries.read().get(key).cloned()))
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self
            .namespaces
            .read()
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let mut namespaces = self.namespaces.write();
        let before = namespaces.len();
        namespaces.retain(|(n, _)| n != name);
        Ok(namespaces.len() != before)
    }
}

/// One in-memory namespace.
///
/// A handle to a deleted namespace keeps working, but its entries are no longer reachable through
/// the storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<CacheKey, CachedResponse>>>,
}

impl MemoryCache {
    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn insert(&self, key: CacheKey, response: CachedResponse) -> Result<(), CacheError> {
        self.entries.write().insert(key, response);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.entries.write().remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Response;
    use url::Url;

    fn key(path: &str) -> CacheKey {
        CacheKey::for_get(&Url::parse("https://app.example.com/").unwrap().join(path).unwrap())
    }

    async fn captured(text: &str) -> CachedResponse {
        let mut resp = Response::from_body(text.to_owned());
        CachedResponse::capture(&mut resp).await.unwrap()
    }

    #[tokio::test]
    async fn open_creates_once_and_keeps_creation_order() {
        let storage = MemoryCacheStorage::new();
        storage.open("app-v2").await.unwrap();
        storage.open("app-v1").await.unwrap();
        storage.open("app-v2").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["app-v2", "app-v1"]);
    }

    #[tokio::test]
    async fn handles_share_entries() {
        let storage = MemoryCacheStorage::new();
        let a = storage.open("app-v1").await.unwrap();
        let b = storage.open("app-v1").await.unwrap();
        a.insert(key("/index.html"), captured("<html>").await)
            .await
            .unwrap();
        let hit = b.lookup(&key("/index.html")).await.unwrap().unwrap();
        assert_eq!(hit.body(), "<html>");
        assert!(b.lookup(&key("/missing")).await.unwrap().is_none());
        assert!(b.remove(&key("/index.html")).await.unwrap());
        assert!(a.is_empty());
    }

    #[tokio::test]
    async fn storage_lookup_does_not_create_namespaces() {
        let storage = MemoryCacheStorage::new();
        assert!(storage.lookup("app-v1", &key("/")).await.unwrap().is_none());
        assert!(storage.keys().await.unwrap().is_empty());

        let cache = storage.open("app-v1").await.unwrap();
        cache.insert(key("/"), captured("root").await).await.unwrap();
        let hit = storage.lookup("app-v1", &key("/")).await.unwrap().unwrap();
        assert_eq!(hit.body(), "root");
        assert!(storage.lookup("app-v2", &key("/")).await.unwrap().is_none());
        assert_eq!(storage.keys().await.unwrap(), vec!["app-v1"]);
    }

    #[tokio::test]
    async fn delete_detaches_the_namespace() {
        let storage = MemoryCacheStorage::new();
        let old = storage.open("app-v1").await.unwrap();
        old.insert(key("/"), captured("old").await).await.unwrap();
        assert!(storage.delete("app-v1").await.unwrap());
        assert!(!storage.delete("app-v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
        let reopened = storage.open("app-v1").await.unwrap();
        assert!(reopened.lookup(&key("/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn captured_responses_replay() {
        let cached = captured("body").await;
        let first = cached.to_response();
        let second: Response = cached.clone().into();
        assert_eq!(first.into_body_str().await.unwrap(), "body");
        assert_eq!(second.into_body_str().await.unwrap(), "body");
    }
}
