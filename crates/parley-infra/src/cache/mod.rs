//! `CacheStore` adapters.
//!
//! - `memory`: in-process store on DashMap, for single-process deployments and tests
//! - `valkey`: Valkey/Redis store shared across processes
//!
//! [`ConfiguredCacheStore`] selects one of them at startup.

pub mod memory;
pub mod valkey;

use std::time::Duration;

use parley_core::chat::cache::CacheStore;
use parley_types::config::CacheConfig;
use parley_types::error::CacheError;

use self::memory::MemoryCacheStore;
use self::valkey::ValkeyCacheStore;

/// The cache backend chosen by configuration.
#[derive(Debug)]
pub enum ConfiguredCacheStore {
    Memory(MemoryCacheStore),
    Valkey(ValkeyCacheStore),
}

impl ConfiguredCacheStore {
    /// Valkey when `redis_url` is set, in-process otherwise.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        match config.redis_url.as_deref() {
            Some(url) => Ok(Self::Valkey(ValkeyCacheStore::new(url)?)),
            None => Ok(Self::Memory(MemoryCacheStore::new())),
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Valkey(_) => "valkey",
        }
    }
}

impl CacheStore for ConfiguredCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self {
            Self::Memory(store) => store.get(key).await,
            Self::Valkey(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        match self {
            Self::Memory(store) => store.set(key, value, ttl).await,
            Self::Valkey(store) => store.set(key, value, ttl).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            Self::Memory(store) => store.delete(key).await,
            Self::Valkey(store) => store.delete(key).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_backend_from_config() {
        let memory = ConfiguredCacheStore::from_config(&CacheConfig::default()).unwrap();
        assert_eq!(memory.backend(), "memory");

        let valkey = ConfiguredCacheStore::from_config(&CacheConfig {
            redis_url: Some("redis://localhost:6379".to_string()),
        })
        .unwrap();
        assert_eq!(valkey.backend(), "valkey");
    }

    #[tokio::test]
    async fn test_memory_variant_delegates() {
        let store = ConfiguredCacheStore::from_config(&CacheConfig::default()).unwrap();
        store
            .set("k", b"v".to_vec(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        store.delete("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }
}
