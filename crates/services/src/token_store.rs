//! Credential persistence with an in-memory cache.
//!
//! The cache is authoritative for the running process. The backing store is only
//! read by `load` at startup; writes go to the store first and then the cache, and
//! a failed store write is logged while the cache still takes the new value.

use std::sync::{Arc, PoisonError, RwLock};

use reasoning_core::model::Credential;
use storage::repository::KeyValueStore;

/// Key of the single persisted credential entry.
pub const CREDENTIAL_KEY: &str = "auth_token";

pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    cached: RwLock<Option<Credential>>,
}

impl TokenStore {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cached: RwLock::new(None),
        }
    }

    /// Read the persisted credential into the cache.
    ///
    /// Storage failures degrade to "no credential".
    pub async fn load(&self) -> Option<Credential> {
        let loaded = match self.store.get(CREDENTIAL_KEY).await {
            Ok(value) => value.filter(|token| !token.is_empty()).map(Credential::new),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read stored credential");
                None
            }
        };
        self.set_cached(loaded.clone());
        loaded
    }

    /// Cached credential; never touches storage.
    #[must_use]
    pub fn current(&self) -> Option<Credential> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub async fn save(&self, credential: Credential) {
        if let Err(err) = self.store.set(CREDENTIAL_KEY, credential.expose()).await {
            tracing::warn!(error = %err, "failed to persist credential");
        }
        self.set_cached(Some(credential));
    }

    pub async fn clear(&self) {
        if let Err(err) = self.store.remove(CREDENTIAL_KEY).await {
            tracing::warn!(error = %err, "failed to remove stored credential");
        }
        self.set_cached(None);
    }

    fn set_cached(&self, value: Option<Credential>) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}
