//! API keys for external services.
//!
//! Keys live in the local store under `fluide_api_key_<provider>`. When none is
//! stored, the `FLUIDE_<PROVIDER>_API_KEY` environment variable is used, first
//! from the running environment and then as captured at build time.

use std::fmt;

use crate::error::StorageError;
use crate::storage::KeyValueStore;

const STORAGE_KEY_PREFIX: &str = "fluide_api_key_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "FLUIDE_GEMINI_API_KEY",
        }
    }

    fn build_time_key(&self) -> Option<&'static str> {
        match self {
            Provider::Gemini => option_env!("FLUIDE_GEMINI_API_KEY"),
        }
    }

    fn storage_key(&self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct CredentialStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> CredentialStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The stored key, if any. Read failures count as "none".
    pub fn get(&self, provider: Provider) -> Option<String> {
        match self.store.get(&provider.storage_key()) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                tracing::error!(%provider, error = %e, "failed to read API key");
                None
            }
        }
    }

    /// Stored key, else the environment, else the build-time value.
    pub fn get_or_env(&self, provider: Provider) -> Option<String> {
        self.get(provider)
            .or_else(|| std::env::var(provider.env_var()).ok())
            .or_else(|| provider.build_time_key().map(str::to_string))
            .filter(|v| !v.trim().is_empty())
    }

    pub fn has_key(&self, provider: Provider) -> bool {
        self.get_or_env(provider).is_some()
    }

    /// Save a key. A blank key clears the stored one.
    ///
    /// # Errors
    /// Propagates the store's write failure so the caller can offer a retry.
    pub fn set(&self, provider: Provider, key: &str) -> Result<(), StorageError> {
        let key = key.trim();
        let result = if key.is_empty() {
            self.store.remove(&provider.storage_key())
        } else {
            self.store.set(&provider.storage_key(), key)
        };
        if let Err(e) = &result {
            tracing::error!(%provider, error = %e, "failed to save API key");
        }
        result
    }

    pub fn clear(&self, provider: Provider) -> Result<(), StorageError> {
        self.set(provider, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn set_trims_and_get_returns_stored_key() {
        let creds = CredentialStore::new(MemoryStore::new());
        creds.set(Provider::Gemini, "  abc123 \n").unwrap();
        assert_eq!(creds.get(Provider::Gemini).as_deref(), Some("abc123"));
        assert_eq!(creds.get_or_env(Provider::Gemini).as_deref(), Some("abc123"));
        assert!(creds.has_key(Provider::Gemini));
    }

    #[test]
    fn blank_value_clears_the_key() {
        let store = MemoryStore::new();
        let creds = CredentialStore::new(&store);
        creds.set(Provider::Gemini, "abc").unwrap();
        creds.set(Provider::Gemini, "   ").unwrap();
        assert!(creds.get(Provider::Gemini).is_none());
        assert!(store.get("fluide_api_key_gemini").unwrap().is_none());
    }

    #[test]
    fn stored_blank_value_is_ignored() {
        let store = MemoryStore::new();
        store.set("fluide_api_key_gemini", "  ").unwrap();
        assert!(CredentialStore::new(&store).get(Provider::Gemini).is_none());
    }

    #[test]
    fn write_failure_propagates() {
        struct FullStore;
        impl KeyValueStore for FullStore {
            fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
                Ok(None)
            }
            fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
                Err(StorageError::WriteFailed {
                    key: key.into(),
                    message: "quota exceeded".into(),
                })
            }
            fn remove(&self, _key: &str) -> Result<(), StorageError> {
                Ok(())
            }
        }

        let creds = CredentialStore::new(FullStore);
        assert!(matches!(
            creds.set(Provider::Gemini, "abc"),
            Err(StorageError::WriteFailed { .. })
        ));
    }
}
