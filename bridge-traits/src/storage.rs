//! Secure Credential Storage Abstraction
//!
//! The request pipeline needs exactly one secret, the API access token, but
//! it must survive app restarts without landing in plain preferences.

use async_trait::async_trait;

use crate::error::Result;

/// Secure credential storage trait
///
/// Abstracts secure storage mechanisms:
/// - macOS/iOS: Keychain
/// - Android: Keystore (hardware-backed when available)
/// - Windows: Credential Manager
/// - Linux: Secret Service / libsecret
///
/// Implementations MUST NOT log secret values.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// async fn store_token(store: &dyn SecureStore, token: &str) -> Result<()> {
///     store.set_secret("access_token", token.as_bytes()).await
/// }
/// ```
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, replacing any previous value for `key`.
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret. Deleting a missing key succeeds.
    async fn delete_secret(&self, key: &str) -> Result<()>;

    /// Check if a secret exists without retrieving it
    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        secrets: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for MemoryStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
            self.secrets
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.secrets.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> Result<()> {
            self.secrets.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_has_secret_default_uses_get() {
        let store = MemoryStore::default();
        assert!(!store.has_secret("access_token").await.unwrap());

        store.set_secret("access_token", b"abc").await.unwrap();
        assert!(store.has_secret("access_token").await.unwrap());

        store.delete_secret("access_token").await.unwrap();
        assert!(!store.has_secret("access_token").await.unwrap());
    }
}
