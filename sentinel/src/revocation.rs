use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

//--------------------------------------------------------------------------------------------------
// Revocation store interface
//--------------------------------------------------------------------------------------------------

// The store may be shared with unrelated data; the prefix namespaces blacklist entries
pub const REVOCATION_KEY_PREFIX: &str = "logout_";

// Deterministic: identical tokens always map to the same key, distinct tokens never collide
pub fn revocation_key(token: &str) -> String {
    format!("{REVOCATION_KEY_PREFIX}{token}")
}

#[derive(Debug, Error)]
#[error("revocation store error: {0}")]
pub struct StoreError(pub String);

/// Blacklist for tokens that must die before their natural expiry. Entries age out on their own;
/// an absent key always reads as "not revoked".
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Blacklist `token` for `ttl`. A non-positive `ttl` means the token has already expired on
    /// its own and the call is a no-op.
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Whether `token` is currently blacklisted.
    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError>;

    /// Connectivity check, for readiness probing.
    async fn ping(&self) -> Result<(), StoreError>;
}

//--------------------------------------------------------------------------------------------------
// In-memory store
//--------------------------------------------------------------------------------------------------

/// Process-local implementation, for tests and deployments without an external store. Expired
/// entries are pruned lazily on lookup.
#[derive(Default)]
pub struct MemoryRevocationStore {
    entries: Mutex<HashMap<String, OffsetDateTime>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), StoreError> {
        if ttl <= Duration::ZERO {
            return Ok(());
        }

        self.entries
            .lock()
            .insert(revocation_key(token), OffsetDateTime::now_utc() + ttl);

        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock();

        let now = OffsetDateTime::now_utc();
        entries.retain(|_, expires_at| *expires_at > now);

        Ok(entries.contains_key(&revocation_key(token)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn revoked_token_reads_as_revoked() {
        let store = MemoryRevocationStore::new();

        store.revoke("token-a", Duration::hours(1)).await.unwrap();

        assert!(store.is_revoked("token-a").await.unwrap());
        assert!(!store.is_revoked("token-b").await.unwrap());
    }

    #[tokio::test]
    async fn non_positive_ttl_is_a_no_op() {
        let store = MemoryRevocationStore::new();

        store.revoke("token-a", Duration::ZERO).await.unwrap();
        store.revoke("token-b", Duration::seconds(-10)).await.unwrap();

        assert!(!store.is_revoked("token-a").await.unwrap());
        assert!(!store.is_revoked("token-b").await.unwrap());
    }

    #[tokio::test]
    async fn entries_age_out() {
        let store = MemoryRevocationStore::new();

        store
            .revoke("token-a", Duration::milliseconds(20))
            .await
            .unwrap();
        assert!(store.is_revoked("token-a").await.unwrap());

        tokio::time::sleep(std::time::Duration::from_millis(40)).await;

        assert!(!store.is_revoked("token-a").await.unwrap());
    }

    #[test]
    fn keys_are_prefixed_and_deterministic() {
        assert_eq!(revocation_key("abc"), "logout_abc");
        assert_eq!(revocation_key("abc"), revocation_key("abc"));
        assert_ne!(revocation_key("abc"), revocation_key("abd"));
    }
}
