use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sentinel::revocation::{revocation_key, RevocationStore, StoreError};
use time::Duration;
use tracing::{debug, info};

//--------------------------------------------------------------------------------------------------
// Redis-backed revocation store
//--------------------------------------------------------------------------------------------------

// Blacklist entries live as "logout_<token>" keys with a TTL; Redis handles the aging out

pub struct RedisRevocationStore {
    connection: ConnectionManager,
}

impl RedisRevocationStore {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        // Make sure the server is actually there before taking traffic
        let mut probe = connection.clone();
        let pong: String = redis::cmd("PING").query_async(&mut probe).await?;
        debug!("Redis answered {}", pong);

        info!("Connected to Redis");

        Ok(RedisRevocationStore { connection })
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, token: &str, ttl: Duration) -> Result<(), StoreError> {
        if ttl <= Duration::ZERO {
            return Ok(());
        }

        // Sub-second remainders round up so a revocation never undershoots the token
        let ttl_secs = ttl.whole_seconds().max(1) as u64;

        let mut connection = self.connection.clone();
        let _: () = connection
            .set_ex(revocation_key(token), "", ttl_secs)
            .await
            .map_err(|err| StoreError(err.to_string()))?;

        debug!("Token blacklisted for {}s", ttl_secs);

        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        let exists: bool = connection
            .exists(revocation_key(token))
            .await
            .map_err(|err| StoreError(err.to_string()))?;

        Ok(exists)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|err| StoreError(err.to_string()))?;

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
