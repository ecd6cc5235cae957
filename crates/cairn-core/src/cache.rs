use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cairn_types::ExplorerError;
#[cfg(test)]
use mockall::automock;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::{Mutex, RwLock};

/// Interval between attempts while waiting on a contended lock.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// How long an acquired lock lives before Redis reclaims it on its own.
const LOCK_TTL_MS: u64 = 30_000;

/// Shared key/value cache. "Absent" is distinguishable from "empty".
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ExplorerError>;
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>)
        -> Result<(), ExplorerError>;
    async fn del(&self, key: &str) -> Result<(), ExplorerError>;
}

/// Cross-process lock with bounded acquisition.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Try to take `key` for up to `timeout`; false when somebody else
    /// still holds it at the deadline.
    async fn acquire(&self, key: &str, timeout: Duration) -> Result<bool, ExplorerError>;
    async fn release(&self, key: &str) -> Result<(), ExplorerError>;
}

fn redis_err(e: redis::RedisError) -> ExplorerError {
    ExplorerError::CacheUnavailable(e.to_string())
}

/// Redis-backed cache client shared by all request workers.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, ExplorerError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| ExplorerError::CacheUnavailable(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client).await.map_err(redis_err)?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, ExplorerError> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key).await.map_err(redis_err)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl_secs: Option<u64>,
    ) -> Result<(), ExplorerError> {
        let mut conn = self.conn.clone();
        match ttl_secs {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl).await.map_err(redis_err),
            None => conn.set::<_, _, ()>(key, value).await.map_err(redis_err),
        }
    }

    async fn del(&self, key: &str) -> Result<(), ExplorerError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(redis_err)
    }
}

/// Redis SET NX PX lock. Each acquisition stores a per-holder token as the
/// lock value; release deletes the key only while it still carries that
/// token, so a holder that outlived the TTL cannot free a lock somebody
/// else has since taken over.
#[derive(Clone)]
pub struct RedisLock {
    conn: ConnectionManager,
    held: HeldTokens,
}

/// Tokens of the locks this process currently holds, by key.
#[derive(Clone, Default)]
struct HeldTokens(Arc<Mutex<HashMap<String, String>>>);

impl HeldTokens {
    async fn store(&self, key: &str, token: String) {
        self.0.lock().await.insert(key.to_string(), token);
    }

    async fn take(&self, key: &str) -> Option<String> {
        self.0.lock().await.remove(key)
    }
}

const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end"#;

impl RedisLock {
    pub fn new(cache: &RedisCache) -> Self {
        Self { conn: cache.conn.clone(), held: HeldTokens::default() }
    }

    async fn try_acquire(&self, key: &str, token: &str) -> Result<bool, ExplorerError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(LOCK_TTL_MS)
            .query_async(&mut conn)
            .await
            .map_err(redis_err)?;
        Ok(reply.is_some())
    }
}

#[async_trait]
impl LockStore for RedisLock {
    async fn acquire(&self, key: &str, timeout: Duration) -> Result<bool, ExplorerError> {
        let token = uuid::Uuid::new_v4().to_string();
        let deadline = Instant::now() + timeout;
        loop {
            if self.try_acquire(key, &token).await? {
                self.held.store(key, token).await;
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
        }
    }

    async fn release(&self, key: &str) -> Result<(), ExplorerError> {
        let Some(token) = self.held.take(key).await else {
            tracing::warn!("release of {} without a held token", key);
            return Ok(());
        };
        let mut conn = self.conn.clone();
        let released: i32 = redis::Script::new(RELEASE_SCRIPT)
            .key(key)
            .arg(&token)
            .invoke_async(&mut conn)
            .await
            .map_err(redis_err)?;
        if released == 0 {
            tracing::warn!("{} expired before release and was not deleted", key);
        }
        Ok(())
    }
}

/// Short-TTL in-process layer in front of the shared cache, absorbing the
/// read traffic of hot keys. Writes and deletes go straight through, so
/// entries here are never more than `local_ttl` behind the shared store.
pub struct LayeredCache {
    inner: Arc<dyn CacheStore>,
    local: RwLock<HashMap<String, (String, Instant)>>,
    local_ttl: Duration,
}

impl LayeredCache {
    pub fn new(inner: Arc<dyn CacheStore>, local_ttl: Duration) -> Self {
        Self { inner, local: RwLock::new(HashMap::new()), local_ttl }
    }
}

#[async_trait]
impl CacheStore for LayeredCache {
    async fn get(&self, key: &str) -> Result<Option<String>, ExplorerError> {
        if let Some((value, stored_at)) = self.local.read().await.get(key) {
            if stored_at.elapsed() < self.local_ttl {
                return Ok(Some(value.clone()));
            }
        }

        let value = self.inner.get(key).await?;
        let mut local = self.local.write().await;
        match &value {
            Some(v) => {
                local.insert(key.to_string(), (v.clone(), Instant::now()));
            }
            None => {
                local.remove(key);
            }
        }
        Ok(value)
    }

    async fn set(
        &self,
        key: &str,
        value: &str,
        ttl_secs: Option<u64>,
    ) -> Result<(), ExplorerError> {
        self.inner.set(key, value, ttl_secs).await?;
        self.local
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), Instant::now()));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), ExplorerError> {
        self.inner.del(key).await?;
        self.local.write().await.remove(key);
        Ok(())
    }
}
