//! # Scan History Cache
//!
//! Best-effort Redis caching of the first scan-history page.
//!
//! ## Explicit Handle, No Globals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  The cache is an explicitly passed handle with a Disabled variant.  │
//! │  There is no process-wide client, no "is it initialized yet?"       │
//! │  state, and no code path that can observe a half-connected cache:   │
//! │                                                                     │
//! │    ScanCache::disabled()            → every call is a no-op         │
//! │    ScanCache::connect(url, ttl)     → Redis-backed                  │
//! │                                                                     │
//! │  Every Redis failure degrades to a cache miss with a warn! -        │
//! │  the database remains the source of truth.                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{info, warn};

/// Key prefix for the per-user first history page.
const SCAN_HISTORY_PREFIX: &str = "scan_history:";

/// Default cache lifetime: 30 days, matching the retention of the
/// history view it fronts.
pub const DEFAULT_HISTORY_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

// =============================================================================
// Scan Cache
// =============================================================================

/// Cache handle threaded through `ScanService`.
#[derive(Clone)]
pub enum ScanCache {
    /// Caching switched off; every read misses, every write is dropped.
    Disabled,

    /// Redis-backed cache.
    Redis {
        manager: ConnectionManager,
        ttl_seconds: u64,
    },
}

impl ScanCache {
    /// A cache that does nothing.
    pub fn disabled() -> Self {
        ScanCache::Disabled
    }

    /// Connects to Redis (redis:// or rediss:// URL).
    ///
    /// Connection errors propagate: a deployment that asked for a cache
    /// and cannot reach it should fail loudly at startup, not limp along
    /// half-configured. Use [`ScanCache::disabled`] to opt out.
    pub async fn connect(url: &str, ttl_seconds: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let manager = client.get_connection_manager().await?;

        info!(ttl_seconds, "Scan history cache connected");

        Ok(ScanCache::Redis {
            manager,
            ttl_seconds,
        })
    }

    /// Whether this handle actually caches.
    pub fn is_enabled(&self) -> bool {
        matches!(self, ScanCache::Redis { .. })
    }

    /// Fetches the cached first history page for an owner.
    pub async fn get_first_page(&self, owner_id: &str) -> Option<String> {
        let ScanCache::Redis { manager, .. } = self else {
            return None;
        };

        let mut conn = manager.clone();
        match conn.get::<_, Option<String>>(history_key(owner_id)).await {
            Ok(value) => value,
            Err(e) => {
                warn!(owner = %owner_id, "Cache read failed: {}", e);
                None
            }
        }
    }

    /// Stores the first history page for an owner.
    pub async fn put_first_page(&self, owner_id: &str, payload: &str) {
        let ScanCache::Redis {
            manager,
            ttl_seconds,
        } = self
        else {
            return;
        };

        let mut conn = manager.clone();
        if let Err(e) = conn
            .set_ex::<_, _, ()>(history_key(owner_id), payload, *ttl_seconds)
            .await
        {
            warn!(owner = %owner_id, "Cache write failed: {}", e);
        }
    }

    /// Drops an owner's cached page after a new scan lands.
    pub async fn invalidate(&self, owner_id: &str) {
        let ScanCache::Redis { manager, .. } = self else {
            return;
        };

        let mut conn = manager.clone();
        if let Err(e) = conn.del::<_, ()>(history_key(owner_id)).await {
            warn!(owner = %owner_id, "Cache invalidation failed: {}", e);
        }
    }
}

fn history_key(owner_id: &str) -> String {
    format!("{}{}", SCAN_HISTORY_PREFIX, owner_id)
}

impl std::fmt::Debug for ScanCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanCache::Disabled => f.write_str("ScanCache::Disabled"),
            ScanCache::Redis { ttl_seconds, .. } => f
                .debug_struct("ScanCache::Redis")
                .field("ttl_seconds", ttl_seconds)
                .finish_non_exhaustive(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_cache_is_a_no_op() {
        let cache = ScanCache::disabled();
        assert!(!cache.is_enabled());

        cache.put_first_page("user-1", "{}").await;
        assert_eq!(cache.get_first_page("user-1").await, None);
        cache.invalidate("user-1").await;
    }

    #[test]
    fn test_history_key() {
        assert_eq!(history_key("user-1"), "scan_history:user-1");
    }
}
