use crate::errors::QueryError;
use crate::schema::introspection::SchemaFetcher;
use crate::schema::snapshot::SchemaSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Owns the current schema snapshot and its freshness timestamp.
///
/// Refresh is lazy and pull-based: the first reader past the TTL performs
/// the refetch. The check-then-fetch sequence runs under one lock, so
/// concurrent readers during a refresh wait for the in-flight fetch instead
/// of issuing their own (single-flight). A failed refresh propagates to the
/// caller and leaves any previous snapshot in place untouched.
pub struct SchemaCache {
    fetcher: Arc<dyn SchemaFetcher>,
    ttl: Duration,
    state: Mutex<Option<CachedSnapshot>>,
}

struct CachedSnapshot {
    snapshot: Arc<SchemaSnapshot>,
    fetched_at: Instant,
}

impl SchemaCache {
    pub fn new(fetcher: Arc<dyn SchemaFetcher>, ttl: Duration) -> Self {
        Self {
            fetcher,
            ttl,
            state: Mutex::new(None),
        }
    }

    /// The current snapshot, refetched first if stale or absent.
    pub async fn get(&self) -> Result<Arc<SchemaSnapshot>, QueryError> {
        let mut state = self.state.lock().await;
        if let Some(cached) = state.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.snapshot.clone());
            }
            debug!("schema snapshot expired, refetching");
        }

        let snapshot = Arc::new(self.fetcher.fetch_schema().await?);
        *state = Some(CachedSnapshot {
            snapshot: snapshot.clone(),
            fetched_at: Instant::now(),
        });
        debug!(types = snapshot.types.len(), "schema snapshot refreshed");
        Ok(snapshot)
    }
}
