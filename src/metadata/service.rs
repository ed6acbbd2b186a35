use super::{FETCH_TIMEOUT, MetadataCache, SourceMetadata, TableMetadata};
use crate::dispatch::{ExecutionTransport, MetadataRequest};
use crate::error::{DispatchError, SnapshotError};
use ahash::AHashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Fetches and caches source metadata through an [`ExecutionTransport`].
///
/// Concurrent requests for the same key are deduplicated: the first caller
/// fetches while the rest wait on a per-key gate and then read the cache,
/// so a burst of nodes pointing at one connection costs a single round
/// trip. Table columns are loaded lazily and merged copy-on-write into the
/// cached entry.
pub struct MetadataService<T: ExecutionTransport> {
    transport: Arc<T>,
    cache: Mutex<MetadataCache>,
    gates: Mutex<AHashMap<String, Arc<Mutex<()>>>>,
    fetch_timeout: Duration,
}

impl<T: ExecutionTransport> MetadataService<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self::with_cache(transport, MetadataCache::new())
    }

    /// Builds a service around an existing cache, e.g. one rehydrated from
    /// a snapshot.
    pub fn with_cache(transport: Arc<T>, cache: MetadataCache) -> Self {
        Self {
            transport,
            cache: Mutex::new(cache),
            gates: Mutex::new(AHashMap::new()),
            fetch_timeout: FETCH_TIMEOUT,
        }
    }

    /// Overrides the per-fetch timeout, [`FETCH_TIMEOUT`] by default.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// The schema/table listing of a connection, fetched at most once per
    /// TTL window.
    pub async fn source(
        &self,
        connection_id: &str,
    ) -> Result<Arc<SourceMetadata>, DispatchError> {
        if let Some(hit) = self.cache.lock().await.get(connection_id) {
            return Ok(hit);
        }
        self.fetch(connection_id, None).await
    }

    /// A table's metadata including its columns. Column listings are not
    /// part of the initial source fetch; the first request for a table
    /// triggers a scoped fetch and merges the result into the cached entry.
    pub async fn table(
        &self,
        connection_id: &str,
        table: &str,
    ) -> Result<TableMetadata, DispatchError> {
        if let Some(meta) = self.cache.lock().await.get(connection_id) {
            if let Some(found) = meta.table(table) {
                if !found.columns.is_empty() {
                    return Ok(found.clone());
                }
            }
        }
        let merged = self.fetch(connection_id, Some(table)).await?;
        merged.table(table).cloned().ok_or_else(|| {
            DispatchError::Rejected(format!(
                "table '{table}' does not exist on connection '{connection_id}'"
            ))
        })
    }

    /// Forgets the cached entry for a connection so the next request
    /// refetches.
    pub async fn invalidate(&self, connection_id: &str) {
        self.cache.lock().await.remove(connection_id);
    }

    /// Persists the current cache to a snapshot file.
    pub async fn save_snapshot(&self, path: &str) -> Result<(), SnapshotError> {
        self.cache.lock().await.save(path)
    }

    async fn fetch(
        &self,
        connection_id: &str,
        table: Option<&str>,
    ) -> Result<Arc<SourceMetadata>, DispatchError> {
        let gate_key = match table {
            Some(table) => format!("{connection_id}#{table}"),
            None => connection_id.to_string(),
        };
        let gate = Arc::clone(
            self.gates
                .lock()
                .await
                .entry(gate_key.clone())
                .or_default(),
        );
        let _held = gate.lock().await;

        // Whoever held the gate before us may have already filled the cache.
        if let Some(hit) = self.cache.lock().await.get(connection_id) {
            let satisfied = match table {
                Some(table) => hit.table(table).is_some_and(|t| !t.columns.is_empty()),
                None => true,
            };
            if satisfied {
                debug!(key = gate_key.as_str(), "metadata fetch satisfied while waiting");
                return Ok(hit);
            }
        }

        let request = MetadataRequest {
            connection_id: connection_id.to_string(),
            table_name: table.map(str::to_string),
        };
        let fetched = match tokio::time::timeout(self.fetch_timeout, self.transport.metadata(request))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!(key = gate_key.as_str(), "metadata fetch timed out");
                return Err(DispatchError::MetadataTimeout {
                    key: gate_key,
                    seconds: self.fetch_timeout.as_secs(),
                });
            }
        };

        let mut cache = self.cache.lock().await;
        let merged = match (table, cache.get(connection_id)) {
            // Scoped fetch on top of an existing entry: replace the matching
            // tables, keep the rest. The old Arc stays valid for readers.
            (Some(_), Some(existing)) => {
                let mut base = (*existing).clone();
                for incoming in fetched.tables {
                    match base
                        .tables
                        .iter_mut()
                        .find(|t| t.qualified_name() == incoming.qualified_name())
                    {
                        Some(slot) => *slot = incoming,
                        None => base.tables.push(incoming),
                    }
                }
                base
            }
            _ => fetched,
        };
        let stored = cache.set(connection_id, merged);
        drop(cache);
        self.gates.lock().await.remove(&gate_key);
        Ok(stored)
    }
}
