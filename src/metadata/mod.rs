//! Schema metadata shared across all nodes referencing the same source:
//! a TTL'd cache with copy-on-write entries, a persisted snapshot, and an
//! explicit per-node fetch state machine.

use crate::error::SnapshotError;
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

mod service;
mod state;

pub use service::MetadataService;
pub use state::{FetchCommand, FetchState};

/// How long a cache entry stays fresh.
pub const METADATA_TTL: Duration = Duration::from_secs(300);

/// Upper bound on a single metadata fetch before it is reported as a
/// timeout instead of left pending.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(35);

/// The schema/table/column listing of one data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_version: Option<String>,
    #[serde(default)]
    pub schemas: Vec<String>,
    #[serde(default)]
    pub tables: Vec<TableMetadata>,
}

impl SourceMetadata {
    /// Looks a table up by qualified (`schema.name`) or bare name.
    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables
            .iter()
            .find(|t| t.qualified_name() == name || t.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_primary_key: Option<bool>,
}

struct CacheSlot {
    value: Arc<SourceMetadata>,
    stored_at: Instant,
}

/// Keyed metadata cache with time-based eviction. Entries are replaced
/// wholesale (copy-on-write `Arc` per key), never mutated in place, so
/// readers holding an `Arc` are unaffected by later updates.
pub struct MetadataCache {
    entries: AHashMap<String, CacheSlot>,
    ttl: Duration,
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::with_ttl(METADATA_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: AHashMap::new(),
            ttl,
        }
    }

    /// Returns the entry for `key` unless it has expired.
    pub fn get(&self, key: &str) -> Option<Arc<SourceMetadata>> {
        let slot = self.entries.get(key)?;
        if slot.stored_at.elapsed() >= self.ttl {
            debug!(key, "metadata cache entry expired");
            return None;
        }
        Some(Arc::clone(&slot.value))
    }

    /// Stores a fresh entry for `key`, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: SourceMetadata) -> Arc<SourceMetadata> {
        let key = key.into();
        let value = Arc::new(value);
        debug!(key = key.as_str(), "metadata cache entry stored");
        self.entries.insert(
            key,
            CacheSlot {
                value: Arc::clone(&value),
                stored_at: Instant::now(),
            },
        );
        value
    }

    /// Removes the entry for `key` regardless of age.
    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Drops every expired entry.
    pub fn evict_expired(&mut self) {
        let ttl = self.ttl;
        self.entries.retain(|_, slot| slot.stored_at.elapsed() < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Saves the cache to a snapshot file using the bincode format. Entry
    /// ages are stored as wall-clock seconds so expiry survives a restart.
    pub fn save(&self, path: &str) -> Result<(), SnapshotError> {
        let now_unix = unix_now();
        let entries = self
            .entries
            .iter()
            .map(|(key, slot)| SnapshotEntry {
                key: key.clone(),
                stored_at_unix: now_unix.saturating_sub(slot.stored_at.elapsed().as_secs()),
                value: (*slot.value).clone(),
            })
            .collect();
        let snapshot = CacheSnapshot { entries };
        let bytes = encode_to_vec(&snapshot, standard())
            .map_err(|e| SnapshotError::Encode(e.to_string()))?;
        let mut file = fs::File::create(path).map_err(|e| SnapshotError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        file.write_all(&bytes).map_err(|e| SnapshotError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Rehydrates a cache from a snapshot file, discarding entries whose
    /// age already exceeds the TTL.
    pub fn load(path: &str, ttl: Duration) -> Result<Self, SnapshotError> {
        let mut file = fs::File::open(path).map_err(|e| SnapshotError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| SnapshotError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let (snapshot, _): (CacheSnapshot, _) = decode_from_slice(&bytes, standard())
            .map_err(|e| SnapshotError::Decode(e.to_string()))?;

        let now_unix = unix_now();
        let now = Instant::now();
        let mut cache = Self::with_ttl(ttl);
        for entry in snapshot.entries {
            let age = Duration::from_secs(now_unix.saturating_sub(entry.stored_at_unix));
            if age >= ttl {
                debug!(key = entry.key.as_str(), "discarding expired snapshot entry");
                continue;
            }
            cache.entries.insert(
                entry.key,
                CacheSlot {
                    value: Arc::new(entry.value),
                    stored_at: now - age,
                },
            );
        }
        Ok(cache)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[derive(Serialize, Deserialize)]
struct CacheSnapshot {
    entries: Vec<SnapshotEntry>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotEntry {
    key: String,
    stored_at_unix: u64,
    value: SourceMetadata,
}
