//! Metadata caching: snapshot persistence, concurrent-fetch deduplication,
//! lazy column loading and the fetch timeout.
mod common;

use async_trait::async_trait;
use caudal::dispatch::{
    ExecutionTransport, MetadataRequest, PreviewRequest, PreviewResponse, RunProgress, RunRequest,
    RunStarted,
};
use caudal::error::DispatchError;
use caudal::metadata::{MetadataCache, MetadataService, SourceMetadata, TableMetadata};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

/// Serves `ventas_metadata`, counting calls. Column listings are withheld
/// unless the request is scoped to a table, mirroring the real service.
#[derive(Default)]
struct CountingTransport {
    calls: AtomicUsize,
    hang: bool,
}

#[async_trait]
impl ExecutionTransport for CountingTransport {
    async fn metadata(&self, request: MetadataRequest) -> Result<SourceMetadata, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        // A short pause so concurrent callers overlap.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut metadata = common::ventas_metadata();
        if request.table_name.is_none() {
            metadata.tables = metadata
                .tables
                .into_iter()
                .map(|table| TableMetadata {
                    columns: vec![],
                    ..table
                })
                .collect();
        }
        Ok(metadata)
    }

    async fn preview(&self, _request: PreviewRequest) -> Result<PreviewResponse, DispatchError> {
        unimplemented!("metadata tests never preview")
    }

    async fn run(&self, _request: RunRequest) -> Result<RunStarted, DispatchError> {
        unimplemented!("metadata tests never run")
    }

    async fn subscribe(
        &self,
        _run_id: &str,
    ) -> Result<mpsc::Receiver<RunProgress>, DispatchError> {
        unimplemented!("metadata tests never subscribe")
    }
}

#[test]
fn snapshot_round_trips_fresh_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.bin");
    let path = path.to_str().unwrap();

    let mut cache = MetadataCache::new();
    cache.set("conn-1", common::ventas_metadata());
    cache.save(path).unwrap();

    let restored = MetadataCache::load(path, Duration::from_secs(300)).unwrap();
    let hit = restored.get("conn-1").unwrap();
    assert_eq!(hit.table("PUBLIC.VENTAS").unwrap().columns.len(), 4);
}

#[test]
fn snapshot_load_discards_entries_past_the_ttl() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metadata.bin");
    let path = path.to_str().unwrap();

    let mut cache = MetadataCache::new();
    cache.set("conn-1", common::ventas_metadata());
    cache.save(path).unwrap();

    let restored = MetadataCache::load(path, Duration::ZERO).unwrap();
    assert!(restored.is_empty());
}

#[tokio::test]
async fn concurrent_fetches_for_one_key_hit_the_transport_once() {
    let transport = Arc::new(CountingTransport::default());
    let service = MetadataService::new(Arc::clone(&transport));

    let (a, b) = tokio::join!(service.source("conn-1"), service.source("conn-1"));
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

    // Still cached afterwards.
    service.source("conn-1").await.unwrap();
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn table_columns_load_lazily_and_merge_into_the_entry() {
    let transport = Arc::new(CountingTransport::default());
    let service = MetadataService::new(Arc::clone(&transport));

    let listing = service.source("conn-1").await.unwrap();
    assert!(listing.table("PUBLIC.VENTAS").unwrap().columns.is_empty());

    let table = service.table("conn-1", "PUBLIC.VENTAS").await.unwrap();
    assert_eq!(table.columns.len(), 4);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);

    // The merged entry answers the next request without a fetch.
    let table = service.table("conn-1", "VENTAS").await.unwrap();
    assert_eq!(table.columns.len(), 4);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_table_is_rejected_after_the_fetch() {
    let transport = Arc::new(CountingTransport::default());
    let service = MetadataService::new(transport);

    let err = service.table("conn-1", "PUBLIC.NADA").await.unwrap_err();
    assert!(matches!(err, DispatchError::Rejected(_)));
}

#[tokio::test]
async fn invalidation_forces_a_refetch() {
    let transport = Arc::new(CountingTransport::default());
    let service = MetadataService::new(Arc::clone(&transport));

    service.source("conn-1").await.unwrap();
    service.invalidate("conn-1").await;
    service.source("conn-1").await.unwrap();
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn hanging_fetch_times_out() {
    let transport = Arc::new(CountingTransport {
        calls: AtomicUsize::new(0),
        hang: true,
    });
    let service = MetadataService::new(transport);

    match service.source("conn-1").await {
        Err(DispatchError::MetadataTimeout { key, seconds }) => {
            assert_eq!(key, "conn-1");
            assert_eq!(seconds, 35);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}
