use std::sync::Arc;
use std::time::Duration;

use stratum_core::Snapshot;
use stratum_core::tree::KeyValue;
use stratum_sources::{DecodeOutcome, KvEvent, KvSource, Loader};
use tokio_util::sync::CancellationToken;

mod common;

use common::MockKv;

fn entries() -> Vec<KeyValue> {
    vec![
        KeyValue::new("/configuration/app/alert/enabled", "true"),
        KeyValue::new("/configuration/app/db/url", "postgres://db"),
        KeyValue::new("/other/ignored", "1"),
    ]
}

async fn wait_for_change(source: &KvSource, before: &Snapshot) -> Arc<Snapshot> {
    for _ in 0..100 {
        let current = source.load().await.unwrap();
        if current.checksum() != before.checksum() {
            return current;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("snapshot did not change");
}

#[tokio::test]
async fn test_load_builds_tree_under_prefix() {
    let (client, _events) = MockKv::new(entries());
    let source = KvSource::new(client, "/configuration/app");

    let data = common::decode(&source.load().await.unwrap());

    assert_eq!(data.get("alert.enabled").unwrap().as_bool(), Some(true));
    assert_eq!(data.get("db.url").unwrap().as_str(), Some("postgres://db"));
    assert!(data.get("other").is_none());
}

#[tokio::test]
async fn test_empty_prefix_is_unavailable() {
    let (client, _events) = MockKv::new(entries());
    let source = KvSource::new(client, "/missing");

    assert!(source.load().await.unwrap_err().is_source_unavailable());
}

#[tokio::test]
async fn test_unreachable_store_is_unavailable() {
    let source = KvSource::new(MockKv::unreachable(), "/configuration/app");

    assert!(source.load().await.unwrap_err().is_source_unavailable());
}

#[tokio::test]
async fn test_decoder_applies_to_values() {
    let (client, _events) = MockKv::new(vec![KeyValue::new("/app/name", "\"svc\"")]);
    let mut source = KvSource::new(client, "/app");
    source.set_decoder(Arc::new(|input: &[u8]| {
        DecodeOutcome::Decoded(input.to_ascii_uppercase())
    }));

    let data = common::decode(&source.load().await.unwrap());

    assert_eq!(data.get("name").unwrap().as_str(), Some("SVC"));
}

#[tokio::test]
async fn test_watch_applies_event_batches_in_order() {
    let (client, events) = MockKv::new(entries());
    let source = Arc::new(KvSource::new(client, "/configuration/app"));
    let before = source.load().await.unwrap();

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let source = source.clone();
        let cancel = cancel.clone();
        async move { source.watch(cancel).await }
    });

    events
        .unbounded_send(Ok(vec![
            KvEvent::put(KeyValue::new("/configuration/app/alert/enabled", "false")),
            KvEvent::put(KeyValue::new("/configuration/app/db/pool", "10")),
            KvEvent::delete("/configuration/app/db/url"),
        ]))
        .unwrap();

    let after = wait_for_change(&source, &before).await;
    let data = common::decode(&after);
    assert_eq!(data.get("alert.enabled").unwrap().as_bool(), Some(false));
    assert_eq!(data.get("db.pool").unwrap().as_i64(), Some(10));
    assert!(data.get("db.url").is_none());

    cancel.cancel();
    watcher.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_watch_ends_with_stream() {
    let (client, events) = MockKv::new(entries());
    let source = KvSource::new(client, "/configuration/app");
    source.load().await.unwrap();

    drop(events);

    assert!(source.supports_watch());
    assert!(source.watch(CancellationToken::new()).await.is_ok());
}
