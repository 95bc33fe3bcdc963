mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{ipa, xml_plist};
use ipameta::store::UnavailableReason;
use ipameta::{
    AttemptOutcome, MetadataPipeline, PipelineState, StoreLookup, StoreOutcome, StoreRecord,
    UploadSession,
};
use tokio::sync::Notify;

/// Store that parks every lookup until the test opens the gate.
#[derive(Default)]
struct GatedStore {
    entered: Notify,
    gate: Notify,
    found: bool,
}

#[async_trait]
impl StoreLookup for GatedStore {
    async fn lookup(&self, term: &str) -> StoreOutcome {
        self.entered.notify_one();
        self.gate.notified().await;
        if self.found {
            StoreOutcome::Found(StoreRecord {
                icon: format!("https://example.com/{term}.png"),
                rating: 3.0,
                ..StoreRecord::default()
            })
        } else {
            StoreOutcome::Unavailable(UnavailableReason::NoResults)
        }
    }
}

fn todo_archive() -> Vec<u8> {
    ipa(
        "Todo",
        &xml_plist(&[
            ("CFBundleDisplayName", "Todo"),
            ("CFBundleShortVersionString", "1.0"),
            ("CFBundleIdentifier", "com.acme.todo"),
        ]),
    )
}

#[tokio::test]
async fn current_attempt_is_applied() {
    let store = Arc::new(GatedStore {
        found: true,
        ..GatedStore::default()
    });
    let session = Arc::new(UploadSession::new());
    let pipeline = MetadataPipeline::new(store.clone());

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.process(&pipeline, &todo_archive()).await }
    });

    store.entered.notified().await;
    assert!(matches!(session.state(), PipelineState::Resolving { .. }));
    store.gate.notify_one();

    let outcome = task.await.unwrap().unwrap();
    let metadata = match outcome {
        AttemptOutcome::Applied(metadata) => metadata,
        other => panic!("expected Applied, got {other:?}"),
    };
    assert_eq!(metadata.icon, "https://example.com/Todo.png");
    assert!(!metadata.is_partial());
    assert_eq!(
        session.state(),
        PipelineState::Assembled {
            attempt: session.state().attempt().unwrap(),
            metadata,
        }
    );
}

#[tokio::test]
async fn newer_upload_supersedes_in_flight_lookup() {
    let store = Arc::new(GatedStore::default());
    let session = Arc::new(UploadSession::new());
    let pipeline = MetadataPipeline::new(store.clone());

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.process(&pipeline, &todo_archive()).await }
    });

    store.entered.notified().await;
    let newer = session.begin();
    store.gate.notify_one();

    assert_eq!(task.await.unwrap().unwrap(), AttemptOutcome::Superseded);
    assert_eq!(
        session.state(),
        PipelineState::Extracting { attempt: newer }
    );
}

#[tokio::test]
async fn reset_discards_in_flight_result() {
    let store = Arc::new(GatedStore::default());
    let session = Arc::new(UploadSession::new());
    let pipeline = MetadataPipeline::new(store.clone());

    let task = tokio::spawn({
        let session = session.clone();
        async move { session.process(&pipeline, &todo_archive()).await }
    });

    store.entered.notified().await;
    session.reset();
    store.gate.notify_one();

    assert_eq!(task.await.unwrap().unwrap(), AttemptOutcome::Superseded);
    assert_eq!(session.state(), PipelineState::Idle);
}

#[tokio::test]
async fn unavailable_store_still_assembles() {
    let store = Arc::new(GatedStore::default());
    let session = UploadSession::new();
    let pipeline = MetadataPipeline::new(store.clone());

    store.gate.notify_one();
    let outcome = session.process(&pipeline, &todo_archive()).await.unwrap();

    let metadata = match outcome {
        AttemptOutcome::Applied(metadata) => metadata,
        other => panic!("expected Applied, got {other:?}"),
    };
    assert!(metadata.is_partial());
    assert_eq!(metadata.name, "Todo");
    assert!(session.state().is_terminal());
}
