//! Integration tests for table sync against an in-memory document store.

use lightseq_protocol::{
    ApplyOperationsResponse, Document, InsertResult, JsonObject, NodeFields, NodeKind,
    OperationKind, PlaylistFields, TableName,
};
use lightseq_sync::{
    DocumentModel, MemoryReporter, MockTransport, NodeHandler, NodeModel, PushOutcome,
    SyncConfig, SyncError, SyncOutcome, SyncPhase, SyncRegistry, SyncTrigger, TableSync,
    UnloadDecision,
};
use lightseq_testkit::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

type Playlists = TableSync<DocumentModel<PlaylistFields>, MemoryDocumentStore>;

async fn settle() {
    tokio::time::sleep(Duration::from_secs(2)).await;
}

fn without_times<F: Clone>(docs: &[Document<F>]) -> Vec<Document<F>> {
    docs.iter()
        .map(|d| Document {
            creation_time: 0.0,
            ..d.clone()
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn resolved_insert_readdresses_model() {
    let transport = Arc::new(MockTransport::new());
    transport.push_response(Ok(ApplyOperationsResponse::new(vec![InsertResult::new(
        "n3", "srv_77",
    )])));
    let sync: TableSync<DocumentModel<JsonObject>, _> =
        TableSync::new(TableName::Nodes, SyncConfig::default(), transport.clone());

    let handle = sync.edit(|models| models.insert(DocumentModel::new(doc(json!({"_id": "n3"})))));
    let outcome = sync.flush().await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Synced {
            operations: 1,
            inserts_resolved: 1,
        }
    );

    assert_eq!(sync.document(handle).unwrap().id.as_str(), "srv_77");
    let snapshot = sync.server_snapshot();
    assert!(snapshot.iter().any(|d| d.id.as_str() == "srv_77"));
    assert!(snapshot.iter().all(|d| d.id.as_str() != "n3"));

    // Nothing left to send.
    assert_eq!(
        sync.flush().await.unwrap(),
        SyncOutcome::Skipped(lightseq_sync::SkipReason::NothingPending)
    );
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn absorbed_push_is_not_sent_back() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.seed_typed(
        TableName::Playlists,
        &[
            scenarios::playlist("pl1", "p1", "Intro"),
            scenarios::playlist("pl2", "p1", "Finale"),
        ],
    );
    let sync = Playlists::new(TableName::Playlists, SyncConfig::default(), store.clone());

    let outcome = sync
        .absorb_server_push(store.documents(TableName::Playlists))
        .unwrap();
    assert!(matches!(outcome, PushOutcome::Applied(summary) if summary.added == 2));

    settle().await;
    assert_eq!(store.call_count(), 0);
    assert!(!sync.has_unsynced_changes());
    assert_eq!(
        sync.with_models(|models| models.snapshot()),
        sync.server_snapshot()
    );
}

#[tokio::test(start_paused = true)]
async fn local_edits_reach_the_store() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.seed_typed(
        TableName::Playlists,
        &[
            scenarios::playlist("pl1", "p1", "Intro"),
            scenarios::playlist("pl2", "p1", "Finale"),
        ],
    );
    let sync = Playlists::new(TableName::Playlists, SyncConfig::default(), store.clone());
    sync.absorb_server_push(store.documents(TableName::Playlists))
        .unwrap();

    let intro = sync.handle_of(&"pl1".into()).unwrap();
    let finale = sync.handle_of(&"pl2".into()).unwrap();
    sync.update(intro, |f| f.name = "Opening".into()).unwrap();
    sync.remove(finale);
    let encore = sync
        .insert(scenarios::playlist("unused", "p1", "Encore").fields)
        .unwrap();
    settle().await;

    assert_eq!(store.call_count(), 1);
    let stored: Vec<Document<PlaylistFields>> = store.documents(TableName::Playlists);
    let names: Vec<&str> = stored.iter().map(|d| d.fields.name.as_str()).collect();
    assert_eq!(names, ["Opening", "Encore"]);
    assert_eq!(sync.document(encore).unwrap().id, stored[1].id);

    // The store's reactive query now delivers the server's creation times.
    let local = sync.with_models(|models| models.snapshot());
    assert_eq!(without_times(&local), without_times(&stored));
    let outcome = sync.absorb_server_push(stored).unwrap();
    assert!(matches!(outcome, PushOutcome::Applied(summary) if summary.updated == 1));

    settle().await;
    assert_eq!(store.call_count(), 1);
    assert!(!sync.has_unsynced_changes());
}

#[tokio::test(start_paused = true)]
async fn failed_sync_retries_with_later_edits() {
    let store = Arc::new(MemoryDocumentStore::new());
    let reporter = Arc::new(MemoryReporter::new());
    let sync = Playlists::with_reporter(
        TableName::Playlists,
        SyncConfig::default(),
        store.clone(),
        reporter.clone(),
    );

    store.fail_next(SyncError::transport_retryable("gateway timeout"));
    let first = sync
        .insert(scenarios::playlist("x", "p1", "First").fields)
        .unwrap();
    settle().await;

    assert_eq!(store.call_count(), 1);
    assert!(store.raw(TableName::Playlists).is_empty());
    assert!(sync.server_snapshot().is_empty());
    assert!(sync.has_unsynced_changes());
    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].context.table, TableName::Playlists);
    assert_eq!(reports[0].context.operation_count, 1);
    assert_eq!(reports[0].context.trigger, SyncTrigger::Debounce);

    sync.insert(scenarios::playlist("y", "p1", "Second").fields)
        .unwrap();
    settle().await;

    assert_eq!(store.call_count(), 2);
    assert_eq!(store.raw(TableName::Playlists).len(), 2);
    assert!(!sync.document(first).unwrap().id.is_temporary());
    assert_eq!(sync.stats().syncs_completed, 1);
    assert_eq!(sync.stats().syncs_failed, 1);
}

#[tokio::test(start_paused = true)]
async fn rejected_patch_keeps_baseline() {
    let store = Arc::new(MemoryDocumentStore::new());
    let reporter = Arc::new(MemoryReporter::new());
    let sync = Playlists::with_reporter(
        TableName::Playlists,
        SyncConfig::default(),
        store.clone(),
        reporter.clone(),
    );

    // The server never had `pl9`, so the patch is rejected.
    let baseline = vec![scenarios::playlist("pl9", "p1", "Ghost")];
    sync.absorb_server_push(baseline.clone()).unwrap();
    let ghost = sync.handle_of(&"pl9".into()).unwrap();
    sync.update(ghost, |f| f.name = "Still ghost".into())
        .unwrap();

    let result = sync.flush().await;
    assert!(matches!(result, Err(SyncError::ServerRejected(_))));
    assert_eq!(sync.server_snapshot(), baseline);
    assert!(!reporter.reports()[0].retryable);
}

fn node(id: &str, kind: NodeKind) -> Document<NodeFields> {
    Document::new(
        id,
        1.0,
        NodeFields {
            sequence_id: "s1".into(),
            order: 0.0,
            start_ms: 0,
            duration_ms: 250,
            kind,
        },
    )
}

#[tokio::test(start_paused = true)]
async fn node_kind_change_rebuilds_model() {
    let store = Arc::new(MemoryDocumentStore::new());
    let sync: TableSync<NodeModel, _> =
        TableSync::new(TableName::Nodes, SyncConfig::default(), store.clone());

    sync.absorb_server_push(vec![node("n1", NodeKind::Color { color: [255, 0, 0] })])
        .unwrap();
    let before = sync.handle_of(&"n1".into()).unwrap();

    let push = vec![node(
        "n1",
        NodeKind::Effect {
            name: "rainbow".into(),
            params: JsonObject::new(),
        },
    )];
    let outcome = sync.absorb_server_push(push).unwrap();
    assert!(matches!(outcome, PushOutcome::Applied(summary) if summary.replaced == 1));

    let after = sync.handle_of(&"n1".into()).unwrap();
    assert_ne!(before, after);
    let handler = sync.with_models(|models| models.get(after).map(NodeModel::handler));
    assert!(matches!(handler, Some(NodeHandler::Effect(_))));

    settle().await;
    assert_eq!(store.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn stale_view_holds_edits_until_fresh() {
    let store = Arc::new(MemoryDocumentStore::new());
    let sync = Playlists::new(TableName::Playlists, SyncConfig::default(), store.clone());

    sync.set_stale(true);
    sync.insert(scenarios::playlist("x", "p1", "Held").fields)
        .unwrap();
    settle().await;
    assert_eq!(store.call_count(), 0);

    sync.set_stale(false);
    settle().await;
    assert_eq!(store.call_count(), 1);
    assert_eq!(store.raw(TableName::Playlists).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn registry_guards_unload_across_tables() {
    let store = Arc::new(MemoryDocumentStore::new());
    let registry = SyncRegistry::new();
    let playlists = Arc::new(Playlists::new(
        TableName::Playlists,
        SyncConfig::default(),
        store.clone(),
    ));
    let nodes: Arc<TableSync<NodeModel, _>> = Arc::new(TableSync::new(
        TableName::Nodes,
        SyncConfig::default(),
        store.clone(),
    ));
    registry.register(&playlists);
    registry.register(&nodes);
    assert_eq!(registry.before_unload(), UnloadDecision::Allow);

    playlists
        .insert(scenarios::playlist("x", "p1", "Unsaved").fields)
        .unwrap();
    nodes
        .insert(node("x", NodeKind::Color { color: [1, 2, 3] }).fields)
        .unwrap();
    assert_eq!(
        registry.before_unload(),
        UnloadDecision::Confirm {
            tables: vec![TableName::Playlists, TableName::Nodes]
        }
    );

    for flush in registry.shutdown_all() {
        let outcome = flush.await.unwrap().unwrap();
        assert!(matches!(outcome, SyncOutcome::Synced { .. }));
    }
    assert_eq!(registry.before_unload(), UnloadDecision::Allow);
    assert_eq!(store.raw(TableName::Playlists).len(), 1);
    assert_eq!(store.raw(TableName::Nodes).len(), 1);
    assert_eq!(
        store.raw(TableName::Nodes)[0].fields["kind"]["type"],
        json!("color")
    );

    let last = store.call_count();
    drop(playlists);
    drop(nodes);
    settle().await;
    assert_eq!(store.call_count(), last);
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn push_during_call_leaves_the_call_intact() {
    let transport = Arc::new(MockTransport::new());
    let sync: Arc<TableSync<DocumentModel<JsonObject>, _>> = Arc::new(TableSync::new(
        TableName::Sequences,
        SyncConfig::default(),
        transport.clone(),
    ));
    let intro = doc(json!({"_id": "s1", "_creationTime": 1.0, "name": "Intro"}));
    sync.absorb_server_push(vec![intro.clone()]).unwrap();
    let draft = sync.insert(fields(json!({"name": "Draft"}))).unwrap();
    let draft_id = sync.document(draft).unwrap().id;

    transport.pause();
    let flushing = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.flush().await })
    };
    while transport.call_count() == 0 {
        tokio::task::yield_now().await;
    }

    // The server renamed the sequence and has not listed the draft yet.
    let opening = doc(json!({"_id": "s1", "_creationTime": 1.0, "name": "Opening"}));
    let outcome = sync.absorb_server_push(vec![opening.clone()]).unwrap();
    assert!(matches!(
        outcome,
        PushOutcome::Applied(summary) if summary.updated == 1 && summary.removed == 1
    ));
    assert_eq!(sync.phase(), SyncPhase::Syncing);
    assert!(sync.document(draft).is_none());

    transport.resume();
    let outcome = flushing.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Synced {
            operations: 1,
            inserts_resolved: 1,
        }
    );

    // The baseline is the batch that was sent, readdressed to the server id.
    let baseline = sync.server_snapshot();
    assert_eq!(baseline.len(), 2);
    assert_eq!(baseline[0], intro);
    assert_eq!(baseline[1].id.as_str(), "srv_1");
    assert_eq!(baseline[1].fields["name"], json!("Draft"));

    // The resolved draft was already gone; no model took its id.
    assert!(sync.handle_of(&draft_id).is_none());
    assert!(sync.handle_of(&"srv_1".into()).is_none());
    assert_eq!(sync.with_models(|models| models.snapshot()), vec![opening]);
    assert!(sync.has_unsynced_changes());

    settle().await;
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    let follow_up: Vec<(OperationKind, String)> = requests[1]
        .operations
        .iter()
        .map(|op| (op.kind(), op.target().to_string()))
        .collect();
    assert_eq!(
        follow_up,
        [
            (OperationKind::Delete, "srv_1".to_string()),
            (OperationKind::Patch, "s1".to_string()),
        ]
    );
}
