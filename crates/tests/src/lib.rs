//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract wire formats
//! - Config file to running backends
//! - Event lines through ingestion, dispatcher and transport (no network)

#[cfg(test)]
mod contract_tests {
    use contracts::{ChangeEvent, DisplayedNotification, PushMessage, TxStatus};
    use serde_json::json;

    #[test]
    fn test_event_path_wire_format() {
        let event: ChangeEvent = serde_json::from_value(json!({
            "kind": "created",
            "path": "projects/p/databases/(default)/documents/groups/g1/tx/t9",
            "record": {"type": "expense", "status": "pending"}
        }))
        .unwrap();
        assert_eq!(event.tx_ref().group_id(), "g1");
        assert_eq!(event.tx_ref().tx_id(), "t9");

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["path"], "groups/g1/tx/t9");
        assert_eq!(back["kind"], "created");

        let bad = serde_json::from_value::<ChangeEvent>(json!({
            "kind": "created",
            "path": "groups/g1/members/u1"
        }));
        assert!(bad.unwrap_err().to_string().contains("groups/{groupId}/tx/{txId}"));
    }

    #[test]
    fn test_unknown_status_survives_round_trip() {
        let event: ChangeEvent = serde_json::from_value(json!({
            "kind": "updated",
            "path": "groups/g1/tx/t1",
            "before": {"type": "expense", "status": "pending"},
            "after": {"type": "expense", "status": "on_hold"}
        }))
        .unwrap();

        let ChangeEvent::Updated { after, .. } = &event else {
            panic!("expected an update, got {event:?}");
        };
        assert_eq!(after.status, Some(TxStatus::Other("on_hold".into())));

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["after"]["status"], "on_hold");
    }

    #[test]
    fn test_pushed_message_renders_on_receiver() {
        let message: PushMessage = serde_json::from_value(json!({
            "tokens": ["t"],
            "notification": {"title": "SplitNest: Approved", "body": "rent • 900 approved"},
            "data": {"groupId": "g1", "txId": "t1", "status": "approved"}
        }))
        .unwrap();

        let payload = serde_json::to_value(&message).unwrap();
        let shown = DisplayedNotification::from_payload(&payload);
        assert_eq!(shown.title, "SplitNest: Approved");
        assert_eq!(shown.body, "rent • 900 approved");
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{StoreType, TransportType};
    use dispatcher::AnyTransport;
    use doc_store::AnyStore;
    use std::io::Write;

    #[test]
    fn test_config_builds_backends() {
        let mut snapshot = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        snapshot
            .write_all(br#"{"groups":{"house":{"memberUids":["alice"]}},"tokens":{"alice":["a1"]}}"#)
            .unwrap();

        let toml = format!(
            r#"
            [app]
            name = "SplitNest"

            [store]
            store_type = "memory"
            snapshot_path = "{}"

            [transport]
            transport_type = "fcm"
            project_id = "splitnest-push"

            [dispatch]
            max_concurrent_events = 4
            "#,
            snapshot.path().display()
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.store.store_type, StoreType::Memory);
        assert_eq!(config.transport.transport_type, TransportType::Fcm);

        let store = AnyStore::from_config(&config.store).unwrap();
        assert_eq!(store.kind(), "memory");

        let dry_run = AnyTransport::from_config(&config.transport, true).unwrap();
        assert!(matches!(dry_run, AnyTransport::Log(_)));
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let result = ConfigLoader::load_from_str(
            "[dispatch]\nmax_concurrent_events = 0\n",
            ConfigFormat::Toml,
        );
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use contracts::Group;
    use dispatcher::{
        DispatcherSettings, EventRunner, FanoutDispatcher, RecordingTransport, RunnerSettings,
    };
    use doc_store::MemoryStore;
    use ingestion::IngestionPipeline;
    use observability::DispatchAggregator;

    const EVENTS: &str = r#"{"kind":"created","path":"groups/house/tx/t1","record":{"type":"expense","status":"pending","category":"food","amount":12.5}}
{"kind":"created","path":"groups/house/tx/t2","record":{"type":"income","status":"pending","amount":100}}

this line is not an event
{"kind":"updated","path":"groups/house/tx/t1","before":{"type":"expense","status":"pending","category":"food","amount":12.5},"after":{"type":"expense","status":"approved","category":"food","amount":12.5}}
{"kind":"updated","path":"groups/house/tx/t3","before":{"type":"expense","status":"approved"},"after":{"type":"expense","status":"approved"}}
{"kind":"updated","path":"groups/house/tx/t4","before":{"type":"expense","status":"pending"},"after":{"type":"expense","status":"on_hold"}}
{"kind":"created","path":"groups/empty/tx/t5","record":{"type":"expense","status":"pending"}}
{"kind":"created","path":"groups/quiet/tx/t6","record":{"type":"expense","status":"pending"}}
{"kind":"updated","path":"groups/house/tx/t7","before":{"type":"expense","status":"pending"},"after":{"type":"expense","status":"rejected","category":"taxi","amount":30}}
"#;

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_group("house", Group::new(["alice", "bob"]));
        store.insert_group("empty", Group::default());
        store.insert_group("quiet", Group::new(["carol"]));
        store.insert_tokens("alice", ["alice-phone"]);
        store.insert_tokens("bob", ["bob-phone", "bob-laptop"]);
        store
    }

    /// End-to-end: JSON lines -> IngestionPipeline -> EventRunner -> transport
    ///
    /// Checks:
    /// 1. Malformed lines are counted and skipped, blank lines ignored
    /// 2. Only qualifying changes reach the transport
    /// 3. Title, body, data and idempotency key are exact
    #[tokio::test]
    async fn test_e2e_event_lines_to_transport() {
        let mut ingestion = IngestionPipeline::new(16);
        let rx = ingestion.take_receiver().unwrap();
        ingestion
            .start_reader("inline", Cursor::new(EVENTS.as_bytes().to_vec()))
            .unwrap();
        ingestion.close();

        let dispatcher = Arc::new(FanoutDispatcher::new(
            seeded_store(),
            RecordingTransport::new(),
            DispatcherSettings::default(),
        ));

        let aggregator = Arc::new(Mutex::new(DispatchAggregator::new()));
        let sink = aggregator.clone();
        let runner = EventRunner::new(dispatcher.clone(), RunnerSettings::default())
            .with_observer(move |report| {
                let multicast = report.result.as_ref().ok().and_then(|o| o.report());
                sink.lock()
                    .unwrap()
                    .record_event(report.label(), 1.0, multicast);
            });

        let snapshot = runner.run(rx).await;
        ingestion.join().await;

        let ingested = ingestion.metrics().snapshot();
        assert_eq!(ingested.parse_errors, 1);
        assert_eq!(ingested.events_forwarded, 8);

        assert_eq!(snapshot.events, 8);
        assert_eq!(snapshot.delivered, 3);
        assert_eq!(snapshot.filtered, 3);
        assert_eq!(snapshot.empty_audience, 1);
        assert_eq!(snapshot.no_tokens, 1);
        assert_eq!(snapshot.failed, 0);
        assert_eq!(snapshot.tokens_succeeded, 9);

        let mut messages = dispatcher.transport().messages();
        messages.sort_by(|a, b| a.data["txId"].cmp(&b.data["txId"]));
        assert_eq!(messages.len(), 3);

        let created = messages
            .iter()
            .find(|m| m.idempotency_key.as_deref() == Some("t1:pending"))
            .unwrap();
        assert_eq!(created.notification.title, "SplitNest: Approval needed");
        assert_eq!(created.notification.body, "New pending food • 12.5");
        assert_eq!(created.tokens, vec!["alice-phone", "bob-phone", "bob-laptop"]);
        assert_eq!(created.data["groupId"], "house");
        assert_eq!(created.data["path"], "groups/house/tx/t1");

        let approved = messages
            .iter()
            .find(|m| m.idempotency_key.as_deref() == Some("t1:approved"))
            .unwrap();
        assert_eq!(approved.notification.title, "SplitNest: Approved");
        assert_eq!(approved.notification.body, "food • 12.5 approved");
        assert_eq!(approved.data["status"], "approved");
        assert!(!approved.data.contains_key("path"));

        let rejected = messages
            .iter()
            .find(|m| m.data["txId"] == "t7")
            .unwrap();
        assert_eq!(rejected.notification.title, "SplitNest: Rejected");
        assert_eq!(rejected.notification.body, "taxi • 30 rejected");

        let summary = aggregator.lock().unwrap().summary();
        assert_eq!(summary.total_events, 8);
        assert_eq!(summary.outcomes["delivered"], 3);
        assert_eq!(summary.tokens_succeeded, 9);
    }

    #[tokio::test]
    async fn test_e2e_rejected_tokens_reported() {
        let mut ingestion = IngestionPipeline::new(4);
        let rx = ingestion.take_receiver().unwrap();
        ingestion
            .start_reader(
                "inline",
                Cursor::new(
                    br#"{"kind":"created","path":"groups/house/tx/t1","record":{"type":"expense","status":"pending"}}"#
                        .to_vec(),
                ),
            )
            .unwrap();
        ingestion.close();

        let dispatcher = Arc::new(FanoutDispatcher::new(
            seeded_store(),
            RecordingTransport::rejecting(["bob-laptop"]),
            DispatcherSettings::default(),
        ));
        let snapshot = EventRunner::new(dispatcher, RunnerSettings::default())
            .run(rx)
            .await;

        assert_eq!(snapshot.delivered, 1);
        assert_eq!(snapshot.tokens_succeeded, 2);
        assert_eq!(snapshot.tokens_failed, 1);
    }

    #[tokio::test]
    async fn test_e2e_transport_outage_fails_event() {
        let mut ingestion = IngestionPipeline::new(4);
        let rx = ingestion.take_receiver().unwrap();
        ingestion
            .start_reader(
                "inline",
                Cursor::new(
                    br#"{"kind":"updated","path":"groups/house/tx/t1","before":{"type":"expense","status":"pending"},"after":{"type":"expense","status":"approved"}}"#
                        .to_vec(),
                ),
            )
            .unwrap();
        ingestion.close();

        let dispatcher = Arc::new(FanoutDispatcher::new(
            seeded_store(),
            RecordingTransport::unavailable(),
            DispatcherSettings::default(),
        ));
        let labels = Arc::new(Mutex::new(Vec::new()));
        let sink = labels.clone();
        let snapshot = EventRunner::new(dispatcher, RunnerSettings::default())
            .with_observer(move |report| sink.lock().unwrap().push(report.label()))
            .run(rx)
            .await;

        assert_eq!(snapshot.failed, 1);
        assert_eq!(*labels.lock().unwrap(), vec!["transport_error"]);
    }
}
