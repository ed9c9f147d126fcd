//! Integration tests for the forwarding pipeline.

use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use vigil::{
    account::registry::{AccountConnection, AccountRegistry},
    engine::{
        balancer::LoadBalancer,
        forwarding::{ForwardRequest, ForwardingPipeline},
    },
    models::{ForwardingStatus, MessageLog},
    persistence::{memory::InMemorySessionStore, traits::SessionStore},
    test_helpers::{DestinationBuilder, GroupBuilder, MessageBuilder, StubSessionClient},
};

const TENANT: &str = "tenant-a";

struct Harness {
    store: Arc<InMemorySessionStore>,
    registry: Arc<AccountRegistry>,
    balancer: Arc<LoadBalancer>,
    pipeline: ForwardingPipeline,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemorySessionStore::new());
        let registry = Arc::new(AccountRegistry::new());
        let balancer = Arc::new(LoadBalancer::new(Arc::clone(&registry)));
        let pipeline = ForwardingPipeline::new(
            store.clone(),
            Arc::clone(&registry),
            Arc::clone(&balancer),
            Duration::from_secs(5),
        );
        Self { store, registry, balancer, pipeline }
    }

    fn register(&self, account_id: &str) -> Arc<StubSessionClient> {
        let (client, _events) = StubSessionClient::new();
        self.registry.add(Arc::new(AccountConnection {
            account_id: account_id.to_string(),
            tenant_id: TENANT.to_string(),
            client: client.clone(),
            cancel: CancellationToken::new(),
        }));
        client
    }

    async fn seed_log(&self) -> MessageLog {
        let group = GroupBuilder::new().tenant_id(TENANT).build();
        let message = MessageBuilder::new().sender_username("alice").text("hello").build();
        let log = MessageLog::from_message(TENANT, "acct-1", &group, &message, vec![]);
        self.store.insert_message_log(log.clone()).await.unwrap();
        log
    }
}

#[tokio::test]
async fn forwards_to_resolved_destination_and_records_everything() {
    let harness = Harness::new();
    let client = harness.register("acct-1");
    harness
        .store
        .insert_destination(
            DestinationBuilder::new().id("dest-1").tenant_id(TENANT).chat_id(-200).build(),
        )
        .await
        .unwrap();
    let log = harness.seed_log().await;
    let group = GroupBuilder::new().tenant_id(TENANT).build();
    let message = MessageBuilder::new().sender_username("alice").text("hello").build();

    let report = harness
        .pipeline
        .forward(ForwardRequest {
            tenant_id: TENANT,
            message_log_id: &log.id,
            message: &message,
            group: &group,
            destination_ids: &["dest-1".to_string()],
            matched_keywords: &[],
        })
        .await;

    assert_eq!(report.success_count, 1);
    assert_eq!(report.failed_count, 0);
    assert_eq!(report.forwarded_to, vec!["test destination".to_string()]);
    assert!(report.errors.is_empty());

    let sent = client.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, -200);
    assert!(sent[0].1.contains("hello"));

    let destination = harness.store.get_destination("dest-1").await.unwrap().unwrap();
    assert_eq!(destination.message_count, 1);
    assert!(destination.last_forwarded.is_some());

    let logs = harness.store.list_message_logs(TENANT, 10).await.unwrap();
    assert!(logs[0].is_forwarded);
    assert_eq!(logs[0].forwarded_count, 1);

    let forwarded = harness.store.list_forwarded_messages(TENANT).await.unwrap();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].status, ForwardingStatus::Success);

    // The send was charged to the forwarding account.
    assert_eq!(harness.balancer.summary().total_messages_processed, 1);
}

#[tokio::test]
async fn failed_send_retries_on_exactly_one_alternate_account() {
    let harness = Harness::new();
    let primary = harness.register("acct-1");
    let fallback = harness.register("acct-2");
    primary.fail_sends(true);
    // Bias selection toward acct-1.
    harness.balancer.record_processed("acct-2", Duration::from_secs(1));

    harness
        .store
        .insert_destination(
            DestinationBuilder::new().id("dest-1").tenant_id(TENANT).chat_id(-200).build(),
        )
        .await
        .unwrap();
    let log = harness.seed_log().await;
    let group = GroupBuilder::new().tenant_id(TENANT).build();
    let message = MessageBuilder::new().text("hello").build();

    let report = harness
        .pipeline
        .forward(ForwardRequest {
            tenant_id: TENANT,
            message_log_id: &log.id,
            message: &message,
            group: &group,
            destination_ids: &["dest-1".to_string()],
            matched_keywords: &[],
        })
        .await;

    assert_eq!(report.success_count, 1);
    assert_eq!(report.failed_count, 0);
    assert_eq!(primary.send_attempts(), 1);
    assert_eq!(fallback.send_attempts(), 1);
    assert_eq!(fallback.sent().len(), 1);
    // The primary failure is still captured.
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("scripted send failure"));
}

#[tokio::test]
async fn destination_fails_after_fallback_also_fails() {
    let harness = Harness::new();
    let primary = harness.register("acct-1");
    let fallback = harness.register("acct-2");
    primary.fail_sends(true);
    fallback.fail_sends(true);

    harness
        .store
        .insert_destination(
            DestinationBuilder::new().id("dest-1").tenant_id(TENANT).chat_id(-200).build(),
        )
        .await
        .unwrap();
    let log = harness.seed_log().await;
    let group = GroupBuilder::new().tenant_id(TENANT).build();
    let message = MessageBuilder::new().text("hello").build();

    let report = harness
        .pipeline
        .forward(ForwardRequest {
            tenant_id: TENANT,
            message_log_id: &log.id,
            message: &message,
            group: &group,
            destination_ids: &["dest-1".to_string()],
            matched_keywords: &[],
        })
        .await;

    assert_eq!(report.success_count, 0);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.errors.len(), 2);

    // One attempt each, never a second retry.
    assert_eq!(primary.send_attempts() + fallback.send_attempts(), 2);

    let logs = harness.store.list_message_logs(TENANT, 10).await.unwrap();
    assert!(!logs[0].is_forwarded);
    assert!(harness.store.list_forwarded_messages(TENANT).await.unwrap().is_empty());
}

#[tokio::test]
async fn no_registered_accounts_reports_without_failing_destinations() {
    let harness = Harness::new();
    harness
        .store
        .insert_destination(
            DestinationBuilder::new().id("dest-1").tenant_id(TENANT).chat_id(-200).build(),
        )
        .await
        .unwrap();
    let log = harness.seed_log().await;
    let group = GroupBuilder::new().tenant_id(TENANT).build();
    let message = MessageBuilder::new().text("hello").build();

    let report = harness
        .pipeline
        .forward(ForwardRequest {
            tenant_id: TENANT,
            message_log_id: &log.id,
            message: &message,
            group: &group,
            destination_ids: &["dest-1".to_string()],
            matched_keywords: &[],
        })
        .await;

    assert_eq!(report.success_count, 0);
    assert_eq!(report.failed_count, 0);
    assert_eq!(report.errors, vec!["no available accounts".to_string()]);

    let logs = harness.store.list_message_logs(TENANT, 10).await.unwrap();
    assert!(!logs[0].is_forwarded);
}

#[tokio::test]
async fn missing_and_inactive_destinations_are_skipped_with_errors() {
    let harness = Harness::new();
    harness.register("acct-1");
    harness
        .store
        .insert_destination(
            DestinationBuilder::new()
                .id("dest-off")
                .tenant_id(TENANT)
                .chat_id(-300)
                .active(false)
                .build(),
        )
        .await
        .unwrap();
    let log = harness.seed_log().await;
    let group = GroupBuilder::new().tenant_id(TENANT).build();
    let message = MessageBuilder::new().text("hello").build();

    let report = harness
        .pipeline
        .forward(ForwardRequest {
            tenant_id: TENANT,
            message_log_id: &log.id,
            message: &message,
            group: &group,
            destination_ids: &["dest-missing".to_string(), "dest-off".to_string()],
            matched_keywords: &[],
        })
        .await;

    assert_eq!(report.success_count, 0);
    assert_eq!(report.failed_count, 0);
    assert!(report.errors.iter().any(|e| e.contains("dest-missing") && e.contains("not found")));
    assert!(report.errors.iter().any(|e| e.contains("dest-off") && e.contains("not active")));
}

#[tokio::test]
async fn empty_destination_list_falls_back_to_tenant_destinations_with_filters() {
    let harness = Harness::new();
    let client = harness.register("acct-1");
    harness
        .store
        .insert_destination(
            DestinationBuilder::new().id("dest-any").tenant_id(TENANT).chat_id(-201).build(),
        )
        .await
        .unwrap();
    harness
        .store
        .insert_destination(
            DestinationBuilder::new()
                .id("dest-restricted")
                .tenant_id(TENANT)
                .chat_id(-202)
                .allowed_usernames(vec!["bob".to_string()])
                .build(),
        )
        .await
        .unwrap();
    let log = harness.seed_log().await;
    let group = GroupBuilder::new().tenant_id(TENANT).build();
    let message = MessageBuilder::new().sender_username("alice").text("hello").build();

    let report = harness
        .pipeline
        .forward(ForwardRequest {
            tenant_id: TENANT,
            message_log_id: &log.id,
            message: &message,
            group: &group,
            destination_ids: &[],
            matched_keywords: &[],
        })
        .await;

    // Only the unrestricted destination accepts a message from alice.
    assert_eq!(report.success_count, 1);
    let sent = client.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, -201);
}
