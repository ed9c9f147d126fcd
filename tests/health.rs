//! Integration tests for the health monitor and account recovery.

use std::{fs, sync::Arc, time::Duration};

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use vigil::{
    account::{manager::AccountManager, registry::AccountRegistry},
    config::AppConfig,
    engine::{
        balancer::LoadBalancer,
        discovery::GroupDiscovery,
        filtering::{FilterEngine, WatchlistFilterEngine},
        forwarding::ForwardingPipeline,
        health::HealthMonitor,
        ingestor::MessageIngestor,
    },
    models::{AccountStatus, ChatKind, HealthStatus},
    persistence::{memory::InMemorySessionStore, traits::SessionStore},
    providers::traits::ChatSummary,
    test_helpers::{AccountBuilder, StubSessionClient, StubSessionProvider},
};

const TENANT: &str = "tenant-a";
const ACCOUNT: &str = "acct-1";
const CREDENTIALS_REF: &str = "main";

struct Harness {
    _sessions: TempDir,
    store: Arc<InMemorySessionStore>,
    registry: Arc<AccountRegistry>,
    provider: Arc<StubSessionProvider>,
    manager: Arc<AccountManager>,
    monitor: HealthMonitor,
}

impl Harness {
    fn new() -> Self {
        let sessions = TempDir::new().unwrap();
        fs::write(sessions.path().join(format!("{CREDENTIALS_REF}.session")), b"").unwrap();
        fs::write(
            sessions.path().join(format!("{CREDENTIALS_REF}.json")),
            r#"{"phone_number": "+15550001"}"#,
        )
        .unwrap();

        let config = AppConfig::builder()
            .sessions_dir(sessions.path())
            .health_probe_timeout(Duration::from_secs(5))
            .recovery_backoff(Duration::from_millis(0))
            .dialog_sample_limit(10)
            .build();

        let store = Arc::new(InMemorySessionStore::new());
        let store_dyn: Arc<dyn SessionStore> = store.clone();
        let registry = Arc::new(AccountRegistry::new());
        let balancer = Arc::new(LoadBalancer::new(Arc::clone(&registry)));
        let filter: Arc<dyn FilterEngine> =
            Arc::new(WatchlistFilterEngine::new(Arc::clone(&store_dyn)));
        let pipeline = Arc::new(ForwardingPipeline::new(
            Arc::clone(&store_dyn),
            Arc::clone(&registry),
            Arc::clone(&balancer),
            Duration::from_secs(5),
        ));
        let ingestor =
            Arc::new(MessageIngestor::new(Arc::clone(&store_dyn), filter, pipeline, balancer));
        let discovery =
            Arc::new(GroupDiscovery::new(Arc::clone(&store_dyn), Arc::clone(&registry)));
        let provider = Arc::new(StubSessionProvider::new());
        let manager = Arc::new(AccountManager::new(
            Arc::clone(&store_dyn),
            provider.clone(),
            Arc::clone(&registry),
            discovery,
            ingestor,
            sessions.path().to_path_buf(),
            CancellationToken::new(),
        ));
        let monitor = HealthMonitor::new(
            &config,
            Arc::clone(&registry),
            Arc::clone(&manager),
            store_dyn,
        );
        Self { _sessions: sessions, store, registry, provider, manager, monitor }
    }

    async fn seed_and_activate(&self, client: Arc<StubSessionClient>) {
        self.store
            .upsert_account(
                AccountBuilder::new()
                    .id(ACCOUNT)
                    .tenant_id(TENANT)
                    .credentials_ref(CREDENTIALS_REF)
                    .build(),
            )
            .await
            .unwrap();
        self.provider.push_client(CREDENTIALS_REF, client);
        self.manager.activate(ACCOUNT).await.unwrap();
    }
}

#[tokio::test]
async fn healthy_account_gets_record_and_persisted_snapshot() {
    let harness = Harness::new();
    let (client, _events) = StubSessionClient::new();
    client.set_dialogs(vec![
        ChatSummary { chat_id: 1, name: "Bob".into(), kind: ChatKind::Private },
        ChatSummary { chat_id: -100_1, name: "Ops".into(), kind: ChatKind::Supergroup },
    ]);
    harness.seed_and_activate(client).await;

    harness.monitor.tick().await;

    let summary = harness.monitor.summary();
    assert_eq!(summary.total_accounts, 1);
    assert_eq!(summary.healthy_accounts, 1);
    assert_eq!(summary.unhealthy_accounts, 0);
    assert!((summary.health_percentage - 100.0).abs() < f64::EPSILON);
    assert!(summary.last_check.is_some());

    let account = harness.store.get_account(ACCOUNT).await.unwrap().unwrap();
    assert_eq!(account.health_status, HealthStatus::Healthy);
    assert!(account.avg_response_time_ms.is_some());
    // Only the monitorable chat counts toward the sample.
    assert_eq!(account.accessible_groups, Some(1));
}

#[tokio::test]
async fn disconnected_account_is_unhealthy_and_recovered_once() {
    let harness = Harness::new();
    let (client, _events) = StubSessionClient::new();
    harness.seed_and_activate(client.clone()).await;

    // The connection drops; queue exactly one replacement session.
    client.set_connected(false);
    let (replacement, _replacement_events) = StubSessionClient::new();
    harness.provider.push_client(CREDENTIALS_REF, replacement);

    harness.monitor.tick().await;

    // Classified unhealthy, then recovered within the same tick.
    let summary = harness.monitor.summary();
    assert_eq!(summary.unhealthy_accounts, 1);

    let account = harness.store.get_account(ACCOUNT).await.unwrap().unwrap();
    assert_eq!(account.status, AccountStatus::Active);
    assert!(harness.registry.contains(ACCOUNT));

    // The replacement queue was drained exactly once; a second recovery in
    // the same tick would have failed activation and left status = error.
    assert_eq!(account.health_status, HealthStatus::Unhealthy);

    // The next tick sees the healthy replacement.
    harness.monitor.tick().await;
    let account = harness.store.get_account(ACCOUNT).await.unwrap().unwrap();
    assert_eq!(account.health_status, HealthStatus::Healthy);
    assert_eq!(harness.monitor.summary().healthy_accounts, 1);
}

#[tokio::test]
async fn failed_recovery_leaves_error_status_for_next_tick() {
    let harness = Harness::new();
    let (client, _events) = StubSessionClient::new();
    harness.seed_and_activate(client.clone()).await;

    // Connection drops and no replacement session is available.
    client.set_connected(false);

    harness.monitor.tick().await;

    assert!(!harness.registry.contains(ACCOUNT));
    let account = harness.store.get_account(ACCOUNT).await.unwrap().unwrap();
    assert_eq!(account.status, AccountStatus::Error);
    assert!(account.last_error.is_some());

    // The deregistered account is skipped on the following tick instead of
    // producing another recovery attempt.
    harness.monitor.tick().await;
    let account = harness.store.get_account(ACCOUNT).await.unwrap().unwrap();
    assert_eq!(account.status, AccountStatus::Error);
}

#[tokio::test]
async fn unauthorized_account_is_unhealthy() {
    let harness = Harness::new();
    let (client, _events) = StubSessionClient::new();
    harness.seed_and_activate(client.clone()).await;

    client.set_authorized(false);
    let (replacement, _replacement_events) = StubSessionClient::new();
    harness.provider.push_client(CREDENTIALS_REF, replacement);

    harness.monitor.tick().await;

    let summary = harness.monitor.summary();
    assert_eq!(summary.unhealthy_accounts, 1);
    // Recovery reconnected with the authorized replacement.
    let account = harness.store.get_account(ACCOUNT).await.unwrap().unwrap();
    assert_eq!(account.status, AccountStatus::Active);
}

#[tokio::test]
async fn summary_with_no_records_is_empty() {
    let harness = Harness::new();
    let summary = harness.monitor.summary();
    assert_eq!(summary.total_accounts, 0);
    assert!((summary.health_percentage - 0.0).abs() < f64::EPSILON);
    assert!(summary.last_check.is_none());
}
