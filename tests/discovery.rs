//! Integration tests for group discovery.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use vigil::{
    account::registry::{AccountConnection, AccountRegistry},
    engine::discovery::{DiscoveryError, GroupDiscovery},
    models::ChatKind,
    persistence::{memory::InMemorySessionStore, traits::SessionStore},
    providers::traits::ChatSummary,
    test_helpers::StubSessionClient,
};

const TENANT: &str = "tenant-a";

fn dialogs() -> Vec<ChatSummary> {
    vec![
        ChatSummary { chat_id: 11, name: "Alice".into(), kind: ChatKind::Private },
        ChatSummary { chat_id: -100_1, name: "Ops".into(), kind: ChatKind::Supergroup },
        ChatSummary { chat_id: -100_2, name: "Announcements".into(), kind: ChatKind::Channel },
    ]
}

fn harness() -> (Arc<InMemorySessionStore>, Arc<AccountRegistry>, GroupDiscovery, Arc<StubSessionClient>)
{
    let store = Arc::new(InMemorySessionStore::new());
    let registry = Arc::new(AccountRegistry::new());
    let discovery =
        GroupDiscovery::new(store.clone(), Arc::clone(&registry));
    let (client, _events) = StubSessionClient::new();
    client.set_dialogs(dialogs());
    registry.add(Arc::new(AccountConnection {
        account_id: "acct-1".to_string(),
        tenant_id: TENANT.to_string(),
        client: client.clone(),
        cancel: CancellationToken::new(),
    }));
    (store, registry, discovery, client)
}

#[tokio::test]
async fn registers_monitorable_chats_only() {
    let (store, _registry, discovery, _client) = harness();

    let report = discovery.discover("acct-1").await.unwrap();
    assert_eq!(report.groups_seen, 2);
    assert_eq!(report.groups_created, 2);

    assert_eq!(store.count_active_groups(TENANT).await.unwrap(), 2);
    // The private chat was never registered.
    assert!(store.find_active_group(TENANT, 11).await.unwrap().is_none());

    let ops = store.find_active_group(TENANT, -100_1).await.unwrap().unwrap();
    assert_eq!(ops.name, "Ops");
    assert_eq!(ops.source, vigil::models::DiscoverySource::Auto);
}

#[tokio::test]
async fn second_run_with_unchanged_dialogs_creates_nothing() {
    let (store, _registry, discovery, _client) = harness();

    let first = discovery.discover("acct-1").await.unwrap();
    assert_eq!(first.groups_created, 2);

    let second = discovery.discover("acct-1").await.unwrap();
    assert_eq!(second.groups_seen, 2);
    assert_eq!(second.groups_created, 0);

    assert_eq!(store.count_active_groups(TENANT).await.unwrap(), 2);
}

#[tokio::test]
async fn unregistered_account_is_an_error() {
    let (_store, _registry, discovery, _client) = harness();
    let result = discovery.discover("ghost").await;
    assert!(matches!(result, Err(DiscoveryError::NotRegistered(_))));
}

#[tokio::test]
async fn groups_of_other_tenants_do_not_shadow() {
    let (store, registry, discovery, _client) = harness();

    // Another tenant already monitors the same chat id.
    let (other_client, _other_events) = StubSessionClient::new();
    other_client.set_dialogs(dialogs());
    registry.add(Arc::new(AccountConnection {
        account_id: "acct-other".to_string(),
        tenant_id: "tenant-b".to_string(),
        client: other_client,
        cancel: CancellationToken::new(),
    }));

    discovery.discover("acct-1").await.unwrap();
    let report = discovery.discover("acct-other").await.unwrap();
    assert_eq!(report.groups_created, 2);

    assert_eq!(store.count_active_groups(TENANT).await.unwrap(), 2);
    assert_eq!(store.count_active_groups("tenant-b").await.unwrap(), 2);
}
