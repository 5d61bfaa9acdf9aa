/*
[INPUT]:  Hubs with scripted adapters and plugins
[OUTPUT]: Test results for the orchestrator lifecycle
[POS]:    Integration tests - hub state machine, routing and plugins
[UPDATE]: When orchestrator behavior changes
*/

mod common;

use std::sync::Arc;

use common::{
    ACCOUNT_A, PluginMode, RecordingPlugin, drain, eip155_connector, full_adapter,
    login_only_adapter, memory_hub, new_hub, provider_events, status_changes, wait_for_status,
};
use serde_json::json;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};
use walletmux_core::adapter::{Adapter, Connector, ConnectorAdapter};
use walletmux_core::hub::ADAPTER_CACHE_KEY;
use walletmux_core::provider::same_handler;
use walletmux_core::{
    AdapterDescriptor, AdapterKind, AdapterNamespace, ChainNamespace, ConnectionState,
    DisconnectOptions, HubEvent, KeyValueStorage, LoginParams, MemoryStorage, MockConnector, Plugin,
    ProviderEvent, RequestHandler, RpcRequest, UserInfo, WalletError,
};

#[tokio::test]
async fn test_end_to_end_connect_switch_logout() {
    let hub = memory_hub();
    assert_ok!(hub.configure_adapter(full_adapter("a", eip155_connector())));
    assert_ok!(hub.configure_adapter(full_adapter("b", eip155_connector())));
    let mut events = hub.subscribe();

    assert!(hub.provider().is_none());
    assert_ok!(hub.init().await);
    assert_eq!(hub.status(), ConnectionState::Ready);

    let proxy = assert_ok!(hub.connect_to("a", LoginParams::default()).await).unwrap();
    assert_eq!(hub.status(), ConnectionState::Connected);
    assert_eq!(hub.connected_adapter_name().as_deref(), Some("a"));
    assert_eq!(
        status_changes(&drain(&mut events)),
        vec![
            (ConnectionState::NotReady, ConnectionState::Ready),
            (ConnectionState::Ready, ConnectionState::Connecting),
            (ConnectionState::Connecting, ConnectionState::Connected),
        ]
    );

    assert_ok!(hub.switch_chain("0x89").await);
    let switched = provider_events(&drain(&mut events));
    assert!(switched.contains(&ProviderEvent::ChainChanged {
        chain_id: "0x89".to_string()
    }));
    assert_eq!(
        assert_ok!(proxy.request(RpcRequest::method("eth_chainId")).await),
        json!("0x89")
    );

    assert_ok!(hub.logout(DisconnectOptions::default()).await);
    let after_logout = drain(&mut events);
    assert!(after_logout.contains(&HubEvent::Disconnected {
        adapter: "a".to_string()
    }));
    assert_eq!(
        status_changes(&after_logout),
        vec![(ConnectionState::Connected, ConnectionState::Ready)]
    );
    assert_eq!(hub.status(), ConnectionState::Ready);
    assert_eq!(hub.connected_adapter_name(), None);
}

#[tokio::test]
async fn test_delegate_is_connected_adapter_provider() {
    let hub = memory_hub();
    let adapter = full_adapter("a", eip155_connector());
    assert_ok!(hub.configure_adapter(adapter.clone()));
    assert_ok!(hub.init().await);

    let proxy = assert_ok!(hub.connect_to("a", LoginParams::default()).await).unwrap();
    let handle = adapter.provider().unwrap().handler();
    assert!(proxy.is_delegate(&handle));
    assert!(same_handler(&proxy.delegate().unwrap(), &handle));

    assert_ok!(hub.logout(DisconnectOptions::default()).await);
    assert!(!proxy.is_delegate(&handle));
    assert_eq!(
        assert_ok!(proxy.request(RpcRequest::method("eth_chainId")).await),
        json!("0x1")
    );
}

#[tokio::test]
async fn test_connect_while_connecting_is_rejected() {
    let gate = Arc::new(Notify::new());
    let slow = Arc::new(
        MockConnector::new(ChainNamespace::Eip155, &[ACCOUNT_A]).with_connect_gate(gate.clone()),
    );
    let hub = memory_hub();
    assert_ok!(hub.configure_adapter(full_adapter("a", slow)));
    assert_ok!(hub.configure_adapter(full_adapter("b", eip155_connector())));
    assert_ok!(hub.init().await);

    let pending = {
        let hub = hub.clone();
        tokio::spawn(async move { hub.connect_to("a", LoginParams::default()).await })
    };
    wait_for_status(&hub, ConnectionState::Connecting).await;

    let err = assert_err!(hub.connect_to("b", LoginParams::default()).await);
    assert!(matches!(err, WalletError::InvalidState(_)));
    assert_eq!(hub.connected_adapter_name(), None);

    gate.notify_one();
    assert_ok!(pending.await.unwrap());
    assert_eq!(hub.connected_adapter_name().as_deref(), Some("a"));

    for name in ["a", "b"] {
        let err = assert_err!(hub.connect_to(name, LoginParams::default()).await);
        assert!(matches!(err, WalletError::InvalidState(_)));
        assert_eq!(hub.connected_adapter_name().as_deref(), Some("a"));
    }
}

#[tokio::test]
async fn test_connect_to_unknown_adapter_or_before_init() {
    let hub = memory_hub();
    assert_ok!(hub.configure_adapter(full_adapter("a", eip155_connector())));

    let err = assert_err!(hub.connect_to("a", LoginParams::default()).await);
    assert!(matches!(err, WalletError::NotFound(_)));

    assert_ok!(hub.init().await);
    let err = assert_err!(hub.connect_to("missing", LoginParams::default()).await);
    assert!(matches!(err, WalletError::NotFound(_)));
    assert_eq!(hub.status(), ConnectionState::Ready);
}

#[tokio::test]
async fn test_failed_connect_errors_and_clears_cache() {
    let storage = Arc::new(MemoryStorage::new());
    assert_ok!(storage.set(ADAPTER_CACHE_KEY, "a"));
    let connector = eip155_connector();
    connector.fail_connect("user rejected the request");

    let hub = new_hub(storage.clone());
    assert_ok!(hub.configure_adapter(full_adapter("a", connector)));
    assert_ok!(hub.init().await);
    let mut events = hub.subscribe();

    let err = assert_err!(hub.connect_to("a", LoginParams::default()).await);
    assert!(matches!(err, WalletError::Connector(_)));
    assert_eq!(hub.status(), ConnectionState::Errored);
    assert_eq!(hub.cached_adapter(), None);
    assert_eq!(assert_ok!(storage.get(ADAPTER_CACHE_KEY)), None);
    assert!(drain(&mut events)
        .iter()
        .any(|event| matches!(event, HubEvent::Errored { adapter, .. } if adapter == "a")));

    // the injected failure is one-shot, so a retry goes through
    assert_ok!(hub.connect_to("a", LoginParams::default()).await);
    assert_eq!(hub.status(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_failed_session_restore_does_not_block_startup() {
    let storage = Arc::new(MemoryStorage::new());
    assert_ok!(storage.set(ADAPTER_CACHE_KEY, "a"));
    let stale = Arc::new(
        MockConnector::new(ChainNamespace::Eip155, &[ACCOUNT_A]).with_existing_session("0x1"),
    );
    stale.fail_connect("session expired");

    let hub = new_hub(storage.clone());
    assert_ok!(hub.configure_adapter(full_adapter("a", stale)));
    assert_ok!(hub.configure_adapter(full_adapter("b", eip155_connector())));
    let mut events = hub.subscribe();

    assert_ok!(hub.init().await);
    assert_eq!(hub.status(), ConnectionState::Errored);
    assert_eq!(hub.connected_adapter_name(), None);
    assert_eq!(hub.cached_adapter(), None);
    assert_eq!(assert_ok!(storage.get(ADAPTER_CACHE_KEY)), None);
    assert!(drain(&mut events)
        .iter()
        .any(|event| matches!(event, HubEvent::Errored { adapter, .. } if adapter == "a")));

    assert_ok!(hub.connect_to("b", LoginParams::default()).await);
    assert_eq!(hub.status(), ConnectionState::Connected);
    assert_eq!(hub.connected_adapter_name().as_deref(), Some("b"));
    assert_eq!(assert_ok!(storage.get(ADAPTER_CACHE_KEY)).as_deref(), Some("b"));
}

#[tokio::test]
async fn test_successful_connect_persists_cache() {
    let storage = Arc::new(MemoryStorage::new());
    let hub = new_hub(storage.clone());
    assert_ok!(hub.configure_adapter(full_adapter("a", eip155_connector())));
    assert_ok!(hub.init().await);

    assert_ok!(hub.connect_to("a", LoginParams::default()).await);
    assert_eq!(assert_ok!(storage.get(ADAPTER_CACHE_KEY)).as_deref(), Some("a"));

    assert_ok!(hub.logout(DisconnectOptions::default()).await);
    assert_eq!(assert_ok!(storage.get(ADAPTER_CACHE_KEY)), None);
}

#[tokio::test]
async fn test_init_restores_cached_adapter() {
    let storage = Arc::new(MemoryStorage::new());
    assert_ok!(storage.set(ADAPTER_CACHE_KEY, "b"));

    let hub = new_hub(storage);
    let restorable = Arc::new(
        MockConnector::new(ChainNamespace::Eip155, &[ACCOUNT_A]).with_existing_session("0x1"),
    );
    assert_ok!(hub.configure_adapter(full_adapter("a", eip155_connector())));
    assert_ok!(hub.configure_adapter(full_adapter("b", restorable)));
    let mut events = hub.subscribe();

    assert_ok!(hub.init().await);
    assert_eq!(hub.connected_adapter_name().as_deref(), Some("b"));
    assert!(drain(&mut events).contains(&HubEvent::Connected {
        adapter: "b".to_string(),
        reconnected: true,
    }));
}

#[tokio::test]
async fn test_registration_rules() {
    let hub = memory_hub();
    assert_ok!(hub.configure_adapter(full_adapter("a", eip155_connector())));

    let err = assert_err!(hub.configure_adapter(full_adapter("a", eip155_connector())));
    assert!(matches!(err, WalletError::DuplicateRegistration(_)));

    let solana = ConnectorAdapter::new(
        AdapterDescriptor::new("phantom", AdapterNamespace::Solana, AdapterKind::Injected),
        Arc::new(MockConnector::new(ChainNamespace::Solana, &["GnQ4Vx9pZbW3mWBRZbNQ"])),
    );
    let err = assert_err!(hub.configure_adapter(solana));
    assert!(matches!(err, WalletError::IncompatibleNamespace(_)));
    assert_eq!(hub.adapter_names(), vec!["a".to_string()]);

    assert_ok!(hub.init().await);
    let err = assert_err!(hub.configure_adapter(full_adapter("late", eip155_connector())));
    assert!(matches!(err, WalletError::InvalidState(_)));
}

#[tokio::test]
async fn test_multichain_adapter_receives_hub_chain() {
    let hub = memory_hub();
    let adapter = ConnectorAdapter::new(
        AdapterDescriptor::new("any", AdapterNamespace::Multichain, AdapterKind::SocialLogin),
        eip155_connector(),
    );
    assert!(adapter.chain_config().is_none());

    assert_ok!(hub.configure_adapter(adapter.clone()));
    assert_eq!(adapter.chain_config().unwrap().chain_id, "0x1");
}

#[tokio::test]
async fn test_logout_requires_connection() {
    let hub = memory_hub();
    assert_ok!(hub.configure_adapter(full_adapter("a", eip155_connector())));
    assert_ok!(hub.init().await);

    let err = assert_err!(hub.logout(DisconnectOptions::default()).await);
    assert!(matches!(err, WalletError::NotConnected(_)));
    let err = assert_err!(hub.get_user_info().await);
    assert!(matches!(err, WalletError::NotConnected(_)));
}

#[tokio::test]
async fn test_capabilities_gate_operations() {
    let profile = UserInfo {
        email: Some("user@example.com".to_string()),
        ..UserInfo::default()
    };
    let connector = Arc::new(
        MockConnector::new(ChainNamespace::Eip155, &[ACCOUNT_A]).with_user_info(profile.clone()),
    );

    let hub = memory_hub();
    assert_ok!(hub.configure_adapter(full_adapter("full", connector)));
    assert_ok!(hub.configure_adapter(login_only_adapter("basic", eip155_connector())));
    assert_ok!(hub.init().await);

    assert_ok!(hub.connect_to("full", LoginParams::default()).await);
    assert_eq!(assert_ok!(hub.get_user_info().await), profile);
    let auth = assert_ok!(hub.authenticate_user().await);
    assert!(auth.id_token.contains(ACCOUNT_A));
    assert_ok!(hub.logout(DisconnectOptions::default()).await);

    assert_ok!(hub.connect_to("basic", LoginParams::default()).await);
    for err in [
        assert_err!(hub.get_user_info().await),
        assert_err!(hub.switch_chain("0x89").await),
    ] {
        assert!(matches!(err, WalletError::UnsupportedOperation { .. }));
    }
    let err = assert_err!(hub.authenticate_user().await);
    assert!(matches!(err, WalletError::UnsupportedOperation { .. }));
}

#[tokio::test]
async fn test_pre_connection_chain_routing() {
    let hub = memory_hub();
    let err = assert_err!(hub.switch_chain("0x89").await);
    assert!(matches!(err, WalletError::NotReady(_)));

    assert_ok!(hub.init().await);
    let proxy = hub.provider().unwrap();
    let mut events = hub.subscribe();

    assert_ok!(hub.switch_chain("137").await);
    assert_eq!(
        assert_ok!(proxy.request(RpcRequest::method("eth_chainId")).await),
        json!("0x89")
    );
    assert!(provider_events(&drain(&mut events)).contains(&ProviderEvent::ChainChanged {
        chain_id: "0x89".to_string()
    }));

    let err = assert_err!(hub.switch_chain("0x999").await);
    assert!(matches!(err, WalletError::NotFound(_)));
}

#[tokio::test]
async fn test_add_and_switch_chain_after_connect() {
    let connector = eip155_connector();
    let hub = memory_hub();
    assert_ok!(hub.configure_adapter(full_adapter("a", connector.clone())));
    assert_ok!(hub.init().await);
    let proxy = assert_ok!(hub.connect_to("a", LoginParams::default()).await).unwrap();

    let mut localnet = hub.chain_config().clone();
    localnet.chain_id = "0x539".to_string();
    localnet.display_name = "Localnet".to_string();
    localnet.rpc_target = "http://127.0.0.1:8545".to_string();

    assert_ok!(hub.add_and_switch_chain(localnet).await);
    assert_eq!(connector.added_chains(), vec!["0x539".to_string()]);
    assert_eq!(connector.switched_chains(), vec!["0x539".to_string()]);
    assert_eq!(
        assert_ok!(proxy.request(RpcRequest::method("net_version")).await),
        json!("1337")
    );
}

#[tokio::test]
async fn test_plugins_follow_connection() {
    let hub = memory_hub();
    let working = Arc::new(
        RecordingPlugin::new("wallet-ui", AdapterNamespace::Eip155, PluginMode::Works)
            .supporting(&["a"]),
    );
    let picky = Arc::new(
        RecordingPlugin::new("picky", AdapterNamespace::Eip155, PluginMode::RejectsAdapter)
            .supporting(&["a"]),
    );
    let broken = Arc::new(
        RecordingPlugin::new("broken", AdapterNamespace::Multichain, PluginMode::Fails)
            .supporting(&["a"]),
    );
    let elsewhere = Arc::new(
        RecordingPlugin::new("elsewhere", AdapterNamespace::Eip155, PluginMode::Works)
            .supporting(&["b"]),
    );
    let undeclared = Arc::new(RecordingPlugin::new(
        "undeclared",
        AdapterNamespace::Eip155,
        PluginMode::Works,
    ));
    for plugin in [
        working.clone(),
        picky.clone(),
        broken.clone(),
        elsewhere.clone(),
        undeclared.clone(),
    ] {
        assert_ok!(hub.add_plugin(plugin));
    }
    assert_ok!(hub.configure_adapter(full_adapter("a", eip155_connector())));
    assert_ok!(hub.init().await);

    assert_ok!(hub.connect_to("a", LoginParams::default()).await);
    assert_eq!(hub.status(), ConnectionState::Connected);
    assert!(hub.is_plugin_active("wallet-ui"));
    assert!(!hub.is_plugin_active("picky"));
    assert!(!hub.is_plugin_active("broken"));
    assert_eq!(working.calls(), vec!["init:a", "connect"]);
    assert_eq!(picky.calls(), vec!["init:a", "connect"]);
    assert_eq!(broken.calls(), vec!["init:a", "connect"]);
    // activation needs an explicit adapter match
    assert!(elsewhere.calls().is_empty());
    assert!(undeclared.calls().is_empty());
    assert!(!hub.is_plugin_active("undeclared"));

    assert_ok!(hub.logout(DisconnectOptions::default()).await);
    assert_eq!(hub.status(), ConnectionState::Ready);
    assert!(!hub.is_plugin_active("wallet-ui"));
    assert_eq!(working.calls().last().map(String::as_str), Some("disconnect"));
    assert_eq!(broken.calls().last().map(String::as_str), Some("disconnect"));
}

#[tokio::test]
async fn test_plugin_registration_rules() {
    let hub = memory_hub();
    let first = Arc::new(RecordingPlugin::new(
        "wallet-ui",
        AdapterNamespace::Eip155,
        PluginMode::Works,
    ));
    assert_ok!(hub.add_plugin(first.clone()));

    let duplicate = Arc::new(RecordingPlugin::new(
        "wallet-ui",
        AdapterNamespace::Multichain,
        PluginMode::Works,
    ));
    let err = assert_err!(hub.add_plugin(duplicate));
    assert!(matches!(err, WalletError::DuplicateRegistration(_)));
    assert_eq!(
        hub.get_plugin("wallet-ui").unwrap().namespace(),
        AdapterNamespace::Eip155
    );

    let solana = Arc::new(RecordingPlugin::new(
        "solana-ui",
        AdapterNamespace::Solana,
        PluginMode::Works,
    ));
    let err = assert_err!(hub.add_plugin(solana));
    assert!(matches!(err, WalletError::IncompatibleNamespace(_)));
    assert!(hub.get_plugin("solana-ui").is_none());

    let anywhere = Arc::new(RecordingPlugin::new(
        "anywhere",
        AdapterNamespace::Multichain,
        PluginMode::Works,
    ));
    assert_ok!(hub.add_plugin(anywhere));
}

#[tokio::test]
async fn test_wallet_session_delete_disconnects_hub() {
    let storage = Arc::new(MemoryStorage::new());
    let connector = eip155_connector();
    let hub = new_hub(storage.clone());
    assert_ok!(hub.configure_adapter(full_adapter("a", connector.clone())));
    assert_ok!(hub.init().await);
    assert_ok!(hub.connect_to("a", LoginParams::default()).await);
    let mut events = hub.subscribe();

    connector.delete_session().await;

    assert_eq!(hub.status(), ConnectionState::Ready);
    assert_eq!(hub.connected_adapter_name(), None);
    assert_eq!(assert_ok!(storage.get(ADAPTER_CACHE_KEY)), None);
    let events = drain(&mut events);
    assert!(provider_events(&events).contains(&ProviderEvent::Disconnect));
    assert!(events.contains(&HubEvent::Disconnected {
        adapter: "a".to_string()
    }));
}

#[tokio::test]
async fn test_wallet_session_update_is_forwarded() {
    let connector = eip155_connector();
    let hub = memory_hub();
    assert_ok!(hub.configure_adapter(full_adapter("a", connector.clone())));
    assert_ok!(hub.init().await);
    assert_ok!(hub.connect_to("a", LoginParams::default()).await);
    let mut events = hub.subscribe();

    connector.emit_session_update().await;

    let session = connector.session().expect("connected wallet has a session");
    let expected = serde_json::to_value(&session).unwrap();
    assert!(drain(&mut events).contains(&HubEvent::AdapterDataUpdated {
        adapter: "a".to_string(),
        data: expected,
    }));
    assert_eq!(hub.status(), ConnectionState::Connected);
}
