mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use alloy::primitives::{keccak256, B256, U256};
use serde_json::json;

use nova_wallet_adapters::{Eip1193Adapter, RuntimeProfile, WalletAdapterConfig};
use nova_wallet_core::{
    PortError, ProviderEventKind, ProviderPort, SessionStore, TransactionRequest,
};

use common::{
    deterministic_adapter, other_account, proxy_adapter, recorded_methods, rpc_error, rpc_result,
    spawn_mock_rpc_server, wallet_account, ONE_AND_A_HALF_ETHER_HEX, TX_HASH,
};

fn transfer_from(from: &str) -> TransactionRequest {
    TransactionRequest {
        from: from.to_owned(),
        to: "0x000000000000000000000000000000000000CAFE".to_owned(),
        value: ONE_AND_A_HALF_ETHER_HEX.to_owned(),
        gas: "0x5208".to_owned(),
    }
}

#[tokio::test]
async fn eip1193_event_recovery_is_deterministic() {
    let adapter = deterministic_adapter();

    adapter
        .debug_inject_accounts_changed(vec![wallet_account(), other_account()])
        .expect("inject accounts");
    adapter
        .debug_inject_chain_changed(8453)
        .expect("inject chain");

    let accounts = adapter.accounts().await.expect("accounts");
    assert_eq!(accounts, vec![wallet_account(), other_account()]);
    assert_eq!(adapter.chain_id().await.expect("chain"), 8453);

    let events = adapter.drain_events().expect("drain events");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].sequence + 1, events[1].sequence);
    assert_eq!(events[0].kind, ProviderEventKind::AccountsChanged);
    assert_eq!(events[1].kind, ProviderEventKind::ChainChanged);
    assert_eq!(events[1].value, "0x2105");

    let no_events = adapter.drain_events().expect("drain empty events");
    assert!(no_events.is_empty());
}

#[tokio::test]
async fn deterministic_wallet_authorises_only_after_request() {
    let adapter = deterministic_adapter();
    assert!(adapter.is_available());
    assert_eq!(adapter.mode_label(), "deterministic");

    assert!(adapter.accounts().await.expect("accounts").is_empty());
    let granted = adapter.request_accounts().await.expect("request accounts");
    assert_eq!(granted, vec![wallet_account()]);
    assert_eq!(adapter.accounts().await.expect("accounts"), vec![wallet_account()]);

    let events = adapter.drain_events().expect("drain events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ProviderEventKind::AccountsChanged);
    assert_eq!(
        events[0].value,
        r#"["0x1000000000000000000000000000000000000001"]"#
    );
}

#[tokio::test]
async fn deterministic_send_debits_balance_and_hashes_payload() {
    let adapter = deterministic_adapter();
    adapter.request_accounts().await.expect("request accounts");
    assert_eq!(
        adapter.get_balance(wallet_account()).await.expect("balance"),
        "0x8ac7230489e80000"
    );

    let tx = transfer_from("0x1000000000000000000000000000000000000001");
    let hash = adapter.send_transaction(&tx).await.expect("send");
    let expected = keccak256(serde_json::to_vec(&json!(tx)).expect("serialize tx"));
    assert_eq!(hash, expected);

    let remaining = adapter.debug_balance().expect("balance");
    assert_eq!(remaining, U256::from(8_500_000_000_000_000_000u128));
    assert_eq!(
        adapter.get_balance(wallet_account()).await.expect("balance"),
        "0x75f610f70ed20000"
    );
    assert_eq!(
        adapter.get_balance(other_account()).await.expect("balance"),
        "0x0"
    );
}

#[tokio::test]
async fn deterministic_send_requires_authorisation() {
    let adapter = deterministic_adapter();
    let err = adapter
        .send_transaction(&transfer_from("0x1000000000000000000000000000000000000001"))
        .await
        .expect_err("send before connect must fail");
    assert!(matches!(err, PortError::Rpc { code: 4100, .. }));
    assert_eq!(
        adapter.debug_balance().expect("balance"),
        U256::from(10_000_000_000_000_000_000u128)
    );
}

#[tokio::test]
async fn deterministic_send_rejects_overdraft() {
    let adapter = deterministic_adapter();
    adapter.request_accounts().await.expect("request accounts");
    let mut tx = transfer_from("0x1000000000000000000000000000000000000001");
    tx.value = "0x1b1ae4d6e2ef500000".to_owned(); // 500 ETH

    let err = adapter.send_transaction(&tx).await.expect_err("overdraft");
    assert_eq!(
        err.user_message().as_deref(),
        Some("insufficient funds for transfer")
    );
}

#[tokio::test]
async fn deterministic_switch_emits_chain_event() {
    let adapter = deterministic_adapter();
    adapter.switch_chain(137).await.expect("switch to polygon");
    assert_eq!(adapter.chain_id().await.expect("chain"), 137);

    let events = adapter.drain_events().expect("drain events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ProviderEventKind::ChainChanged);
    assert_eq!(events[0].value, "0x89");

    adapter.switch_chain(137).await.expect("switch again");
    assert!(adapter.drain_events().expect("drain").is_empty());
}

#[tokio::test]
async fn deterministic_switch_rejects_unknown_chain() {
    let adapter = deterministic_adapter();
    let err = adapter.switch_chain(999_999).await.expect_err("unknown chain");
    assert!(matches!(err, PortError::Rpc { code: 4902, .. }));
    assert_eq!(adapter.chain_id().await.expect("chain"), 1);
    assert!(adapter.drain_events().expect("drain").is_empty());
}

#[tokio::test]
async fn deterministic_wallet_rejects_unknown_methods() {
    let adapter = deterministic_adapter();
    let err = adapter
        .request("eth_sign", json!([]))
        .await
        .expect_err("unsupported");
    assert!(matches!(err, PortError::Rpc { code: 4200, .. }));
}

#[tokio::test]
async fn production_profile_requires_eip1193_runtime() {
    let cfg = WalletAdapterConfig {
        runtime_profile: RuntimeProfile::Production,
        eip1193_proxy_url: None,
        ..WalletAdapterConfig::default()
    };
    let adapter = Eip1193Adapter::with_config(cfg);
    assert!(!adapter.is_available());
    assert!(adapter.disabled_reason().is_some());

    let err = adapter
        .request_accounts()
        .await
        .expect_err("runtime should be required");
    assert!(matches!(err, PortError::Policy(_)));
    assert!(matches!(
        adapter.drain_events().expect_err("no events when disabled"),
        PortError::Policy(_)
    ));
}

#[tokio::test]
async fn proxy_forwards_balance_query() {
    let (base_url, calls) = spawn_mock_rpc_server(|method, _params| match method {
        "eth_getBalance" => rpc_result(json!("0xde0b6b3a7640000")),
        _ => rpc_error(4200, "unsupported"),
    });
    let adapter = proxy_adapter(base_url);
    assert_eq!(adapter.mode_label(), "proxy");

    let balance = adapter
        .get_balance(wallet_account())
        .await
        .expect("balance");
    assert_eq!(balance, "0xde0b6b3a7640000");

    let calls = calls.lock().expect("calls lock");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["jsonrpc"], "2.0");
    assert_eq!(calls[0]["method"], "eth_getBalance");
    assert_eq!(
        calls[0]["params"],
        json!(["0x1000000000000000000000000000000000000001", "latest"])
    );
}

#[tokio::test]
async fn proxy_sends_transfer_and_tracks_wallet_changes() {
    let (base_url, calls) = spawn_mock_rpc_server(|method, _params| match method {
        "eth_requestAccounts" => rpc_result(json!(["0x1000000000000000000000000000000000000001"])),
        "eth_chainId" => rpc_result(json!("0xa")),
        "eth_sendTransaction" => rpc_result(json!(TX_HASH)),
        _ => rpc_error(4200, "unsupported"),
    });
    let adapter = proxy_adapter(base_url);

    assert_eq!(
        adapter.request_accounts().await.expect("accounts"),
        vec![wallet_account()]
    );
    assert_eq!(adapter.chain_id().await.expect("chain"), 10);
    let hash = adapter
        .send_transaction(&transfer_from("0x1000000000000000000000000000000000000001"))
        .await
        .expect("send");
    assert_eq!(hash, TX_HASH.parse::<B256>().expect("hash"));

    let kinds: Vec<_> = adapter
        .drain_events()
        .expect("drain")
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![ProviderEventKind::AccountsChanged, ProviderEventKind::ChainChanged]
    );

    assert_eq!(
        recorded_methods(&calls),
        vec!["eth_requestAccounts", "eth_chainId", "eth_sendTransaction"]
    );
    let sent = calls.lock().expect("calls lock")[2]["params"][0].clone();
    assert_eq!(sent["value"], ONE_AND_A_HALF_ETHER_HEX);
    assert_eq!(sent["gas"], "0x5208");
}

#[tokio::test]
async fn proxy_polling_picks_up_wallet_side_changes() {
    let accounts_calls = AtomicUsize::new(0);
    let (base_url, calls) = spawn_mock_rpc_server(move |method, _params| match method {
        "eth_accounts" => {
            if accounts_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                rpc_result(json!(["0x1000000000000000000000000000000000000001"]))
            } else {
                rpc_result(json!(["0x2000000000000000000000000000000000000002"]))
            }
        }
        "eth_chainId" => rpc_result(json!("0x1")),
        "eth_getBalance" => rpc_result(json!("0xde0b6b3a7640000")),
        _ => rpc_error(4200, "unsupported"),
    });
    let adapter = proxy_adapter(base_url);
    assert!(adapter.polls_wallet());
    let session = SessionStore::new(adapter.clone());

    session.restore().await;
    assert_eq!(session.snapshot().address, Some(wallet_account()));
    let _ = session.poll_provider_events();
    assert_eq!(session.poll_provider_events(), None);

    adapter.sync_wallet_view().await.expect("sync");
    let refetch = session.poll_provider_events();
    assert_eq!(refetch, Some(other_account()));
    assert_eq!(session.snapshot().address, Some(other_account()));

    assert_eq!(
        recorded_methods(&calls),
        vec![
            "eth_accounts",
            "eth_chainId",
            "eth_getBalance",
            "eth_accounts",
            "eth_chainId"
        ]
    );
}

#[tokio::test]
async fn only_the_proxy_needs_polling() {
    let adapter = deterministic_adapter();
    assert!(!adapter.polls_wallet());
    adapter.sync_wallet_view().await.expect("no-op sync");
    assert!(adapter.drain_events().expect("drain").is_empty());
}

#[tokio::test]
async fn proxy_maps_wallet_rejection_to_rpc_error() {
    let (base_url, _calls) = spawn_mock_rpc_server(|_method, _params| {
        rpc_error(4001, "User rejected the request.")
    });
    let adapter = proxy_adapter(base_url);

    let err = adapter
        .send_transaction(&transfer_from("0x1000000000000000000000000000000000000001"))
        .await
        .expect_err("rejected");
    assert_eq!(
        err,
        PortError::Rpc {
            code: 4001,
            message: "User rejected the request.".to_owned(),
        }
    );
    assert_eq!(
        err.user_message().as_deref(),
        Some("User rejected the request.")
    );
}

#[tokio::test]
async fn proxy_http_failure_is_transport_error() {
    let (base_url, _calls) = spawn_mock_rpc_server(|_method, _params| {
        (502, json!({ "detail": "bad gateway" }))
    });
    let adapter = proxy_adapter(base_url);

    let err = adapter.chain_id().await.expect_err("gateway failure");
    assert!(matches!(err, PortError::Transport(_)));
}

#[test]
fn config_reads_overrides_and_ignores_garbage() {
    let cfg = WalletAdapterConfig::from_lookup(|key| match key {
        WalletAdapterConfig::ENV_PROFILE => Some("Production".to_owned()),
        WalletAdapterConfig::ENV_PROXY_URL => Some("  http://127.0.0.1:8545  ".to_owned()),
        WalletAdapterConfig::ENV_BALANCE_REFRESH_DELAY_MS => Some("500".to_owned()),
        WalletAdapterConfig::ENV_PROVIDER_TIMEOUT_MS => Some("soon".to_owned()),
        _ => None,
    });
    assert_eq!(cfg.runtime_profile, RuntimeProfile::Production);
    assert!(cfg.strict_runtime_required());
    assert_eq!(cfg.eip1193_proxy_url.as_deref(), Some("http://127.0.0.1:8545"));
    assert_eq!(cfg.balance_refresh_delay_ms, 500);
    assert_eq!(cfg.provider_timeout_ms, 15_000);
    assert_eq!(cfg.event_poll_interval_ms, 1_000);
}

#[test]
fn config_defaults_to_development_without_proxy() {
    let cfg = WalletAdapterConfig::from_lookup(|_| None);
    assert_eq!(cfg.runtime_profile, RuntimeProfile::Development);
    assert!(cfg.eip1193_proxy_url.is_none());
    assert_eq!(cfg.balance_refresh_delay_ms, 2_000);

    let blank = WalletAdapterConfig::from_lookup(|key| {
        (key == WalletAdapterConfig::ENV_PROXY_URL).then(|| "   ".to_owned())
    });
    assert!(blank.eip1193_proxy_url.is_none());
}
