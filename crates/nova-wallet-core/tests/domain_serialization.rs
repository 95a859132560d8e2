use nova_wallet_core::{ProviderEvent, ProviderEventKind, TransactionRequest, WalletSession};

#[test]
fn transaction_request_serializes_as_eth_send_transaction_params() {
    let tx = TransactionRequest {
        from: "0x1000000000000000000000000000000000000001".to_owned(),
        to: "0x000000000000000000000000000000000000CAFE".to_owned(),
        value: "0x14d1120d7b160000".to_owned(),
        gas: "0x5208".to_owned(),
    };
    let json = serde_json::to_value(&tx).expect("serialize tx");
    assert_eq!(
        json,
        serde_json::json!({
            "from": "0x1000000000000000000000000000000000000001",
            "to": "0x000000000000000000000000000000000000CAFE",
            "value": "0x14d1120d7b160000",
            "gas": "0x5208"
        })
    );
}

#[test]
fn default_session_is_disconnected_with_zero_balance() {
    let session = WalletSession::default();
    assert!(!session.is_connected);
    assert_eq!(session.address, None);
    assert_eq!(session.balance, "0");
    assert!(!session.balance_updated);
    assert!(!session.is_loading_balance);
    assert_eq!(session.chain_id, 1);
}

#[test]
fn provider_event_kind_serializes_by_name() {
    let event = ProviderEvent {
        sequence: 7,
        kind: ProviderEventKind::ChainChanged,
        value: "8453".to_owned(),
    };
    let json = serde_json::to_string(&event).expect("serialize event");
    assert!(json.contains("\"ChainChanged\""));
    assert!(json.contains("\"sequence\":7"));
}
