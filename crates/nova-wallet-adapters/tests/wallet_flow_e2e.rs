mod common;

use std::time::Duration;

use nova_wallet_core::{SessionStore, TransferController, TransferOutcome, TransferState};

use common::{deterministic_adapter, recipient, wallet_account, RecordingScheduler};

#[tokio::test]
async fn connect_send_and_refresh_against_deterministic_wallet() {
    let adapter = deterministic_adapter();
    let session = SessionStore::new(adapter.clone());
    let transfer = TransferController::new(adapter.clone());
    let scheduler = RecordingScheduler::default();

    session.restore().await;
    assert!(!session.snapshot().is_connected);

    session.connect().await.expect("connect");
    let snapshot = session.snapshot();
    assert_eq!(snapshot.address, Some(wallet_account()));
    assert_eq!(snapshot.balance, "10.000000");
    assert!(snapshot.balance_updated);

    // The connect already observed this account; its event changes nothing.
    assert_eq!(session.poll_provider_events(), None);

    transfer.set_recipient(recipient());
    transfer.set_amount("1.5");
    let outcome = transfer.submit(snapshot.address, &scheduler).await;
    assert!(matches!(outcome, TransferOutcome::Success { .. }));
    assert_eq!(scheduler.stale_marks(), 1);
    assert_eq!(scheduler.delays(), vec![Duration::from_millis(2_000)]);
    assert!(transfer.form().request.recipient.is_empty());

    session.refresh_balance().await;
    assert_eq!(session.snapshot().balance, "8.500000");
}

#[tokio::test]
async fn wallet_side_chain_switch_reaches_session() {
    let adapter = deterministic_adapter();
    let session = SessionStore::new(adapter.clone());
    session.connect().await.expect("connect");
    let _ = session.poll_provider_events();

    session.switch_chain(8453).await;
    assert_eq!(session.snapshot().chain_id, 1);

    let refetch = session.poll_provider_events();
    assert_eq!(refetch, Some(wallet_account()));
    assert_eq!(session.snapshot().chain_id, 8453);
    assert!(!session.snapshot().balance_updated);
}

#[tokio::test]
async fn account_removal_disconnects_session() {
    let adapter = deterministic_adapter();
    let session = SessionStore::new(adapter.clone());
    session.connect().await.expect("connect");
    let _ = session.poll_provider_events();

    adapter
        .debug_inject_accounts_changed(Vec::new())
        .expect("inject accounts");
    assert_eq!(session.poll_provider_events(), None);

    let snapshot = session.snapshot();
    assert!(!snapshot.is_connected);
    assert_eq!(snapshot.address, None);
    assert_eq!(snapshot.balance, "0");
}

#[tokio::test]
async fn rejected_send_keeps_form_for_retry() {
    let adapter = deterministic_adapter();
    let session = SessionStore::new(adapter.clone());
    let transfer = TransferController::new(adapter.clone());
    let scheduler = RecordingScheduler::default();
    session.connect().await.expect("connect");

    transfer.set_recipient(recipient());
    transfer.set_amount("500");
    let outcome = transfer.submit(session.snapshot().address, &scheduler).await;

    assert_eq!(
        outcome,
        TransferOutcome::Failure {
            message: "insufficient funds for transfer".to_owned(),
        }
    );
    let form = transfer.form();
    assert_eq!(form.state(), TransferState::Failure);
    assert_eq!(form.request.amount, "500");
    assert!(scheduler.delays().is_empty());
}
