mod test_factory;
use test_factory::*;

use launchpad_client::controller::action::ParticipationState;
use launchpad_client::controller::sequencer::{TxOutcome, TxStatus};
use launchpad_client::controller::state::{ActionKind, TxRequest};
use launchpad_client::controller::ControllerError;

#[tokio::test]
async fn test_process_double_submit() {
    let TestSetup {
        chain,
        mut participant,
        ..
    } = setup().await;
    chain.set_time(T + 60).unwrap();
    participant.set_input("100");

    let prepared = participant.prepare().unwrap();
    assert_eq!(
        prepared.request,
        TxRequest::Approve {
            spender: deployment().fair_auction,
            amount: 100 * SALE_UNIT,
        }
    );
    let handle = participant.submit(prepared).await.unwrap();

    // Invalid use case
    // Submitting the same kind again while the first one is pending
    let err = participant.submit(prepared).await.unwrap_err();
    assert_eq!(
        to_controller_error(err),
        ControllerError::TransactionPending(ActionKind::Approve)
    );
    let err = participant.invoke().await.unwrap_err();
    assert_eq!(to_controller_error(err), ControllerError::ActionNotEnabled);
    assert_eq!(chain.pending_count().unwrap(), 1);

    chain.mine().unwrap();
    participant.settle(handle, chain.as_ref()).await.unwrap();
    assert!(participant.invoke().await.is_ok());
}

#[tokio::test]
async fn test_process_rejected_signature() {
    let TestSetup {
        chain,
        notifier,
        mut participant,
    } = setup().await;
    chain.set_time(T + 60).unwrap();
    participant.set_input("100");
    chain.reject_next_signature().unwrap();

    let err = participant.invoke().await.unwrap_err();
    assert_eq!(to_controller_error(err), ControllerError::TransactionRejected);
    assert!(!participant.sequencer().is_pending(ActionKind::Approve));
    assert_eq!(participant.sequencer().recent().count(), 0);
    assert!(notifier.notifications().is_empty());

    let view = participant.view();
    assert_eq!(view.action.state, ParticipationState::NeedsApproval);
    assert!(view.action.enabled);
}

#[tokio::test]
async fn test_process_stale_request() {
    let TestSetup {
        chain,
        mut participant,
        ..
    } = setup().await;
    chain.set_time(T + 60).unwrap();
    participant.set_input("100");

    let prepared = participant.prepare().unwrap();
    participant.poll().await;
    let err = participant.submit(prepared).await.unwrap_err();
    assert_eq!(to_controller_error(err), ControllerError::StaleRequest);
    assert_eq!(chain.pending_count().unwrap(), 0);
}

#[tokio::test]
async fn test_process_edited_input() {
    let TestSetup {
        chain,
        mut participant,
        ..
    } = setup().await;
    chain.set_time(T + 60).unwrap();
    participant.set_input("100");

    // Invalid use case
    // The amount was edited after the request had been built
    let prepared = participant.prepare().unwrap();
    participant.set_input("5");
    let err = participant.submit(prepared).await.unwrap_err();
    assert_eq!(to_controller_error(err), ControllerError::StaleRequest);
    assert_eq!(chain.pending_count().unwrap(), 0);
    assert!(!participant.sequencer().is_pending(ActionKind::Approve));

    let prepared = participant.prepare().unwrap();
    assert_eq!(
        prepared.request,
        TxRequest::Approve {
            spender: deployment().fair_auction,
            amount: 5 * SALE_UNIT,
        }
    );
    assert!(participant.submit(prepared).await.is_ok());
}

#[tokio::test]
async fn test_process_deposit_after_end() {
    let TestSetup {
        chain,
        mut participant,
        ..
    } = setup().await;
    chain.set_time(T + 60).unwrap();
    chain.set_auto_mine(true).unwrap();
    participant.set_input("100");
    let handle = participant.invoke().await.unwrap();
    participant.settle(handle, chain.as_ref()).await.unwrap();

    // Invalid use case
    // The auction ended between building and submitting the deposit
    let prepared = participant.prepare().unwrap();
    assert!(matches!(prepared.request, TxRequest::Buy { .. }));
    chain.set_time(T + DURATION + 5).unwrap();
    let err = participant.submit(prepared).await.unwrap_err();
    assert_eq!(to_controller_error(err), ControllerError::StaleRequest);
    assert!(!participant.sequencer().is_pending(ActionKind::Deposit));
    assert_eq!(participant.view().spent, "0.00");
}

#[tokio::test]
async fn test_process_reverted_deposit() {
    let TestSetup {
        chain,
        notifier,
        mut participant,
    } = setup().await;
    chain.set_time(T + 60).unwrap();
    chain.set_auto_mine(true).unwrap();
    participant.set_input("1000");

    let handle = participant.invoke().await.unwrap();
    participant.settle(handle, chain.as_ref()).await.unwrap();

    // somebody else fills the raise before our deposit lands
    chain.contribute(OTHER_USER, 499_500 * SALE_UNIT).unwrap();
    let handle = participant.invoke().await.unwrap();
    assert_eq!(handle.kind, ActionKind::Deposit);
    let outcome = participant.settle(handle, chain.as_ref()).await.unwrap();
    assert_eq!(outcome, TxOutcome::Reverted);

    assert_eq!(notifier.notifications().len(), 1);
    assert!(!participant.sequencer().is_pending(ActionKind::Deposit));
    let recent = participant.sequencer().recent().collect::<Vec<_>>();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[1].status, TxStatus::Reverted);

    // dependent reads were refreshed nonetheless
    let view = participant.view();
    assert_eq!(view.spent, "0.00");
    assert_eq!(view.total_raised, "499,500.00");
    assert_eq!(view.action.state, ParticipationState::ReadyToDeposit);
    assert!(view.action.enabled);
}

#[tokio::test]
async fn test_process_dropped_receipt() {
    let TestSetup {
        chain,
        notifier,
        mut participant,
    } = setup().await;
    chain.set_time(T + DURATION).unwrap();

    let handle = participant.invoke().await.unwrap();
    assert_eq!(handle.kind, ActionKind::Claim);

    // the receipt never shows up
    participant
        .on_receipt(handle, TxOutcome::Dropped)
        .await
        .unwrap();
    assert!(!participant.sequencer().is_pending(ActionKind::Claim));
    assert!(notifier.notifications().is_empty());
    assert_eq!(
        participant.sequencer().recent().last().unwrap().status,
        TxStatus::Dropped
    );

    // a handle can only be applied once
    let err = participant
        .on_receipt(handle, TxOutcome::Confirmed)
        .await
        .unwrap_err();
    assert_eq!(to_controller_error(err), ControllerError::UnknownTransaction);
}
