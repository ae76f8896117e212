use crate::allowance::allowance_state;
use crate::amount::InputAmount;
use crate::error::ControllerError;
use crate::phase::resolve_timing;
use crate::reads::{ChainSnapshot, ReadKey};
use crate::sequencer::TransactionSequencer;
use crate::state::{
    ActionKind, Address, AllowanceState, Amount, AuctionTiming, TxRequest, UnixTimestamp,
};

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnavailableReason {
    WalletDisconnected,
    UnsupportedNetwork,
    Unresolved(ReadKey),
    NotStarted,
}

/// The participant's state, recomputed from scratch on every refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipationState {
    Unavailable(UnavailableReason),
    NeedsApproval,
    ReadyToDeposit,
    AuctionEndedReadyToClaim,
    Claimed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionLabel {
    Loading,
    Approve,
    Deposit,
    Claim,
    Claimed,
    NotStarted,
    Unavailable,
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Loading => "Loading...",
            Self::Approve => "Approve",
            Self::Deposit => "Deposit",
            Self::Claim => "Claim",
            Self::Claimed => "Claimed",
            Self::NotStarted => "Not started",
            Self::Unavailable => "Unavailable",
        };
        f.write_str(label)
    }
}

/// The action button: what it does, whether it may be pressed and what it
/// reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionView {
    pub state: ParticipationState,
    pub action: Option<ActionKind>,
    pub enabled: bool,
    pub label: ActionLabel,
}

/// Everything the action selection depends on, captured at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ControllerInputs {
    pub wallet_connected: bool,
    pub network_supported: bool,
    pub sale_decimals_loaded: bool,
    pub timing: Option<AuctionTiming>,
    pub allowance: Option<AllowanceState>,
    pub allowance_fetching: bool,
    pub window_fetching: bool,
    /// `None` while the user info read has not resolved.
    pub has_claimed: Option<bool>,
    /// Validly parsed, positive spend amount.
    pub spend_amount: Option<Amount>,
    pub approve_pending: bool,
    pub deposit_pending: bool,
    pub claim_pending: bool,
    pub awaiting_confirmation: bool,
}

impl ControllerInputs {
    pub fn capture(
        snapshot: &ChainSnapshot,
        now: UnixTimestamp,
        input: &InputAmount,
        sequencer: &TransactionSequencer,
    ) -> Self {
        let spend_amount = input.spend_amount(snapshot.sale_decimals());
        Self {
            wallet_connected: snapshot.wallet().is_some(),
            network_supported: snapshot.network_supported(),
            sale_decimals_loaded: snapshot.sale_decimals().is_some(),
            timing: snapshot.window().map(|window| resolve_timing(now, window)),
            allowance: allowance_state(snapshot.allowance(), spend_amount),
            allowance_fetching: snapshot.is_fetching(ReadKey::Allowance),
            window_fetching: snapshot.is_fetching(ReadKey::AuctionWindow),
            has_claimed: snapshot.user_info().map(|info| info.has_claimed),
            spend_amount,
            approve_pending: sequencer.is_pending(ActionKind::Approve),
            deposit_pending: sequencer.is_pending(ActionKind::Deposit),
            claim_pending: sequencer.is_pending(ActionKind::Claim),
            awaiting_confirmation: sequencer.any_awaiting_confirmation(),
        }
    }
}

fn unavailable(reason: UnavailableReason) -> (ParticipationState, Option<ActionKind>, bool) {
    (ParticipationState::Unavailable(reason), None, false)
}

/// Selects the single next permitted action.
///
/// Precedence: missing connection or unresolved reads, then the ended
/// auction (claim or claimed), then the not yet started auction, then
/// approval, then deposit.
pub fn select(inputs: &ControllerInputs) -> ActionView {
    let (state, action, enabled) = if !inputs.wallet_connected {
        unavailable(UnavailableReason::WalletDisconnected)
    } else if !inputs.network_supported {
        unavailable(UnavailableReason::UnsupportedNetwork)
    } else if !inputs.sale_decimals_loaded {
        unavailable(UnavailableReason::Unresolved(ReadKey::SaleToken))
    } else if let (Some(allowance), Some(timing)) = (inputs.allowance, inputs.timing) {
        if timing.has_ended {
            match inputs.has_claimed {
                Some(true) => (ParticipationState::Claimed, None, false),
                has_claimed => (
                    ParticipationState::AuctionEndedReadyToClaim,
                    Some(ActionKind::Claim),
                    !inputs.claim_pending && has_claimed.is_some(),
                ),
            }
        } else if !timing.has_started {
            unavailable(UnavailableReason::NotStarted)
        } else if allowance.needs_approval {
            (
                ParticipationState::NeedsApproval,
                Some(ActionKind::Approve),
                !inputs.approve_pending
                    && inputs.spend_amount.is_some()
                    && !inputs.allowance_fetching,
            )
        } else {
            (
                ParticipationState::ReadyToDeposit,
                Some(ActionKind::Deposit),
                !inputs.deposit_pending
                    && inputs.spend_amount.is_some()
                    && !inputs.allowance_fetching
                    && !inputs.window_fetching,
            )
        }
    } else if inputs.allowance.is_none() {
        unavailable(UnavailableReason::Unresolved(ReadKey::Allowance))
    } else {
        unavailable(UnavailableReason::Unresolved(ReadKey::AuctionWindow))
    };

    let label = if inputs.awaiting_confirmation {
        ActionLabel::Loading
    } else {
        match state {
            ParticipationState::NeedsApproval => ActionLabel::Approve,
            ParticipationState::ReadyToDeposit => ActionLabel::Deposit,
            ParticipationState::AuctionEndedReadyToClaim => ActionLabel::Claim,
            ParticipationState::Claimed => ActionLabel::Claimed,
            ParticipationState::Unavailable(UnavailableReason::NotStarted) => {
                ActionLabel::NotStarted
            }
            ParticipationState::Unavailable(_) => ActionLabel::Unavailable,
        }
    };

    ActionView {
        state,
        action,
        enabled,
        label,
    }
}

/// Builds the write request of an enabled view.
pub fn prepare(
    view: &ActionView,
    spend_amount: Option<Amount>,
    spender: Address,
    referral: Address,
) -> Result<TxRequest, ControllerError> {
    if !view.enabled {
        return Err(ControllerError::ActionNotEnabled);
    }
    match view.action {
        Some(ActionKind::Approve) => Ok(TxRequest::Approve {
            spender,
            amount: spend_amount.ok_or(ControllerError::InvalidAmount)?,
        }),
        Some(ActionKind::Deposit) => Ok(TxRequest::Buy {
            amount: spend_amount.ok_or(ControllerError::InvalidAmount)?,
            referral,
        }),
        Some(ActionKind::Claim) => Ok(TxRequest::Claim),
        None => Err(ControllerError::ActionNotEnabled),
    }
}
