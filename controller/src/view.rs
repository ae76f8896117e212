use crate::action::{select, ActionView, ControllerInputs};
use crate::amount::{format_currency, InputAmount};
use crate::phase::{estimate_allocation, resolve, AuctionPhase, Countdown};
use crate::reads::ChainSnapshot;
use crate::sequencer::TransactionSequencer;
use crate::state::{UnixTimestamp, UserPosition};
use crate::{DEFAULT_PROJECT_SYMBOL, DEFAULT_SALE_SYMBOL};

/// Display model of the launchpad. Amounts are formatted with
/// [`format_currency`]; unresolved values read `0.00`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchpadView {
    pub phase: Option<AuctionPhase>,
    pub countdown: Countdown,
    pub sale_symbol: String,
    pub project_symbol: String,
    pub total_raised: String,
    pub floor_price: String,
    pub max_raise: String,
    pub token_price: String,
    pub balance: String,
    pub position: Option<UserPosition>,
    pub spent: String,
    pub allocation: String,
    /// Allocation the participant would hold after depositing the current
    /// input, assuming nobody else contributes.
    pub allocation_preview: Option<String>,
    pub input_error: bool,
    pub action: ActionView,
}

pub fn derive(
    snapshot: &ChainSnapshot,
    now: UnixTimestamp,
    input: &InputAmount,
    sequencer: &TransactionSequencer,
) -> LaunchpadView {
    let sale_decimals = snapshot.sale_decimals();
    let project_decimals = snapshot.project_decimals();
    let phase = resolve(
        now,
        snapshot.window(),
        snapshot.total_raised(),
        snapshot.curve(),
        project_decimals,
    );
    let bounds = phase.and_then(|p| p.bounds);
    let inputs = ControllerInputs::capture(snapshot, now, input, sequencer);
    let position = snapshot.user_position();

    let allocation_preview = match (inputs.spend_amount, snapshot.total_raised(), snapshot.curve()) {
        (Some(spend), Some(raised), Some(curve)) => {
            let spent = snapshot.user_info().map(|i| i.contribution).unwrap_or(0);
            spent
                .checked_add(spend)
                .zip(raised.checked_add(spend))
                .and_then(|(contribution, raised)| estimate_allocation(contribution, raised, curve))
                .map(|amount| format_currency(Some(amount), project_decimals))
        }
        _ => None,
    };

    LaunchpadView {
        phase,
        countdown: phase
            .map(|p| Countdown::from(p.timing.remaining))
            .unwrap_or_default(),
        sale_symbol: snapshot
            .sale_token()
            .map(|t| t.symbol.clone())
            .unwrap_or_else(|| DEFAULT_SALE_SYMBOL.to_owned()),
        project_symbol: snapshot
            .project_token()
            .map(|t| t.symbol.clone())
            .unwrap_or_else(|| DEFAULT_PROJECT_SYMBOL.to_owned()),
        total_raised: format_currency(snapshot.total_raised(), sale_decimals),
        floor_price: format_currency(bounds.map(|b| b.min_raise), sale_decimals),
        max_raise: format_currency(bounds.map(|b| b.max_raise), sale_decimals),
        token_price: format_currency(bounds.and_then(|b| b.token_price), sale_decimals),
        balance: format_currency(snapshot.sale_balance(), sale_decimals),
        position,
        spent: format_currency(snapshot.user_info().map(|i| i.contribution), sale_decimals),
        allocation: format_currency(snapshot.expected_claim_amount(), project_decimals),
        allocation_preview,
        input_error: input.shows_error(),
        action: select(&inputs),
    }
}
