use crate::cli_opts::LaunchpadBotOpt;

use launchpad_client::sim::{SimParams, SimulatedChain};
use launchpad_client::{Deployment, LaunchpadConfig};
use launchpad_controller::action::ParticipationState;
use launchpad_controller::amount::parse_units;
use launchpad_controller::phase::Stage;
use launchpad_controller::state::{
    ActionKind, Address, AuctionWindow, PriceCurve, TokenMetadata, UnixTimestamp,
};
use launchpad_controller::view::LaunchpadView;
use launchpad_controller::{DEFAULT_PROJECT_SYMBOL, DEFAULT_SALE_SYMBOL};

use log::info;

pub const DEFAULT_CHAIN_ID: u64 = 7700;

#[rustfmt::skip]
pub const TEST_WALLET: Address = Address([
    0x5c, 0x2f, 0x91, 0x0b, 0xe8, 0x47, 0x13, 0xd6, 0x0a, 0x7e,
    0x21, 0x9c, 0x48, 0xf3, 0x6b, 0x05, 0xd2, 0x8a, 0x3e, 0x17,
]);

const SALE_DECIMALS: u8 = 6;
const PROJECT_DECIMALS: u8 = 18;
const MAX_PROJECT_TOKENS: &str = "1000000";
const MIN_RAISE: &str = "100000";
const MAX_RAISE: &str = "500000";

/// Config used when no config file is given: a single deployment on the
/// default chain.
pub fn default_config() -> LaunchpadConfig {
    let mut config = LaunchpadConfig::default();
    config.deployments.insert(
        DEFAULT_CHAIN_ID,
        Deployment {
            fair_auction: Address([0xfa; 20]),
            sale_token: Address([0x5a; 20]),
            project_token: Address([0xd7; 20]),
        },
    );
    config
}

pub fn simulated_chain(
    deployment: Deployment,
    opt: &LaunchpadBotOpt,
    now: UnixTimestamp,
) -> Result<SimulatedChain, anyhow::Error> {
    let start_time = now + opt.start_delay;
    let params = SimParams {
        deployment,
        sale_token: TokenMetadata {
            decimals: SALE_DECIMALS,
            symbol: DEFAULT_SALE_SYMBOL.to_owned(),
        },
        project_token: TokenMetadata {
            decimals: PROJECT_DECIMALS,
            symbol: DEFAULT_PROJECT_SYMBOL.to_owned(),
        },
        window: AuctionWindow::new(start_time, start_time + opt.auction_length)?,
        curve: PriceCurve {
            max_project_tokens: parse_units(MAX_PROJECT_TOKENS, PROJECT_DECIMALS)?,
            min_raise: parse_units(MIN_RAISE, SALE_DECIMALS)?,
            max_raise: parse_units(MAX_RAISE, SALE_DECIMALS)?,
        },
        now,
    };
    let chain = SimulatedChain::new(params, TEST_WALLET);
    chain.mint(TEST_WALLET, parse_units(&opt.balance, SALE_DECIMALS)?)?;
    Ok(chain)
}

/// What the bot does on a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Invoke,
    Wait,
    Stop,
}

/// Decides the next step from the current view. After the end the bot stops
/// once nothing is pending and there is nothing (left) to claim.
pub fn next_step(view: &LaunchpadView, auto: bool, pending: bool) -> Step {
    if view.action.state == ParticipationState::Claimed {
        return Step::Stop;
    }
    let ended = view
        .phase
        .map(|phase| phase.stage == Stage::Ended)
        .unwrap_or(false);
    if ended {
        let nothing_to_claim = view
            .position
            .map(|position| position.expected_claim_amount == 0)
            .unwrap_or(false);
        if !auto || (!pending && (nothing_to_claim || !view.action.enabled)) {
            return Step::Stop;
        }
    }
    if auto && view.action.enabled {
        Step::Invoke
    } else {
        Step::Wait
    }
}

/// A resolved claim ends the session whatever its outcome.
pub fn ends_session(kind: ActionKind) -> bool {
    kind == ActionKind::Claim
}

pub fn log_view(view: &LaunchpadView) {
    let stage = view
        .phase
        .map(|phase| format!("{:?}", phase.stage))
        .unwrap_or_else(|| "Unknown".to_owned());
    info!(
        "{}    {}    raised: {} {}    price: {} {}",
        stage,
        view.countdown,
        view.total_raised,
        view.sale_symbol,
        view.token_price,
        view.sale_symbol
    );
    info!(
        "balance: {} {}    spent: {} {}    allocation: {} {}    action: {} ({})",
        view.balance,
        view.sale_symbol,
        view.spent,
        view.sale_symbol,
        view.allocation,
        view.project_symbol,
        view.action.label,
        if view.action.enabled {
            "enabled"
        } else {
            "disabled"
        }
    );
}
