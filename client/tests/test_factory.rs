#![allow(dead_code)]

use launchpad_client::controller::state::{
    Address, Amount, AuctionWindow, PriceCurve, TokenMetadata, UnixTimestamp,
};
use launchpad_client::controller::ControllerError;
use launchpad_client::sim::{RecordingNotifier, SimParams, SimulatedChain};
use launchpad_client::{Deployment, LaunchpadConfig, Participant};

use std::sync::Arc;

pub const T: UnixTimestamp = 1_700_000_000;
pub const DURATION: i64 = 86_400;
pub const CHAIN_ID: u64 = 7700;
pub const USER: Address = Address([0x11; 20]);
pub const OTHER_USER: Address = Address([0x12; 20]);
pub const SALE_UNIT: Amount = 1_000_000;
pub const PROJECT_UNIT: Amount = 1_000_000_000_000_000_000;
pub const INITIAL_BALANCE: Amount = 10_000 * SALE_UNIT;

pub struct TestSetup {
    pub chain: Arc<SimulatedChain>,
    pub notifier: Arc<RecordingNotifier>,
    pub participant: Participant,
}

pub fn deployment() -> Deployment {
    Deployment {
        fair_auction: Address([0xa0; 20]),
        sale_token: Address([0xa1; 20]),
        project_token: Address([0xa2; 20]),
    }
}

pub fn sim_params() -> SimParams {
    SimParams {
        deployment: deployment(),
        sale_token: TokenMetadata {
            decimals: 6,
            symbol: "USDC".to_owned(),
        },
        project_token: TokenMetadata {
            decimals: 18,
            symbol: "CAD".to_owned(),
        },
        window: AuctionWindow::new(T, T + DURATION).unwrap(),
        curve: PriceCurve {
            max_project_tokens: 1_000_000 * PROJECT_UNIT,
            min_raise: 100_000 * SALE_UNIT,
            max_raise: 500_000 * SALE_UNIT,
        },
        now: T - 3_600,
    }
}

pub fn config() -> LaunchpadConfig {
    let mut config = LaunchpadConfig::default();
    config.deployments.insert(CHAIN_ID, deployment());
    config
}

/// Connected participant with a funded wallet and every read loaded, one
/// hour before the auction starts.
pub async fn setup() -> TestSetup {
    let chain = Arc::new(SimulatedChain::new(sim_params(), USER));
    chain.mint(USER, INITIAL_BALANCE).unwrap();
    let notifier = Arc::new(RecordingNotifier::new());
    let mut participant = Participant::new(
        chain.clone(),
        chain.clone(),
        notifier.clone(),
        chain.clone(),
        config(),
    );
    participant.connect(USER, CHAIN_ID);
    participant.refresh_all().await;
    TestSetup {
        chain,
        notifier,
        participant,
    }
}

pub fn to_controller_error(err: anyhow::Error) -> ControllerError {
    *err.downcast_ref::<ControllerError>().unwrap()
}
