use launchpad_controller::state::{Address, TxHash};
use launchpad_controller::MIN_TICK_INTERVAL;
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_EXPLORER_URL: &str = "https://arbiscan.io";
/// Chain id the launchpad was first deployed on.
pub const DEFAULT_CHAIN_ID: u64 = 7700;

/// Contracts of a fair auction on one chain.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub fair_auction: Address,
    pub sale_token: Address,
    pub project_token: Address,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LaunchpadConfig {
    /// Deployments keyed by chain id. A chain without a deployment is
    /// unsupported.
    pub deployments: BTreeMap<u64, Deployment>,
    pub explorer_url: String,
    /// Countdown refresh interval (in seconds).
    pub tick_interval: u64,
    /// Referral passed along with every buy.
    pub referral: Option<Address>,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            deployments: BTreeMap::new(),
            explorer_url: DEFAULT_EXPLORER_URL.to_owned(),
            tick_interval: MIN_TICK_INTERVAL,
            referral: None,
        }
    }
}

impl LaunchpadConfig {
    pub fn from_json(json: &str) -> Result<Self, anyhow::Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn deployment(&self, chain_id: u64) -> Option<&Deployment> {
        self.deployments.get(&chain_id)
    }

    pub fn referral(&self) -> Address {
        self.referral.unwrap_or(Address::ZERO)
    }

    /// Interval of the countdown clock, never below one second.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval.max(MIN_TICK_INTERVAL))
    }

    pub fn tx_link(&self, hash: &TxHash) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), hash)
    }
}
