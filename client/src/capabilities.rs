use async_trait::async_trait;
use launchpad_controller::sequencer::TxOutcome;
use launchpad_controller::state::{
    Address, Amount, AuctionWindow, PriceCurve, TokenMetadata, TxHash, UnixTimestamp, UserInfo,
};
use log::info;

use std::time::{SystemTime, UNIX_EPOCH};

/// Read-only view of one fair auction deployment and its tokens.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn allowance(&self, owner: Address, spender: Address) -> Result<Amount, anyhow::Error>;
    async fn total_raised(&self) -> Result<Amount, anyhow::Error>;
    async fn user_info(&self, user: Address) -> Result<UserInfo, anyhow::Error>;
    async fn expected_claim_amount(&self, user: Address) -> Result<Amount, anyhow::Error>;
    async fn token_metadata(&self, token: Address) -> Result<TokenMetadata, anyhow::Error>;
    async fn balance_of(&self, token: Address, owner: Address) -> Result<Amount, anyhow::Error>;
    async fn auction_window(&self) -> Result<AuctionWindow, anyhow::Error>;
    async fn price_curve(&self) -> Result<PriceCurve, anyhow::Error>;
}

/// Write access through the connected wallet. Every call returns once the
/// wallet has signed and broadcast the transaction; an error means the
/// signature was refused or the broadcast failed.
#[async_trait]
pub trait ChainWriter: Send + Sync {
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<TxHash, anyhow::Error>;
    async fn buy(&self, amount: Amount, referral: Address) -> Result<TxHash, anyhow::Error>;
    async fn claim(&self) -> Result<TxHash, anyhow::Error>;
}

#[async_trait]
pub trait ReceiptWatcher: Send + Sync {
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxOutcome, anyhow::Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub link: String,
}

/// Displays dismissible success messages. Never consulted for decisions.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> UnixTimestamp;
}

/// Notifier writing to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        info!(
            "{} {}    {}",
            notification.title, notification.message, notification.link
        );
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTimestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as UnixTimestamp)
            .unwrap_or_default()
    }
}
