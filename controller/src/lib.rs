//! Participation controller for a fixed-window fair auction token sale.
//!
//! Every value exposed here is derived by pure functions from a
//! [`ChainSnapshot`](reads::ChainSnapshot), the user's input and the
//! [`TransactionSequencer`](sequencer::TransactionSequencer), so the same
//! inputs always yield the same [`LaunchpadView`](view::LaunchpadView).
mod error;

/// Selection of the single next permitted user action.
pub mod action;
/// Approval requirement of the requested spend.
pub mod allowance;
/// Parsing, scaling and formatting of token amounts.
pub mod amount;
/// Auction timing, countdown and price bounds.
pub mod phase;
/// Loadable chain reads and the snapshot the controller derives from.
pub mod reads;
/// Per-kind pending transaction slots and the recent transaction log.
pub mod sequencer;
/// Data structures describing the auction and the participant.
pub mod state;
/// Everything the launchpad displays, derived in one pass.
pub mod view;

pub use error::ControllerError;

/// Sale token symbol shown until the token metadata has loaded.
pub const DEFAULT_SALE_SYMBOL: &str = "USDC";
/// Project token symbol shown until the token metadata has loaded.
pub const DEFAULT_PROJECT_SYMBOL: &str = "DMT";
/// Minimum interval between two countdown refreshes (in seconds).
pub const MIN_TICK_INTERVAL: u64 = 1;
/// Maximum number of entries kept in the recent transaction log.
pub const MAX_RECENT_TRANSACTIONS: usize = 10;
/// Number of fraction digits displayed by
/// [`format_currency`](amount::format_currency).
pub const DISPLAY_DECIMALS: u32 = 2;
