use crate::state::{
    Address, Amount, AuctionWindow, PriceCurve, TokenMetadata, UserInfo, UserPosition,
};

/// Load state of a single chain read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadState {
    NotLoaded,
    Loaded,
    /// A value is available but a newer request is in flight.
    Refreshing,
}

/// The independently refreshable chain reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadKey {
    SaleToken,
    ProjectToken,
    SaleBalance,
    Allowance,
    TotalRaised,
    UserInfo,
    ExpectedClaimAmount,
    AuctionWindow,
    PriceCurve,
}

impl ReadKey {
    pub const ALL: [ReadKey; 9] = [
        Self::SaleToken,
        Self::ProjectToken,
        Self::SaleBalance,
        Self::Allowance,
        Self::TotalRaised,
        Self::UserInfo,
        Self::ExpectedClaimAmount,
        Self::AuctionWindow,
        Self::PriceCurve,
    ];

    /// Reads keyed by the connected wallet. They are dropped when the wallet
    /// changes.
    pub const WALLET_BOUND: [ReadKey; 4] = [
        Self::SaleBalance,
        Self::Allowance,
        Self::UserInfo,
        Self::ExpectedClaimAmount,
    ];

    /// Reads polled on every tick.
    pub const WATCHED: [ReadKey; 1] = [Self::TotalRaised];

    pub fn is_wallet_bound(&self) -> bool {
        Self::WALLET_BOUND.contains(self)
    }
}

/// Result of a completed read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadValue {
    SaleToken(TokenMetadata),
    ProjectToken(TokenMetadata),
    SaleBalance(Amount),
    Allowance(Amount),
    TotalRaised(Amount),
    UserInfo(UserInfo),
    ExpectedClaimAmount(Amount),
    AuctionWindow(AuctionWindow),
    PriceCurve(PriceCurve),
}

impl ReadValue {
    pub fn key(&self) -> ReadKey {
        match self {
            Self::SaleToken(_) => ReadKey::SaleToken,
            Self::ProjectToken(_) => ReadKey::ProjectToken,
            Self::SaleBalance(_) => ReadKey::SaleBalance,
            Self::Allowance(_) => ReadKey::Allowance,
            Self::TotalRaised(_) => ReadKey::TotalRaised,
            Self::UserInfo(_) => ReadKey::UserInfo,
            Self::ExpectedClaimAmount(_) => ReadKey::ExpectedClaimAmount,
            Self::AuctionWindow(_) => ReadKey::AuctionWindow,
            Self::PriceCurve(_) => ReadKey::PriceCurve,
        }
    }
}

/// Identifies an issued read request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId {
    pub key: ReadKey,
    seq: u64,
}

/// A single read with last-writer-wins semantics: a completion is applied
/// only if no newer request has already been applied.
#[derive(Clone, Debug)]
pub struct ReadSlot<T> {
    value: Option<T>,
    issued: u64,
    applied: u64,
    in_flight: Option<u64>,
}

impl<T> Default for ReadSlot<T> {
    fn default() -> Self {
        Self {
            value: None,
            issued: 0,
            applied: 0,
            in_flight: None,
        }
    }
}

impl<T> ReadSlot<T> {
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn state(&self) -> ReadState {
        match (&self.value, self.in_flight) {
            (None, _) => ReadState::NotLoaded,
            (Some(_), None) => ReadState::Loaded,
            (Some(_), Some(_)) => ReadState::Refreshing,
        }
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight = Some(self.issued);
        self.issued
    }

    fn complete(&mut self, seq: u64, value: T) -> bool {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
        }
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        self.value = Some(value);
        true
    }

    fn fail(&mut self, seq: u64) {
        if self.in_flight == Some(seq) {
            self.in_flight = None;
        }
    }

    /// Drops the value and orphans every outstanding request.
    fn reset(&mut self) {
        self.value = None;
        self.applied = self.issued;
        self.in_flight = None;
    }
}

/// Latest known chain state as seen by the connected wallet.
#[derive(Clone, Debug, Default)]
pub struct ChainSnapshot {
    wallet: Option<Address>,
    network_supported: bool,
    sale_token: ReadSlot<TokenMetadata>,
    project_token: ReadSlot<TokenMetadata>,
    sale_balance: ReadSlot<Amount>,
    allowance: ReadSlot<Amount>,
    total_raised: ReadSlot<Amount>,
    user_info: ReadSlot<UserInfo>,
    expected_claim_amount: ReadSlot<Amount>,
    window: ReadSlot<AuctionWindow>,
    curve: ReadSlot<PriceCurve>,
    revision: u64,
}

impl ChainSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connected wallet and whether its network hosts the auction.
    /// Switching to another wallet drops every wallet-bound read.
    pub fn connect(&mut self, wallet: Address, network_supported: bool) {
        if self.wallet != Some(wallet) {
            self.reset_wallet_bound();
        }
        self.wallet = Some(wallet);
        self.network_supported = network_supported;
        self.revision += 1;
    }

    pub fn disconnect(&mut self) {
        self.wallet = None;
        self.network_supported = false;
        self.reset_wallet_bound();
        self.revision += 1;
    }

    fn reset_wallet_bound(&mut self) {
        self.sale_balance.reset();
        self.allowance.reset();
        self.user_info.reset();
        self.expected_claim_amount.reset();
    }

    pub fn wallet(&self) -> Option<Address> {
        self.wallet
    }

    pub fn network_supported(&self) -> bool {
        self.network_supported
    }

    /// Incremented whenever a read value or the connection changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn begin(&mut self, key: ReadKey) -> RequestId {
        let seq = match key {
            ReadKey::SaleToken => self.sale_token.begin(),
            ReadKey::ProjectToken => self.project_token.begin(),
            ReadKey::SaleBalance => self.sale_balance.begin(),
            ReadKey::Allowance => self.allowance.begin(),
            ReadKey::TotalRaised => self.total_raised.begin(),
            ReadKey::UserInfo => self.user_info.begin(),
            ReadKey::ExpectedClaimAmount => self.expected_claim_amount.begin(),
            ReadKey::AuctionWindow => self.window.begin(),
            ReadKey::PriceCurve => self.curve.begin(),
        };
        RequestId { key, seq }
    }

    /// Applies a read result. Returns `false` if it was superseded by a newer
    /// one or does not belong to the request.
    pub fn complete(&mut self, id: RequestId, value: ReadValue) -> bool {
        if id.key != value.key() {
            self.fail(id);
            return false;
        }
        let applied = match value {
            ReadValue::SaleToken(v) => self.sale_token.complete(id.seq, v),
            ReadValue::ProjectToken(v) => self.project_token.complete(id.seq, v),
            ReadValue::SaleBalance(v) => self.sale_balance.complete(id.seq, v),
            ReadValue::Allowance(v) => self.allowance.complete(id.seq, v),
            ReadValue::TotalRaised(v) => self.total_raised.complete(id.seq, v),
            ReadValue::UserInfo(v) => self.user_info.complete(id.seq, v),
            ReadValue::ExpectedClaimAmount(v) => self.expected_claim_amount.complete(id.seq, v),
            ReadValue::AuctionWindow(v) => self.window.complete(id.seq, v),
            ReadValue::PriceCurve(v) => self.curve.complete(id.seq, v),
        };
        if applied {
            self.revision += 1;
        }
        applied
    }

    /// Ends a request without a value; the previous value stays in place.
    pub fn fail(&mut self, id: RequestId) {
        match id.key {
            ReadKey::SaleToken => self.sale_token.fail(id.seq),
            ReadKey::ProjectToken => self.project_token.fail(id.seq),
            ReadKey::SaleBalance => self.sale_balance.fail(id.seq),
            ReadKey::Allowance => self.allowance.fail(id.seq),
            ReadKey::TotalRaised => self.total_raised.fail(id.seq),
            ReadKey::UserInfo => self.user_info.fail(id.seq),
            ReadKey::ExpectedClaimAmount => self.expected_claim_amount.fail(id.seq),
            ReadKey::AuctionWindow => self.window.fail(id.seq),
            ReadKey::PriceCurve => self.curve.fail(id.seq),
        }
    }

    /// Issues and immediately applies a read.
    pub fn set(&mut self, value: ReadValue) {
        let id = self.begin(value.key());
        self.complete(id, value);
    }

    pub fn state(&self, key: ReadKey) -> ReadState {
        match key {
            ReadKey::SaleToken => self.sale_token.state(),
            ReadKey::ProjectToken => self.project_token.state(),
            ReadKey::SaleBalance => self.sale_balance.state(),
            ReadKey::Allowance => self.allowance.state(),
            ReadKey::TotalRaised => self.total_raised.state(),
            ReadKey::UserInfo => self.user_info.state(),
            ReadKey::ExpectedClaimAmount => self.expected_claim_amount.state(),
            ReadKey::AuctionWindow => self.window.state(),
            ReadKey::PriceCurve => self.curve.state(),
        }
    }

    /// Whether a request for `key` is in flight, including the first load.
    pub fn is_fetching(&self, key: ReadKey) -> bool {
        match key {
            ReadKey::SaleToken => self.sale_token.is_fetching(),
            ReadKey::ProjectToken => self.project_token.is_fetching(),
            ReadKey::SaleBalance => self.sale_balance.is_fetching(),
            ReadKey::Allowance => self.allowance.is_fetching(),
            ReadKey::TotalRaised => self.total_raised.is_fetching(),
            ReadKey::UserInfo => self.user_info.is_fetching(),
            ReadKey::ExpectedClaimAmount => self.expected_claim_amount.is_fetching(),
            ReadKey::AuctionWindow => self.window.is_fetching(),
            ReadKey::PriceCurve => self.curve.is_fetching(),
        }
    }

    pub fn sale_token(&self) -> Option<&TokenMetadata> {
        self.sale_token.value()
    }

    pub fn project_token(&self) -> Option<&TokenMetadata> {
        self.project_token.value()
    }

    pub fn sale_decimals(&self) -> Option<u8> {
        self.sale_token().map(|t| t.decimals)
    }

    pub fn project_decimals(&self) -> Option<u8> {
        self.project_token().map(|t| t.decimals)
    }

    pub fn sale_balance(&self) -> Option<Amount> {
        self.sale_balance.value().copied()
    }

    pub fn allowance(&self) -> Option<Amount> {
        self.allowance.value().copied()
    }

    pub fn total_raised(&self) -> Option<Amount> {
        self.total_raised.value().copied()
    }

    pub fn user_info(&self) -> Option<UserInfo> {
        self.user_info.value().copied()
    }

    pub fn expected_claim_amount(&self) -> Option<Amount> {
        self.expected_claim_amount.value().copied()
    }

    pub fn window(&self) -> Option<&AuctionWindow> {
        self.window.value()
    }

    pub fn curve(&self) -> Option<&PriceCurve> {
        self.curve.value()
    }

    /// The participant's position; absent while no wallet is connected or
    /// its reads have not loaded.
    pub fn user_position(&self) -> Option<UserPosition> {
        self.wallet?;
        let info = self.user_info()?;
        let expected_claim_amount = self.expected_claim_amount()?;
        Some(UserPosition {
            spent: info.contribution,
            has_claimed: info.has_claimed,
            expected_claim_amount,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn slot_states() {
        let mut snapshot = ChainSnapshot::new();
        assert_eq!(snapshot.state(ReadKey::Allowance), ReadState::NotLoaded);
        assert!(!snapshot.is_fetching(ReadKey::Allowance));

        let id = snapshot.begin(ReadKey::Allowance);
        assert_eq!(snapshot.state(ReadKey::Allowance), ReadState::NotLoaded);
        assert!(snapshot.is_fetching(ReadKey::Allowance));

        assert!(snapshot.complete(id, ReadValue::Allowance(5)));
        assert_eq!(snapshot.state(ReadKey::Allowance), ReadState::Loaded);
        assert_eq!(snapshot.allowance(), Some(5));

        let id = snapshot.begin(ReadKey::Allowance);
        assert_eq!(snapshot.state(ReadKey::Allowance), ReadState::Refreshing);
        snapshot.fail(id);
        assert_eq!(snapshot.state(ReadKey::Allowance), ReadState::Loaded);
        assert_eq!(snapshot.allowance(), Some(5));
    }

    #[test]
    fn newer_read_wins() {
        let mut snapshot = ChainSnapshot::new();
        let older = snapshot.begin(ReadKey::TotalRaised);
        let newer = snapshot.begin(ReadKey::TotalRaised);
        assert!(snapshot.complete(newer, ReadValue::TotalRaised(20)));
        assert!(!snapshot.complete(older, ReadValue::TotalRaised(10)));
        assert_eq!(snapshot.total_raised(), Some(20));
        assert_eq!(snapshot.state(ReadKey::TotalRaised), ReadState::Loaded);

        // an older completion arriving first is applied but the slot keeps
        // refreshing until the newest request resolves
        let older = snapshot.begin(ReadKey::TotalRaised);
        let newer = snapshot.begin(ReadKey::TotalRaised);
        assert!(snapshot.complete(older, ReadValue::TotalRaised(30)));
        assert_eq!(snapshot.state(ReadKey::TotalRaised), ReadState::Refreshing);
        assert!(snapshot.complete(newer, ReadValue::TotalRaised(40)));
        assert_eq!(snapshot.total_raised(), Some(40));
    }

    #[test]
    fn mismatched_value_is_rejected() {
        let mut snapshot = ChainSnapshot::new();
        let id = snapshot.begin(ReadKey::Allowance);
        assert!(!snapshot.complete(id, ReadValue::TotalRaised(1)));
        assert!(!snapshot.is_fetching(ReadKey::Allowance));
        assert_eq!(snapshot.allowance(), None);
    }

    #[test]
    fn wallet_change_drops_user_reads() {
        let mut snapshot = ChainSnapshot::new();
        let alice = Address([1; 20]);
        let bob = Address([2; 20]);
        snapshot.connect(alice, true);
        snapshot.set(ReadValue::Allowance(10));
        snapshot.set(ReadValue::TotalRaised(100));
        snapshot.set(ReadValue::UserInfo(UserInfo {
            contribution: 10,
            has_claimed: false,
        }));
        snapshot.set(ReadValue::ExpectedClaimAmount(7));
        assert_eq!(
            snapshot.user_position(),
            Some(UserPosition {
                spent: 10,
                has_claimed: false,
                expected_claim_amount: 7
            })
        );

        // reconnecting the same wallet keeps everything
        snapshot.connect(alice, true);
        assert_eq!(snapshot.allowance(), Some(10));

        let in_flight = snapshot.begin(ReadKey::Allowance);
        snapshot.connect(bob, true);
        assert_eq!(snapshot.allowance(), None);
        assert_eq!(snapshot.user_position(), None);
        assert_eq!(snapshot.total_raised(), Some(100));
        // a read issued for the previous wallet is discarded
        assert!(!snapshot.complete(in_flight, ReadValue::Allowance(10)));

        snapshot.disconnect();
        assert_eq!(snapshot.wallet(), None);
        assert!(!snapshot.network_supported());
    }

    #[test]
    fn revision_tracks_applied_values() {
        let mut snapshot = ChainSnapshot::new();
        let start = snapshot.revision();
        let id = snapshot.begin(ReadKey::PriceCurve);
        assert_eq!(snapshot.revision(), start);
        snapshot.fail(id);
        assert_eq!(snapshot.revision(), start);
        snapshot.set(ReadValue::TotalRaised(1));
        assert_eq!(snapshot.revision(), start + 1);
    }
}
