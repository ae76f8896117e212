use crate::error::ControllerError;

use log::debug;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Token amount in base units (scaled by the token's decimals).
pub type Amount = u128;
/// Seconds since the unix epoch, as reported by the chain.
pub type UnixTimestamp = i64;

/// A 20 byte account or contract address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null address, used as the default referral.
    pub const ZERO: Address = Address([0; 20]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Address {
    /// Decodes 20 hex encoded bytes, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0_u8; 20];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl FromStr for Address {
    type Err = ControllerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).map_err(|err| {
            debug!("invalid address {:?}: {}", s, err);
            ControllerError::InvalidAddress
        })
    }
}

/// Reference of a submitted transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[cfg(feature = "client")]
mod serde_impls {
    use super::Address;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Address {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s)
                .map_err(|err| D::Error::custom(format!("invalid address {:?}: {}", s, err)))
        }
    }
}

/// Start and end of the auction (in seconds).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuctionWindow {
    start_time: UnixTimestamp,
    end_time: UnixTimestamp,
}

impl AuctionWindow {
    pub fn new(start_time: UnixTimestamp, end_time: UnixTimestamp) -> Result<Self, ControllerError> {
        if start_time >= end_time {
            return Err(ControllerError::InvalidWindow);
        }
        Ok(Self {
            start_time,
            end_time,
        })
    }

    pub fn start_time(&self) -> UnixTimestamp {
        self.start_time
    }

    pub fn end_time(&self) -> UnixTimestamp {
        self.end_time
    }
}

/// Where the auction stands relative to the current time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuctionTiming {
    pub has_started: bool,
    /// Implies `has_started`.
    pub has_ended: bool,
    /// Zero once the auction has ended.
    pub remaining: Duration,
}

/// Parameters of the fair auction's price curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceCurve {
    /// Project tokens distributed when the floor raise is reached (in base
    /// units).
    pub max_project_tokens: Amount,
    /// Raise required to distribute all project tokens (in sale token base
    /// units).
    pub min_raise: Amount,
    /// Hard cap of the raise (in sale token base units).
    pub max_raise: Amount,
}

/// Price bounds derived from the curve and the current raise. All values are
/// in sale token base units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PriceBounds {
    pub min_raise: Amount,
    pub max_raise: Amount,
    /// Price of one whole project token, `None` if it does not fit an
    /// [`Amount`].
    pub token_price: Option<Amount>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMetadata {
    pub decimals: u8,
    pub symbol: String,
}

/// The participant's record as stored by the auction contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub contribution: Amount,
    pub has_claimed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllowanceState {
    pub value: Amount,
    pub needs_approval: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserPosition {
    pub spent: Amount,
    pub has_claimed: bool,
    pub expected_claim_amount: Amount,
}

/// The three write operations a participant may perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKind {
    Approve,
    Deposit,
    Claim,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [Self::Approve, Self::Deposit, Self::Claim];

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Approve => 0,
            Self::Deposit => 1,
            Self::Claim => 2,
        }
    }

    /// Description stored in the recent transaction log.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Approve => "Approval tx",
            Self::Deposit => "Buy tx",
            Self::Claim => "Claim tx",
        }
    }

    /// Message of the success notification.
    pub fn success_message(&self) -> &'static str {
        match self {
            Self::Approve => "Approval successfully confirmed",
            Self::Deposit => "Buy successfully confirmed",
            Self::Claim => "Claim successfully confirmed",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Approve => "approve",
            Self::Deposit => "deposit",
            Self::Claim => "claim",
        };
        f.write_str(name)
    }
}

/// A submitted transaction awaiting confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTransaction {
    pub kind: ActionKind,
    pub hash: TxHash,
    /// Set once the receipt arrived; the slot stays occupied until the
    /// dependent reads have been refreshed.
    pub confirmed: bool,
}

/// Write request handed to the wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxRequest {
    Approve { spender: Address, amount: Amount },
    Buy { amount: Amount, referral: Address },
    Claim,
}

impl TxRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Approve { .. } => ActionKind::Approve,
            Self::Buy { .. } => ActionKind::Deposit,
            Self::Claim => ActionKind::Claim,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn address_parsing() {
        let address: Address = "0x00000000000000000000000000000000000000ff".parse().unwrap();
        assert_eq!(address.0[19], 0xff);
        assert_eq!(
            address.to_string(),
            "0x00000000000000000000000000000000000000ff"
        );
        let unprefixed: Address = "00000000000000000000000000000000000000ff".parse().unwrap();
        assert_eq!(address, unprefixed);
        assert_eq!(
            "0x00ff".parse::<Address>(),
            Err(ControllerError::InvalidAddress)
        );
        assert_eq!(
            "0xzz000000000000000000000000000000000000ff".parse::<Address>(),
            Err(ControllerError::InvalidAddress)
        );
        assert!(Address::ZERO.is_zero());
        assert_eq!(
            Address::from_hex("0x00ff"),
            Err(hex::FromHexError::InvalidStringLength)
        );
        assert_eq!(
            Address::from_hex("0xzz000000000000000000000000000000000000ff"),
            Err(hex::FromHexError::InvalidHexCharacter { c: 'z', index: 0 })
        );
    }

    #[cfg(feature = "client")]
    #[test]
    fn address_deserialize_error_names_input() {
        let input = "0xzz000000000000000000000000000000000000ff";
        let err = serde_json::from_str::<Address>(&format!("\"{}\"", input)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&format!("invalid address \"{}\"", input)));
        assert!(message.contains("Invalid character 'z' at position 0"));
    }

    #[test]
    fn window_ordering() {
        assert!(AuctionWindow::new(10, 20).is_ok());
        assert_eq!(
            AuctionWindow::new(20, 20),
            Err(ControllerError::InvalidWindow)
        );
        assert_eq!(
            AuctionWindow::new(30, 20),
            Err(ControllerError::InvalidWindow)
        );
    }

    #[test]
    fn request_kinds() {
        let request = TxRequest::Buy {
            amount: 1,
            referral: Address::ZERO,
        };
        assert_eq!(request.kind(), ActionKind::Deposit);
        assert_eq!(TxRequest::Claim.kind(), ActionKind::Claim);
        assert_eq!(ActionKind::Deposit.description(), "Buy tx");
    }

    #[cfg(feature = "client")]
    #[test]
    fn address_serde() {
        let address = Address([0xab; 20]);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), address);
        assert!(serde_json::from_str::<Address>("\"0xab\"").is_err());
    }
}
