use crate::state::ActionKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("a required chain read has not resolved yet")]
    UnresolvedInput,
    #[error("the entered amount is not a valid positive token amount")]
    InvalidAmount,
    #[error("invalid address")]
    InvalidAddress,
    #[error("auction start time must precede its end time")]
    InvalidWindow,
    #[error("a {0} transaction is already pending")]
    TransactionPending(ActionKind),
    #[error("no enabled action is available")]
    ActionNotEnabled,
    #[error("the request was prepared against outdated chain data")]
    StaleRequest,
    #[error("unknown transaction handle")]
    UnknownTransaction,
    #[error("the transaction was rejected")]
    TransactionRejected,
}

impl ControllerError {
    /// Stable numeric code of the error, used in logs.
    pub fn code(&self) -> u32 {
        match self {
            Self::UnresolvedInput => 600,
            Self::InvalidAmount => 601,
            Self::InvalidAddress => 602,
            Self::InvalidWindow => 603,
            Self::TransactionPending(_) => 604,
            Self::ActionNotEnabled => 605,
            Self::StaleRequest => 606,
            Self::UnknownTransaction => 607,
            Self::TransactionRejected => 608,
        }
    }
}

