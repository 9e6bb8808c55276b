use concordium_cis2::Cis2Error;
use concordium_std::{num, LogError, ParseError, Reject, SchemaType, Serialize, UnwrapAbort};

pub type ContractResult<A> = Result<A, ContractError>;

/// Base error type. `InsufficientFunds` and `Unauthorized` come from the
/// wrapper; everything sale specific lives in [`CustomContractError`].
pub type ContractError = Cis2Error<CustomContractError>;

/// The different errors the contract can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    #[from(ParseError)]
    ParseParams,
    OverflowError,
    LogFull,
    LogMalformed,
    TransferError,
    AccountOnly,
    /// The four sale timestamps are not ordered, or lie in the past.
    InvalidSchedule,
    /// Purchases are not accepted in the current phase.
    PhaseClosed,
    /// Contribution below the accepted minimum.
    BelowMinimum,
    /// The active phase already sold out.
    CapReached,
    InsufficientAllowance,
    /// Coin transfers are closed until 14 days past the sale end.
    TransfersLocked,
    /// The family reserve is still locked.
    LockNotExpired,
    /// Ownership handover is closed until 30 days past the sale end.
    TooEarly,
    /// The treasury may only push funds back after a soft-cap miss.
    FundingNotAllowed,
    /// Refunds require an ended sale below the soft cap.
    RefundNotEligible,
}

impl From<CustomContractError> for ContractError {
    fn from(c: CustomContractError) -> Self {
        Cis2Error::Custom(c)
    }
}

impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}
