//! Error types for the lottery engine
//!
//! Every failure is returned to the caller of the operation that produced it.
//! Nothing is retried internally; a failed operation leaves the engine unchanged.

use crate::types::{Address, RequestId, Wei};
use crate::upkeep::UpkeepDiagnostics;
use thiserror::Error;

/// Root error type for all lottery operations
#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("Insufficient payment: entrance fee is {required} wei, paid {paid} wei")]
    InsufficientPayment { required: Wei, paid: Wei },

    #[error("Lottery round is not open for entries")]
    RoundNotOpen,

    #[error("Player index {index} out of range ({len} players)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Upkeep not needed: {0}")]
    UpkeepNotNeeded(UpkeepDiagnostics),

    #[error("Randomness oracle unavailable: {0}")]
    OracleUnavailable(#[source] OracleError),

    #[error("Unknown randomness request {0}")]
    UnknownRequest(RequestId),

    #[error("Payout of {amount} wei to {winner} failed: {source}")]
    PayoutFailed {
        winner: Address,
        amount: Wei,
        #[source]
        source: TransferError,
    },

    #[error("Fulfillment for request {0} carried no random words")]
    MissingRandomWords(RequestId),

    #[error("Pool balance overflow")]
    BalanceOverflow,

    #[error("Lottery service stopped")]
    ServiceStopped,

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
}

/// Failures reported by the randomness oracle
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("Invalid subscription {0}")]
    InvalidSubscription(u64),

    #[error("Invalid number of words: {requested} (max {max})")]
    InvalidNumWords { requested: u32, max: u32 },

    #[error("Nonexistent request {0}")]
    NonexistentRequest(RequestId),

    #[error("Insufficient subscription balance: {balance} < {required}")]
    InsufficientBalance { balance: Wei, required: Wei },

    #[error("Consumer rejected fulfillment: {0}")]
    ConsumerRejected(String),

    #[error("Oracle unreachable: {0}")]
    Unreachable(String),
}

/// Failures reported by the funds transfer collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("Recipient {0} rejected the transfer")]
    Rejected(Address),

    #[error("Recipient balance overflow for {0}")]
    Overflow(Address),
}

/// Configuration and validation errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

// Convenience type alias for Results
pub type LotteryResult<T> = Result<T, LotteryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_error_display() {
        let err = LotteryError::InsufficientPayment { required: 10, paid: 9 };
        assert!(err.to_string().contains("10 wei"));
        assert!(err.to_string().contains("paid 9"));
    }

    #[test]
    fn test_error_source() {
        let err = LotteryError::PayoutFailed {
            winner: Address::repeat_byte(1),
            amount: 5,
            source: TransferError::Rejected(Address::repeat_byte(1)),
        };
        assert!(err.source().is_some());

        let err = LotteryError::OracleUnavailable(OracleError::InvalidSubscription(7));
        assert!(err.to_string().contains("Invalid subscription 7"));
    }

    #[test]
    fn test_error_conversion() {
        let config_error = ConfigurationError::LoadFailed("missing".to_string());
        let err: LotteryError = config_error.into();

        match err {
            LotteryError::Configuration(_) => {}
            _ => panic!("Expected configuration error"),
        }
    }
}
