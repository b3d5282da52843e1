//! Error taxonomy for the transfer path
//!
//! Input errors fail before any network call. Network errors are retryable
//! by the caller. A chain rejection carries the provider's error text
//! verbatim, since it is usually diagnostic (expired message, insufficient
//! balance). Construction errors wrap failures from the cell layer; they
//! indicate a wrong binary layout and are never swallowed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("mnemonic must have exactly 24 words, got {0}")]
    WrongWordCount(usize),

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("rejected by chain: {0}")]
    Rejected(String),

    #[error("message construction failed: {0}")]
    Construction(#[from] anyhow::Error),
}

impl TransferError {
    /// Whether the caller may safely retry the whole operation
    ///
    /// Only transport-level failures qualify. A chain rejection must not be
    /// resubmitted without re-fetching the sequence number first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

pub type TransferResult<T> = Result<T, TransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(TransferError::Network("timeout".into()).is_retryable());
        assert!(!TransferError::Rejected("exitcode=33".into()).is_retryable());
        assert!(!TransferError::WrongWordCount(12).is_retryable());
    }
}
