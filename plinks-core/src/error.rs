//! Error types for private payment links

use thiserror::Error;

use crate::amount::format_sol_fixed;

/// Result type alias for payment link operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used to decide how a front end reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A secret or link could not be decoded. Disable the dependent action.
    InvalidFormat,
    /// Local input check failed before any network call.
    Validation,
    /// Withdrawal precondition failed; nothing was submitted.
    BalanceTooLow,
    /// The shielded-pool SDK rejected the call.
    External,
    /// Another run of the same flow is still in flight.
    Busy,
    /// Client-side storage could not be read or written.
    Storage,
}

/// A rejection reported by the shielded-pool SDK.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PoolError {
    /// Message as reported by the SDK
    pub message: String,
    /// HTTP-like status code, when the SDK exposes one
    pub status: Option<u16>,
}

impl PoolError {
    /// Create an error from a bare message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    /// Create an error carrying a status code
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Whether the SDK refused the request as malformed (400 / Bad Request class)
    pub fn is_bad_request(&self) -> bool {
        self.status == Some(400)
            || self.message.contains("400")
            || self.message.contains("Bad Request")
    }
}

/// Errors that can occur while building links or running payment flows
#[derive(Debug, Error)]
pub enum Error {
    /// Secret is not base58 or does not decode to 32 bytes
    #[error("Invalid secret format: {0}")]
    InvalidSecret(String),

    /// Missing required link parameter
    #[error("Missing `{0}` in payment link")]
    MissingParameter(&'static str),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Amount is empty, malformed or not positive once converted to lamports
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// No wallet is connected to the session
    #[error("Connect a wallet")]
    WalletNotConnected,

    /// An explicitly blank recipient was supplied
    #[error("Recipient is required")]
    MissingRecipient,

    /// Estimated fees would consume the whole balance
    #[error(
        "Balance too low. Minimum withdrawal: ~{} SOL (to cover fees). Your balance: {} SOL",
        sol(.minimum, 4),
        sol(.balance, 9)
    )]
    BalanceTooLow {
        /// Scanned balance in lamports
        balance: u64,
        /// Smallest balance worth withdrawing, in lamports
        minimum: u64,
    },

    /// The scan found nothing spendable for this secret
    #[error("No private balance found for this link")]
    NothingToWithdraw,

    /// Deposit refused by the SDK as a bad request
    #[error("Deposit rejected: {0}")]
    DepositRejected(PoolError),

    /// Withdrawal refused by the SDK as a bad request
    #[error("Withdrawal rejected: balance may be too low to cover fees, or transaction is invalid.")]
    WithdrawalRejected(#[source] PoolError),

    /// Any other SDK failure, surfaced verbatim
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The flow is already running
    #[error("{0} already in progress")]
    Busy(&'static str),

    /// Filesystem error from a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored JSON could not be read back
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidSecret(_)
            | Error::MissingParameter(_)
            | Error::UrlParse(_) => ErrorKind::InvalidFormat,
            Error::InvalidAmount(_)
            | Error::WalletNotConnected
            | Error::MissingRecipient
            | Error::NothingToWithdraw => ErrorKind::Validation,
            Error::BalanceTooLow { .. } => ErrorKind::BalanceTooLow,
            Error::DepositRejected(_) | Error::WithdrawalRejected(_) | Error::Pool(_) => {
                ErrorKind::External
            }
            Error::Busy(_) => ErrorKind::Busy,
            Error::Io(_) | Error::Json(_) => ErrorKind::Storage,
        }
    }
}

fn sol(lamports: &u64, decimals: usize) -> String {
    format_sol_fixed(*lamports, decimals)
}

impl From<bs58::decode::Error> for Error {
    fn from(e: bs58::decode::Error) -> Self {
        Error::InvalidSecret(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_detection() {
        assert!(PoolError::with_status(400, "nope").is_bad_request());
        assert!(PoolError::new("request failed with status 400").is_bad_request());
        assert!(PoolError::new("Bad Request: proof invalid").is_bad_request());
        assert!(!PoolError::new("blockhash not found").is_bad_request());
        assert!(!PoolError::with_status(500, "internal").is_bad_request());
    }

    #[test]
    fn test_balance_too_low_names_minimum() {
        let err = Error::BalanceTooLow {
            balance: 1_000_000,
            minimum: 6_600_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("0.0066 SOL"));
        assert!(msg.contains("0.001000000 SOL"));
        assert_eq!(err.kind(), ErrorKind::BalanceTooLow);
    }

    #[test]
    fn test_pool_errors_pass_through_verbatim() {
        let err: Error = PoolError::new("blockhash not found").into();
        assert_eq!(err.to_string(), "blockhash not found");
        assert_eq!(err.kind(), ErrorKind::External);
    }
}
