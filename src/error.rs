//! Error taxonomy for the trading engine.

use std::path::PathBuf;

use rust_decimal::Decimal;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Every failure the engine can report to a caller.
///
/// Local errors (`UnknownSymbol`, `InsufficientFunds`, `InvalidParameter`) are
/// raised before any ledger mutation. Remote errors (`Connectivity`, `Auth`,
/// `RemoteRejected`) only come from the live client and are never retried.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Insufficient {asset}: required {required}, available {available}")]
    InsufficientFunds {
        asset: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Account balance unavailable: {source}")]
    BalanceUnavailable {
        #[source]
        source: Box<EngineError>,
    },

    #[error("Exchange unreachable: {0}")]
    Connectivity(String),

    #[error("Exchange rejected credentials: {0}")]
    Auth(String),

    #[error("Exchange rejected request (HTTP {status}, code {code:?}): {message}")]
    RemoteRejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Ledger is locked by another writer ({}); remove the lock file if no session is running", .0.display())]
    LedgerBusy(PathBuf),

    #[error("Ledger I/O failed at {}: {source}", .path.display())]
    LedgerIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger record {} is not valid JSON: {source}", .path.display())]
    LedgerFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Ledger record {} is corrupt: {reason}", .path.display())]
    LedgerCorrupt { path: PathBuf, reason: String },
}

impl EngineError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True for errors that leave the ledger untouched and can be retried
    /// with different parameters.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownSymbol(_)
                | Self::InsufficientFunds { .. }
                | Self::InvalidParameter { .. }
                | Self::LedgerBusy(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_funds_message() {
        let err = EngineError::InsufficientFunds {
            asset: "USDT".to_string(),
            required: dec!(682500),
            available: dec!(10000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient USDT: required 682500, available 10000"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_balance_unavailable_keeps_source() {
        let err = EngineError::BalanceUnavailable {
            source: Box::new(EngineError::Connectivity("timed out".to_string())),
        };
        assert!(err.to_string().contains("timed out"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_remote_failures_are_not_recoverable() {
        let rejected = EngineError::RemoteRejected {
            status: 200,
            code: None,
            message: "unreadable response".to_string(),
        };
        assert!(!rejected.is_recoverable());
        assert!(EngineError::invalid("quantity", "USDT balance overflows").is_recoverable());
    }
}
