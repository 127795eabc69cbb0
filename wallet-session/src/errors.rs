use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletError {
    // Session preconditions
    WalletNotSelected,
    WalletNotReady(String),
    WalletNotConnected,

    // Adapter pass-through errors
    WalletConnectionError(String),
    WalletDisconnectionError(String),
    WalletSignTransactionError(String),
    WalletSignAndSubmitTransactionError(String),
    WalletSignMessageError(String),
    WalletAccountChangeError(String),
    WalletNetworkChangeError(String),

    // Storage errors
    StorageError(String),
    StorageUnavailable,

    // Validation errors
    ValidationError(String),

    // Generic errors
    Unknown(String),
}

impl WalletError {
    /// True for the errors raised by the session itself rather than by an adapter.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            WalletError::WalletNotSelected
                | WalletError::WalletNotReady(_)
                | WalletError::WalletNotConnected
        )
    }

    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            WalletError::StorageError(_) | WalletError::StorageUnavailable
        )
    }
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WalletError::WalletNotSelected => write!(f, "Wallet not selected"),
            WalletError::WalletNotReady(name) => write!(f, "Wallet not ready: {}", name),
            WalletError::WalletNotConnected => write!(f, "Wallet not connected"),

            WalletError::WalletConnectionError(msg) => write!(f, "Connection error: {}", msg),
            WalletError::WalletDisconnectionError(msg) => {
                write!(f, "Disconnection error: {}", msg)
            }
            WalletError::WalletSignTransactionError(msg) => {
                write!(f, "Sign transaction error: {}", msg)
            }
            WalletError::WalletSignAndSubmitTransactionError(msg) => {
                write!(f, "Sign and submit transaction error: {}", msg)
            }
            WalletError::WalletSignMessageError(msg) => write!(f, "Sign message error: {}", msg),
            WalletError::WalletAccountChangeError(msg) => {
                write!(f, "Account change error: {}", msg)
            }
            WalletError::WalletNetworkChangeError(msg) => {
                write!(f, "Network change error: {}", msg)
            }

            WalletError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            WalletError::StorageUnavailable => write!(f, "Storage unavailable"),

            WalletError::ValidationError(msg) => write!(f, "Validation error: {}", msg),

            WalletError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for WalletError {}

pub type WalletResult<T> = Result<T, WalletError>;

// Helper macro for easy error creation
#[macro_export]
macro_rules! wallet_error {
    ($variant:ident, $msg:expr) => {
        $crate::errors::WalletError::$variant($msg.to_string())
    };
    ($variant:ident) => {
        $crate::errors::WalletError::$variant
    };
}

// Conversion helpers
impl From<std::io::Error> for WalletError {
    fn from(error: std::io::Error) -> Self {
        WalletError::StorageError(error.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(error: serde_json::Error) -> Self {
        WalletError::ValidationError(format!("JSON error: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(WalletError::WalletNotSelected.to_string(), "Wallet not selected");
        assert_eq!(
            WalletError::WalletNotReady("Petra".into()).to_string(),
            "Wallet not ready: Petra"
        );
        assert_eq!(
            wallet_error!(WalletConnectionError, "user rejected").to_string(),
            "Connection error: user rejected"
        );
    }

    #[test]
    fn classifies_precondition_errors() {
        assert!(WalletError::WalletNotConnected.is_precondition());
        assert!(!wallet_error!(WalletSignMessageError, "x").is_precondition());
        assert!(wallet_error!(StorageUnavailable).is_storage());
    }

    #[test]
    fn io_errors_map_to_storage() {
        let err: WalletError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(err.is_storage());
    }
}
