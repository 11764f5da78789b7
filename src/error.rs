//! Error types for the tray wallet core

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the tray wallet core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Tray errors
    #[error("Invalid amount: must be greater than zero")]
    InvalidAmount,

    #[error("Insufficient tray balance: {available} available, {required} required")]
    InsufficientTrayBalance { available: u64, required: u64 },

    #[error("Invalid slot balance: {0}")]
    InvalidSlotBalance(String),

    #[error("No slot can be broken down for the remaining {0}")]
    InvalidStepIndex(u64),

    #[error("Slot at index {0} is empty")]
    SlotAtIndexEmpty(usize),

    #[error("Tray balances overflow: {0}")]
    BalanceOverflow(String),

    // Derivation errors
    #[error("Malformed derivation path: {0}")]
    MalformedPath(String),

    #[error("Invalid mnemonic length: expected 12 or 24 words, got {0}")]
    InvalidMnemonicLength(usize),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Key derivation failed: {0}")]
    Derivation(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Tray errors leave the tray untouched and can be retried with a different amount
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::InvalidAmount
                | Error::InsufficientTrayBalance { .. }
                | Error::InvalidSlotBalance(_)
                | Error::InvalidStepIndex(_)
                | Error::SlotAtIndexEmpty(_)
        )
    }

    /// Check if this error came from parsing or deriving keys
    pub fn is_derivation(&self) -> bool {
        matches!(
            self,
            Error::MalformedPath(_)
                | Error::InvalidMnemonicLength(_)
                | Error::InvalidMnemonic(_)
                | Error::InvalidDomain(_)
                | Error::Derivation(_)
        )
    }
}

// Conversion from bip39 errors
impl From<bip39::Error> for Error {
    fn from(e: bip39::Error) -> Self {
        match e {
            bip39::Error::BadWordCount(count) => Error::InvalidMnemonicLength(count),
            other => Error::InvalidMnemonic(other.to_string()),
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
