//! Error types for address synchronization and signing-session handling

use thiserror::Error;

/// Application error code returned to a signing-session peer for every
/// rejected request.
pub const SESSION_ERROR_CODE: i64 = -32000;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Could not fetch data because the wallet is offline")]
    NetworkUnavailable,

    #[error("Error while fetching data for address {address}: {reason}")]
    FetchFailed { address: String, reason: String },

    #[error("Unknown signer address: {0}")]
    UnknownSigner(String),

    #[error("Method not supported: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid request params: {0}")]
    InvalidParams(String),

    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),

    #[error("Address not found: {0}")]
    AddressNotFound(String),

    #[error("No wallet is unlocked")]
    WalletLocked,

    #[error("Transactions of {0} are already being loaded")]
    AlreadyLoading(String),

    #[error("Explorer error: {0}")]
    Explorer(String),

    #[error("Node error: {0}")]
    Node(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Wallet directory not found: {0}")]
    DirectoryNotFound(String),
}

impl WalletError {
    pub fn fetch_failed(address: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            address: address.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        WalletError::Explorer(err.to_string())
    }
}
