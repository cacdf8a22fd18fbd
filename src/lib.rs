//! wallet-sync: address and transaction synchronization for a light wallet
//!
//! This crate keeps per-address wallet state (keys, settings, balances and
//! transaction history) in sync with a remote explorer, reconciles locally
//! submitted transactions against confirmed chain data and handles signing
//! requests coming from connected dApps.
//!
//! # Architecture
//!
//! - **Address Registry**: network-scoped store of address records with
//!   change notification
//! - **Sync Coordinator**: fetches details, history pages and mempool entries
//!   and reconciles pending transactions
//! - **Pending Poller**: cancellable background task refreshing addresses
//!   until their pending transactions confirm
//! - **Session Handler**: turns dApp requests into transaction intents and
//!   answers the peer
//!
//! # Example
//!
//! ```ignore
//! use wallet_sync::{SyncConfig, WalletManager, WalletKeys};
//!
//! let config = SyncConfig::from_env()?;
//! let mut manager = WalletManager::new(config);
//!
//! manager.unlock(WalletKeys {
//!     name: "main".to_string(),
//!     deriver: Arc::new(my_deriver),
//!     passphrase_used: false,
//! }).await?;
//!
//! manager.refresh_addresses_data().await?;
//! ```

// Public modules
pub mod amount;
pub mod config;
pub mod error;
pub mod explorer;
pub mod notifications;
pub mod storage;
pub mod wallet;
pub mod walletconnect;

// Re-exports for convenience
pub use amount::{Amount, NATIVE_ASSET_ID};
pub use config::{NetworkName, SyncConfig};
pub use error::{StorageError, WalletError, SESSION_ERROR_CODE};
pub use explorer::{ChainDataClient, ExplorerClient};
pub use notifications::{Notification, NotificationKind, Notifier};
pub use storage::Storage;
pub use wallet::{
    AddressRecord, AddressRegistry, KeyDeriver, NetworkStatus, PendingTxPoller, SyncCoordinator,
    WalletKeys, WalletManager,
};
pub use walletconnect::{SessionLifecycle, SessionRequestHandler, SessionTransport};

pub type Result<T> = std::result::Result<T, WalletError>;
