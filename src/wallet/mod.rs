/// Wallet Core Module
///
/// Address synchronization split by concern:
///
/// - `manager.rs` - Orchestrator for an unlocked wallet
/// - `address.rs` - Address records and pending transactions
/// - `address_ops.rs` - Address creation and settings
/// - `registry.rs` - Network-scoped address store
/// - `reconcile.rs` - Pending transaction reconciliation
/// - `sync_ops.rs` - Fetching and merging chain data
/// - `polling.rs` - Pending transaction poller

pub mod address;
pub mod address_ops;
pub mod polling;
pub mod reconcile;
pub mod registry;
pub mod sync_ops;

// Main manager (orchestrator)
pub mod manager;

pub use address::{AddressHash, AddressRecord, AddressSettings, PendingTransaction, PendingTxType};
pub use address_ops::{KeyDeriver, WalletKeys};
pub use manager::WalletManager;
pub use polling::PendingTxPoller;
pub use registry::{AddressRegistry, RegistrySnapshot};
pub use sync_ops::{NetworkStatus, PageLoad, SyncCoordinator, SyncReport, SyncState};
