//! Storage and persistence layer
//!
//! - File system operations
//! - Address metadata models

mod file_system;
mod models;

pub use file_system::Storage;
pub use models::{StoredAddressMetadata, WalletAddressesFile};
