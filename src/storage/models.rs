//! Data models for address metadata storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::wallet::address::AddressSettings;

/// Settings of one address, keyed by derivation index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAddressMetadata {
    pub index: u32,
    #[serde(flatten)]
    pub settings: AddressSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAddressesFile {
    pub wallet_name: String,
    pub updated_at: DateTime<Utc>,
    pub addresses: Vec<StoredAddressMetadata>,
}
