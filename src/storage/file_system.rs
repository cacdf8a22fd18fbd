use chrono::Utc;
use std::fs;
use std::path::PathBuf;

use super::models::{StoredAddressMetadata, WalletAddressesFile};
use crate::error::StorageError;
use crate::wallet::address::AddressSettings;

const ADDRESSES_FILE: &str = "addresses.json";

#[derive(Clone)]
pub struct Storage {
    base_path: PathBuf,
}

impl Storage {
    /// Create a new storage instance with the default base directory ("./wallets")
    pub fn new() -> Self {
        Self {
            base_path: PathBuf::from("./wallets"),
        }
    }

    /// Create storage with custom base directory (for testing)
    pub fn new_with_base_dir(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the base directory path for wallet storage
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_path
    }

    /// Get the directory path for a specific wallet
    fn wallet_dir(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Check if metadata was ever stored for the given wallet
    pub fn wallet_exists(&self, name: &str) -> bool {
        self.wallet_dir(name).join(ADDRESSES_FILE).exists()
    }

    /// Load the stored address settings of a wallet, ordered by index.
    /// A wallet without a metadata file has no stored addresses.
    pub fn load_addresses_metadata(
        &self,
        name: &str,
    ) -> Result<Vec<StoredAddressMetadata>, StorageError> {
        let path = self.wallet_dir(name).join(ADDRESSES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(path)?;
        let file: WalletAddressesFile = serde_json::from_str(&contents)?;
        let mut addresses = file.addresses;
        addresses.sort_by_key(|entry| entry.index);
        Ok(addresses)
    }

    /// Store (or replace) the settings of the address at `index`
    pub fn store_address_metadata(
        &self,
        name: &str,
        index: u32,
        settings: &AddressSettings,
    ) -> Result<(), StorageError> {
        let mut addresses = self.load_addresses_metadata(name)?;
        match addresses.iter_mut().find(|entry| entry.index == index) {
            Some(entry) => entry.settings = settings.clone(),
            None => addresses.push(StoredAddressMetadata {
                index,
                settings: settings.clone(),
            }),
        }

        // Only one address can be the main one
        if settings.is_main {
            for entry in addresses.iter_mut().filter(|entry| entry.index != index) {
                entry.settings.is_main = false;
            }
        }

        let wallet_dir = self.wallet_dir(name);
        fs::create_dir_all(&wallet_dir)?;
        let file = WalletAddressesFile {
            wallet_name: name.to_string(),
            updated_at: Utc::now(),
            addresses,
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(wallet_dir.join(ADDRESSES_FILE), json)?;
        log::debug!("Stored settings of address #{} for wallet '{}'", index, name);
        Ok(())
    }

    /// Delete a wallet and all its associated data from disk
    pub fn delete_wallet(&self, name: &str) -> Result<(), StorageError> {
        let wallet_dir = self.wallet_dir(name);

        if !wallet_dir.exists() {
            return Err(StorageError::DirectoryNotFound(
                wallet_dir.display().to_string(),
            ));
        }

        log::warn!("Deleting wallet directory: {:?}", wallet_dir);
        fs::remove_dir_all(&wallet_dir)?;
        log::info!("Wallet '{}' deleted successfully", name);

        Ok(())
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}
