/// Address management operations
///
/// Handles address creation, settings and the initial population of the
/// registry when a wallet is unlocked.

use std::sync::Arc;

use super::address::{AddressHash, AddressRecord, AddressSettings, DerivedKey, TOTAL_NUMBER_OF_GROUPS};
use super::sync_ops::SyncCoordinator;
use crate::error::WalletError;
use crate::storage::Storage;

/// Deterministic key derivation from the wallet's master key
pub trait KeyDeriver: Send + Sync {
    /// Derive the key at a fixed index
    fn derive_at_index(&self, index: u32) -> Result<DerivedKey, WalletError>;

    /// Derive the first key of `group` whose index is not in `skip_indexes`
    fn derive_for_group(&self, group: u32, skip_indexes: &[u32]) -> Result<DerivedKey, WalletError>;
}

/// The unlocked wallet as seen by address operations
#[derive(Clone)]
pub struct WalletKeys {
    pub name: String,
    pub deriver: Arc<dyn KeyDeriver>,
    /// Passphrase wallets never persist address metadata
    pub passphrase_used: bool,
}

fn persist_settings(
    storage: &Storage,
    keys: &WalletKeys,
    index: u32,
    settings: &AddressSettings,
) -> Result<(), WalletError> {
    if keys.passphrase_used {
        return Ok(());
    }
    storage.store_address_metadata(&keys.name, index, settings)?;
    Ok(())
}

/// Refresh details, first page and mempool entries of freshly registered
/// records. Failures are already reported through the notifier.
async fn fetch_new_addresses(coordinator: &SyncCoordinator, records: Vec<AddressRecord>) {
    if let Err(e) = coordinator.fetch_account_data(records.clone(), false).await {
        log::debug!("Initial data fetch skipped: {}", e);
    }
    if let Err(e) = coordinator.fetch_pending_for_addresses(records).await {
        log::debug!("Initial pending fetch skipped: {}", e);
    }
}

/// Persist, register and fetch a new address
pub async fn save_new_address(
    coordinator: &SyncCoordinator,
    storage: &Storage,
    keys: &WalletKeys,
    record: AddressRecord,
) -> Result<AddressHash, WalletError> {
    persist_settings(storage, keys, record.index, &record.settings)?;
    let hash = record.hash.clone();
    log::info!("Saving new address #{} ({})", record.index, record.short_hash());
    if record.is_main() {
        demote_main_addresses(coordinator, &hash);
    }
    coordinator.registry().upsert(record.clone());
    fetch_new_addresses(coordinator, vec![record]).await;
    Ok(hash)
}

/// Create one address in every group not listed in `skip_groups`.
///
/// Indexes already used on the active network are never reused. Labels are
/// set to "<prefix> <group>" only when both a prefix and a color are given.
pub async fn generate_one_address_per_group(
    coordinator: &SyncCoordinator,
    storage: &Storage,
    keys: &WalletKeys,
    label_prefix: Option<&str>,
    color: Option<&str>,
    skip_groups: &[u32],
) -> Result<Vec<AddressHash>, WalletError> {
    let mut skip_indexes: Vec<u32> = coordinator.registry().all().iter().map(|r| r.index).collect();
    let label = match (label_prefix, color) {
        (Some(prefix), Some(color)) if !prefix.is_empty() && !color.is_empty() => {
            Some((prefix, color))
        }
        _ => None,
    };

    let mut created = Vec::new();
    for group in (0..TOTAL_NUMBER_OF_GROUPS).filter(|group| !skip_groups.contains(group)) {
        let key = keys.deriver.derive_for_group(group, &skip_indexes)?;
        skip_indexes.push(key.index);

        let settings = AddressSettings {
            is_main: false,
            label: label.map(|(prefix, _)| format!("{} {}", prefix, key.group)),
            color: label.map(|(_, color)| color.to_string()),
        };
        let record = AddressRecord::new(key, settings);
        persist_settings(storage, keys, record.index, &record.settings)?;
        coordinator.registry().upsert(record.clone());
        created.push(record);
    }

    log::info!("Generated {} address(es), one per group", created.len());
    let hashes = created.iter().map(|record| record.hash.clone()).collect();
    fetch_new_addresses(coordinator, created).await;
    Ok(hashes)
}

/// Replace the settings of an existing address
pub fn update_address_settings(
    coordinator: &SyncCoordinator,
    storage: &Storage,
    keys: &WalletKeys,
    hash: &str,
    settings: AddressSettings,
) -> Result<AddressRecord, WalletError> {
    let mut record = coordinator
        .registry()
        .get(hash)
        .ok_or_else(|| WalletError::AddressNotFound(hash.to_string()))?;

    persist_settings(storage, keys, record.index, &settings)?;
    if settings.is_main && !record.is_main() {
        demote_main_addresses(coordinator, hash);
    }
    record.settings = settings;
    coordinator.registry().upsert(record.clone());
    Ok(record)
}

fn demote_main_addresses(coordinator: &SyncCoordinator, new_main: &str) {
    let previous: Vec<AddressRecord> = coordinator
        .registry()
        .all()
        .into_iter()
        .filter(|record| record.is_main() && record.hash != new_main)
        .collect();
    coordinator.registry().update_many(previous, |record| {
        record.settings.is_main = false;
        true
    });
}

/// Populate the registry for the active network.
///
/// Stored metadata is re-derived index by index. A wallet without stored
/// metadata (or a passphrase wallet) starts with its main address at index 0.
pub async fn initialize_addresses(
    coordinator: &SyncCoordinator,
    storage: &Storage,
    keys: &WalletKeys,
) -> Result<Vec<AddressHash>, WalletError> {
    log::info!("Initializing addresses of wallet '{}' on {}", keys.name, coordinator.registry().network());

    let metadata = if keys.passphrase_used {
        Vec::new()
    } else {
        storage.load_addresses_metadata(&keys.name)?
    };

    if metadata.is_empty() {
        let key = keys.deriver.derive_at_index(0)?;
        let settings = AddressSettings {
            is_main: true,
            label: None,
            color: None,
        };
        let hash = save_new_address(coordinator, storage, keys, AddressRecord::new(key, settings)).await?;
        return Ok(vec![hash]);
    }

    log::debug!("Found metadata of {} stored address(es)", metadata.len());
    let records = metadata
        .into_iter()
        .map(|entry| {
            let key = keys.deriver.derive_at_index(entry.index)?;
            Ok::<_, WalletError>(AddressRecord::new(key, entry.settings))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let hashes = records.iter().map(|record| record.hash.clone()).collect();
    coordinator.registry().upsert_many(records.clone());
    fetch_new_addresses(coordinator, records).await;
    Ok(hashes)
}
