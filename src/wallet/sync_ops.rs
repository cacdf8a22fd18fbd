//! Synchronization operations
//!
//! Fetches address details, confirmed history and mempool entries from the
//! chain data client, reconciles pending transactions and writes the results
//! back into the address registry.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use super::address::{AddressHash, AddressRecord, PendingTransaction};
use super::reconcile;
use super::registry::{AddressRegistry, RegistrySnapshot};
use crate::error::WalletError;
use crate::explorer::{AddressDetails, ChainDataClient, Transaction};
use crate::notifications::{Notification, Notifier};

const OFFLINE_MESSAGE_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Uninitialized,
    Connecting,
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Loading,
}

/// Outcome of a details + first page refresh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Addresses written back to the registry
    pub updated: Vec<AddressHash>,
    /// Addresses whose fetch failed (already reported)
    pub failed: Vec<AddressHash>,
}

/// Outcome of a single-address page load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLoad {
    Loaded(usize),
    /// The page brought nothing new: all transactions are loaded
    Exhausted,
    /// Another page load of the same address is still running
    AlreadyLoading,
}

/// One page of the merged history of several addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressesPage {
    pub next_page: u32,
    pub transactions: Vec<Transaction>,
}

struct FetchedAccount {
    details: AddressDetails,
    first_page: Vec<Transaction>,
}

pub struct SyncCoordinator {
    registry: Arc<AddressRegistry>,
    client: Arc<dyn ChainDataClient>,
    notifier: Notifier,
    network_status: watch::Sender<NetworkStatus>,
    loading: AtomicUsize,
    in_flight: Mutex<HashSet<String>>,
}

/// Keeps the coordinator in `Loading` while alive
struct LoadingGuard<'a>(&'a AtomicUsize);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Marks an address (or address set) as having a page load in flight
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.key);
    }
}

impl SyncCoordinator {
    pub fn new(
        registry: Arc<AddressRegistry>,
        client: Arc<dyn ChainDataClient>,
        notifier: Notifier,
    ) -> Self {
        let (network_status, _) = watch::channel(NetworkStatus::Uninitialized);
        Self {
            registry,
            client,
            notifier,
            network_status,
            loading: AtomicUsize::new(0),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn registry(&self) -> &Arc<AddressRegistry> {
        &self.registry
    }

    pub fn client(&self) -> &Arc<dyn ChainDataClient> {
        &self.client
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn set_network_status(&self, status: NetworkStatus) {
        self.network_status.send_replace(status);
    }

    pub fn network_status(&self) -> NetworkStatus {
        *self.network_status.borrow()
    }

    pub fn subscribe_network_status(&self) -> watch::Receiver<NetworkStatus> {
        self.network_status.subscribe()
    }

    fn is_offline(&self) -> bool {
        self.network_status() == NetworkStatus::Offline
    }

    pub fn sync_state(&self) -> SyncState {
        if self.loading.load(Ordering::SeqCst) > 0 {
            SyncState::Loading
        } else {
            SyncState::Idle
        }
    }

    /// Busy while a batch runs or while any pending transaction awaits
    /// confirmation on the active network
    pub fn is_loading(&self) -> bool {
        if self.sync_state() == SyncState::Loading {
            return true;
        }
        let snapshot = self.registry.snapshot();
        let network = snapshot.network();
        let pending = snapshot
            .addresses()
            .any(|record| record.pending_on(network).next().is_some());
        pending
    }

    fn start_loading(&self) -> LoadingGuard<'_> {
        self.loading.fetch_add(1, Ordering::SeqCst);
        LoadingGuard(&self.loading)
    }

    fn try_begin(&self, key: String) -> Option<InFlightGuard<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !set.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            set: &self.in_flight,
            key,
        })
    }

    fn notify_offline(&self) {
        self.notifier.notify(
            Notification::alert(WalletError::NetworkUnavailable.to_string())
                .lasting(OFFLINE_MESSAGE_DURATION),
        );
    }

    async fn fetch_account(&self, address: &str) -> Result<FetchedAccount, WalletError> {
        log::debug!("Fetching details and latest transactions of {}", address);
        let details = self.client.get_address_details(address).await?;
        let first_page = self.client.get_confirmed_transactions(address, 1).await?;
        Ok(FetchedAccount {
            details,
            first_page,
        })
    }

    /// Refresh details and the first page of confirmed transactions, then
    /// reconcile pending transactions.
    ///
    /// An empty `addresses` refreshes every address of the active network.
    /// When `checking_for_pending_only` is set, only addresses whose pending
    /// set shrank are written back.
    pub async fn fetch_account_data(
        &self,
        addresses: Vec<AddressRecord>,
        checking_for_pending_only: bool,
    ) -> Result<SyncReport, WalletError> {
        let addresses = if addresses.is_empty() {
            self.registry.all()
        } else {
            addresses
        };

        if self.is_offline() {
            self.notify_offline();
            // Known records keep their latest copy, new ones get registered
            let unmodified = addresses
                .into_iter()
                .map(|address| self.registry.get(&address.hash).unwrap_or(address))
                .collect();
            self.registry.upsert_many(unmodified);
            return Err(WalletError::NetworkUnavailable);
        }

        let _loading = self.start_loading();
        let network = self.registry.network();
        log::info!("Fetching data of {} address(es) on {}", addresses.len(), network);

        let lookups = addresses.iter().map(|address| async move {
            (address.hash.clone(), self.fetch_account(&address.hash).await)
        });
        let results = join_all(lookups).await;

        let mut fetched = HashMap::new();
        let mut failed = Vec::new();
        for (hash, result) in results {
            match result {
                Ok(account) => {
                    fetched.insert(hash, account);
                }
                Err(e) => {
                    let error = WalletError::fetch_failed(&hash, e);
                    log::error!("{}", error);
                    self.notifier.notify(Notification::alert(error.to_string()));
                    failed.push(hash);
                }
            }
        }

        let to_write: Vec<AddressRecord> = addresses
            .into_iter()
            .filter(|address| fetched.contains_key(&address.hash))
            .collect();

        let updated = self.registry.update_many_on(network, to_write, |record| {
            let Some(account) = fetched.remove(&record.hash) else {
                return false;
            };
            record.details = account.details;
            record.merge_first_page(account.first_page);
            record.transactions.all_pages_loaded =
                record.transactions.confirmed.len() as u64 >= record.details.tx_number;

            let pending_before = record.transactions.pending.len();
            reconcile::apply(record);
            !checking_for_pending_only || record.transactions.pending.len() != pending_before
        });

        Ok(SyncReport { updated, failed })
    }

    /// Append the mempool transactions listed for the given addresses to
    /// their pending sets, skipping ids already pending. Confirmed history is
    /// left alone.
    ///
    /// An empty `addresses` checks every address of the active network.
    /// Returns the addresses that gained pending transactions.
    pub async fn fetch_pending_for_addresses(
        &self,
        addresses: Vec<AddressRecord>,
    ) -> Result<Vec<AddressHash>, WalletError> {
        let addresses = if addresses.is_empty() {
            self.registry.all()
        } else {
            addresses
        };

        if self.is_offline() {
            self.notify_offline();
            return Err(WalletError::NetworkUnavailable);
        }

        let _loading = self.start_loading();
        let network = self.registry.network();

        let lookups = addresses.iter().map(|address| {
            let client = self.client.clone();
            let hash = address.hash.clone();
            async move {
                log::debug!("Fetching unconfirmed transactions of {}", hash);
                let result = client.get_unconfirmed_transactions(&hash).await;
                (hash, result)
            }
        });
        let results = join_all(lookups).await;

        let mut found: HashMap<AddressHash, Vec<PendingTransaction>> = HashMap::new();
        for (hash, result) in results {
            match result {
                Ok(txs) => {
                    let unconfirmed: Vec<PendingTransaction> = txs
                        .iter()
                        .filter(|tx| tx.is_unconfirmed())
                        .map(|tx| PendingTransaction::from_unconfirmed(tx, &hash, network))
                        .collect();
                    if !unconfirmed.is_empty() {
                        found.insert(hash, unconfirmed);
                    }
                }
                Err(e) => {
                    let text = format!(
                        "Error while fetching pending transactions for address {}: {}",
                        hash, e
                    );
                    log::error!("{}", text);
                    self.notifier.notify(Notification::alert(text));
                }
            }
        }

        let to_write: Vec<AddressRecord> = addresses
            .into_iter()
            .filter(|address| found.contains_key(&address.hash))
            .collect();

        Ok(self.registry.update_many_on(network, to_write, |record| {
            let Some(txs) = found.remove(&record.hash) else {
                return false;
            };
            let mut added = false;
            for tx in txs {
                added |= record.add_pending_transaction(tx);
            }
            if added {
                reconcile::apply(record);
            }
            added
        }))
    }

    /// Load the next page of confirmed transactions of one address
    pub async fn fetch_next_page(&self, address: &str) -> Result<PageLoad, WalletError> {
        if self.is_offline() {
            return Err(WalletError::NetworkUnavailable);
        }
        let record = self
            .registry
            .get(address)
            .ok_or_else(|| WalletError::AddressNotFound(address.to_string()))?;

        let Some(_guard) = self.try_begin(address.to_string()) else {
            log::debug!("Page load of {} already running", address);
            return Ok(PageLoad::AlreadyLoading);
        };
        let _loading = self.start_loading();
        let network = self.registry.network();

        let page = record.transactions.loaded_page + 1;
        log::debug!("Fetching page {} of {}", page, address);
        let txs = match self.client.get_confirmed_transactions(address, page).await {
            Ok(txs) => txs,
            Err(e) => {
                let error = WalletError::fetch_failed(address, e);
                self.notifier.notify(Notification::alert(error.to_string()));
                return Err(error);
            }
        };

        let mut page_txs = Some(txs);
        let mut added = 0;
        self.registry.update_many_on(network, vec![record], |latest| {
            let txs = page_txs.take().unwrap_or_default();
            if txs.is_empty() {
                let changed = !latest.transactions.all_pages_loaded;
                latest.transactions.all_pages_loaded = true;
                return changed;
            }
            added = latest.append_page(txs);
            latest.transactions.loaded_page = latest.transactions.loaded_page.max(page);
            if added == 0 {
                latest.transactions.all_pages_loaded = true;
            }
            reconcile::apply(latest);
            true
        });

        // Removed, cleared or network switched while the page was loading
        if self.registry.network() != network || self.registry.get(address).is_none() {
            log::debug!("Discarded page {} of {}", page, address);
            return Err(WalletError::AddressNotFound(address.to_string()));
        }
        if added == 0 {
            Ok(PageLoad::Exhausted)
        } else {
            Ok(PageLoad::Loaded(added))
        }
    }

    /// Load one page of the merged history of several addresses and file
    /// each transaction under the addresses it involves.
    pub async fn fetch_addresses_next_page(
        &self,
        addresses: &[AddressHash],
        page: u32,
    ) -> Result<AddressesPage, WalletError> {
        if self.is_offline() {
            return Err(WalletError::NetworkUnavailable);
        }

        let mut sorted: Vec<&str> = addresses.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        let key = sorted.join(",");
        let Some(_guard) = self.try_begin(key.clone()) else {
            return Err(WalletError::AlreadyLoading(key));
        };
        let _loading = self.start_loading();
        let network = self.registry.network();

        let transactions = match self.client.get_addresses_transactions(addresses, page).await {
            Ok(txs) => txs,
            Err(e) => {
                let text = format!("Error while fetching transactions page {}: {}", page, e);
                self.notifier.notify(Notification::alert(text));
                return Err(e);
            }
        };

        let records: Vec<AddressRecord> = addresses
            .iter()
            .filter_map(|hash| self.registry.get(hash))
            .collect();

        self.registry.update_many_on(network, records, |record| {
            let mine: Vec<Transaction> = transactions
                .iter()
                .filter(|tx| tx.involves(&record.hash))
                .cloned()
                .collect();
            if record.append_page(mine) == 0 {
                return false;
            }
            reconcile::apply(record);
            true
        });

        Ok(AddressesPage {
            next_page: page + 1,
            transactions,
        })
    }

    /// Addresses the pending poller has to refresh
    pub fn addresses_to_poll(&self) -> Vec<AddressRecord> {
        addresses_to_poll(&self.registry.snapshot())
    }
}

/// Active-network addresses with pending transactions, plus the wallet's own
/// addresses those transactions pay into.
pub fn addresses_to_poll(snapshot: &RegistrySnapshot) -> Vec<AddressRecord> {
    let network = snapshot.network();

    let senders: Vec<&AddressRecord> = snapshot
        .addresses()
        .filter(|record| record.pending_on(network).next().is_some())
        .collect();

    let destinations: HashSet<&str> = senders
        .iter()
        .copied()
        .flat_map(|record| record.pending_on(network))
        .map(|tx| tx.to_address.as_str())
        .collect();

    let mut targets: Vec<AddressRecord> = snapshot
        .addresses()
        .filter(|record| {
            record.pending_on(network).next().is_some() || destinations.contains(record.hash.as_str())
        })
        .cloned()
        .collect();
    targets.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.hash.cmp(&b.hash)));
    targets
}
