/// Address registry
///
/// Keyed store of every known address record, scoped by network. Each
/// mutation publishes a new immutable snapshot on a `watch` channel so that
/// subscribers (the UI layer, the pending poller) can react to changes.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

use super::address::{AddressHash, AddressRecord};
use crate::config::NetworkName;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressKey {
    pub hash: AddressHash,
    pub network: NetworkName,
}

impl AddressKey {
    pub fn new(hash: &str, network: NetworkName) -> Self {
        Self {
            hash: hash.to_string(),
            network,
        }
    }
}

/// Immutable view of the registry at one point in time
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    network: NetworkName,
    records: Arc<HashMap<AddressKey, AddressRecord>>,
    version: u64,
}

impl RegistrySnapshot {
    pub fn network(&self) -> NetworkName {
        self.network
    }

    /// Bumped on every published mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, hash: &str) -> Option<&AddressRecord> {
        self.records.get(&AddressKey::new(hash, self.network))
    }

    /// Records of the active network, in no particular order
    pub fn addresses(&self) -> impl Iterator<Item = &AddressRecord> {
        let network = self.network;
        self.records
            .iter()
            .filter(move |(key, _)| key.network == network)
            .map(|(_, record)| record)
    }

    /// Every record regardless of network
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct AddressRegistry {
    state: watch::Sender<RegistrySnapshot>,
}

impl AddressRegistry {
    pub fn new(network: NetworkName) -> Self {
        let (state, _) = watch::channel(RegistrySnapshot {
            network,
            records: Arc::new(HashMap::new()),
            version: 0,
        });
        Self { state }
    }

    pub fn subscribe(&self) -> watch::Receiver<RegistrySnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.state.borrow().clone()
    }

    pub fn network(&self) -> NetworkName {
        self.state.borrow().network
    }

    /// Record of `hash` on the active network
    pub fn get(&self, hash: &str) -> Option<AddressRecord> {
        self.state.borrow().get(hash).cloned()
    }

    /// Records of the active network
    pub fn all(&self) -> Vec<AddressRecord> {
        self.state.borrow().addresses().cloned().collect()
    }

    pub fn main_address(&self) -> Option<AddressRecord> {
        self.state
            .borrow()
            .addresses()
            .find(|record| record.is_main())
            .cloned()
    }

    pub fn upsert(&self, record: AddressRecord) {
        self.upsert_many(vec![record]);
    }

    /// Store records under the active network, replacing previous entries.
    /// Publishes nothing when `records` is empty.
    pub fn upsert_many(&self, records: Vec<AddressRecord>) {
        if records.is_empty() {
            return;
        }
        let count = records.len();
        self.state.send_modify(|snapshot| {
            let network = snapshot.network;
            let map = Arc::make_mut(&mut snapshot.records);
            for mut record in records {
                record.network = Some(network);
                map.insert(AddressKey::new(&record.hash, network), record);
            }
            snapshot.version += 1;
        });
        log::debug!("Updated {} address record(s)", count);
    }

    /// Read-modify-write against the latest state in one step.
    ///
    /// Each record is replaced by its current registry copy and handed to
    /// `f`; the result is stored only when `f` returns true. Records no
    /// longer held on the active network are skipped, never re-inserted.
    /// Subscribers are notified once, and only if something was stored.
    /// Returns the hashes that were written.
    pub fn update_many<F>(&self, records: Vec<AddressRecord>, f: F) -> Vec<AddressHash>
    where
        F: FnMut(&mut AddressRecord) -> bool,
    {
        self.write_back(None, records, f)
    }

    /// Like [`update_many`](Self::update_many), for results fetched while
    /// `network` was active. Nothing is written once the active network
    /// has changed.
    pub fn update_many_on<F>(
        &self,
        network: NetworkName,
        records: Vec<AddressRecord>,
        f: F,
    ) -> Vec<AddressHash>
    where
        F: FnMut(&mut AddressRecord) -> bool,
    {
        self.write_back(Some(network), records, f)
    }

    fn write_back<F>(
        &self,
        expected: Option<NetworkName>,
        records: Vec<AddressRecord>,
        mut f: F,
    ) -> Vec<AddressHash>
    where
        F: FnMut(&mut AddressRecord) -> bool,
    {
        let mut written = Vec::new();
        self.state.send_if_modified(|snapshot| {
            let network = snapshot.network;
            if let Some(expected) = expected.filter(|expected| *expected != network) {
                log::debug!(
                    "Dropping {} record(s) fetched for {}, active network is {}",
                    records.len(),
                    expected,
                    network
                );
                return false;
            }
            let mut changed = Vec::new();
            for stale in records {
                let key = AddressKey::new(&stale.hash, network);
                let Some(mut record) = snapshot.records.get(&key).cloned() else {
                    log::debug!("Skipping write of {}, no longer registered", stale.hash);
                    continue;
                };
                if f(&mut record) {
                    record.network = Some(network);
                    changed.push((key, record));
                }
            }
            if changed.is_empty() {
                return false;
            }
            let map = Arc::make_mut(&mut snapshot.records);
            for (key, record) in changed {
                written.push(key.hash.clone());
                map.insert(key, record);
            }
            snapshot.version += 1;
            true
        });
        written
    }

    /// Drop one address of the active network
    pub fn remove(&self, hash: &str) -> Option<AddressRecord> {
        let mut removed = None;
        self.state.send_if_modified(|snapshot| {
            let key = AddressKey::new(hash, snapshot.network);
            if !snapshot.records.contains_key(&key) {
                return false;
            }
            removed = Arc::make_mut(&mut snapshot.records).remove(&key);
            snapshot.version += 1;
            true
        });
        removed
    }

    /// Forget every record of every network (wallet lock or switch)
    pub fn clear(&self) {
        self.state.send_if_modified(|snapshot| {
            if snapshot.records.is_empty() {
                return false;
            }
            snapshot.records = Arc::new(HashMap::new());
            snapshot.version += 1;
            true
        });
    }

    /// Switch the active network. Records of other networks stay stored.
    pub fn set_network(&self, network: NetworkName) {
        self.state.send_if_modified(|snapshot| {
            if snapshot.network == network {
                return false;
            }
            log::info!("Switching address registry from {} to {}", snapshot.network, network);
            snapshot.network = network;
            snapshot.version += 1;
            true
        });
    }
}
