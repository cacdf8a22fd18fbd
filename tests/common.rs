//! Common test utilities for wallet sync integration tests
//!
//! This module provides shared test infrastructure including:
//! - A scriptable in-memory chain data client with call counters
//! - A deterministic key deriver
//! - A transport recording every response sent to the peer
//! - Builders for transactions and address records
#![allow(dead_code)]

use async_trait::async_trait;
use num_bigint::BigUint;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use wallet_sync::explorer::{
    AddressDetails, ApiRequest, Input, Output, Token, Transaction, UnconfirmedTransaction,
};
use wallet_sync::wallet::address::{
    AddressRecord, AddressSettings, DerivedKey, PendingTransaction, PendingTxType,
    TOTAL_NUMBER_OF_GROUPS,
};
use wallet_sync::walletconnect::JsonRpcResponse;
use wallet_sync::{
    ChainDataClient, KeyDeriver, NetworkName, Notifier, SessionTransport, Storage, SyncConfig,
    SyncCoordinator, WalletError, WalletKeys, WalletManager,
};
use wallet_sync::wallet::{AddressRegistry, NetworkStatus};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn amount(value: u64) -> BigUint {
    BigUint::from(value)
}

// ============================================================================
// Chain data client
// ============================================================================

#[derive(Default)]
struct MockState {
    details: HashMap<String, AddressDetails>,
    /// Pages of confirmed transactions, page 1 first
    pages: HashMap<String, Vec<Vec<Transaction>>>,
    unconfirmed: HashMap<String, Vec<UnconfirmedTransaction>>,
    multi_pages: Vec<Vec<Transaction>>,
    failing: HashSet<String>,
    node_response: Option<Value>,
    explorer_response: Option<Value>,
    api_requests: Vec<ApiRequest>,
}

#[derive(Default)]
pub struct MockChainClient {
    state: Mutex<MockState>,
    delay: Mutex<Option<Duration>>,
    pub details_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub unconfirmed_calls: AtomicUsize,
    pub multi_page_calls: AtomicUsize,
}

impl MockChainClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn set_details(&self, address: &str, balance: u64, tx_number: u64) {
        self.state().details.insert(
            address.to_string(),
            AddressDetails {
                balance: amount(balance),
                locked_balance: amount(0),
                tx_number,
            },
        );
    }

    pub fn set_pages(&self, address: &str, pages: Vec<Vec<Transaction>>) {
        self.state().pages.insert(address.to_string(), pages);
    }

    pub fn set_unconfirmed(&self, address: &str, txs: Vec<UnconfirmedTransaction>) {
        self.state().unconfirmed.insert(address.to_string(), txs);
    }

    pub fn set_multi_pages(&self, pages: Vec<Vec<Transaction>>) {
        self.state().multi_pages = pages;
    }

    pub fn fail_for(&self, address: &str) {
        self.state().failing.insert(address.to_string());
    }

    pub fn heal(&self, address: &str) {
        self.state().failing.remove(address);
    }

    pub fn set_node_response(&self, value: Value) {
        self.state().node_response = Some(value);
    }

    pub fn set_explorer_response(&self, value: Value) {
        self.state().explorer_response = Some(value);
    }

    pub fn api_requests(&self) -> Vec<ApiRequest> {
        self.state().api_requests.clone()
    }

    /// Slow down every page fetch
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    async fn maybe_wait(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self, address: &str) -> Result<(), WalletError> {
        if self.state().failing.contains(address) {
            return Err(WalletError::Explorer("503 Service Unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainDataClient for MockChainClient {
    async fn get_address_details(&self, address: &str) -> Result<AddressDetails, WalletError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        self.check(address)?;
        Ok(self.state().details.get(address).cloned().unwrap_or_default())
    }

    async fn get_confirmed_transactions(
        &self,
        address: &str,
        page: u32,
    ) -> Result<Vec<Transaction>, WalletError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_wait().await;
        self.check(address)?;
        Ok(self
            .state()
            .pages
            .get(address)
            .and_then(|pages| pages.get(page.saturating_sub(1) as usize))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_unconfirmed_transactions(
        &self,
        address: &str,
    ) -> Result<Vec<UnconfirmedTransaction>, WalletError> {
        self.unconfirmed_calls.fetch_add(1, Ordering::SeqCst);
        self.check(address)?;
        Ok(self.state().unconfirmed.get(address).cloned().unwrap_or_default())
    }

    async fn get_addresses_transactions(
        &self,
        _addresses: &[String],
        page: u32,
    ) -> Result<Vec<Transaction>, WalletError> {
        self.multi_page_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_wait().await;
        Ok(self
            .state()
            .multi_pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_default())
    }

    async fn node_request(&self, request: &ApiRequest) -> Result<Value, WalletError> {
        let mut state = self.state();
        state.api_requests.push(request.clone());
        state
            .node_response
            .clone()
            .ok_or_else(|| WalletError::Node("node unreachable".to_string()))
    }

    async fn explorer_request(&self, request: &ApiRequest) -> Result<Value, WalletError> {
        let mut state = self.state();
        state.api_requests.push(request.clone());
        state
            .explorer_response
            .clone()
            .ok_or_else(|| WalletError::Explorer("explorer unreachable".to_string()))
    }
}

// ============================================================================
// Key derivation
// ============================================================================

/// Derives `addr-<index>` in group `index % 4`
pub struct MockDeriver;

impl MockDeriver {
    pub fn key(index: u32) -> DerivedKey {
        DerivedKey {
            hash: address_at(index),
            public_key: format!("pub-{}", index),
            private_key: format!("priv-{}", index),
            index,
            group: index % TOTAL_NUMBER_OF_GROUPS,
        }
    }
}

impl KeyDeriver for MockDeriver {
    fn derive_at_index(&self, index: u32) -> Result<DerivedKey, WalletError> {
        Ok(Self::key(index))
    }

    fn derive_for_group(&self, group: u32, skip_indexes: &[u32]) -> Result<DerivedKey, WalletError> {
        (0..1000)
            .find(|index| index % TOTAL_NUMBER_OF_GROUPS == group && !skip_indexes.contains(index))
            .map(Self::key)
            .ok_or_else(|| WalletError::KeyDerivation(format!("no free index in group {}", group)))
    }
}

pub fn address_at(index: u32) -> String {
    format!("addr-{}", index)
}

pub fn wallet_keys(name: &str, passphrase_used: bool) -> WalletKeys {
    WalletKeys {
        name: name.to_string(),
        deriver: Arc::new(MockDeriver),
        passphrase_used,
    }
}

// ============================================================================
// Session transport
// ============================================================================

#[derive(Default)]
pub struct RecordingTransport {
    responses: Mutex<Vec<(String, JsonRpcResponse)>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn responses(&self) -> Vec<(String, JsonRpcResponse)> {
        self.responses.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionTransport for RecordingTransport {
    async fn respond(&self, topic: &str, response: JsonRpcResponse) -> Result<(), WalletError> {
        self.responses
            .lock()
            .unwrap()
            .push((topic.to_string(), response));
        Ok(())
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn record(index: u32) -> AddressRecord {
    AddressRecord::new(
        MockDeriver::key(index),
        AddressSettings {
            is_main: index == 0,
            label: None,
            color: None,
        },
    )
}

pub fn confirmed_tx(hash: &str, from: &str, to: &str, value: u64, timestamp: i64) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        block_hash: format!("block-{}", hash),
        timestamp,
        inputs: vec![Input {
            address: Some(from.to_string()),
            atto_alph_amount: Some(amount(value)),
            tokens: None,
        }],
        outputs: vec![Output {
            address: to.to_string(),
            atto_alph_amount: amount(value),
            tokens: None,
        }],
        gas_amount: 20_000,
        gas_price: amount(100_000_000_000),
        coinbase: false,
    }
}

pub fn mempool_tx(hash: &str, from: &str, to: &str, value: u64, change: u64) -> UnconfirmedTransaction {
    UnconfirmedTransaction {
        tx_type: Some("Unconfirmed".to_string()),
        hash: hash.to_string(),
        chain_from: 0,
        chain_to: 0,
        inputs: vec![Input {
            address: Some(from.to_string()),
            atto_alph_amount: Some(amount(value + change)),
            tokens: None,
        }],
        outputs: vec![
            Output {
                address: to.to_string(),
                atto_alph_amount: amount(value),
                tokens: Some(vec![]),
            },
            Output {
                address: from.to_string(),
                atto_alph_amount: amount(change),
                tokens: None,
            },
        ],
        gas_amount: 20_000,
        gas_price: amount(100_000_000_000),
        last_seen: 1_700_000_000_000,
    }
}

pub fn pending_tx(
    tx_id: &str,
    from: &str,
    to: &str,
    value: Option<&str>,
    tx_type: PendingTxType,
    network: NetworkName,
) -> PendingTransaction {
    PendingTransaction {
        tx_id: tx_id.to_string(),
        from_address: from.to_string(),
        to_address: to.to_string(),
        amount: value.map(str::to_string),
        tx_type,
        network,
        timestamp: 1_700_000_000_000,
    }
}

pub fn token(id: &str, value: u64) -> Token {
    Token {
        id: id.to_string(),
        amount: amount(value),
    }
}

// ============================================================================
// Environments
// ============================================================================

/// Coordinator over a fresh mainnet registry
pub struct SyncEnvironment {
    pub client: Arc<MockChainClient>,
    pub registry: Arc<AddressRegistry>,
    pub notifier: Notifier,
    pub coordinator: Arc<SyncCoordinator>,
}

impl SyncEnvironment {
    pub fn new() -> Self {
        init_logger();
        let client = MockChainClient::new();
        let registry = Arc::new(AddressRegistry::new(NetworkName::Mainnet));
        let notifier = Notifier::new();
        let coordinator = Arc::new(SyncCoordinator::new(
            registry.clone(),
            client.clone(),
            notifier.clone(),
        ));
        coordinator.set_network_status(NetworkStatus::Online);
        Self {
            client,
            registry,
            notifier,
            coordinator,
        }
    }
}

/// Wallet manager with storage in a temp directory
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub client: Arc<MockChainClient>,
    pub manager: WalletManager,
}

impl TestEnvironment {
    pub fn new() -> anyhow::Result<Self> {
        init_logger();
        let temp_dir = TempDir::new()?;
        log::info!("Test directory: {:?}", temp_dir.path());

        let mut config = SyncConfig::for_network(NetworkName::Mainnet);
        config.data_dir = temp_dir.path().to_path_buf();
        config.poll_interval = Duration::from_millis(50);

        let storage = Storage::new_with_base_dir(temp_dir.path().to_path_buf());
        let client = MockChainClient::new();
        let manager = WalletManager::with_client(config, storage, client.clone());
        manager.set_network_status(NetworkStatus::Online);

        Ok(Self {
            temp_dir,
            client,
            manager,
        })
    }
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
