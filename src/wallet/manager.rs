/// Wallet Manager - Orchestration Layer
///
/// Owns the address registry, the sync coordinator and the pending poller of
/// the unlocked wallet, and delegates to the operation modules.

use std::sync::Arc;

use super::address::{AddressHash, AddressRecord, AddressSettings};
use super::address_ops::{self, WalletKeys};
use super::polling::PendingTxPoller;
use super::registry::AddressRegistry;
use super::sync_ops::{NetworkStatus, PageLoad, SyncCoordinator, SyncReport};
use crate::config::SyncConfig;
use crate::error::WalletError;
use crate::explorer::{ChainDataClient, ExplorerClient};
use crate::notifications::Notifier;
use crate::storage::Storage;
use crate::walletconnect::{SessionRequestHandler, SessionTransport};

pub struct WalletManager {
    pub config: SyncConfig,
    pub storage: Storage,
    registry: Arc<AddressRegistry>,
    notifier: Notifier,
    coordinator: Arc<SyncCoordinator>,
    poller: Option<PendingTxPoller>,
    keys: Option<WalletKeys>,
}

impl WalletManager {
    // ============================================================================
    // Constructor
    // ============================================================================

    pub fn new(config: SyncConfig) -> Self {
        let client: Arc<dyn ChainDataClient> = Arc::new(ExplorerClient::new(&config));
        let storage = Storage::new_with_base_dir(config.data_dir.clone());
        Self::with_client(config, storage, client)
    }

    /// Create WalletManager with a custom chain data client (for testing)
    pub fn with_client(
        config: SyncConfig,
        storage: Storage,
        client: Arc<dyn ChainDataClient>,
    ) -> Self {
        let registry = Arc::new(AddressRegistry::new(config.network));
        let notifier = Notifier::new();
        let coordinator = Arc::new(SyncCoordinator::new(
            registry.clone(),
            client,
            notifier.clone(),
        ));

        Self {
            config,
            storage,
            registry,
            notifier,
            coordinator,
            poller: None,
            keys: None,
        }
    }

    pub fn registry(&self) -> &Arc<AddressRegistry> {
        &self.registry
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn set_network_status(&self, status: NetworkStatus) {
        self.coordinator.set_network_status(status);
    }

    pub fn is_unlocked(&self) -> bool {
        self.keys.is_some()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().map_or(false, PendingTxPoller::is_running)
    }

    pub fn is_loading(&self) -> bool {
        self.coordinator.is_loading()
    }

    fn keys(&self) -> Result<&WalletKeys, WalletError> {
        self.keys.as_ref().ok_or(WalletError::WalletLocked)
    }

    // ============================================================================
    // Wallet session
    // ============================================================================

    /// Unlock a wallet: populate the registry for the active network and
    /// start watching pending transactions. A previously unlocked wallet is
    /// locked first.
    pub async fn unlock(&mut self, keys: WalletKeys) -> Result<Vec<AddressHash>, WalletError> {
        if self.keys.is_some() {
            self.lock().await;
        }
        log::info!("Unlocking wallet '{}'", keys.name);

        let addresses =
            address_ops::initialize_addresses(&self.coordinator, &self.storage, &keys).await?;
        self.keys = Some(keys);
        self.start_polling();
        Ok(addresses)
    }

    /// Stop polling and forget every address record
    pub async fn lock(&mut self) {
        self.stop_polling().await;
        self.registry.clear();
        if let Some(keys) = self.keys.take() {
            log::info!("Wallet '{}' locked", keys.name);
        }
    }

    /// Whether address metadata is stored for `name`
    pub fn wallet_exists(&self, name: &str) -> bool {
        self.storage.wallet_exists(name)
    }

    /// Remove the stored address metadata of a wallet, locking it first
    /// when it is the unlocked one
    pub async fn delete_wallet(&mut self, name: &str) -> Result<(), WalletError> {
        if self.keys.as_ref().is_some_and(|keys| keys.name == name) {
            self.lock().await;
        }
        self.storage.delete_wallet(name)?;
        Ok(())
    }

    /// Point the wallet at another network and its endpoints
    pub async fn switch_network(&mut self, config: SyncConfig) -> Result<(), WalletError> {
        let client: Arc<dyn ChainDataClient> = Arc::new(ExplorerClient::new(&config));
        self.switch_network_with_client(config, client).await
    }

    pub async fn switch_network_with_client(
        &mut self,
        config: SyncConfig,
        client: Arc<dyn ChainDataClient>,
    ) -> Result<(), WalletError> {
        log::info!("Switching network to {}", config.network);
        self.stop_polling().await;

        let status = self.coordinator.network_status();
        let coordinator = SyncCoordinator::new(self.registry.clone(), client, self.notifier.clone());
        coordinator.set_network_status(status);
        self.coordinator = Arc::new(coordinator);
        self.registry.set_network(config.network);
        self.config = config;

        if let Some(keys) = self.keys.clone() {
            address_ops::initialize_addresses(&self.coordinator, &self.storage, &keys).await?;
            self.start_polling();
        }
        Ok(())
    }

    fn start_polling(&mut self) {
        self.poller = Some(PendingTxPoller::start(
            self.coordinator.clone(),
            self.config.poll_interval,
        ));
    }

    async fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
    }

    // ============================================================================
    // Addresses
    // ============================================================================

    pub async fn save_new_address(&self, record: AddressRecord) -> Result<AddressHash, WalletError> {
        address_ops::save_new_address(&self.coordinator, &self.storage, self.keys()?, record).await
    }

    pub async fn generate_one_address_per_group(
        &self,
        label_prefix: Option<&str>,
        color: Option<&str>,
        skip_groups: &[u32],
    ) -> Result<Vec<AddressHash>, WalletError> {
        address_ops::generate_one_address_per_group(
            &self.coordinator,
            &self.storage,
            self.keys()?,
            label_prefix,
            color,
            skip_groups,
        )
        .await
    }

    pub fn update_address_settings(
        &self,
        hash: &str,
        settings: AddressSettings,
    ) -> Result<AddressRecord, WalletError> {
        address_ops::update_address_settings(&self.coordinator, &self.storage, self.keys()?, hash, settings)
    }

    // ============================================================================
    // Synchronization
    // ============================================================================

    /// Full refresh of every address followed by a mempool check
    pub async fn refresh_addresses_data(&self) -> Result<SyncReport, WalletError> {
        let report = self.coordinator.fetch_account_data(Vec::new(), false).await?;
        self.coordinator.fetch_pending_for_addresses(Vec::new()).await?;
        Ok(report)
    }

    pub async fn fetch_next_page(&self, address: &str) -> Result<PageLoad, WalletError> {
        self.coordinator.fetch_next_page(address).await
    }

    // ============================================================================
    // dApp sessions
    // ============================================================================

    /// Session handler reading this wallet's addresses
    pub fn session_handler(&self, transport: Arc<dyn SessionTransport>) -> SessionRequestHandler {
        SessionRequestHandler::new(
            self.registry.clone(),
            self.coordinator.client().clone(),
            transport,
        )
    }
}
