use std::env;
use std::sync::Arc;

use wallet_sync::wallet::address::{AddressSettings, DerivedKey};
use wallet_sync::{
    AddressRecord, AddressRegistry, ExplorerClient, NetworkStatus, Notifier, PendingTxPoller,
    SyncConfig, SyncCoordinator,
};

/// Watch-only sync: refresh the given addresses, then follow their pending
/// transactions until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger (set RUST_LOG=debug for verbose output, RUST_LOG=info for normal)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = SyncConfig::from_env()?;
    let addresses: Vec<String> = env::args().skip(1).collect();
    if addresses.is_empty() {
        anyhow::bail!("usage: wallet-sync <address>...");
    }

    log::info!(
        "Watching {} address(es) on {} via {}",
        addresses.len(),
        config.network,
        config.explorer_api_url
    );

    let registry = Arc::new(AddressRegistry::new(config.network));
    let notifier = Notifier::new();
    let coordinator = Arc::new(SyncCoordinator::new(
        registry.clone(),
        Arc::new(ExplorerClient::new(&config)),
        notifier.clone(),
    ));
    coordinator.set_network_status(NetworkStatus::Online);

    let records: Vec<AddressRecord> = addresses
        .into_iter()
        .enumerate()
        .map(|(index, hash)| {
            AddressRecord::new(
                DerivedKey {
                    hash,
                    public_key: String::new(),
                    private_key: String::new(),
                    index: index as u32,
                    group: 0,
                },
                AddressSettings {
                    is_main: index == 0,
                    label: None,
                    color: None,
                },
            )
        })
        .collect();
    registry.upsert_many(records);

    coordinator.fetch_account_data(Vec::new(), false).await?;
    coordinator.fetch_pending_for_addresses(Vec::new()).await?;

    for record in registry.all() {
        log::info!(
            "{}: balance {} (available {}), {} confirmed / {} pending transaction(s)",
            record.hash,
            record.details.balance,
            record.available_balance,
            record.details.tx_number,
            record.transactions.pending.len()
        );
    }

    let poller = PendingTxPoller::start(coordinator.clone(), config.poll_interval);
    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    poller.stop().await;
    Ok(())
}
