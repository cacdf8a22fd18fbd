mod common;

use common::*;
use wallet_sync::wallet::address::AddressSettings;
use wallet_sync::{NetworkName, SyncConfig, WalletError};

#[tokio::test]
async fn test_unlock_fresh_wallet_creates_main_address() -> anyhow::Result<()> {
    let mut env = TestEnvironment::new()?;
    env.client.set_details(&address_at(0), 42, 0);

    let addresses = env.manager.unlock(wallet_keys("fresh", false)).await?;
    assert_eq!(addresses, vec![address_at(0)]);
    assert!(env.manager.is_unlocked());
    assert!(env.manager.is_polling());

    let main = env.manager.registry().main_address().unwrap();
    assert_eq!(main.index, 0);
    assert_eq!(main.details.balance, amount(42));

    let stored = env.manager.storage.load_addresses_metadata("fresh")?;
    assert_eq!(stored.len(), 1);
    assert!(stored[0].settings.is_main);

    env.manager.lock().await;
    Ok(())
}

#[tokio::test]
async fn test_unlock_rederives_stored_addresses() -> anyhow::Result<()> {
    let mut env = TestEnvironment::new()?;
    let main = AddressSettings {
        is_main: true,
        label: Some("Main".to_string()),
        color: None,
    };
    let savings = AddressSettings {
        is_main: false,
        label: Some("Savings".to_string()),
        color: Some("#00ff00".to_string()),
    };
    env.manager.storage.store_address_metadata("stored", 0, &main)?;
    env.manager.storage.store_address_metadata("stored", 5, &savings)?;

    let mut addresses = env.manager.unlock(wallet_keys("stored", false)).await?;
    addresses.sort();
    assert_eq!(addresses, vec![address_at(0), address_at(5)]);

    let record = env.manager.registry().get(&address_at(5)).unwrap();
    assert_eq!(record.name(), "Savings");
    assert_eq!(record.group, 1);
    assert_eq!(env.client.details_calls.load(std::sync::atomic::Ordering::SeqCst), 2);

    env.manager.lock().await;
    Ok(())
}

#[tokio::test]
async fn test_passphrase_wallet_persists_nothing() -> anyhow::Result<()> {
    let mut env = TestEnvironment::new()?;
    env.manager.unlock(wallet_keys("hidden", true)).await?;
    env.manager.generate_one_address_per_group(None, None, &[]).await?;

    assert_eq!(env.manager.registry().all().len(), 5);
    assert!(!env.manager.wallet_exists("hidden"));

    env.manager.lock().await;
    Ok(())
}

#[tokio::test]
async fn test_generate_one_address_per_group() -> anyhow::Result<()> {
    let mut env = TestEnvironment::new()?;
    env.manager.unlock(wallet_keys("groups", false)).await?;

    let created = env
        .manager
        .generate_one_address_per_group(Some("Group"), Some("#ffffff"), &[0])
        .await?;
    assert_eq!(created, vec![address_at(1), address_at(2), address_at(3)]);

    let second = env.manager.registry().get(&address_at(2)).unwrap();
    assert_eq!(second.settings.label.as_deref(), Some("Group 2"));
    assert_eq!(second.settings.color.as_deref(), Some("#ffffff"));
    assert!(!second.is_main());

    // Used indexes are never reused
    let more = env.manager.generate_one_address_per_group(None, Some("#ffffff"), &[]).await?;
    assert_eq!(more, vec![address_at(4), address_at(5), address_at(6), address_at(7)]);
    assert!(env.manager.registry().get(&address_at(4)).unwrap().settings.label.is_none());

    let stored = env.manager.storage.load_addresses_metadata("groups")?;
    assert_eq!(stored.len(), 8);

    env.manager.lock().await;
    Ok(())
}

#[tokio::test]
async fn test_update_settings_moves_main_address() -> anyhow::Result<()> {
    let mut env = TestEnvironment::new()?;
    env.manager.unlock(wallet_keys("settings", false)).await?;
    env.manager.generate_one_address_per_group(None, None, &[0, 2, 3]).await?;

    let updated = env.manager.update_address_settings(
        &address_at(1),
        AddressSettings {
            is_main: true,
            label: Some("New main".to_string()),
            color: None,
        },
    )?;
    assert!(updated.is_main());

    let main = env.manager.registry().main_address().unwrap();
    assert_eq!(main.hash, address_at(1));
    assert!(!env.manager.registry().get(&address_at(0)).unwrap().is_main());

    let stored = env.manager.storage.load_addresses_metadata("settings")?;
    assert!(!stored[0].settings.is_main);
    assert!(stored[1].settings.is_main);

    assert!(matches!(
        env.manager.update_address_settings("nobody", AddressSettings::default()),
        Err(WalletError::AddressNotFound(_))
    ));

    env.manager.lock().await;
    Ok(())
}

#[tokio::test]
async fn test_lock_clears_state() -> anyhow::Result<()> {
    let mut env = TestEnvironment::new()?;
    env.manager.unlock(wallet_keys("locking", false)).await?;
    assert!(!env.manager.registry().all().is_empty());

    env.manager.lock().await;
    assert!(!env.manager.is_unlocked());
    assert!(!env.manager.is_polling());
    assert!(env.manager.registry().snapshot().is_empty());

    assert!(matches!(
        env.manager.generate_one_address_per_group(None, None, &[]).await,
        Err(WalletError::WalletLocked)
    ));
    Ok(())
}

#[tokio::test]
async fn test_switch_network_keeps_networks_apart() -> anyhow::Result<()> {
    let mut env = TestEnvironment::new()?;
    env.client.set_details(&address_at(0), 1_000, 0);
    env.manager.unlock(wallet_keys("switch", false)).await?;
    assert_eq!(env.manager.registry().main_address().unwrap().details.balance, amount(1_000));

    let testnet_client = MockChainClient::new();
    testnet_client.set_details(&address_at(0), 5, 0);
    let mut config = SyncConfig::for_network(NetworkName::Testnet);
    config.data_dir = env.temp_dir.path().to_path_buf();

    env.manager
        .switch_network_with_client(config, testnet_client.clone())
        .await?;

    assert_eq!(env.manager.registry().network(), NetworkName::Testnet);
    assert!(env.manager.is_polling());
    let main = env.manager.registry().main_address().unwrap();
    assert_eq!(main.details.balance, amount(5));
    assert_eq!(main.network, Some(NetworkName::Testnet));

    // Mainnet state survives in the registry, hidden from the active view
    assert_eq!(env.manager.registry().snapshot().len(), 2);

    env.manager.lock().await;
    Ok(())
}

#[tokio::test]
async fn test_refresh_addresses_data() -> anyhow::Result<()> {
    let mut env = TestEnvironment::new()?;
    env.manager.unlock(wallet_keys("refresh", false)).await?;

    env.client.set_details(&address_at(0), 77, 0);
    env.client
        .set_unconfirmed(&address_at(0), vec![mempool_tx("m1", &address_at(0), "external", 7, 0)]);

    let report = env.manager.refresh_addresses_data().await?;
    assert_eq!(report.updated, vec![address_at(0)]);

    let main = env.manager.registry().main_address().unwrap();
    assert_eq!(main.details.balance, amount(77));
    assert!(main.has_pending("m1"));
    assert_eq!(main.available_balance, amount(70));
    assert!(env.manager.is_loading());

    env.manager.lock().await;
    Ok(())
}

#[tokio::test]
async fn test_delete_unlocked_wallet() -> anyhow::Result<()> {
    let mut env = TestEnvironment::new()?;
    env.manager.unlock(wallet_keys("doomed", false)).await?;
    assert!(env.manager.wallet_exists("doomed"));

    env.manager.delete_wallet("doomed").await?;
    assert!(!env.manager.wallet_exists("doomed"));
    assert!(!env.manager.is_unlocked());
    assert!(!env.manager.is_polling());
    assert!(env.manager.registry().snapshot().is_empty());

    assert!(matches!(
        env.manager.delete_wallet("doomed").await,
        Err(WalletError::Storage(_))
    ));
    Ok(())
}
