//! Transaction intents
//!
//! Unsigned descriptions of what a dApp asked the wallet to do. They are
//! handed to the UI for confirmation and never submitted from here.

use uuid::Uuid;

use super::types::{SignDeployContractTxParams, SignExecuteScriptTxParams, SignTransferTxParams};
use crate::amount::{Amount, NATIVE_ASSET_ID};
use crate::error::WalletError;
use crate::wallet::address::AddressRecord;
use crate::wallet::registry::RegistrySnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetAmount {
    pub id: String,
    pub amount: Amount,
}

impl AssetAmount {
    pub fn native(amount: Amount) -> Self {
        Self {
            id: NATIVE_ASSET_ID.to_string(),
            amount,
        }
    }

    pub fn is_native(&self) -> bool {
        self.id == NATIVE_ASSET_ID
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTxData {
    pub from_address: AddressRecord,
    pub to_address: String,
    pub asset_amounts: Vec<AssetAmount>,
    pub gas_amount: Option<u64>,
    pub gas_price: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployContractTxData {
    pub from_address: AddressRecord,
    pub bytecode: String,
    pub initial_alph_amount: Option<AssetAmount>,
    pub issue_token_amount: Option<Amount>,
    pub gas_amount: Option<u64>,
    pub gas_price: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTxData {
    pub from_address: AddressRecord,
    pub bytecode: String,
    pub asset_amounts: Vec<AssetAmount>,
    pub gas_amount: Option<u64>,
    pub gas_price: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DappTxData {
    Transfer(TransferTxData),
    DeployContract(DeployContractTxData),
    Script(ScriptTxData),
}

impl DappTxData {
    pub fn from_address(&self) -> &AddressRecord {
        match self {
            DappTxData::Transfer(tx) => &tx.from_address,
            DappTxData::DeployContract(tx) => &tx.from_address,
            DappTxData::Script(tx) => &tx.from_address,
        }
    }
}

/// An intent together with the request it answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DappIntent {
    pub id: Uuid,
    pub request_id: u64,
    pub topic: String,
    pub tx: DappTxData,
}

impl DappIntent {
    pub fn new(request_id: u64, topic: impl Into<String>, tx: DappTxData) -> Self {
        Self {
            id: Uuid::new_v4(),
            request_id,
            topic: topic.into(),
            tx,
        }
    }
}

fn resolve_signer(addresses: &RegistrySnapshot, signer: &str) -> Result<AddressRecord, WalletError> {
    addresses
        .get(signer)
        .cloned()
        .ok_or_else(|| WalletError::UnknownSigner(signer.to_string()))
}

/// Native amount of the first destination, then its tokens in order
pub fn transfer_intent(
    addresses: &RegistrySnapshot,
    params: SignTransferTxParams,
) -> Result<TransferTxData, WalletError> {
    let from_address = resolve_signer(addresses, &params.signer_address)?;
    let destination = params
        .destinations
        .into_iter()
        .next()
        .ok_or_else(|| WalletError::InvalidParams("Transfer without destination".to_string()))?;

    let mut asset_amounts = vec![AssetAmount::native(destination.atto_alph_amount)];
    asset_amounts.extend(
        destination
            .tokens
            .unwrap_or_default()
            .into_iter()
            .map(|token| AssetAmount {
                id: token.id,
                amount: token.amount,
            }),
    );

    Ok(TransferTxData {
        from_address,
        to_address: destination.address,
        asset_amounts,
        gas_amount: params.gas_amount,
        gas_price: params.gas_price,
    })
}

pub fn deploy_contract_intent(
    addresses: &RegistrySnapshot,
    params: SignDeployContractTxParams,
) -> Result<DeployContractTxData, WalletError> {
    let from_address = resolve_signer(addresses, &params.signer_address)?;
    Ok(DeployContractTxData {
        from_address,
        bytecode: params.bytecode,
        initial_alph_amount: params.initial_atto_alph_amount.map(AssetAmount::native),
        issue_token_amount: params.issue_token_amount,
        gas_amount: params.gas_amount,
        gas_price: params.gas_price,
    })
}

/// Tokens keep their request order; every native contribution (the explicit
/// amount and tokens carrying the native id) is summed into one trailing
/// entry, present only when there is at least one.
pub fn script_intent(
    addresses: &RegistrySnapshot,
    params: SignExecuteScriptTxParams,
) -> Result<ScriptTxData, WalletError> {
    let from_address = resolve_signer(addresses, &params.signer_address)?;

    let mut native: Option<Amount> = params.atto_alph_amount;
    let mut asset_amounts = Vec::new();
    for token in params.tokens.unwrap_or_default() {
        if token.id == NATIVE_ASSET_ID {
            native = Some(native.unwrap_or_default() + token.amount);
        } else {
            asset_amounts.push(AssetAmount {
                id: token.id,
                amount: token.amount,
            });
        }
    }
    if let Some(total) = native {
        asset_amounts.push(AssetAmount::native(total));
    }

    Ok(ScriptTxData {
        from_address,
        bytecode: params.bytecode,
        asset_amounts,
        gas_amount: params.gas_amount,
        gas_price: params.gas_price,
    })
}
