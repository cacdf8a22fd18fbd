// Session peer event, request parameter and response types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::amount::{self, Amount};
use crate::error::{WalletError, SESSION_ERROR_CODE};
use crate::explorer::Token;

/// Namespace under which dApps list the chains they require
pub const PROVIDER_NAMESPACE: &str = "alephium";

/// Chain requirement of a session: `alephium:<networkId>/<group>`,
/// where group `-1` accepts any group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainInfo {
    pub network_id: u32,
    pub chain_group: Option<u32>,
}

impl FromStr for ChainInfo {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WalletError::InvalidParams(format!("Invalid chain: {}", s));

        let rest = s
            .strip_prefix(PROVIDER_NAMESPACE)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(invalid)?;
        let (network_id, group) = rest.split_once('/').ok_or_else(invalid)?;
        let network_id = network_id.parse::<u32>().map_err(|_| invalid())?;
        let group = group.parse::<i32>().map_err(|_| invalid())?;
        let chain_group = match group {
            -1 => None,
            g if g >= 0 => Some(g as u32),
            _ => return Err(invalid()),
        };

        Ok(Self {
            network_id,
            chain_group,
        })
    }
}

impl fmt::Display for ChainInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.chain_group {
            Some(group) => write!(f, "{}:{}/{}", PROVIDER_NAMESPACE, self.network_id, group),
            None => write!(f, "{}:{}/-1", PROVIDER_NAMESPACE, self.network_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icons: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequiredNamespace {
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposer {
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub metadata: PeerMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalParams {
    #[serde(default)]
    pub required_namespaces: HashMap<String, RequiredNamespace>,
    #[serde(default)]
    pub proposer: Proposer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalEvent {
    pub id: u64,
    pub params: ProposalParams,
}

impl ProposalEvent {
    /// First chain required under the provider namespace
    pub fn required_chain(&self) -> Result<ChainInfo, WalletError> {
        self.params
            .required_namespaces
            .get(PROVIDER_NAMESPACE)
            .and_then(|namespace| namespace.chains.first())
            .ok_or_else(|| {
                WalletError::InvalidParams(format!(
                    "Proposal does not require any {} chain",
                    PROVIDER_NAMESPACE
                ))
            })?
            .parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
    pub request: SessionRequest,
    #[serde(default)]
    pub chain_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    pub id: u64,
    pub topic: String,
    pub params: RequestParams,
}

impl RequestEvent {
    pub fn method(&self) -> &str {
        &self.params.request.method
    }
}

/// Methods a connected dApp may call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMethod {
    SignAndSubmitTransferTx,
    SignAndSubmitDeployContractTx,
    SignAndSubmitExecuteScriptTx,
    RequestNodeApi,
    RequestExplorerApi,
}

impl RelayMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMethod::SignAndSubmitTransferTx => "alph_signAndSubmitTransferTx",
            RelayMethod::SignAndSubmitDeployContractTx => "alph_signAndSubmitDeployContractTx",
            RelayMethod::SignAndSubmitExecuteScriptTx => "alph_signAndSubmitExecuteScriptTx",
            RelayMethod::RequestNodeApi => "alph_requestNodeApi",
            RelayMethod::RequestExplorerApi => "alph_requestExplorerApi",
        }
    }
}

impl FromStr for RelayMethod {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alph_signAndSubmitTransferTx" => Ok(RelayMethod::SignAndSubmitTransferTx),
            "alph_signAndSubmitDeployContractTx" => Ok(RelayMethod::SignAndSubmitDeployContractTx),
            "alph_signAndSubmitExecuteScriptTx" => Ok(RelayMethod::SignAndSubmitExecuteScriptTx),
            "alph_requestNodeApi" => Ok(RelayMethod::RequestNodeApi),
            "alph_requestExplorerApi" => Ok(RelayMethod::RequestExplorerApi),
            other => Err(WalletError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for RelayMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub address: String,
    #[serde(with = "amount::string")]
    pub atto_alph_amount: Amount,
    #[serde(default)]
    pub tokens: Option<Vec<Token>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTransferTxParams {
    pub signer_address: String,
    pub destinations: Vec<Destination>,
    #[serde(default)]
    pub gas_amount: Option<u64>,
    #[serde(default, with = "amount::option")]
    pub gas_price: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignDeployContractTxParams {
    pub signer_address: String,
    pub bytecode: String,
    #[serde(default, with = "amount::option")]
    pub initial_atto_alph_amount: Option<Amount>,
    #[serde(default, with = "amount::option")]
    pub issue_token_amount: Option<Amount>,
    #[serde(default)]
    pub gas_amount: Option<u64>,
    #[serde(default, with = "amount::option")]
    pub gas_price: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignExecuteScriptTxParams {
    pub signer_address: String,
    pub bytecode: String,
    #[serde(default, with = "amount::option")]
    pub atto_alph_amount: Option<Amount>,
    #[serde(default)]
    pub tokens: Option<Vec<Token>>,
    #[serde(default)]
    pub gas_amount: Option<u64>,
    #[serde(default, with = "amount::option")]
    pub gas_price: Option<Amount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// Response relayed to the peer for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub id: u64,
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(JsonRpcError {
                code: SESSION_ERROR_CODE,
                message: message.into(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
