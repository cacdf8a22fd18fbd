// Explorer / node API request and response types

use serde::{Deserialize, Serialize};

use crate::amount::{self, Amount};

/// Balance snapshot of one address
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDetails {
    #[serde(with = "amount::string")]
    pub balance: Amount,
    #[serde(with = "amount::string")]
    pub locked_balance: Amount,
    pub tx_number: u64,
}

/// Response of `GET /addresses/{address}/balance`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBalance {
    #[serde(with = "amount::string")]
    pub balance: Amount,
    #[serde(with = "amount::string")]
    pub locked_balance: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(with = "amount::string")]
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, with = "amount::option")]
    pub atto_alph_amount: Option<Amount>,
    #[serde(default)]
    pub tokens: Option<Vec<Token>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub address: String,
    #[serde(with = "amount::string")]
    pub atto_alph_amount: Amount,
    #[serde(default)]
    pub tokens: Option<Vec<Token>>,
}

/// Confirmed transaction as listed by the explorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub block_hash: String,
    /// Block timestamp in milliseconds
    pub timestamp: i64,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    pub gas_amount: u64,
    #[serde(with = "amount::string")]
    pub gas_price: Amount,
    #[serde(default)]
    pub coinbase: bool,
}

impl Transaction {
    /// Whether the address appears on either side of the transaction
    pub fn involves(&self, address: &str) -> bool {
        self.inputs
            .iter()
            .any(|input| input.address.as_deref() == Some(address))
            || self.outputs.iter().any(|output| output.address == address)
    }
}

/// Mempool transaction as listed by the explorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnconfirmedTransaction {
    #[serde(rename = "type", default)]
    pub tx_type: Option<String>,
    pub hash: String,
    #[serde(default)]
    pub chain_from: u32,
    #[serde(default)]
    pub chain_to: u32,
    #[serde(default)]
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    pub gas_amount: u64,
    #[serde(with = "amount::string")]
    pub gas_price: Amount,
    /// Last time the mempool saw it, in milliseconds
    #[serde(default)]
    pub last_seen: i64,
}

impl UnconfirmedTransaction {
    /// Older explorers omit the tag, newer ones mark mempool entries as
    /// `Unconfirmed`.
    pub fn is_unconfirmed(&self) -> bool {
        self.tx_type.as_deref().map_or(true, |t| t == "Unconfirmed")
    }
}

/// Opaque passthrough request: `path` is the URL path below the API root,
/// `method` the HTTP verb, and `params[0]` the JSON body of POST/PUT calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}
