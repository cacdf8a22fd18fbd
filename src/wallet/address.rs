/// Address records
///
/// One derived address plus its cached chain state and user settings.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::amount::{self, Amount};
use crate::config::NetworkName;
use crate::explorer::{AddressDetails, Transaction, UnconfirmedTransaction};

pub type AddressHash = String;

/// Number of address groups (shards) on the chain.
pub const TOTAL_NUMBER_OF_GROUPS: u32 = 4;

/// Key material produced by the key derivation collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKey {
    pub hash: AddressHash,
    pub public_key: String,
    pub private_key: String,
    pub index: u32,
    pub group: u32,
}

/// User settings stored alongside the address index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSettings {
    #[serde(default)]
    pub is_main: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingTxType {
    Transfer,
    Sweep,
    Consolidation,
    Contract,
    Script,
    #[serde(other)]
    Other,
}

impl PendingTxType {
    /// Whether the transaction spends everything the address holds
    pub fn spends_whole_balance(&self) -> bool {
        matches!(self, PendingTxType::Sweep | PendingTxType::Consolidation)
    }
}

/// Submitted but not yet confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub tx_id: String,
    pub from_address: AddressHash,
    pub to_address: AddressHash,
    /// Raw decimal amount; a malformed value is read as zero
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: PendingTxType,
    pub network: NetworkName,
    /// Submission (or last mempool sighting) time in milliseconds
    pub timestamp: i64,
}

impl PendingTransaction {
    /// Convert a mempool entry seen on `address`.
    ///
    /// The destination is the first output paying someone other than the
    /// sender (or the first output when the sender pays itself); the amount
    /// is everything not returned to the sender as change.
    pub fn from_unconfirmed(
        tx: &UnconfirmedTransaction,
        address: &str,
        network: NetworkName,
    ) -> Self {
        let to_address = tx
            .outputs
            .iter()
            .find(|output| output.address != address)
            .or_else(|| tx.outputs.first())
            .map(|output| output.address.clone())
            .unwrap_or_default();

        let sent: Amount = tx
            .outputs
            .iter()
            .filter(|output| output.address != address)
            .map(|output| output.atto_alph_amount.clone())
            .sum();

        Self {
            tx_id: tx.hash.clone(),
            from_address: address.to_string(),
            to_address,
            amount: Some(sent.to_string()),
            tx_type: PendingTxType::Transfer,
            network,
            timestamp: tx.last_seen,
        }
    }

    pub fn amount_value(&self) -> Amount {
        self.amount
            .as_deref()
            .map(amount::parse_or_zero)
            .unwrap_or_else(amount::zero)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressTransactions {
    /// Most recent first, unique by hash
    pub confirmed: Vec<Transaction>,
    /// Insertion ordered, unique by transaction id
    pub pending: Vec<PendingTransaction>,
    pub loaded_page: u32,
    pub all_pages_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub hash: AddressHash,
    pub public_key: String,
    pub private_key: String,
    pub index: u32,
    pub group: u32,
    pub settings: AddressSettings,
    pub details: AddressDetails,
    pub transactions: AddressTransactions,
    pub available_balance: Amount,
    pub last_used: Option<DateTime<Utc>>,
    pub network: Option<NetworkName>,
}

impl AddressRecord {
    pub fn new(key: DerivedKey, settings: AddressSettings) -> Self {
        Self {
            hash: key.hash,
            public_key: key.public_key,
            private_key: key.private_key,
            index: key.index,
            group: key.group,
            settings,
            details: AddressDetails::default(),
            transactions: AddressTransactions::default(),
            available_balance: amount::zero(),
            last_used: None,
            network: None,
        }
    }

    pub fn short_hash(&self) -> String {
        let prefix: String = self.hash.chars().take(10).collect();
        format!("{}...", prefix)
    }

    /// Label when set, shortened hash otherwise
    pub fn name(&self) -> String {
        match self.settings.label.as_deref() {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => self.short_hash(),
        }
    }

    pub fn is_main(&self) -> bool {
        self.settings.is_main
    }

    pub fn has_pending(&self, tx_id: &str) -> bool {
        self.transactions.pending.iter().any(|tx| tx.tx_id == tx_id)
    }

    pub fn has_confirmed(&self, hash: &str) -> bool {
        self.transactions.confirmed.iter().any(|tx| tx.hash == hash)
    }

    /// Track a transaction sent from this address. Returns false when the
    /// id is already pending.
    pub fn add_pending_transaction(&mut self, tx: PendingTransaction) -> bool {
        if self.has_pending(&tx.tx_id) {
            return false;
        }
        log::debug!("Adding pending transaction {} sent from {}", tx.tx_id, tx.from_address);
        self.transactions.pending.push(tx);
        true
    }

    /// Pending transactions belonging to `network`
    pub fn pending_on(&self, network: NetworkName) -> impl Iterator<Item = &PendingTransaction> {
        self.transactions
            .pending
            .iter()
            .filter(move |tx| tx.network == network)
    }

    /// Merge a freshly fetched first page. New transactions go in front,
    /// already known hashes are kept where they are.
    pub fn merge_first_page(&mut self, page: Vec<Transaction>) {
        let mut fresh: Vec<Transaction> = page
            .into_iter()
            .filter(|tx| !self.has_confirmed(&tx.hash))
            .collect();
        fresh.extend(self.transactions.confirmed.drain(..));
        self.transactions.confirmed = fresh;
        self.transactions.loaded_page = self.transactions.loaded_page.max(1);
        self.refresh_last_used();
    }

    /// Append an older page. Returns how many transactions were new.
    pub fn append_page(&mut self, page: Vec<Transaction>) -> usize {
        let mut added = 0;
        for tx in page {
            if !self.has_confirmed(&tx.hash) {
                self.transactions.confirmed.push(tx);
                added += 1;
            }
        }
        self.refresh_last_used();
        added
    }

    fn refresh_last_used(&mut self) {
        self.last_used = self
            .transactions
            .confirmed
            .iter()
            .map(|tx| tx.timestamp)
            .max()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    }
}
