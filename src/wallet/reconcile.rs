/// Pending transaction reconciliation
///
/// Prunes pending transactions that the chain has confirmed and recomputes the
/// spendable balance from the latest raw balance.

use super::address::{AddressRecord, PendingTransaction};
use crate::amount::{self, Amount};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub pending: Vec<PendingTransaction>,
    pub available_balance: Amount,
}

/// Compute the pending set and available balance of a record.
///
/// Never fails: amounts that do not parse count as zero.
pub fn reconcile(record: &AddressRecord) -> Reconciled {
    let pending: Vec<PendingTransaction> = record
        .transactions
        .pending
        .iter()
        .filter(|tx| !record.has_confirmed(&tx.tx_id))
        .cloned()
        .collect();

    let raw_balance = &record.details.balance;

    let available_balance = if pending.iter().any(|tx| tx.tx_type.spends_whole_balance()) {
        raw_balance.clone()
    } else {
        let in_flight: Amount = pending.iter().map(PendingTransaction::amount_value).sum();
        amount::saturating_sub(raw_balance, &in_flight)
    };

    Reconciled {
        pending,
        available_balance,
    }
}

/// Reconcile in place. Returns how many pending transactions were confirmed.
pub fn apply(record: &mut AddressRecord) -> usize {
    let before = record.transactions.pending.len();
    let Reconciled {
        pending,
        available_balance,
    } = reconcile(record);

    let confirmed = before - pending.len();
    if confirmed > 0 {
        log::info!("{} pending transaction(s) of {} confirmed", confirmed, record.hash);
    }

    record.transactions.pending = pending;
    record.available_balance = available_balance;
    confirmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkName;
    use crate::explorer::Transaction;
    use crate::wallet::address::{AddressSettings, DerivedKey, PendingTxType};
    use num_bigint::BigUint;

    fn record_with_balance(balance: u64) -> AddressRecord {
        let mut record = AddressRecord::new(
            DerivedKey {
                hash: "x".into(),
                public_key: "pk".into(),
                private_key: "sk".into(),
                index: 0,
                group: 0,
            },
            AddressSettings::default(),
        );
        record.details.balance = BigUint::from(balance);
        record
    }

    fn pending(id: &str, amount: Option<&str>, tx_type: PendingTxType) -> PendingTransaction {
        PendingTransaction {
            tx_id: id.into(),
            from_address: "x".into(),
            to_address: "y".into(),
            amount: amount.map(str::to_string),
            tx_type,
            network: NetworkName::Testnet,
            timestamp: 0,
        }
    }

    fn confirmed(hash: &str) -> Transaction {
        Transaction {
            hash: hash.into(),
            block_hash: "b".into(),
            timestamp: 1,
            inputs: vec![],
            outputs: vec![],
            gas_amount: 20000,
            gas_price: BigUint::from(1u32),
            coinbase: false,
        }
    }

    #[test]
    fn test_transfer_reduces_available_balance() {
        let mut record = record_with_balance(1000);
        record.add_pending_transaction(pending("t1", Some("300"), PendingTxType::Transfer));

        let outcome = reconcile(&record);
        assert_eq!(outcome.available_balance, BigUint::from(700u32));
        assert_eq!(outcome.pending.len(), 1);
    }

    #[test]
    fn test_confirmation_restores_balance() {
        let mut record = record_with_balance(1000);
        record.add_pending_transaction(pending("t1", Some("300"), PendingTxType::Transfer));
        apply(&mut record);
        assert_eq!(record.available_balance, BigUint::from(700u32));

        record.transactions.confirmed.push(confirmed("t1"));
        assert_eq!(apply(&mut record), 1);
        assert!(record.transactions.pending.is_empty());
        assert_eq!(record.available_balance, BigUint::from(1000u32));
    }

    #[test]
    fn test_missing_and_malformed_amounts_count_as_zero() {
        let mut record = record_with_balance(1000);
        record.add_pending_transaction(pending("t1", None, PendingTxType::Transfer));
        record.add_pending_transaction(pending("t2", Some("not-a-number"), PendingTxType::Transfer));
        record.add_pending_transaction(pending("t3", Some("250"), PendingTxType::Transfer));

        assert_eq!(reconcile(&record).available_balance, BigUint::from(750u32));
    }

    #[test]
    fn test_sweep_keeps_raw_balance() {
        let mut record = record_with_balance(1000);
        record.add_pending_transaction(pending("t1", Some("300"), PendingTxType::Transfer));
        record.add_pending_transaction(pending("t2", None, PendingTxType::Sweep));

        assert_eq!(reconcile(&record).available_balance, BigUint::from(1000u32));
    }

    #[test]
    fn test_consolidation_keeps_raw_balance() {
        let mut record = record_with_balance(55);
        record.add_pending_transaction(pending("t1", Some("10"), PendingTxType::Consolidation));
        assert_eq!(reconcile(&record).available_balance, BigUint::from(55u32));
    }

    #[test]
    fn test_overspend_clamps_at_zero() {
        let mut record = record_with_balance(100);
        record.add_pending_transaction(pending("t1", Some("300"), PendingTxType::Transfer));
        assert_eq!(reconcile(&record).available_balance, BigUint::default());
    }

    #[test]
    fn test_no_id_both_pending_and_confirmed() {
        let mut record = record_with_balance(1000);
        for id in ["a", "b", "c", "d"] {
            record.add_pending_transaction(pending(id, Some("1"), PendingTxType::Transfer));
        }
        record.transactions.confirmed = vec![confirmed("b"), confirmed("d"), confirmed("z")];
        apply(&mut record);

        for tx in &record.transactions.pending {
            assert!(!record.has_confirmed(&tx.tx_id));
        }
        assert_eq!(record.transactions.pending.len(), 2);
        assert_eq!(record.transactions.confirmed.len(), 3);
        assert_eq!(record.available_balance, BigUint::from(998u32));
    }
}
