//! Unspent transaction outputs and the pool that holds them

use crate::amount::{self, Amount};
use crate::crypto::Address;
use crate::transaction::{Output, Transaction, TxHash};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Handle for one spendable output: the hash of the transaction that created it
/// and the output's position in that transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Utxo {
    #[serde(with = "hex::serde")]
    pub tx_hash: TxHash,
    pub index: u32,
}

impl Utxo {
    pub fn new(tx_hash: TxHash, index: u32) -> Self {
        Utxo { tx_hash, index }
    }
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.tx_hash), self.index)
    }
}

/// Serialized form of a pool entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub utxo: Utxo,
    pub output: Output,
}

/// The set of currently spendable outputs.
///
/// Every key in the pool is spendable and has not been consumed by any committed
/// transaction. `Clone` is a deep copy: a cloned pool shares no state with its source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<UtxoEntry>", into = "Vec<UtxoEntry>")]
pub struct UtxoPool {
    utxos: HashMap<Utxo, Output>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a pool with every output of the given transactions.
    pub fn from_genesis(transactions: &[Transaction]) -> Self {
        let mut pool = Self::new();
        for tx in transactions {
            for (utxo, output) in tx.created_utxos() {
                pool.insert(utxo, output.clone());
            }
        }
        pool
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(utxo)
    }

    pub fn get(&self, utxo: &Utxo) -> Option<&Output> {
        self.utxos.get(utxo)
    }

    /// Adds an output, returning whatever was stored under the same key before.
    pub fn insert(&mut self, utxo: Utxo, output: Output) -> Option<Output> {
        self.utxos.insert(utxo, output)
    }

    /// Removes an output; `None` means it was not in the pool.
    pub fn remove(&mut self, utxo: &Utxo) -> Option<Output> {
        self.utxos.remove(utxo)
    }

    /// Independent deep copy of the pool.
    pub fn snapshot_copy(&self) -> Self {
        self.clone()
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Utxo, &Output)> {
        self.utxos.iter()
    }

    /// All handles in the pool, sorted.
    pub fn all_utxos(&self) -> Vec<Utxo> {
        let mut utxos: Vec<Utxo> = self.utxos.keys().copied().collect();
        utxos.sort();
        utxos
    }

    /// Total value locked to `address`, or `None` on overflow.
    pub fn balance_of(&self, address: &Address) -> Option<Amount> {
        amount::checked_sum(
            self.utxos
                .values()
                .filter(|output| &output.address == address)
                .map(|output| output.value),
        )
    }
}

impl From<Vec<UtxoEntry>> for UtxoPool {
    fn from(entries: Vec<UtxoEntry>) -> Self {
        UtxoPool {
            utxos: entries.into_iter().map(|e| (e.utxo, e.output)).collect(),
        }
    }
}

impl From<UtxoPool> for Vec<UtxoEntry> {
    fn from(pool: UtxoPool) -> Self {
        let mut entries: Vec<UtxoEntry> = pool
            .utxos
            .into_iter()
            .map(|(utxo, output)| UtxoEntry { utxo, output })
            .collect();
        entries.sort_by_key(|e| e.utxo);
        entries
    }
}
