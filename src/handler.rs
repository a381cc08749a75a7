//! Per-epoch transaction handling against an owned UTXO pool
//!
//! A [`TxHandler`] owns a private copy of the pool. Each epoch it receives an
//! unordered batch of candidate transactions and accepts the ones that are
//! individually valid, do not claim an output already claimed by a
//! transaction accepted earlier in the same batch, and would not overwrite an
//! existing output when committed.
//!
//! Candidates are considered in submission order. Every candidate is checked
//! against the pool as it stood when the epoch began, so an output created by
//! a transaction accepted in this epoch cannot be spent until the next one.

use crate::amount::Amount;
use crate::config::HandlerConfig;
use crate::crypto::{Secp256k1Verifier, SignatureVerifier};
use crate::error::TxRejection;
use crate::transaction::{Transaction, TxHash};
use crate::utxo::{Utxo, UtxoPool};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, trace};

/// A candidate that was not accepted, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    /// Position of the candidate in the submitted batch.
    pub position: usize,
    pub tx_hash: TxHash,
    pub reason: TxRejection,
}

/// Outcome of one epoch.
#[derive(Debug, Clone, Default)]
pub struct EpochReport {
    /// Accepted transactions in acceptance order.
    pub accepted: Vec<Transaction>,
    pub rejected: Vec<Rejected>,
}

pub struct TxHandler<V = Secp256k1Verifier> {
    pool: UtxoPool,
    verifier: V,
    config: HandlerConfig,
}

impl TxHandler<Secp256k1Verifier> {
    /// Creates a handler over a private copy of `pool`; later epochs never touch
    /// the caller's pool.
    pub fn new(pool: &UtxoPool) -> Self {
        Self::with_verifier(pool, Secp256k1Verifier)
    }
}

impl<V: SignatureVerifier> TxHandler<V> {
    pub fn with_verifier(pool: &UtxoPool, verifier: V) -> Self {
        Self::with_config(pool, verifier, HandlerConfig::default())
    }

    pub fn with_config(pool: &UtxoPool, verifier: V, config: HandlerConfig) -> Self {
        TxHandler {
            pool: pool.snapshot_copy(),
            verifier,
            config,
        }
    }

    /// Read-only view of the current pool.
    pub fn pool(&self) -> &UtxoPool {
        &self.pool
    }

    pub fn into_pool(self) -> UtxoPool {
        self.pool
    }

    /// Whether `tx` is valid against the current pool. Never mutates the pool.
    pub fn is_valid(&self, tx: &Transaction) -> bool {
        tx.is_valid_against(&self.pool, &self.verifier)
    }

    /// Like [`TxHandler::is_valid`], returning the fee or the first failed check.
    pub fn check(&self, tx: &Transaction) -> Result<Amount, TxRejection> {
        tx.validate_against(&self.pool, &self.verifier)
    }

    /// Processes one epoch and returns the accepted transactions in acceptance order.
    pub fn process_epoch(&mut self, candidates: &[Transaction]) -> Vec<Transaction> {
        self.process_epoch_report(candidates).accepted
    }

    /// Processes one epoch, also reporting every rejected candidate.
    pub fn process_epoch_report(&mut self, candidates: &[Transaction]) -> EpochReport {
        let prechecks = self.precheck(candidates);

        let mut claims = EpochClaims::default();
        let mut report = EpochReport::default();

        for (position, (tx, precheck)) in candidates.iter().zip(prechecks).enumerate() {
            let verdict = precheck.and_then(|_| claims.claim(tx, &self.pool));
            match verdict {
                Ok(()) => report.accepted.push(tx.clone()),
                Err(reason) => {
                    debug!(
                        "Rejected transaction {} at position {}: {}",
                        tx.hash_str(),
                        position,
                        reason
                    );
                    report.rejected.push(Rejected {
                        position,
                        tx_hash: tx.hash(),
                        reason,
                    });
                }
            }
        }

        for tx in &report.accepted {
            self.commit(tx);
        }

        info!(
            "Epoch processed: {} accepted, {} rejected, pool size {}",
            report.accepted.len(),
            report.rejected.len(),
            self.pool.len()
        );
        report
    }

    /// Individual checks against the epoch-start pool.
    fn precheck(&self, candidates: &[Transaction]) -> Vec<Result<Amount, TxRejection>> {
        if self.config.parallel_precheck {
            candidates
                .par_iter()
                .map(|tx| tx.validate_against(&self.pool, &self.verifier))
                .collect()
        } else {
            candidates
                .iter()
                .map(|tx| tx.validate_against(&self.pool, &self.verifier))
                .collect()
        }
    }

    /// Applies an accepted transaction: its claims leave the pool, its outputs enter it.
    fn commit(&mut self, tx: &Transaction) {
        for input in tx.inputs() {
            let utxo = input.utxo();
            if self.pool.remove(&utxo).is_none() {
                panic!(
                    "accepted transaction {} spends {} which is not in the pool",
                    tx.hash_str(),
                    utxo
                );
            }
        }
        for (utxo, output) in tx.created_utxos() {
            if self.pool.insert(utxo, output.clone()).is_some() {
                panic!(
                    "accepted transaction {} overwrote pool entry {}",
                    tx.hash_str(),
                    utxo
                );
            }
        }
        trace!(
            "Committed transaction {} ({} in, {} out)",
            tx.hash_str(),
            tx.num_inputs(),
            tx.num_outputs()
        );
    }
}

/// What the transactions accepted so far this epoch have spent and created.
#[derive(Debug, Default)]
struct EpochClaims {
    /// Output -> hash of the accepted transaction spending it.
    consumed: HashMap<Utxo, TxHash>,
    /// Keys the accepted transactions will add to the pool.
    created: HashSet<Utxo>,
    accepted: HashSet<TxHash>,
}

impl EpochClaims {
    /// Records `tx` as accepted, unless it spends something already spent this
    /// epoch, repeats an accepted transaction, or would overwrite an output.
    ///
    /// Nothing is recorded when the transaction is rejected.
    fn claim(&mut self, tx: &Transaction, pool: &UtxoPool) -> Result<(), TxRejection> {
        for input in tx.inputs() {
            let utxo = input.utxo();
            if let Some(consumed_by) = self.consumed.get(&utxo) {
                return Err(TxRejection::EpochConflict {
                    utxo,
                    consumed_by: *consumed_by,
                });
            }
        }
        if self.accepted.contains(&tx.hash()) {
            return Err(TxRejection::DuplicateTransaction { tx_hash: tx.hash() });
        }
        for (utxo, _) in tx.created_utxos() {
            if pool.contains(&utxo) || self.created.contains(&utxo) {
                return Err(TxRejection::OutputExists { utxo });
            }
        }

        for input in tx.inputs() {
            self.consumed.insert(input.utxo(), tx.hash());
        }
        self.created.extend(tx.created_utxos().map(|(utxo, _)| utxo));
        self.accepted.insert(tx.hash());
        Ok(())
    }
}
