//! Error types for ScroogeCoin

use crate::amount::Amount;
use crate::transaction::TxHash;
use crate::utxo::Utxo;
use thiserror::Error;

/// Errors raised by the ambient surface of the crate: keys, files, configuration
/// and transaction construction. Validation outcomes are [`TxRejection`]s instead.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Why a candidate transaction was not accepted.
///
/// Rejections are plain values: the handler records them and moves on to the
/// next candidate, so one bad transaction never aborts an epoch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxRejection {
    /// Input references an output that is not in the pool.
    #[error("input {input} claims {utxo}, which is not in the UTXO pool")]
    MissingUtxo { input: usize, utxo: Utxo },

    #[error("input {input} signature does not verify against the owner of {utxo}")]
    SignatureInvalid { input: usize, utxo: Utxo },

    /// Two inputs of the same transaction claim one output.
    #[error("input {input} claims {utxo} a second time")]
    DoubleClaim { input: usize, utxo: Utxo },

    #[error("output {output} has negative value {value}")]
    NegativeOutput { output: usize, value: Amount },

    #[error("inputs sum to {inputs} but outputs sum to {outputs}")]
    ValueImbalance { inputs: Amount, outputs: Amount },

    /// Another transaction accepted earlier in this epoch already spent the output.
    #[error("{utxo} was already consumed by {} this epoch", hex::encode(.consumed_by))]
    EpochConflict { utxo: Utxo, consumed_by: TxHash },

    /// A transaction with the same hash was already accepted this epoch.
    #[error("transaction {} was already accepted this epoch", hex::encode(.tx_hash))]
    DuplicateTransaction { tx_hash: TxHash },

    /// Committing would overwrite an output that is in the pool or was created
    /// earlier in this epoch.
    #[error("output {utxo} already exists")]
    OutputExists { utxo: Utxo },
}

impl TxRejection {
    /// Short machine-friendly name of the rejection category.
    pub fn kind(&self) -> &'static str {
        match self {
            TxRejection::MissingUtxo { .. } => "missing-utxo",
            TxRejection::SignatureInvalid { .. } => "signature-invalid",
            TxRejection::DoubleClaim { .. } => "double-claim",
            TxRejection::NegativeOutput { .. } => "negative-output",
            TxRejection::ValueImbalance { .. } => "value-imbalance",
            TxRejection::EpochConflict { .. } => "epoch-conflict",
            TxRejection::DuplicateTransaction { .. } => "duplicate-transaction",
            TxRejection::OutputExists { .. } => "output-exists",
        }
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
