//! ScroogeCoin - UTXO transaction validation and per-epoch batch resolution
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Ledger Core
//! - [`utxo`] - Unspent output handles and the UTXO pool
//! - [`transaction`] - Transaction types, signing messages and validation
//! - [`handler`] - Epoch processing: conflict resolution and pool commit
//! - [`amount`] - Fixed-point currency amounts
//!
//! ## Cryptography
//! - [`crypto`] - Addresses, key pairs and signature verification (secp256k1)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management and logging setup
//! - [`error`] - Error and rejection types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger Core
// ============================================================================
pub mod amount;
pub mod handler;
pub mod transaction;
pub mod utxo;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;

pub use handler::{EpochReport, Rejected, TxHandler};
pub use transaction::{Input, Output, Transaction, TxHash};
pub use utxo::{Utxo, UtxoPool};
