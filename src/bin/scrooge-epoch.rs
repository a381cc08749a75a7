#![forbid(unsafe_code)]
//! Runs one epoch over a pool file and a batch of candidate transactions.

use clap::Parser;
use colored::*;
use scroogecoin::config::{init_tracing, load_config};
use scroogecoin::crypto::Secp256k1Verifier;
use scroogecoin::{Transaction, TxHandler, UtxoPool};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scrooge-epoch", version, about = "Process one epoch of candidate transactions")]
struct Cli {
    /// JSON file holding the current UTXO pool
    #[arg(long)]
    pool: PathBuf,

    /// JSON file holding the candidate transactions, in submission order
    #[arg(long)]
    txs: PathBuf,

    /// Where to write the updated pool
    #[arg(long)]
    out: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Check candidates in parallel regardless of the config file
    #[arg(long)]
    parallel: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    init_tracing(&config.logging);
    if cli.parallel {
        config.handler.parallel_precheck = true;
    }

    let pool: UtxoPool = serde_json::from_str(&fs::read_to_string(&cli.pool)?)?;
    let candidates: Vec<Transaction> = serde_json::from_str(&fs::read_to_string(&cli.txs)?)?;

    let mut handler = TxHandler::with_config(&pool, Secp256k1Verifier, config.handler);
    let report = handler.process_epoch_report(&candidates);

    println!("{}", "Epoch result".bright_cyan().bold());
    println!("{}", "------------".bright_cyan());
    for tx in &report.accepted {
        println!("  {} {}", "accepted".bright_green(), tx.hash_str());
    }
    for rejected in &report.rejected {
        println!(
            "  {} {} (#{}) {}",
            "rejected".bright_red(),
            hex::encode(rejected.tx_hash),
            rejected.position,
            rejected.reason.to_string().dimmed()
        );
    }
    println!();
    println!(
        "Pool size: {} -> {}",
        pool.len(),
        handler.pool().len().to_string().bold()
    );

    if let Some(out) = cli.out {
        fs::write(&out, serde_json::to_string_pretty(handler.pool())?)?;
        println!("Updated pool written to {}", out.display());
    }

    Ok(())
}
