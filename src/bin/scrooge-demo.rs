#![forbid(unsafe_code)]
//! Walks through a small epoch with freshly generated keys.

use colored::*;
use scroogecoin::amount::Amount;
use scroogecoin::config::{init_tracing, LoggingConfig};
use scroogecoin::crypto::KeyPair;
use scroogecoin::{Transaction, TxHandler, UtxoPool};

fn transfer(
    from: &KeyPair,
    prev: &Transaction,
    index: u32,
    outputs: &[(i64, &KeyPair)],
) -> Result<Transaction, Box<dyn std::error::Error>> {
    let mut tx = Transaction::new();
    tx.add_input(prev.hash(), index);
    for (value, to) in outputs {
        tx.add_output(Amount::from_num(*value), to.address());
    }
    tx.sign_input(0, from)?;
    tx.finalize();
    Ok(tx)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing(&LoggingConfig::default());

    let scrooge = KeyPair::generate()?;
    let alice = KeyPair::generate()?;
    let bob = KeyPair::generate()?;

    let genesis = Transaction::coinbase(Amount::from_num(10), scrooge.address());
    let pool = UtxoPool::from_genesis(&[genesis.clone()]);
    let mut handler = TxHandler::new(&pool);

    let pay_alice = transfer(&scrooge, &genesis, 0, &[(6, &alice), (4, &scrooge)])?;
    let pay_bob_twice = transfer(&scrooge, &genesis, 0, &[(10, &bob)])?;
    let overspend = transfer(&alice, &pay_alice, 0, &[(7, &bob)])?;

    println!("{}", "Epoch 1".bright_cyan().bold());
    let report = handler.process_epoch_report(&[pay_alice.clone(), pay_bob_twice]);
    for tx in &report.accepted {
        println!("  {} {}", "accepted".bright_green(), tx.hash_str());
    }
    for rejected in &report.rejected {
        println!("  {} {}", "rejected".bright_red(), rejected.reason);
    }

    println!("{}", "Epoch 2".bright_cyan().bold());
    let honest = transfer(&alice, &pay_alice, 0, &[(5, &bob)])?;
    let report = handler.process_epoch_report(&[overspend, honest]);
    for tx in &report.accepted {
        println!("  {} {}", "accepted".bright_green(), tx.hash_str());
    }
    for rejected in &report.rejected {
        println!("  {} {}", "rejected".bright_red(), rejected.reason);
    }

    println!();
    for (name, key) in [("scrooge", &scrooge), ("alice", &alice), ("bob", &bob)] {
        let balance = handler.pool().balance_of(&key.address()).unwrap_or(Amount::MAX);
        println!("  {:<8} {}", name, balance);
    }

    Ok(())
}
