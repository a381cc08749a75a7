//! Integration tests for single-transaction checks and epoch processing

use scroogecoin::amount::Amount;
use scroogecoin::crypto::KeyPair;
use scroogecoin::error::TxRejection;
use scroogecoin::{Transaction, TxHandler, Utxo, UtxoPool};
use std::collections::HashSet;
use tempfile::TempDir;

fn coins(value: i64) -> Amount {
    Amount::from_num(value)
}

/// Helper to build and sign a transaction spending `utxos`, all owned by `owner`.
fn spend(owner: &KeyPair, utxos: &[Utxo], outputs: &[(i64, &KeyPair)]) -> Transaction {
    let mut tx = Transaction::new();
    for utxo in utxos {
        tx.add_input(utxo.tx_hash, utxo.index);
    }
    for (value, to) in outputs {
        tx.add_output(coins(*value), to.address());
    }
    for index in 0..utxos.len() {
        tx.sign_input(index, owner).expect("input exists");
    }
    tx.finalize();
    tx
}

fn genesis(owner: &KeyPair, values: &[i64]) -> Transaction {
    let mut tx = Transaction::new();
    for value in values {
        tx.add_output(coins(*value), owner.address());
    }
    tx.finalize();
    tx
}

/// An input-less transaction with a single zero-valued output.
fn genesis_like_zero(owner: &KeyPair) -> Transaction {
    genesis(owner, &[0])
}

#[test]
fn test_single_spend_updates_pool() {
    let a = KeyPair::generate().unwrap();
    let b = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[10]);
    let u1 = Utxo::new(genesis.hash(), 0);
    let pool = UtxoPool::from_genesis(&[genesis]);
    let mut handler = TxHandler::new(&pool);

    let tx1 = spend(&a, &[u1], &[(10, &b)]);
    let accepted = handler.process_epoch(&[tx1.clone()]);

    assert_eq!(accepted, vec![tx1.clone()]);
    let after = handler.pool();
    assert_eq!(after.len(), 1);
    assert!(!after.contains(&u1));
    let created = after.get(&Utxo::new(tx1.hash(), 0)).unwrap();
    assert_eq!(created.value, coins(10));
    assert_eq!(created.address, b.address());
}

#[test]
fn test_duplicate_submission_is_epoch_conflict() {
    let a = KeyPair::generate().unwrap();
    let b = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[10]);
    let u1 = Utxo::new(genesis.hash(), 0);
    let mut handler = TxHandler::new(&UtxoPool::from_genesis(&[genesis]));

    let tx1 = spend(&a, &[u1], &[(10, &b)]);
    let report = handler.process_epoch_report(&[tx1.clone(), tx1.clone()]);

    assert_eq!(report.accepted, vec![tx1.clone()]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].position, 1);
    assert_eq!(
        report.rejected[0].reason,
        TxRejection::EpochConflict {
            utxo: u1,
            consumed_by: tx1.hash()
        }
    );
}

#[test]
fn test_resubmission_in_later_epoch_is_rejected() {
    let a = KeyPair::generate().unwrap();
    let b = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[10]);
    let u1 = Utxo::new(genesis.hash(), 0);
    let mut handler = TxHandler::new(&UtxoPool::from_genesis(&[genesis]));

    let tx1 = spend(&a, &[u1], &[(10, &b)]);
    assert_eq!(handler.process_epoch(&[tx1.clone()]).len(), 1);
    assert!(handler.process_epoch(&[tx1.clone()]).is_empty());
    assert!(!handler.is_valid(&tx1));
}

#[test]
fn test_inputless_duplicate_is_accepted_once() {
    let a = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[10]);
    let mut handler = TxHandler::new(&UtxoPool::from_genesis(&[genesis]));
    let before = handler.pool().len();

    // Claims nothing and pays nothing, so it passes every individual check.
    let z = genesis_like_zero(&a);
    assert!(handler.is_valid(&z));

    let report = handler.process_epoch_report(&[z.clone(), z.clone()]);
    assert_eq!(report.accepted, vec![z.clone()]);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].position, 1);
    assert_eq!(
        report.rejected[0].reason,
        TxRejection::DuplicateTransaction { tx_hash: z.hash() }
    );
    assert_eq!(handler.pool().len(), before + z.num_outputs());
    assert!(handler.pool().contains(&Utxo::new(z.hash(), 0)));
}

#[test]
fn test_output_already_in_pool_is_rejected() {
    let a = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[10]);
    let z = genesis_like_zero(&a);

    // Its output is already in the starting pool.
    let mut seeded = TxHandler::new(&UtxoPool::from_genesis(&[genesis.clone(), z.clone()]));
    let report = seeded.process_epoch_report(&[z.clone()]);
    assert!(report.accepted.is_empty());
    assert_eq!(
        report.rejected[0].reason,
        TxRejection::OutputExists {
            utxo: Utxo::new(z.hash(), 0)
        }
    );
    assert_eq!(seeded.pool().len(), 2);

    // Accepted in one epoch, then resubmitted in the next.
    let mut handler = TxHandler::new(&UtxoPool::from_genesis(&[genesis]));
    assert_eq!(handler.process_epoch(&[z.clone()]), vec![z.clone()]);
    let report = handler.process_epoch_report(&[z.clone()]);
    assert!(report.accepted.is_empty());
    assert_eq!(report.rejected[0].reason.kind(), "output-exists");
    assert_eq!(handler.pool().len(), 2);
}

#[test]
fn test_overspend_is_value_imbalance() {
    let a = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[5]);
    let u = Utxo::new(genesis.hash(), 0);
    let mut handler = TxHandler::new(&UtxoPool::from_genesis(&[genesis]));

    let tx = spend(&a, &[u], &[(7, &a)]);
    assert!(matches!(
        handler.check(&tx),
        Err(TxRejection::ValueImbalance { .. })
    ));
    assert!(handler.process_epoch(&[tx]).is_empty());
    assert_eq!(handler.pool().len(), 1);
}

#[test]
fn test_negative_output_always_rejected() {
    let a = KeyPair::generate().unwrap();
    let b = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[10]);
    let u = Utxo::new(genesis.hash(), 0);
    let mut handler = TxHandler::new(&UtxoPool::from_genesis(&[genesis]));

    // Balanced overall, correctly signed, but one output is negative.
    let tx = spend(&a, &[u], &[(-1, &b), (11, &a)]);
    assert!(matches!(
        handler.check(&tx),
        Err(TxRejection::NegativeOutput { output: 0, .. })
    ));
    assert!(handler.process_epoch(&[tx]).is_empty());
}

#[test]
fn test_double_claim_within_transaction() {
    let a = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[10]);
    let u = Utxo::new(genesis.hash(), 0);
    let mut handler = TxHandler::new(&UtxoPool::from_genesis(&[genesis]));

    let tx = spend(&a, &[u, u], &[(10, &a)]);
    assert!(matches!(
        handler.check(&tx),
        Err(TxRejection::DoubleClaim { input: 1, .. })
    ));
    assert!(handler.process_epoch(&[tx]).is_empty());
}

#[test]
fn test_epoch_invariants_on_mixed_batch() {
    let a = KeyPair::generate().unwrap();
    let b = KeyPair::generate().unwrap();
    let c = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[10, 20, 30, 40, 50]);
    let u = |i| Utxo::new(genesis.hash(), i);
    let pre_epoch = UtxoPool::from_genesis(&[genesis.clone()]);
    let mut handler = TxHandler::new(&pre_epoch);

    let candidates = vec![
        spend(&a, &[u(0), u(1)], &[(15, &b), (15, &a)]),
        spend(&a, &[u(1)], &[(20, &c)]),
        spend(&a, &[u(2)], &[(10, &b), (10, &c), (10, &a)]),
        spend(&b, &[u(3)], &[(40, &b)]),
        spend(&a, &[u(3), u(4)], &[(90, &c)]),
        spend(&a, &[u(2), u(4)], &[(1, &c)]),
        spend(&a, &[u(4)], &[(51, &c)]),
    ];

    let accepted = handler.process_epoch(&candidates);
    assert_eq!(accepted.len(), 3);

    // Every accepted transaction is valid against the pre-epoch pool.
    let checker = TxHandler::new(&pre_epoch);
    assert!(accepted.iter().all(|tx| checker.is_valid(tx)));

    // Accepted input sets are pairwise disjoint.
    let mut seen = HashSet::new();
    for tx in &accepted {
        for input in tx.inputs() {
            assert!(seen.insert(input.utxo()), "{} claimed twice", input.utxo());
        }
    }

    // Pool size accounting.
    let consumed: usize = accepted.iter().map(|tx| tx.num_inputs()).sum();
    let created: usize = accepted.iter().map(|tx| tx.num_outputs()).sum();
    assert_eq!(handler.pool().len(), pre_epoch.len() - consumed + created);

    // Acceptance order is a subsequence of submission order.
    assert_eq!(accepted[0], candidates[0]);
    assert_eq!(accepted[1], candidates[2]);
    assert_eq!(accepted[2], candidates[4]);

    // The caller's pool is untouched.
    assert_eq!(pre_epoch.len(), 5);
    assert_eq!(handler.pool().balance_of(&c.address()), Some(coins(100)));
}

#[test]
fn test_submission_order_decides_conflicts() {
    let a = KeyPair::generate().unwrap();
    let b = KeyPair::generate().unwrap();
    let c = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[10]);
    let u = Utxo::new(genesis.hash(), 0);
    let pool = UtxoPool::from_genesis(&[genesis]);

    let to_b = spend(&a, &[u], &[(10, &b)]);
    let to_c = spend(&a, &[u], &[(10, &c)]);

    let mut first = TxHandler::new(&pool);
    assert_eq!(first.process_epoch(&[to_b.clone(), to_c.clone()]), vec![to_b.clone()]);

    let mut second = TxHandler::new(&pool);
    assert_eq!(second.process_epoch(&[to_c.clone(), to_b]), vec![to_c]);
}

#[test]
fn test_pool_and_transactions_through_json_files() {
    let a = KeyPair::generate().unwrap();
    let b = KeyPair::generate().unwrap();
    let genesis = genesis(&a, &[10, 3]);
    let pool = UtxoPool::from_genesis(&[genesis.clone()]);
    let candidates = vec![spend(&a, &[Utxo::new(genesis.hash(), 0)], &[(9, &b)])];

    let dir = TempDir::new().unwrap();
    let pool_path = dir.path().join("pool.json");
    let txs_path = dir.path().join("txs.json");
    std::fs::write(&pool_path, serde_json::to_string_pretty(&pool).unwrap()).unwrap();
    std::fs::write(&txs_path, serde_json::to_string_pretty(&candidates).unwrap()).unwrap();

    let loaded_pool: UtxoPool =
        serde_json::from_str(&std::fs::read_to_string(&pool_path).unwrap()).unwrap();
    let loaded_txs: Vec<Transaction> =
        serde_json::from_str(&std::fs::read_to_string(&txs_path).unwrap()).unwrap();

    let mut handler = TxHandler::new(&loaded_pool);
    assert_eq!(handler.process_epoch(&loaded_txs), candidates);
    assert_eq!(handler.pool().len(), 2);
}
