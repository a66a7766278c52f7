//! Block lifecycle scenarios
//!
//! Drives `KvStoreApplication` over a durable `LogStore` through the
//! CheckTx / BeginBlock / DeliverTx / EndBlock / Commit / Query sequence.

use kvstore::app::{AppError, BlockPhase, FatalPolicy, KvStoreApplication};
use kvstore::storage::{LogStore, MemoryStore};
use kvstore::validation::TxCode;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn open_app(data_dir: &TempDir) -> KvStoreApplication {
    let store = LogStore::open(data_dir.path()).expect("Failed to open store");
    KvStoreApplication::new(Box::new(store), FatalPolicy::Halt)
}

fn run_block(app: &mut KvStoreApplication, height: i64, txs: &[&str]) -> Vec<TxCode> {
    app.begin_block(height).unwrap();
    let codes = txs
        .iter()
        .map(|tx| app.deliver_tx(tx.as_bytes()).unwrap())
        .collect();
    app.end_block(height).unwrap();
    app.commit().unwrap();
    codes
}

fn committed_value(app: &mut KvStoreApplication, key: &str) -> Option<Vec<u8>> {
    app.query(key.as_bytes()).unwrap().value
}

// =============================================================================
// Validation Codes
// =============================================================================

#[test]
fn test_new_pair_accepted_by_check_and_deliver() {
    let temp_dir = create_temp_data_dir();
    let mut app = open_app(&temp_dir);

    assert_eq!(app.check_tx(b"name=satoshi").unwrap().code, TxCode::Ok);
    assert_eq!(run_block(&mut app, 1, &["name=satoshi"]), vec![TxCode::Ok]);
}

#[test]
fn test_malformed_rejected_without_write() {
    let temp_dir = create_temp_data_dir();
    let mut app = open_app(&temp_dir);

    for tx in ["novalue", "a=b=c", "=="] {
        assert_eq!(app.check_tx(tx.as_bytes()).unwrap().code, TxCode::Malformed);
    }

    let codes = run_block(&mut app, 1, &["novalue", "a=b=c"]);
    assert_eq!(codes, vec![TxCode::Malformed, TxCode::Malformed]);
    assert_eq!(committed_value(&mut app, "a"), None);
    assert_eq!(committed_value(&mut app, "novalue"), None);
}

#[test]
fn test_existing_pair_is_duplicate() {
    let temp_dir = create_temp_data_dir();
    let mut app = open_app(&temp_dir);
    run_block(&mut app, 1, &["k=v"]);

    assert_eq!(app.check_tx(b"k=v").unwrap().code, TxCode::Duplicate);
    assert_eq!(run_block(&mut app, 2, &["k=v"]), vec![TxCode::Duplicate]);
    assert_eq!(app.last_block_height(), 2);
}

#[test]
fn test_new_value_for_existing_key_accepted() {
    let temp_dir = create_temp_data_dir();
    let mut app = open_app(&temp_dir);
    run_block(&mut app, 1, &["k=value1"]);

    assert_eq!(app.check_tx(b"k=value2").unwrap().code, TxCode::Ok);
    assert_eq!(run_block(&mut app, 2, &["k=value2"]), vec![TxCode::Ok]);
    assert_eq!(committed_value(&mut app, "k"), Some(b"value2".to_vec()));
}

#[test]
fn test_empty_key_and_value_are_well_formed() {
    let temp_dir = create_temp_data_dir();
    let mut app = open_app(&temp_dir);

    assert_eq!(run_block(&mut app, 1, &["=", "k="]), vec![TxCode::Ok, TxCode::Ok]);
    assert_eq!(committed_value(&mut app, ""), Some(Vec::new()));
    assert_eq!(committed_value(&mut app, "k"), Some(Vec::new()));
}

// =============================================================================
// Commit Visibility
// =============================================================================

#[test]
fn test_commit_makes_pair_queryable() {
    let temp_dir = create_temp_data_dir();
    let mut app = open_app(&temp_dir);

    run_block(&mut app, 1, &["k=v"]);

    let result = app.query(b"k").unwrap();
    assert!(result.found());
    assert_eq!(result.value, Some(b"v".to_vec()));
    assert_eq!(result.log(), "exists");
}

#[test]
fn test_open_block_invisible_until_commit() {
    let temp_dir = create_temp_data_dir();
    let mut app = open_app(&temp_dir);

    app.begin_block(1).unwrap();
    app.deliver_tx(b"k=v").unwrap();
    app.end_block(1).unwrap();

    let before = app.query(b"k").unwrap();
    assert!(!before.found());
    assert_eq!(before.log(), "does not exist");
    assert_eq!(app.phase(), BlockPhase::Open);

    app.commit().unwrap();
    assert!(app.query(b"k").unwrap().found());
    assert_eq!(app.phase(), BlockPhase::Idle);
}

#[test]
fn test_intra_block_duplicates_not_caught() {
    let temp_dir = create_temp_data_dir();
    let mut app = open_app(&temp_dir);

    let codes = run_block(&mut app, 1, &["a=1", "a=1"]);
    assert_eq!(codes, vec![TxCode::Ok, TxCode::Ok]);
    assert_eq!(committed_value(&mut app, "a"), Some(b"1".to_vec()));
}

#[test]
fn test_empty_block_still_advances_height() {
    let temp_dir = create_temp_data_dir();
    let mut app = open_app(&temp_dir);

    run_block(&mut app, 1, &[]);
    run_block(&mut app, 2, &[]);
    assert_eq!(app.info().unwrap().last_block_height, 2);
}

// =============================================================================
// Durability
// =============================================================================

#[test]
fn test_committed_blocks_survive_restart() {
    let temp_dir = create_temp_data_dir();

    {
        let mut app = open_app(&temp_dir);
        run_block(&mut app, 1, &["a=1", "b=2"]);
        run_block(&mut app, 2, &["a=3"]);
    }

    let mut app = open_app(&temp_dir);
    assert_eq!(app.info().unwrap().last_block_height, 2);
    assert_eq!(committed_value(&mut app, "a"), Some(b"3".to_vec()));
    assert_eq!(committed_value(&mut app, "b"), Some(b"2".to_vec()));
    assert_eq!(app.check_tx(b"b=2").unwrap().code, TxCode::Duplicate);
}

#[test]
fn test_uncommitted_block_lost_on_restart() {
    let temp_dir = create_temp_data_dir();

    {
        let mut app = open_app(&temp_dir);
        run_block(&mut app, 1, &["a=1"]);
        app.begin_block(2).unwrap();
        app.deliver_tx(b"b=2").unwrap();
    }

    let mut app = open_app(&temp_dir);
    assert_eq!(app.last_block_height(), 1);
    assert_eq!(committed_value(&mut app, "b"), None);
    assert_eq!(run_block(&mut app, 2, &["b=2"]), vec![TxCode::Ok]);
}

// =============================================================================
// Lifecycle Violations
// =============================================================================

#[test]
fn test_double_begin_block_is_fatal() {
    let mut app = KvStoreApplication::new(Box::new(MemoryStore::new()), FatalPolicy::Halt);
    app.begin_block(1).unwrap();

    let err = app.begin_block(2).unwrap_err();
    assert!(matches!(err, AppError::BlockAlreadyOpen { height: 2, open_height: 1 }));
    assert!(err.is_fatal());
    assert!(app.is_halted());
}

#[test]
fn test_deliver_and_commit_without_block_are_fatal() {
    for call in ["deliver_tx", "commit"] {
        let mut app = KvStoreApplication::new(Box::new(MemoryStore::new()), FatalPolicy::Halt);
        let err = match call {
            "deliver_tx" => app.deliver_tx(b"k=v").unwrap_err(),
            _ => app.commit().unwrap_err(),
        };
        assert_eq!(err.code(), "KV_APP_NO_OPEN_BLOCK", "{}", call);
        assert!(err.is_fatal());
        assert!(app.is_halted());
    }
}

#[test]
fn test_halted_application_refuses_everything() {
    let mut app = KvStoreApplication::new(Box::new(MemoryStore::new()), FatalPolicy::Halt);
    app.commit().unwrap_err();

    assert_eq!(app.info().unwrap_err().code(), "KV_APP_HALTED");
    assert_eq!(app.check_tx(b"k=v").unwrap_err().code(), "KV_APP_HALTED");
    assert_eq!(app.begin_block(1).unwrap_err().code(), "KV_APP_HALTED");
    assert_eq!(app.query(b"k").unwrap_err().code(), "KV_APP_HALTED");
}
