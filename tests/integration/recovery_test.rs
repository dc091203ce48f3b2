// Recovery Integration Tests

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;
use anyhow::Result;
use tempfile::TempDir;

use amberdb::common::types::BlockId;
use amberdb::record::{Layout, RecordPage, Schema};
use amberdb::storage::page::Page;
use amberdb::transaction::TransactionError;
use amberdb::{Database, DatabaseError};

#[path = "../common/mod.rs"]
mod common;

use common::{student_names, student_schema, insert_students, test_config, TEST_BLOCK_SIZE};

fn people_layout() -> Arc<Layout> {
    let mut schema = Schema::new();
    schema.add_int_field("id");
    schema.add_string_field("name", 16);
    Arc::new(Layout::new(schema))
}

/// Read slot values straight from the data file
fn read_names_from_disk(db: &Database, block: &BlockId, layout: &Layout, slots: usize) -> Result<Vec<String>> {
    let mut page = Page::new(TEST_BLOCK_SIZE);
    db.disk_manager().read(block, &mut page)?;
    let name_offset = layout.offset("name").unwrap();
    (0..slots)
        .map(|slot| Ok(page.get_string(slot * layout.slot_size() + name_offset)?))
        .collect()
}

#[test]
fn test_uncommitted_update_undone_after_crash() -> Result<()> {
    let dir = TempDir::new()?;
    let layout = people_layout();
    let block;

    {
        let db = Database::open(test_config(dir.path(), 8))?;

        let tx1 = db.new_tx()?;
        block = tx1.append("people.tbl")?;
        let page = RecordPage::new(tx1.clone(), block.clone(), layout.clone())?;
        page.format()?;
        for (id, name) in [(1, "Tom"), (2, "Jim"), (3, "John")] {
            let slot = page.insert()?;
            page.set_int(slot, "id", id)?;
            page.set_string(slot, "name", name)?;
        }
        page.close()?;
        tx1.commit()?;

        let tx2 = db.new_tx()?;
        let page = RecordPage::new(tx2.clone(), block.clone(), layout.clone())?;
        let mut slot = page.next_after(None)?;
        while let Some(s) = slot {
            if page.get_int(s, "id")? == 2 {
                page.set_string(s, "name", "Jimmy")?;
            }
            slot = page.next_after(Some(s))?;
        }
        // The modified page reaches disk, the COMMIT record never does
        db.buffer_pool().flush_all(tx2.txn_id())?;
        assert_eq!(read_names_from_disk(&db, &block, &layout, 3)?[1], "Jimmy");
    }

    let db = Database::open(test_config(dir.path(), 8))?;
    assert_eq!(read_names_from_disk(&db, &block, &layout, 3)?, vec!["Tom", "Jim", "John"]);

    let tx = db.new_tx()?;
    let page = RecordPage::new(tx.clone(), block.clone(), layout.clone())?;
    assert_eq!(page.get_string(0, "name")?, "Tom");
    assert_eq!(page.get_string(1, "name")?, "Jim");
    assert_eq!(page.get_string(2, "name")?, "John");
    assert_eq!(page.get_int(1, "id")?, 2);
    tx.commit()?;
    Ok(())
}

#[test]
fn test_recovery_is_idempotent() -> Result<()> {
    let dir = TempDir::new()?;
    let layout = Arc::new(Layout::new(student_schema()));

    {
        let db = Database::open(test_config(dir.path(), 8))?;
        let tx = db.new_tx()?;
        insert_students(&tx, &layout, &[(1, "ann", 2020), (2, "ben", 2021)])?;
        tx.commit()?;

        let crashed = db.new_tx()?;
        insert_students(&crashed, &layout, &[(3, "cat", 2022)])?;
        db.buffer_pool().flush_all(crashed.txn_id())?;
    }

    let db = Database::open(test_config(dir.path(), 8))?;
    let block = BlockId::new("student.tbl", 0);
    let mut once = Page::new(TEST_BLOCK_SIZE);
    db.disk_manager().read(&block, &mut once)?;

    db.recover()?;
    let mut twice = Page::new(TEST_BLOCK_SIZE);
    db.disk_manager().read(&block, &mut twice)?;
    assert_eq!(once.contents(), twice.contents());

    let tx = db.new_tx()?;
    assert_eq!(student_names(&tx, &layout)?, vec!["ann", "ben"]);
    tx.commit()?;
    Ok(())
}

#[test]
fn test_rollback_restores_value_before_transaction() -> Result<()> {
    let dir = TempDir::new()?;
    let db = Database::open(test_config(dir.path(), 8))?;
    let block = BlockId::new("values.tbl", 0);

    let setup = db.new_tx()?;
    setup.append("values.tbl")?;
    setup.pin(&block)?;
    setup.set_int(&block, 16, 100, true)?;
    setup.set_string(&block, 40, "A", true)?;
    setup.commit()?;

    let tx = db.new_tx()?;
    tx.pin(&block)?;
    for (value, text) in [(200, "B"), (300, "C")] {
        tx.set_int(&block, 16, value, true)?;
        tx.set_string(&block, 40, text, true)?;
    }
    assert_eq!(tx.get_int(&block, 16)?, 300);
    tx.rollback()?;

    let check = db.new_tx()?;
    check.pin(&block)?;
    assert_eq!(check.get_int(&block, 16)?, 100);
    assert_eq!(check.get_string(&block, 40)?, "A");
    check.commit()?;
    Ok(())
}

#[test]
fn test_committed_work_survives_later_recoveries() -> Result<()> {
    let dir = TempDir::new()?;
    let block = BlockId::new("values.tbl", 0);

    {
        let db = Database::open(test_config(dir.path(), 8))?;
        let tx = db.new_tx()?;
        tx.append("values.tbl")?;
        tx.pin(&block)?;
        tx.set_int(&block, 0, 1, true)?;
        tx.commit()?;

        let crashed = db.new_tx()?;
        crashed.pin(&block)?;
        crashed.set_int(&block, 0, 2, true)?;
        db.buffer_pool().flush_all(crashed.txn_id())?;
    }

    {
        // Recovery restores 1, then a committed transaction writes 3
        let db = Database::open(test_config(dir.path(), 8))?;
        let tx = db.new_tx()?;
        tx.pin(&block)?;
        assert_eq!(tx.get_int(&block, 0)?, 1);
        tx.set_int(&block, 0, 3, true)?;
        tx.commit()?;
    }

    // The old undo record lies behind a checkpoint and is not replayed
    let db = Database::open(test_config(dir.path(), 8))?;
    let tx = db.new_tx()?;
    tx.pin(&block)?;
    assert_eq!(tx.get_int(&block, 0)?, 3);
    tx.commit()?;
    Ok(())
}

#[test]
fn test_recovery_refused_while_transaction_runs() -> Result<()> {
    let dir = TempDir::new()?;
    let db = Database::open(test_config(dir.path(), 8))?;
    let block = BlockId::new("values.tbl", 0);

    let setup = db.new_tx()?;
    setup.append("values.tbl")?;
    setup.commit()?;

    let running = db.new_tx()?;
    running.pin(&block)?;
    running.set_int(&block, 0, 42, true)?;

    assert!(matches!(db.recover(), Err(DatabaseError::TransactionsActive(1))));
    assert_eq!(running.get_int(&block, 0)?, 42);
    running.commit()?;

    // Once nothing runs, recovery proceeds and the committed value stays
    db.recover()?;
    let check = db.new_tx()?;
    check.pin(&block)?;
    assert_eq!(check.get_int(&block, 0)?, 42);
    check.commit()?;

    // A later crash still sees the committed value, not an undone one
    drop(db);
    let db = Database::open(test_config(dir.path(), 8))?;
    let check = db.new_tx()?;
    check.pin(&block)?;
    assert_eq!(check.get_int(&block, 0)?, 42);
    check.commit()?;
    Ok(())
}

#[test]
fn test_corrupt_log_poisons_database() -> Result<()> {
    let dir = TempDir::new()?;
    let db = Database::open(test_config(dir.path(), 8))?;
    let log_file = db.config().log_file.clone();
    let block = BlockId::new("values.tbl", 0);

    let tx = db.new_tx()?;
    tx.append("values.tbl")?;
    tx.commit()?;
    let mut i = 0;
    while db.disk_manager().length(&log_file)? < 3 {
        let tx = db.new_tx()?;
        tx.pin(&block)?;
        tx.set_int(&block, 0, i, true)?;
        tx.commit()?;
        i += 1;
    }

    // Point the first log block's boundary at a record whose length runs off the block
    let mut file = OpenOptions::new()
        .write(true)
        .open(dir.path().join("db").join(&log_file))?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&8i32.to_le_bytes())?;
    file.seek(SeekFrom::Start(8))?;
    file.write_all(&[0xFF; 4])?;
    file.sync_all()?;

    let err = db.recover().unwrap_err();
    assert!(matches!(&err, DatabaseError::TransactionError(e) if e.is_corruption()));
    assert!(db.is_poisoned());
    assert!(matches!(db.new_tx(), Err(DatabaseError::Poisoned)));
    Ok(())
}

#[test]
fn test_open_fails_on_corrupt_log() -> Result<()> {
    let dir = TempDir::new()?;
    let log_file;
    {
        let db = Database::open(test_config(dir.path(), 8))?;
        log_file = db.config().log_file.clone();
    }

    let mut file = OpenOptions::new()
        .write(true)
        .open(dir.path().join("db").join(&log_file))?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&2i32.to_le_bytes())?;
    file.sync_all()?;

    match Database::open(test_config(dir.path(), 8)) {
        Err(DatabaseError::TransactionError(TransactionError::RecoveryError(_))) => Ok(()),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("open succeeded on a corrupt log"),
    }
}
