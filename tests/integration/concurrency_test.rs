// Concurrency Integration Tests

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use anyhow::Result;

use amberdb::common::types::BlockId;
use amberdb::Database;

#[path = "../common/mod.rs"]
mod common;

use common::create_test_db;

/// Create `blocks` zeroed blocks in `file_name` and commit them
fn prepare_blocks(db: &Database, file_name: &str, blocks: u64) -> Result<Vec<BlockId>> {
    let tx = db.new_tx()?;
    let mut created = Vec::new();
    for _ in 0..blocks {
        created.push(tx.append(file_name)?);
    }
    tx.commit()?;
    Ok(created)
}

#[test]
fn test_exclusive_lock_blocks_reader_until_commit() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    let block = prepare_blocks(&db, "values.tbl", 1)?.remove(0);
    let (locked_tx, locked_rx) = mpsc::channel();

    let (db, block) = (&db, &block);
    let (released_at, (acquired_at, seen)) = thread::scope(|s| -> Result<_> {
        let writer = s.spawn(move || -> Result<Instant> {
            let tx = db.new_tx()?;
            tx.pin(block)?;
            tx.set_int(block, 0, 7, true)?;
            locked_tx.send(())?;
            thread::sleep(Duration::from_millis(200));
            let released_at = Instant::now();
            tx.commit()?;
            Ok(released_at)
        });

        let reader = s.spawn(move || -> Result<(Instant, i32)> {
            locked_rx.recv()?;
            let tx = db.new_tx()?;
            tx.pin(block)?;
            let value = tx.get_int(block, 0)?;
            let acquired_at = Instant::now();
            tx.commit()?;
            Ok((acquired_at, value))
        });

        let released = writer.join().expect("writer panicked")?;
        let acquired = reader.join().expect("reader panicked")?;
        Ok((released, acquired))
    })?;

    assert!(acquired_at >= released_at);
    assert_eq!(seen, 7);
    Ok(())
}

#[test]
fn test_exclusive_locks_serialize_writers() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    let block = prepare_blocks(&db, "values.tbl", 1)?.remove(0);
    let (locked_tx, locked_rx) = mpsc::channel();

    let (db, block) = (&db, &block);
    let (released_at, acquired_at) = thread::scope(|s| -> Result<_> {
        let first = s.spawn(move || -> Result<Instant> {
            let tx = db.new_tx()?;
            tx.pin(block)?;
            tx.set_int(block, 0, 1, true)?;
            locked_tx.send(())?;
            thread::sleep(Duration::from_millis(200));
            let released_at = Instant::now();
            tx.commit()?;
            Ok(released_at)
        });

        let second = s.spawn(move || -> Result<Instant> {
            locked_rx.recv()?;
            let tx = db.new_tx()?;
            tx.pin(block)?;
            tx.set_int(block, 0, 2, true)?;
            let acquired_at = Instant::now();
            tx.commit()?;
            Ok(acquired_at)
        });

        let released = first.join().expect("first writer panicked")?;
        let acquired = second.join().expect("second writer panicked")?;
        Ok((released, acquired))
    })?;

    assert!(acquired_at >= released_at);
    let tx = db.new_tx()?;
    tx.pin(block)?;
    assert_eq!(tx.get_int(block, 0)?, 2);
    tx.commit()?;
    Ok(())
}

#[test]
fn test_shared_locks_coexist_but_block_writer() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    let block = prepare_blocks(&db, "values.tbl", 1)?.remove(0);

    let reader1 = db.new_tx()?;
    let reader2 = db.new_tx()?;
    reader1.pin(&block)?;
    reader2.pin(&block)?;
    assert_eq!(reader1.get_int(&block, 0)?, 0);
    assert_eq!(reader2.get_int(&block, 0)?, 0);

    let err = reader2.set_int(&block, 0, 1, true).unwrap_err();
    assert!(err.is_timeout());

    reader2.rollback()?;
    reader1.commit()?;

    let writer = db.new_tx()?;
    writer.pin(&block)?;
    writer.set_int(&block, 0, 1, true)?;
    writer.commit()?;
    Ok(())
}

#[test]
fn test_lock_wait_times_out() -> Result<()> {
    let (db, _dir) = create_test_db(8)?;
    let block = prepare_blocks(&db, "values.tbl", 1)?.remove(0);

    let holder = db.new_tx()?;
    holder.pin(&block)?;
    holder.set_int(&block, 0, 1, true)?;

    let waiter = db.new_tx()?;
    waiter.pin(&block)?;
    let start = Instant::now();
    let err = waiter.get_int(&block, 0).unwrap_err();
    assert!(err.is_timeout());
    assert!(start.elapsed() >= Duration::from_millis(400));

    waiter.rollback()?;
    holder.commit()?;
    Ok(())
}

#[test]
fn test_pin_times_out_when_pool_exhausted() -> Result<()> {
    let (db, _dir) = create_test_db(3)?;
    let blocks = prepare_blocks(&db, "values.tbl", 4)?;

    let holder = db.new_tx()?;
    for block in &blocks[..3] {
        holder.pin(block)?;
    }
    assert_eq!(db.buffer_pool().available(), 0);

    let waiter = db.new_tx()?;
    let start = Instant::now();
    let err = waiter.pin(&blocks[3]).unwrap_err();
    assert!(err.is_timeout());
    assert!(start.elapsed() >= Duration::from_millis(400));

    // A block that is already resident can still be pinned
    waiter.pin(&blocks[0])?;
    waiter.unpin(&blocks[0])?;

    holder.unpin(&blocks[2])?;
    waiter.pin(&blocks[3])?;
    waiter.commit()?;
    holder.commit()?;
    assert_eq!(db.buffer_pool().available(), 3);
    Ok(())
}

#[test]
fn test_pin_waiter_woken_by_unpin() -> Result<()> {
    let (db, _dir) = create_test_db(2)?;
    let blocks = prepare_blocks(&db, "values.tbl", 3)?;

    let holder = db.new_tx()?;
    holder.pin(&blocks[0])?;
    holder.pin(&blocks[1])?;

    thread::scope(|s| -> Result<()> {
        let waiter = s.spawn(|| -> Result<()> {
            let tx = db.new_tx()?;
            tx.pin(&blocks[2])?;
            tx.commit()?;
            Ok(())
        });
        thread::sleep(Duration::from_millis(100));
        holder.unpin(&blocks[0])?;
        waiter.join().expect("waiter panicked")?;
        Ok(())
    })?;

    holder.commit()?;
    Ok(())
}

#[test]
fn test_pins_are_counted_per_request() -> Result<()> {
    let (db, _dir) = create_test_db(4)?;
    let block = prepare_blocks(&db, "values.tbl", 1)?.remove(0);
    let pool = db.buffer_pool();

    let tx = db.new_tx()?;
    tx.pin(&block)?;
    tx.pin(&block)?;
    assert_eq!(pool.available(), 3);

    tx.unpin(&block)?;
    assert_eq!(pool.available(), 3);
    tx.unpin(&block)?;
    assert_eq!(pool.available(), 4);
    assert!(tx.unpin(&block).is_err());

    // Pins left behind are released by commit
    tx.pin(&block)?;
    assert_eq!(pool.available(), 3);
    tx.commit()?;
    assert_eq!(pool.available(), 4);
    Ok(())
}
