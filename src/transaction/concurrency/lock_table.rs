use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use log::warn;
use parking_lot::{Condvar, Mutex};

use crate::common::types::{BlockId, TxnId};
use super::LockError;

/// Current grant on one block
#[derive(Debug, Clone, PartialEq, Eq)]
enum LockEntry {
    Shared(HashSet<TxnId>),
    Exclusive(TxnId),
}

/// Global table of block locks shared by every transaction.
///
/// A request that conflicts with the current grant waits on a condition
/// variable. It fails with `LockTimeout` once `max_wait` has passed; that is
/// the only deadlock handling: no wait-for graph is built.
pub struct LockTable {
    locks: Mutex<HashMap<BlockId, LockEntry>>,
    released: Condvar,
    max_wait: Duration,
}

impl LockTable {
    pub fn new(max_wait: Duration) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            released: Condvar::new(),
            max_wait,
        }
    }

    /// Grant `txn_id` a shared lock on `block`
    pub fn s_lock(&self, txn_id: TxnId, block: &BlockId) -> Result<(), LockError> {
        let deadline = Instant::now() + self.max_wait;
        let mut locks = self.locks.lock();

        loop {
            match locks.get(block) {
                Some(LockEntry::Exclusive(holder)) if *holder != txn_id => {}
                // An exclusive holder already has read access
                Some(LockEntry::Exclusive(_)) => return Ok(()),
                _ => {
                    let entry = locks
                        .entry(block.clone())
                        .or_insert_with(|| LockEntry::Shared(HashSet::new()));
                    if let LockEntry::Shared(holders) = entry {
                        holders.insert(txn_id);
                    }
                    return Ok(());
                }
            }

            if self.released.wait_until(&mut locks, deadline).timed_out() {
                warn!("Transaction {} timed out waiting for shared lock on {}", txn_id, block);
                return Err(LockError::LockTimeout {
                    txn_id,
                    block: block.clone(),
                });
            }
        }
    }

    /// Grant `txn_id` an exclusive lock on `block`, upgrading its own shared
    /// lock if it holds one
    pub fn x_lock(&self, txn_id: TxnId, block: &BlockId) -> Result<(), LockError> {
        let deadline = Instant::now() + self.max_wait;
        let mut locks = self.locks.lock();

        loop {
            let grantable = match locks.get(block) {
                None => true,
                Some(LockEntry::Shared(holders)) => holders.iter().all(|&h| h == txn_id),
                Some(LockEntry::Exclusive(holder)) => *holder == txn_id,
            };
            if grantable {
                locks.insert(block.clone(), LockEntry::Exclusive(txn_id));
                return Ok(());
            }

            if self.released.wait_until(&mut locks, deadline).timed_out() {
                warn!("Transaction {} timed out waiting for exclusive lock on {}", txn_id, block);
                return Err(LockError::LockTimeout {
                    txn_id,
                    block: block.clone(),
                });
            }
        }
    }

    /// Drop whatever `txn_id` holds on `block` and wake waiters
    pub fn unlock(&self, txn_id: TxnId, block: &BlockId) {
        let mut locks = self.locks.lock();
        let now_free = match locks.get_mut(block) {
            Some(LockEntry::Shared(holders)) => {
                holders.remove(&txn_id);
                holders.is_empty()
            }
            Some(LockEntry::Exclusive(holder)) => *holder == txn_id,
            None => false,
        };
        if now_free {
            locks.remove(block);
        }
        self.released.notify_all();
    }

    /// Number of blocks with at least one lock holder
    pub fn locked_blocks(&self) -> usize {
        self.locks.lock().len()
    }
}
