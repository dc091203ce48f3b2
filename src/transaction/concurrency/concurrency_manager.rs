use std::collections::HashMap;
use std::sync::Arc;

use crate::common::types::{BlockId, TxnId};
use super::{LockError, LockTable};

/// The strongest lock a transaction holds on a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Per-transaction view of the lock table.
///
/// Remembers what the transaction already holds so repeated requests don't
/// touch the shared table, and releases everything at once at the end of the
/// transaction (strict two-phase locking).
pub struct ConcurrencyManager {
    txn_id: TxnId,
    lock_table: Arc<LockTable>,
    locks: HashMap<BlockId, LockMode>,
    released: bool,
}

impl ConcurrencyManager {
    pub fn new(txn_id: TxnId, lock_table: Arc<LockTable>) -> Self {
        Self {
            txn_id,
            lock_table,
            locks: HashMap::new(),
            released: false,
        }
    }

    pub fn s_lock(&mut self, block: &BlockId) -> Result<(), LockError> {
        self.check_growing()?;
        if !self.locks.contains_key(block) {
            self.lock_table.s_lock(self.txn_id, block)?;
            self.locks.insert(block.clone(), LockMode::Shared);
        }
        Ok(())
    }

    pub fn x_lock(&mut self, block: &BlockId) -> Result<(), LockError> {
        self.check_growing()?;
        if self.locks.get(block) != Some(&LockMode::Exclusive) {
            self.s_lock(block)?;
            self.lock_table.x_lock(self.txn_id, block)?;
            self.locks.insert(block.clone(), LockMode::Exclusive);
        }
        Ok(())
    }

    /// Release every lock. No lock may be acquired afterwards.
    pub fn release(&mut self) {
        for block in self.locks.keys() {
            self.lock_table.unlock(self.txn_id, block);
        }
        self.locks.clear();
        self.released = true;
    }

    pub fn lock_mode(&self, block: &BlockId) -> Option<LockMode> {
        self.locks.get(block).copied()
    }

    fn check_growing(&self) -> Result<(), LockError> {
        if self.released {
            return Err(LockError::LocksReleased(self.txn_id));
        }
        Ok(())
    }
}
