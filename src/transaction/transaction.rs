// AmberDB Transaction implementation
// Combines locking, logging and pinning behind one handle per unit of work

use std::sync::Arc;
use log::debug;
use parking_lot::Mutex;

use crate::common::types::{BlockId, TxnId};
use crate::storage::buffer::{BufferPoolManager, FramePtr};
use crate::storage::disk::DiskManager;
use crate::transaction::buffer_list::BufferList;
use crate::transaction::concurrency::{ConcurrencyManager, LockTable};
use crate::transaction::error::{Result, TransactionError};
use crate::transaction::recovery::RecoveryManager;
use crate::transaction::wal::LogManager;

/// Transaction states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

/// Transaction - one unit of work over the shared engine.
///
/// Reads take shared locks and writes take exclusive locks; all locks are
/// held until `commit` or `rollback`. Every value change is logged before the
/// page is touched unless the caller opts out with `ok_to_log = false`.
///
/// Methods take `&self` so a transaction can be shared by the scans that run
/// inside it. It is still meant to be driven by one thread at a time.
///
/// Dropping an active transaction leaves its pins and locks in place, as a
/// crash would; call `rollback` to abandon work.
pub struct Transaction {
    txn_id: TxnId,
    state: Mutex<TransactionState>,
    recovery: RecoveryManager,
    concurrency: Mutex<ConcurrencyManager>,
    buffers: Mutex<BufferList>,
    buffer_pool: Arc<BufferPoolManager>,
    disk_manager: Arc<DiskManager>,
}

impl Transaction {
    /// Start transaction `txn_id`; its START record is logged immediately
    pub fn new(
        txn_id: TxnId,
        disk_manager: Arc<DiskManager>,
        log_manager: Arc<LogManager>,
        buffer_pool: Arc<BufferPoolManager>,
        lock_table: Arc<LockTable>,
    ) -> Result<Self> {
        let recovery = RecoveryManager::new(txn_id, log_manager, buffer_pool.clone())?;
        debug!("Started transaction {}", txn_id);
        Ok(Self {
            txn_id,
            state: Mutex::new(TransactionState::Active),
            recovery,
            concurrency: Mutex::new(ConcurrencyManager::new(txn_id, lock_table)),
            buffers: Mutex::new(BufferList::new(buffer_pool.clone())),
            buffer_pool,
            disk_manager,
        })
    }

    pub fn txn_id(&self) -> TxnId {
        self.txn_id
    }

    pub fn state(&self) -> TransactionState {
        *self.state.lock()
    }

    /// Make every change durable, then release locks and pins
    pub fn commit(&self) -> Result<()> {
        self.check_active()?;
        self.recovery.commit()?;
        self.finish(TransactionState::Committed)?;
        debug!("Committed transaction {}", self.txn_id);
        Ok(())
    }

    /// Undo every change, then release locks and pins
    pub fn rollback(&self) -> Result<()> {
        self.check_active()?;
        self.recovery.rollback()?;
        self.finish(TransactionState::RolledBack)?;
        debug!("Rolled back transaction {}", self.txn_id);
        Ok(())
    }

    /// Undo the work of every unfinished transaction in the log.
    /// Only sound while no other transaction is running; `Database::recover`
    /// checks that before calling it.
    pub fn recover(&self) -> Result<()> {
        self.check_active()?;
        self.buffer_pool.flush_all(self.txn_id)?;
        self.recovery.recover()?;
        Ok(())
    }

    pub fn pin(&self, block: &BlockId) -> Result<()> {
        self.check_active()?;
        self.buffers.lock().pin(block)?;
        Ok(())
    }

    pub fn unpin(&self, block: &BlockId) -> Result<()> {
        self.check_active()?;
        if !self.buffers.lock().unpin(block)? {
            return Err(self.not_pinned(block));
        }
        Ok(())
    }

    pub fn get_int(&self, block: &BlockId, offset: usize) -> Result<i32> {
        self.check_active()?;
        self.concurrency.lock().s_lock(block)?;
        let frame = self.pinned_frame(block)?;
        let value = frame.read().page().get_int(offset)?;
        Ok(value)
    }

    pub fn get_string(&self, block: &BlockId, offset: usize) -> Result<String> {
        self.check_active()?;
        self.concurrency.lock().s_lock(block)?;
        let frame = self.pinned_frame(block)?;
        let value = frame.read().page().get_string(offset)?;
        Ok(value)
    }

    /// Overwrite an integer. With `ok_to_log` the old value is logged first.
    pub fn set_int(&self, block: &BlockId, offset: usize, value: i32, ok_to_log: bool) -> Result<()> {
        self.check_active()?;
        self.concurrency.lock().x_lock(block)?;
        let frame = self.pinned_frame(block)?;
        let mut frame = frame.write();
        let lsn = if ok_to_log {
            Some(self.recovery.set_int(&frame, offset)?)
        } else {
            None
        };
        frame.page_mut().set_int(offset, value)?;
        frame.set_modified(self.txn_id, lsn);
        Ok(())
    }

    /// Overwrite a string. With `ok_to_log` the old value is logged first.
    pub fn set_string(&self, block: &BlockId, offset: usize, value: &str, ok_to_log: bool) -> Result<()> {
        self.check_active()?;
        self.concurrency.lock().x_lock(block)?;
        let frame = self.pinned_frame(block)?;
        let mut frame = frame.write();
        let lsn = if ok_to_log {
            Some(self.recovery.set_string(&frame, offset)?)
        } else {
            None
        };
        frame.page_mut().set_string(offset, value)?;
        frame.set_modified(self.txn_id, lsn);
        Ok(())
    }

    /// Number of blocks in `file_name`
    pub fn size(&self, file_name: &str) -> Result<u64> {
        self.check_active()?;
        self.concurrency.lock().s_lock(&BlockId::end_of_file(file_name))?;
        Ok(self.disk_manager.length(file_name)?)
    }

    /// Add a zeroed block to the end of `file_name`
    pub fn append(&self, file_name: &str) -> Result<BlockId> {
        self.check_active()?;
        self.concurrency.lock().x_lock(&BlockId::end_of_file(file_name))?;
        Ok(self.disk_manager.append(file_name)?)
    }

    pub fn block_size(&self) -> usize {
        self.disk_manager.block_size()
    }

    pub fn available_buffers(&self) -> usize {
        self.buffer_pool.available()
    }

    fn finish(&self, final_state: TransactionState) -> Result<()> {
        self.concurrency.lock().release();
        *self.state.lock() = final_state;
        self.buffers.lock().unpin_all()?;
        Ok(())
    }

    fn pinned_frame(&self, block: &BlockId) -> Result<FramePtr> {
        let frame_id = self
            .buffers
            .lock()
            .frame_id(block)
            .ok_or_else(|| self.not_pinned(block))?;
        Ok(self.buffer_pool.frame(frame_id)?.clone())
    }

    fn not_pinned(&self, block: &BlockId) -> TransactionError {
        TransactionError::NotPinned {
            txn_id: self.txn_id,
            block: block.clone(),
        }
    }

    fn check_active(&self) -> Result<()> {
        if *self.state.lock() != TransactionState::Active {
            return Err(TransactionError::InvalidState(self.txn_id));
        }
        Ok(())
    }
}
