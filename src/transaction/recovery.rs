// AmberDB Transaction Recovery Module
//
// Undo-only recovery. Every dirty page of a transaction is flushed before its
// COMMIT record is written, so committed work never needs to be redone; only
// the changes of unfinished transactions are rolled back.

use std::collections::HashSet;
use std::sync::Arc;
use log::{debug, info};
use thiserror::Error;

use crate::common::types::{Lsn, TxnId};
use crate::storage::buffer::{BufferPoolError, BufferPoolManager, Frame};
use crate::storage::page::PageError;
use crate::transaction::wal::{LogManager, LogManagerError, LogRecord, LogRecordError};

/// Error type for recovery operations
#[derive(Error, Debug)]
pub enum RecoveryError {
    /// The log holds a record that cannot be decoded; recovery cannot go on
    #[error("Log corruption: {0}")]
    Corruption(String),

    #[error("Log manager error: {0}")]
    LogManagerError(#[from] LogManagerError),

    #[error("Log record error: {0}")]
    LogRecordError(#[from] LogRecordError),

    #[error("Buffer pool error: {0}")]
    BufferPoolError(#[from] BufferPoolError),

    #[error("Page error: {0}")]
    PageError(#[from] PageError),

    #[error("Frame {0} holds no block")]
    UnassignedFrame(usize),
}

/// Result type for recovery operations
pub type Result<T> = std::result::Result<T, RecoveryError>;

/// Per-transaction producer of log records and driver of undo.
pub struct RecoveryManager {
    txn_id: TxnId,
    log_manager: Arc<LogManager>,
    buffer_pool: Arc<BufferPoolManager>,
}

impl RecoveryManager {
    /// Create the manager and write the transaction's START record
    pub fn new(
        txn_id: TxnId,
        log_manager: Arc<LogManager>,
        buffer_pool: Arc<BufferPoolManager>,
    ) -> Result<Self> {
        let manager = Self {
            txn_id,
            log_manager,
            buffer_pool,
        };
        manager.write(&LogRecord::Start { txn_id })?;
        Ok(manager)
    }

    /// Flush the transaction's pages, then make its COMMIT record durable
    pub fn commit(&self) -> Result<()> {
        self.buffer_pool.flush_all(self.txn_id)?;
        let lsn = self.write(&LogRecord::Commit { txn_id: self.txn_id })?;
        self.log_manager.flush(lsn)?;
        Ok(())
    }

    /// Undo the transaction's changes, then make its ROLLBACK record durable
    pub fn rollback(&self) -> Result<()> {
        self.do_rollback()?;
        self.buffer_pool.flush_all(self.txn_id)?;
        let lsn = self.write(&LogRecord::Rollback { txn_id: self.txn_id })?;
        self.log_manager.flush(lsn)?;
        Ok(())
    }

    /// Undo every unfinished transaction found in the log, then checkpoint
    pub fn recover(&self) -> Result<()> {
        self.do_recover()?;
        self.buffer_pool.flush_all(self.txn_id)?;
        let lsn = self.write(&LogRecord::Checkpoint { active_transactions: Vec::new() })?;
        self.log_manager.flush(lsn)?;
        Ok(())
    }

    /// Log the integer currently at `offset` in `frame` before it is overwritten
    pub fn set_int(&self, frame: &Frame, offset: usize) -> Result<Lsn> {
        let block = frame
            .block()
            .ok_or(RecoveryError::UnassignedFrame(frame.frame_id()))?
            .clone();
        let old_value = frame.page().get_int(offset)?;
        self.write(&LogRecord::SetInt {
            txn_id: self.txn_id,
            block,
            offset: offset as u32,
            old_value,
        })
    }

    /// Log the string currently at `offset` in `frame` before it is overwritten
    pub fn set_string(&self, frame: &Frame, offset: usize) -> Result<Lsn> {
        let block = frame
            .block()
            .ok_or(RecoveryError::UnassignedFrame(frame.frame_id()))?
            .clone();
        let old_value = frame.page().get_string(offset)?;
        self.write(&LogRecord::SetString {
            txn_id: self.txn_id,
            block,
            offset: offset as u32,
            old_value,
        })
    }

    fn write(&self, record: &LogRecord) -> Result<Lsn> {
        let bytes = record.serialize()?;
        Ok(self.log_manager.append(&bytes)?)
    }

    fn do_rollback(&self) -> Result<()> {
        for bytes in self.log_manager.iterator()? {
            let record = decode(bytes)?;
            if record.txn_id() != Some(self.txn_id) {
                continue;
            }
            if let LogRecord::Start { .. } = record {
                return Ok(());
            }
            self.undo(&record)?;
        }
        Ok(())
    }

    fn do_recover(&self) -> Result<()> {
        info!("Starting database recovery");
        let mut finished: HashSet<TxnId> = HashSet::new();
        let mut started: HashSet<TxnId> = HashSet::new();
        // Unfinished transactions named by a checkpoint whose START is still ahead
        let mut awaited: Option<HashSet<TxnId>> = None;
        let mut undone = 0usize;

        for bytes in self.log_manager.iterator()? {
            let record = decode(bytes)?;
            match &record {
                LogRecord::Checkpoint { active_transactions } => {
                    let waiting: HashSet<TxnId> = active_transactions
                        .iter()
                        .copied()
                        .filter(|t| !finished.contains(t) && !started.contains(t))
                        .collect();
                    debug!("Found checkpoint awaiting {} transactions", waiting.len());
                    if waiting.is_empty() {
                        break;
                    }
                    awaited = Some(waiting);
                }
                LogRecord::Commit { txn_id } | LogRecord::Rollback { txn_id } => {
                    finished.insert(*txn_id);
                }
                LogRecord::Start { txn_id } => {
                    started.insert(*txn_id);
                    if let Some(waiting) = awaited.as_mut() {
                        waiting.remove(txn_id);
                        if waiting.is_empty() {
                            break;
                        }
                    }
                }
                LogRecord::SetInt { txn_id, .. } | LogRecord::SetString { txn_id, .. } => {
                    if !finished.contains(txn_id) {
                        self.undo(&record)?;
                        undone += 1;
                    }
                }
            }
        }
        info!("Recovery complete: {} updates undone", undone);
        Ok(())
    }

    /// Write a record's old value back into its block, without logging
    fn undo(&self, record: &LogRecord) -> Result<()> {
        let (block, offset) = match record {
            LogRecord::SetInt { block, offset, .. } | LogRecord::SetString { block, offset, .. } => {
                (block, *offset as usize)
            }
            _ => return Ok(()),
        };
        debug!("Undoing {}", record);

        let frame_id = self.buffer_pool.pin(block)?;
        let restored = (|| -> Result<()> {
            let mut frame = self.buffer_pool.frame(frame_id)?.write();
            match record {
                LogRecord::SetInt { old_value, .. } => frame.page_mut().set_int(offset, *old_value)?,
                LogRecord::SetString { old_value, .. } => {
                    frame.page_mut().set_string(offset, old_value)?
                }
                _ => {}
            }
            frame.set_modified(self.txn_id, None);
            Ok(())
        })();
        self.buffer_pool.unpin(frame_id)?;
        restored
    }
}

fn decode(bytes: std::result::Result<Vec<u8>, LogManagerError>) -> Result<LogRecord> {
    let bytes = bytes.map_err(|e| RecoveryError::Corruption(e.to_string()))?;
    LogRecord::deserialize(&bytes).map_err(|e| RecoveryError::Corruption(e.to_string()))
}
