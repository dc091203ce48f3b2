use std::sync::Arc;
use log::debug;
use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::{BlockId, Lsn};
use crate::storage::disk::{DiskManager, DiskManagerError};
use crate::storage::page::{Page, PageError, INT_SIZE};
use crate::transaction::wal::log_iterator::LogIterator;

/// Error type for log manager operations
#[derive(Error, Debug)]
pub enum LogManagerError {
    #[error("Disk error: {0}")]
    DiskError(#[from] DiskManagerError),

    #[error("Page error: {0}")]
    PageError(#[from] PageError),

    #[error("Log record of {size} bytes exceeds the maximum of {max} bytes")]
    RecordTooLarge { size: usize, max: usize },

    #[error("Corrupt log block {block}: {reason}")]
    CorruptBlock { block: BlockId, reason: String },
}

/// Result type for log manager operations
pub type Result<T> = std::result::Result<T, LogManagerError>;

/// Mutable state of the log tail, guarded by one mutex
struct LogTail {
    /// In-memory copy of the current (last) log block
    log_page: Page,
    /// The block `log_page` belongs to
    current_block: BlockId,
    /// LSN of the most recently appended record
    latest_lsn: Lsn,
    /// Highest LSN known to be on disk
    last_saved_lsn: Lsn,
}

/// Manager for write-ahead logging operations.
///
/// Records are opaque byte strings packed back-to-front inside each log block.
/// The first four bytes of a block hold the boundary: the offset of the most
/// recently written record. Reading forward from the boundary therefore yields
/// records newest-first, which is the order recovery wants.
pub struct LogManager {
    disk_manager: Arc<DiskManager>,
    log_file: String,
    tail: Mutex<LogTail>,
}

impl LogManager {
    /// Open the log stored in `log_file`, creating its first block if empty
    pub fn new(disk_manager: Arc<DiskManager>, log_file: impl Into<String>) -> Result<Self> {
        let log_file = log_file.into();
        let block_size = disk_manager.block_size();
        let mut log_page = Page::new(block_size);

        let log_size = disk_manager.length(&log_file)?;
        let current_block = if log_size == 0 {
            Self::append_new_block(&disk_manager, &log_file, &mut log_page)?
        } else {
            let block = BlockId::new(log_file.clone(), log_size - 1);
            disk_manager.read(&block, &mut log_page)?;
            // A block appended just before a crash may never have received its boundary
            if log_page.get_int(0)? == 0 {
                log_page.set_int(0, block_size as i32)?;
                disk_manager.write(&block, &log_page)?;
            }
            block
        };
        debug!("Log {} opened at {}", log_file, current_block);

        Ok(Self {
            disk_manager,
            log_file,
            tail: Mutex::new(LogTail {
                log_page,
                current_block,
                latest_lsn: 0,
                last_saved_lsn: 0,
            }),
        })
    }

    /// Append a record and return its LSN. The record is not durable until
    /// `flush` is called with an LSN at least as large.
    pub fn append(&self, record: &[u8]) -> Result<Lsn> {
        let block_size = self.disk_manager.block_size();
        let bytes_needed = record.len() + INT_SIZE;
        let max = block_size - 2 * INT_SIZE;
        if record.len() > max {
            return Err(LogManagerError::RecordTooLarge { size: record.len(), max });
        }

        let mut tail = self.tail.lock();
        let mut boundary = tail.log_page.get_int(0)? as usize;
        if boundary < bytes_needed + INT_SIZE {
            // Doesn't fit: seal this block and move to a fresh one
            self.flush_tail(&mut tail)?;
            let LogTail { log_page, current_block, .. } = &mut *tail;
            *current_block = Self::append_new_block(&self.disk_manager, &self.log_file, log_page)?;
            boundary = log_page.get_int(0)? as usize;
        }

        let record_pos = boundary - bytes_needed;
        tail.log_page.set_bytes(record_pos, record)?;
        tail.log_page.set_int(0, record_pos as i32)?;
        tail.latest_lsn += 1;
        Ok(tail.latest_lsn)
    }

    /// Ensure every record up to and including `lsn` is on disk
    pub fn flush(&self, lsn: Lsn) -> Result<()> {
        let mut tail = self.tail.lock();
        if lsn > tail.last_saved_lsn {
            self.flush_tail(&mut tail)?;
        }
        Ok(())
    }

    /// Flush the tail and return an iterator over all records, newest first
    pub fn iterator(&self) -> Result<LogIterator> {
        let mut tail = self.tail.lock();
        self.flush_tail(&mut tail)?;
        LogIterator::new(self.disk_manager.clone(), tail.current_block.clone())
    }

    /// LSN of the most recently appended record (0 if none this process)
    pub fn latest_lsn(&self) -> Lsn {
        self.tail.lock().latest_lsn
    }

    /// Highest LSN known to be durable
    pub fn last_saved_lsn(&self) -> Lsn {
        self.tail.lock().last_saved_lsn
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    fn flush_tail(&self, tail: &mut LogTail) -> Result<()> {
        self.disk_manager.write(&tail.current_block, &tail.log_page)?;
        tail.last_saved_lsn = tail.latest_lsn;
        Ok(())
    }

    fn append_new_block(
        disk_manager: &DiskManager,
        log_file: &str,
        log_page: &mut Page,
    ) -> Result<BlockId> {
        let block = disk_manager.append(log_file)?;
        log_page.clear();
        log_page.set_int(0, disk_manager.block_size() as i32)?;
        disk_manager.write(&block, log_page)?;
        Ok(block)
    }
}
