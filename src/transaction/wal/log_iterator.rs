// AmberDB WAL Log Iterator
//
// Walks the log file backwards, block by block, yielding raw records
// from the most recent one to the oldest.

use std::sync::Arc;

use crate::common::types::BlockId;
use crate::storage::disk::DiskManager;
use crate::storage::page::{Page, INT_SIZE};
use crate::transaction::wal::log_manager::{LogManagerError, Result};

/// Iterator over raw log records in reverse chronological order
pub struct LogIterator {
    disk_manager: Arc<DiskManager>,
    block: BlockId,
    page: Page,
    current_pos: usize,
    done: bool,
}

impl LogIterator {
    /// Start iterating at the newest record of `block` (normally the log tail)
    pub fn new(disk_manager: Arc<DiskManager>, block: BlockId) -> Result<Self> {
        let page = Page::new(disk_manager.block_size());
        let mut iter = Self {
            disk_manager,
            block,
            page,
            current_pos: 0,
            done: false,
        };
        iter.move_to_block(iter.block.clone())?;
        Ok(iter)
    }

    fn move_to_block(&mut self, block: BlockId) -> Result<()> {
        let block_size = self.disk_manager.block_size();
        self.disk_manager.read(&block, &mut self.page)?;
        let boundary = self.page.get_int(0)?;

        self.current_pos = match boundary {
            // A zero-filled block never received a record
            0 => block_size,
            b if (b as usize) < INT_SIZE || b as usize > block_size => {
                return Err(LogManagerError::CorruptBlock {
                    block,
                    reason: format!("boundary {} out of range", b),
                });
            }
            b => b as usize,
        };
        self.block = block;
        Ok(())
    }

    fn read_next(&mut self) -> Result<Option<Vec<u8>>> {
        let block_size = self.disk_manager.block_size();
        while self.current_pos >= block_size {
            if self.block.block_num == 0 {
                return Ok(None);
            }
            let prev = BlockId::new(self.block.file_name.clone(), self.block.block_num - 1);
            self.move_to_block(prev)?;
        }

        let record = self
            .page
            .get_bytes(self.current_pos)
            .map_err(|e| LogManagerError::CorruptBlock {
                block: self.block.clone(),
                reason: e.to_string(),
            })?
            .to_vec();
        self.current_pos += INT_SIZE + record.len();
        Ok(Some(record))
    }
}

impl Iterator for LogIterator {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_next() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
