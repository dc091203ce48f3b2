use std::sync::Arc;
use parking_lot::RwLock;

use crate::common::types::{BlockId, FrameId, Lsn, TxnId};
use crate::storage::disk::DiskManager;
use crate::storage::page::Page;
use crate::transaction::wal::LogManager;
use super::error::BufferPoolError;

/// One slot of the buffer pool: a page plus the bookkeeping needed to decide
/// when it may be evicted and what must be logged before it is written.
#[derive(Debug)]
pub struct Frame {
    frame_id: FrameId,
    page: Page,
    block: Option<BlockId>,
    pin_count: u32,
    is_dirty: bool,
    modified_by: Option<TxnId>,
    lsn: Option<Lsn>,
}

/// Smart pointer to a frame
pub type FramePtr = Arc<RwLock<Frame>>;

impl Frame {
    pub fn new(frame_id: FrameId, block_size: usize) -> Self {
        Self {
            frame_id,
            page: Page::new(block_size),
            block: None,
            pin_count: 0,
            is_dirty: false,
            modified_by: None,
            lsn: None,
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Mutable page access. Callers must follow up with `set_modified`.
    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn block(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn modifying_txn(&self) -> Option<TxnId> {
        self.modified_by
    }

    pub fn lsn(&self) -> Option<Lsn> {
        self.lsn
    }

    /// Mark the page dirty on behalf of `txn_id`. The recorded LSN only moves
    /// forward; `None` means the change was not logged.
    pub fn set_modified(&mut self, txn_id: TxnId, lsn: Option<Lsn>) {
        self.is_dirty = true;
        self.modified_by = Some(txn_id);
        if let Some(lsn) = lsn {
            self.lsn = Some(self.lsn.map_or(lsn, |current| current.max(lsn)));
        }
    }

    pub(crate) fn pin(&mut self) {
        self.pin_count += 1;
    }

    pub(crate) fn unpin(&mut self) -> Result<u32, BufferPoolError> {
        if self.pin_count == 0 {
            return Err(BufferPoolError::FrameNotPinned(self.frame_id));
        }
        self.pin_count -= 1;
        Ok(self.pin_count)
    }

    /// Write the page back if dirty, flushing the log through its LSN first
    pub(crate) fn flush(
        &mut self,
        disk_manager: &DiskManager,
        log_manager: &LogManager,
    ) -> Result<(), BufferPoolError> {
        if !self.is_dirty {
            return Ok(());
        }
        if let Some(block) = &self.block {
            if let Some(lsn) = self.lsn {
                log_manager.flush(lsn)?;
            }
            disk_manager.write(block, &self.page)?;
        }
        self.is_dirty = false;
        self.modified_by = None;
        Ok(())
    }

    /// Load `block` into this frame. The frame must already be clean.
    pub(crate) fn assign_to_block(
        &mut self,
        block: BlockId,
        disk_manager: &DiskManager,
    ) -> Result<(), BufferPoolError> {
        self.block = None;
        disk_manager.read(&block, &mut self.page)?;
        self.block = Some(block);
        self.pin_count = 0;
        self.lsn = None;
        Ok(())
    }

    /// Detach the frame from any block
    pub(crate) fn reset(&mut self) {
        self.page.clear();
        self.block = None;
        self.pin_count = 0;
        self.is_dirty = false;
        self.modified_by = None;
        self.lsn = None;
    }
}
