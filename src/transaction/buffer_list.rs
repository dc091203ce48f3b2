use std::collections::HashMap;
use std::sync::Arc;

use crate::common::types::{BlockId, FrameId};
use crate::storage::buffer::{BufferPoolError, BufferPoolManager};

/// The pins held by one transaction.
///
/// A block pinned twice must be unpinned twice; `pins` keeps one entry per
/// outstanding pin so `unpin_all` releases exactly what was taken.
pub struct BufferList {
    buffers: HashMap<BlockId, FrameId>,
    pins: Vec<BlockId>,
    buffer_pool: Arc<BufferPoolManager>,
}

impl BufferList {
    pub fn new(buffer_pool: Arc<BufferPoolManager>) -> Self {
        Self {
            buffers: HashMap::new(),
            pins: Vec::new(),
            buffer_pool,
        }
    }

    /// Frame holding `block`, if this transaction has it pinned
    pub fn frame_id(&self, block: &BlockId) -> Option<FrameId> {
        self.buffers.get(block).copied()
    }

    pub fn pin(&mut self, block: &BlockId) -> Result<FrameId, BufferPoolError> {
        let frame_id = self.buffer_pool.pin(block)?;
        self.buffers.insert(block.clone(), frame_id);
        self.pins.push(block.clone());
        Ok(frame_id)
    }

    /// Release one pin on `block`. Returns false if the block was not pinned.
    pub fn unpin(&mut self, block: &BlockId) -> Result<bool, BufferPoolError> {
        let Some(frame_id) = self.buffers.get(block).copied() else {
            return Ok(false);
        };
        self.buffer_pool.unpin(frame_id)?;
        if let Some(pos) = self.pins.iter().position(|b| b == block) {
            self.pins.remove(pos);
        }
        if !self.pins.contains(block) {
            self.buffers.remove(block);
        }
        Ok(true)
    }

    pub fn unpin_all(&mut self) -> Result<(), BufferPoolError> {
        for block in self.pins.drain(..) {
            if let Some(&frame_id) = self.buffers.get(&block) {
                self.buffer_pool.unpin(frame_id)?;
            }
        }
        self.buffers.clear();
        Ok(())
    }

    /// Outstanding pins, counting repeats
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }
}
