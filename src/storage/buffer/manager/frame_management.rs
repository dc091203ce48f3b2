use log::debug;

use crate::common::types::{BlockId, FrameId};
use crate::storage::buffer::error::BufferPoolError;
use super::{BufferPoolManager, PoolState};

impl BufferPoolManager {
    /// Pin `block` if it is resident or a frame can be freed for it.
    /// Returns `None` when every frame is pinned.
    pub(super) fn try_to_pin(
        &self,
        state: &mut PoolState,
        block: &BlockId,
    ) -> Result<Option<FrameId>, BufferPoolError> {
        if let Some(&frame_id) = state.page_table.get(block) {
            let mut frame = self.frames[frame_id].write();
            if !frame.is_pinned() {
                state.num_available -= 1;
                state.replacer.remove(frame_id);
            }
            frame.pin();
            return Ok(Some(frame_id));
        }

        let frame_id = match allocate_frame(state) {
            Some(id) => id,
            None => return Ok(None),
        };

        let mut frame = self.frames[frame_id].write();

        // WAL rule: the frame flushes the log through its LSN before the page
        if let Err(e) = frame.flush(&self.disk_manager, &self.log_manager) {
            if frame.block().is_some() {
                state.replacer.restore(frame_id);
            } else {
                state.free_list.push_front(frame_id);
            }
            return Err(e);
        }

        if let Some(old_block) = frame.block().cloned() {
            debug!("Evicting {} from frame {} for {}", old_block, frame_id, block);
            state.page_table.remove(&old_block);
        }

        if let Err(e) = frame.assign_to_block(block.clone(), &self.disk_manager) {
            frame.reset();
            state.free_list.push_back(frame_id);
            return Err(e);
        }

        frame.pin();
        state.num_available -= 1;
        state.page_table.insert(block.clone(), frame_id);
        Ok(Some(frame_id))
    }
}

/// Take a frame from the free list, or evict the replacer's victim
fn allocate_frame(state: &mut PoolState) -> Option<FrameId> {
    if let Some(frame_id) = state.free_list.pop_front() {
        return Some(frame_id);
    }
    state.replacer.victim()
}
