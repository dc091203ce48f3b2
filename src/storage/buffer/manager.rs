use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use log::warn;
use parking_lot::{Condvar, Mutex, RwLock};

use crate::common::types::{BlockId, FrameId, Lsn, TxnId};
use crate::storage::disk::DiskManager;
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::frame::{Frame, FramePtr};
use crate::storage::buffer::replacer::LRUReplacer;
use crate::transaction::wal::LogManager;

mod frame_management;

/// Bookkeeping shared by every pin/unpin, guarded by the pool mutex
pub(crate) struct PoolState {
    pub(crate) page_table: HashMap<BlockId, FrameId>,
    pub(crate) free_list: VecDeque<FrameId>,
    pub(crate) replacer: LRUReplacer,
    pub(crate) num_available: usize,
}

/// Fixed arena of frames caching blocks on behalf of transactions.
///
/// Lock order is pool state first, then an individual frame. Readers of a
/// pinned frame take only the frame lock: a pinned frame is never reassigned.
pub struct BufferPoolManager {
    pub(crate) pool_size: usize,
    pub(crate) frames: Vec<FramePtr>,
    pub(crate) state: Mutex<PoolState>,
    pub(crate) frame_freed: Condvar,
    pub(crate) disk_manager: Arc<DiskManager>,
    pub(crate) log_manager: Arc<LogManager>,
    pub(crate) max_wait: Duration,
}

impl BufferPoolManager {
    pub fn new(
        pool_size: usize,
        disk_manager: Arc<DiskManager>,
        log_manager: Arc<LogManager>,
        max_wait: Duration,
    ) -> Self {
        let block_size = disk_manager.block_size();
        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = VecDeque::with_capacity(pool_size);

        for frame_id in 0..pool_size {
            frames.push(Arc::new(RwLock::new(Frame::new(frame_id, block_size))));
            free_list.push_back(frame_id);
        }

        Self {
            pool_size,
            frames,
            state: Mutex::new(PoolState {
                page_table: HashMap::new(),
                free_list,
                replacer: LRUReplacer::new(pool_size),
                num_available: pool_size,
            }),
            frame_freed: Condvar::new(),
            disk_manager,
            log_manager,
            max_wait,
        }
    }

    /// Pin `block`, loading it if it is not resident. Waits up to the
    /// configured bound for a frame to become evictable.
    pub fn pin(&self, block: &BlockId) -> Result<FrameId, BufferPoolError> {
        let start = Instant::now();
        let deadline = start + self.max_wait;
        let mut state = self.state.lock();

        loop {
            if let Some(frame_id) = self.try_to_pin(&mut state, block)? {
                return Ok(frame_id);
            }
            if self.frame_freed.wait_until(&mut state, deadline).timed_out() {
                if let Some(frame_id) = self.try_to_pin(&mut state, block)? {
                    return Ok(frame_id);
                }
                warn!("Pin of {} timed out after {:?}", block, start.elapsed());
                return Err(BufferPoolError::BufferPoolExhausted {
                    block: block.clone(),
                    waited: start.elapsed(),
                });
            }
        }
    }

    /// Release one pin. At zero the frame becomes evictable and waiters wake.
    pub fn unpin(&self, frame_id: FrameId) -> Result<(), BufferPoolError> {
        let frame = self.frame(frame_id)?;
        let mut state = self.state.lock();
        let remaining = frame.write().unpin()?;
        if remaining == 0 {
            state.num_available += 1;
            state.replacer.record_unpinned(frame_id);
            self.frame_freed.notify_all();
        }
        Ok(())
    }

    /// Mark a frame dirty on behalf of `txn_id` with the justifying LSN
    pub fn set_modified(
        &self,
        frame_id: FrameId,
        txn_id: TxnId,
        lsn: Option<Lsn>,
    ) -> Result<(), BufferPoolError> {
        self.frame(frame_id)?.write().set_modified(txn_id, lsn);
        Ok(())
    }

    /// Write every frame dirtied by `txn_id` to disk, log first
    pub fn flush_all(&self, txn_id: TxnId) -> Result<(), BufferPoolError> {
        for frame in &self.frames {
            let mut frame_guard = frame.write();
            if frame_guard.modifying_txn() == Some(txn_id) {
                frame_guard.flush(&self.disk_manager, &self.log_manager)?;
            }
        }
        Ok(())
    }

    /// Write every dirty frame to disk
    pub fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        for frame in &self.frames {
            frame.write().flush(&self.disk_manager, &self.log_manager)?;
        }
        Ok(())
    }

    /// Number of frames with a pin count of zero
    pub fn available(&self) -> usize {
        self.state.lock().num_available
    }

    /// Access a frame by handle
    pub fn frame(&self, frame_id: FrameId) -> Result<&FramePtr, BufferPoolError> {
        self.frames
            .get(frame_id)
            .ok_or(BufferPoolError::InvalidFrame(frame_id))
    }

    /// The frame currently holding `block`, if resident
    pub fn resident_frame(&self, block: &BlockId) -> Option<FrameId> {
        self.state.lock().page_table.get(block).copied()
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn log_manager(&self) -> Arc<LogManager> {
        self.log_manager.clone()
    }

    pub fn disk_manager(&self) -> Arc<DiskManager> {
        self.disk_manager.clone()
    }
}
