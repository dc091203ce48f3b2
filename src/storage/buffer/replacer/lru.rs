use std::collections::VecDeque;
use crate::common::types::FrameId;

/// LRU ordering over the frames whose pin count dropped to zero.
/// The front holds the most recently unpinned frame.
pub struct LRUReplacer {
    lru_list: VecDeque<FrameId>,
}

impl LRUReplacer {
    pub fn new(pool_size: usize) -> Self {
        Self {
            lru_list: VecDeque::with_capacity(pool_size),
        }
    }

    /// The frame became evictable
    pub fn record_unpinned(&mut self, frame_id: FrameId) {
        self.remove(frame_id);
        self.lru_list.push_front(frame_id);
    }

    /// The frame was pinned again and is no longer a candidate
    pub fn remove(&mut self, frame_id: FrameId) {
        if let Some(pos) = self.lru_list.iter().position(|&id| id == frame_id) {
            self.lru_list.remove(pos);
        }
    }

    /// Take the least recently unpinned frame
    pub fn victim(&mut self) -> Option<FrameId> {
        self.lru_list.pop_back()
    }

    /// Put a victim back at the cold end, e.g. after its write-back failed
    pub fn restore(&mut self, frame_id: FrameId) {
        self.remove(frame_id);
        self.lru_list.push_back(frame_id);
    }

    pub fn len(&self) -> usize {
        self.lru_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lru_list.is_empty()
    }
}
