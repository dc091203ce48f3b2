use std::time::Duration;
use thiserror::Error;

use crate::common::types::{BlockId, FrameId};
use crate::storage::disk::DiskManagerError;
use crate::transaction::wal::LogManagerError;

#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error("Buffer pool exhausted: no frame became available for {block} within {waited:?}")]
    BufferPoolExhausted { block: BlockId, waited: Duration },
    #[error("Disk manager error: {0}")]
    DiskManagerError(#[from] DiskManagerError),
    #[error("Log manager error: {0}")]
    LogManagerError(#[from] LogManagerError),
    #[error("Frame {0} does not exist")]
    InvalidFrame(FrameId),
    #[error("Frame {0} is not pinned")]
    FrameNotPinned(FrameId),
}
