use std::fmt;
use serde::{Serialize, Deserialize};

/// Default block size in bytes (4KB)
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Transaction ID type
pub type TxnId = u32;

/// Buffer pool frame ID type
pub type FrameId = usize;

/// LSN (Log Sequence Number) type
pub type Lsn = u64;

/// Block number sentinel used to lock the end of a file.
/// Growth of a file is serialized through a lock on this marker.
pub const END_OF_FILE: u64 = u64::MAX;

/// Identity of one block: a file name plus a block number within that file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId {
    pub file_name: String,
    pub block_num: u64,
}

impl BlockId {
    pub fn new(file_name: impl Into<String>, block_num: u64) -> Self {
        Self {
            file_name: file_name.into(),
            block_num,
        }
    }

    /// The end-of-file marker block for `file_name`
    pub fn end_of_file(file_name: impl Into<String>) -> Self {
        Self::new(file_name, END_OF_FILE)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn number(&self) -> u64 {
        self.block_num
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.block_num == END_OF_FILE {
            write!(f, "[file {}, block EOF]", self.file_name)
        } else {
            write!(f, "[file {}, block {}]", self.file_name, self.block_num)
        }
    }
}
