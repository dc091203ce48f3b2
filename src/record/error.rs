use thiserror::Error;

use crate::common::types::BlockId;
use crate::transaction::TransactionError;

/// Errors raised by the record layer
#[derive(Error, Debug)]
pub enum RecordError {
    /// No EMPTY slot remains in the block
    #[error("No free slot in {0}")]
    PageFull(BlockId),

    #[error("Field {0} is not part of the layout")]
    FieldNotFound(String),

    #[error("Slot {slot} does not fit in a block of {block_size} bytes")]
    InvalidSlot { slot: usize, block_size: usize },

    #[error("Value of {len} bytes does not fit field {field} of {max} bytes")]
    StringTooLong { field: String, len: usize, max: usize },

    /// The layout cannot place even one record in a block
    #[error("Slot of {slot_size} bytes does not fit in a block of {block_size} bytes")]
    SlotTooLarge { slot_size: usize, block_size: usize },

    #[error("Field {field} holds a {expected} value")]
    TypeMismatch { field: String, expected: &'static str },

    #[error("Scan has no current record")]
    NoCurrentRecord,

    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),
}

/// Result type for record operations
pub type Result<T> = std::result::Result<T, RecordError>;
