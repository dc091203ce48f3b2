use std::fmt;
use thiserror::Error;
use serde::{Serialize, Deserialize};
use bincode::{serialize, deserialize};

use crate::common::types::{BlockId, TxnId};

/// Error type for log record operations
#[derive(Error, Debug)]
pub enum LogRecordError {
    #[error("Failed to serialize log record: {0}")]
    SerializationError(String),

    #[error("Failed to deserialize log record: {0}")]
    DeserializationError(String),
}

/// Result type for log record operations
pub type Result<T> = std::result::Result<T, LogRecordError>;

/// Kinds of log records, used for filtering and display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRecordType {
    Start,
    Commit,
    Rollback,
    Checkpoint,
    SetInt,
    SetString,
}

/// A write-ahead log record.
///
/// Update records carry the value the field held *before* the change;
/// recovery is undo-only and never needs the new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogRecord {
    /// Marks the beginning of a transaction
    Start { txn_id: TxnId },
    /// Marks the successful completion of a transaction
    Commit { txn_id: TxnId },
    /// Marks that a transaction has been fully rolled back
    Rollback { txn_id: TxnId },
    /// Transactions active when the checkpoint was taken
    Checkpoint { active_transactions: Vec<TxnId> },
    /// An integer field was overwritten; `old_value` restores it
    SetInt {
        txn_id: TxnId,
        block: BlockId,
        offset: u32,
        old_value: i32,
    },
    /// A string field was overwritten; `old_value` restores it
    SetString {
        txn_id: TxnId,
        block: BlockId,
        offset: u32,
        old_value: String,
    },
}

impl LogRecord {
    pub fn record_type(&self) -> LogRecordType {
        match self {
            LogRecord::Start { .. } => LogRecordType::Start,
            LogRecord::Commit { .. } => LogRecordType::Commit,
            LogRecord::Rollback { .. } => LogRecordType::Rollback,
            LogRecord::Checkpoint { .. } => LogRecordType::Checkpoint,
            LogRecord::SetInt { .. } => LogRecordType::SetInt,
            LogRecord::SetString { .. } => LogRecordType::SetString,
        }
    }

    /// The transaction this record belongs to; checkpoints belong to none
    pub fn txn_id(&self) -> Option<TxnId> {
        match self {
            LogRecord::Start { txn_id }
            | LogRecord::Commit { txn_id }
            | LogRecord::Rollback { txn_id }
            | LogRecord::SetInt { txn_id, .. }
            | LogRecord::SetString { txn_id, .. } => Some(*txn_id),
            LogRecord::Checkpoint { .. } => None,
        }
    }

    /// Serialize the log record to bytes
    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(self).map_err(|e| LogRecordError::SerializationError(e.to_string()))
    }

    /// Deserialize bytes into a log record
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        deserialize(data).map_err(|e| LogRecordError::DeserializationError(e.to_string()))
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogRecord::Start { txn_id } => write!(f, "<START {}>", txn_id),
            LogRecord::Commit { txn_id } => write!(f, "<COMMIT {}>", txn_id),
            LogRecord::Rollback { txn_id } => write!(f, "<ROLLBACK {}>", txn_id),
            LogRecord::Checkpoint { active_transactions } => {
                write!(f, "<CHECKPOINT {:?}>", active_transactions)
            }
            LogRecord::SetInt { txn_id, block, offset, old_value } => {
                write!(f, "<SETINT {} {} {} {}>", txn_id, block, offset, old_value)
            }
            LogRecord::SetString { txn_id, block, offset, old_value } => {
                write!(f, "<SETSTRING {} {} {} {}>", txn_id, block, offset, old_value)
            }
        }
    }
}
