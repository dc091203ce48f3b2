use thiserror::Error;

use crate::common::types::{BlockId, TxnId};
use crate::storage::buffer::BufferPoolError;
use crate::storage::disk::DiskManagerError;
use crate::storage::page::PageError;
use crate::transaction::concurrency::LockError;
use crate::transaction::recovery::RecoveryError;

/// Errors that can occur during transaction processing
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Transaction {0} is already committed or rolled back")]
    InvalidState(TxnId),

    #[error("Transaction {txn_id} has not pinned {block}")]
    NotPinned { txn_id: TxnId, block: BlockId },

    #[error("Lock error: {0}")]
    LockError(#[from] LockError),

    #[error("Recovery error: {0}")]
    RecoveryError(#[from] RecoveryError),

    #[error("Buffer pool error: {0}")]
    BufferPoolError(#[from] BufferPoolError),

    #[error("Disk manager error: {0}")]
    DiskManagerError(#[from] DiskManagerError),

    #[error("Page error: {0}")]
    PageError(#[from] PageError),
}

impl TransactionError {
    /// True when the log could not be decoded during undo
    pub fn is_corruption(&self) -> bool {
        matches!(self, TransactionError::RecoveryError(RecoveryError::Corruption(_)))
    }

    /// True when the error came from a timed-out lock or pin wait
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransactionError::LockError(LockError::LockTimeout { .. })
                | TransactionError::BufferPoolError(BufferPoolError::BufferPoolExhausted { .. })
                | TransactionError::RecoveryError(RecoveryError::BufferPoolError(
                    BufferPoolError::BufferPoolExhausted { .. }
                ))
        )
    }
}

/// Result type for transaction operations
pub type Result<T> = std::result::Result<T, TransactionError>;
