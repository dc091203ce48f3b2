// Transaction concurrency module exports

pub mod lock_table;
pub mod concurrency_manager;

use thiserror::Error;

use crate::common::types::{BlockId, TxnId};

pub use lock_table::LockTable;
pub use concurrency_manager::{ConcurrencyManager, LockMode};

/// Errors raised by lock acquisition
#[derive(Error, Debug)]
pub enum LockError {
    #[error("Transaction {txn_id} timed out waiting for a lock on {block}")]
    LockTimeout { txn_id: TxnId, block: BlockId },

    #[error("Transaction {0} already released its locks")]
    LocksReleased(TxnId),
}
