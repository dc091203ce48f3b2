// AmberDB Transaction Management Module

pub mod wal;
pub mod concurrency;
pub mod recovery;
pub mod buffer_list;
pub mod error;
#[allow(clippy::module_inception)]
pub mod transaction;

// Public exports
pub use wal::log_manager::LogManager;
pub use wal::log_record::{LogRecord, LogRecordType};
pub use concurrency::{ConcurrencyManager, LockError, LockMode, LockTable};
pub use recovery::{RecoveryError, RecoveryManager};
pub use buffer_list::BufferList;
pub use error::TransactionError;
pub use transaction::{Transaction, TransactionState};
