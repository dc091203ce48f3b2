// AmberDB Database Engine

pub mod common;
pub mod storage;
pub mod transaction;
pub mod record;
pub mod catalog;
pub mod query;
pub mod database;

// Re-export key items for convenient access
pub use common::{BlockId, DatabaseConfig};
pub use database::{Database, DatabaseError};
pub use storage::buffer::{BufferPoolError, BufferPoolManager};
pub use storage::disk::DiskManager;
pub use storage::page::{Page, PageError};
pub use transaction::wal::LogManager;
pub use transaction::{Transaction, TransactionError};
pub use record::{Layout, RecordPage, Schema};
pub use query::{Constant, ExecutionResult, Planner, QueryError, Scan, UpdateScan};
