// AmberDB Write-Ahead Logging Module

pub mod log_record;
pub mod log_manager;
pub mod log_iterator;

pub use log_manager::{LogManager, LogManagerError, Result};
pub use log_iterator::LogIterator;
pub use log_record::{LogRecord, LogRecordError, LogRecordType};
