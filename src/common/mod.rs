pub mod types;
pub mod config;

pub use types::{BlockId, FrameId, Lsn, TxnId, DEFAULT_BLOCK_SIZE, END_OF_FILE};
pub use config::DatabaseConfig;
