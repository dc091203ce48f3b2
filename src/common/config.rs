use std::path::PathBuf;
use std::time::Duration;

use super::types::DEFAULT_BLOCK_SIZE;

/// Default number of frames in the buffer pool
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 8;

/// Default name of the log file inside the data directory
pub const DEFAULT_LOG_FILE: &str = "amberdb.log";

/// Default bound on lock and pin waits
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10);

/// Configuration for a database instance
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Directory holding table files and the log
    pub data_dir: PathBuf,

    /// Size of every block in bytes
    pub block_size: usize,

    /// Number of frames in the buffer pool
    pub buffer_pool_size: usize,

    /// Name of the log file inside `data_dir`
    pub log_file: String,

    /// How long a lock request may wait before failing
    pub lock_timeout: Duration,

    /// How long a pin request may wait for a free frame before failing
    pub pin_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("amberdb_data"),
            block_size: DEFAULT_BLOCK_SIZE,
            buffer_pool_size: DEFAULT_BUFFER_POOL_SIZE,
            log_file: DEFAULT_LOG_FILE.to_string(),
            lock_timeout: DEFAULT_MAX_WAIT,
            pin_timeout: DEFAULT_MAX_WAIT,
        }
    }
}

impl DatabaseConfig {
    /// Default configuration rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_buffer_pool_size(mut self, buffer_pool_size: usize) -> Self {
        self.buffer_pool_size = buffer_pool_size;
        self
    }

    /// Set both the lock and the pin timeout
    pub fn with_timeouts(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self.pin_timeout = timeout;
        self
    }
}
