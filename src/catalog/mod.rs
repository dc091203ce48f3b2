//! Catalog Management Module
//!
//! This module manages table metadata. The catalog is itself stored in tables,
//! read and written through ordinary transactions.

pub mod metadata_manager;
pub mod stat_manager;
pub mod table_manager;

// Re-export key types
pub use self::metadata_manager::MetadataManager;
pub use self::stat_manager::{StatInfo, StatManager};
pub use self::table_manager::{TableManager, FIELD_CATALOG, MAX_NAME, TABLE_CATALOG};
