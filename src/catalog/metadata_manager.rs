use std::sync::Arc;

use crate::catalog::stat_manager::{StatInfo, StatManager};
use crate::catalog::table_manager::TableManager;
use crate::query::executor::result::QueryResult;
use crate::record::{Layout, Schema};
use crate::transaction::Transaction;

/// Single entry point to table and statistics metadata
pub struct MetadataManager {
    table_manager: Arc<TableManager>,
    stat_manager: StatManager,
}

impl MetadataManager {
    pub fn new(is_new: bool, tx: &Arc<Transaction>) -> QueryResult<Self> {
        let table_manager = Arc::new(TableManager::new(is_new, tx)?);
        let stat_manager = StatManager::new(table_manager.clone());
        Ok(Self {
            table_manager,
            stat_manager,
        })
    }

    pub fn create_table(&self, name: &str, schema: &Schema, tx: &Arc<Transaction>) -> QueryResult<()> {
        self.table_manager.create_table(name, schema, tx)
    }

    pub fn layout(&self, name: &str, tx: &Arc<Transaction>) -> QueryResult<Layout> {
        self.table_manager.layout(name, tx)
    }

    pub fn table_names(&self, tx: &Arc<Transaction>) -> QueryResult<Vec<String>> {
        self.table_manager.table_names(tx)
    }

    pub fn stat_info(&self, name: &str, layout: &Arc<Layout>, tx: &Arc<Transaction>) -> QueryResult<StatInfo> {
        self.stat_manager.stat_info(name, layout, tx)
    }

    pub fn refresh_statistics(&self, tx: &Arc<Transaction>) -> QueryResult<()> {
        self.stat_manager.refresh(tx)
    }
}
