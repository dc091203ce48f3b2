use std::collections::HashMap;
use std::sync::Arc;
use log::debug;
use parking_lot::Mutex;

use crate::catalog::table_manager::TableManager;
use crate::query::executor::operators::{Scan, TableScan};
use crate::query::executor::result::QueryResult;
use crate::record::Layout;
use crate::transaction::Transaction;

/// Statistics are recomputed after this many requests
const REFRESH_INTERVAL: usize = 100;

/// Size estimates for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatInfo {
    num_blocks: u64,
    num_records: u64,
}

impl StatInfo {
    pub fn new(num_blocks: u64, num_records: u64) -> Self {
        Self { num_blocks, num_records }
    }

    pub fn blocks_accessed(&self) -> u64 {
        self.num_blocks
    }

    pub fn records_output(&self) -> u64 {
        self.num_records
    }

    /// Rough guess; no per-field histogram is kept
    pub fn distinct_values(&self, _field: &str) -> u64 {
        1 + self.num_records / 3
    }
}

#[derive(Default)]
struct StatCache {
    table_stats: HashMap<String, StatInfo>,
    num_calls: usize,
}

/// Caches table statistics computed by full scans
pub struct StatManager {
    table_manager: Arc<TableManager>,
    cache: Mutex<StatCache>,
}

impl StatManager {
    pub fn new(table_manager: Arc<TableManager>) -> Self {
        Self {
            table_manager,
            cache: Mutex::new(StatCache::default()),
        }
    }

    pub fn stat_info(&self, table_name: &str, layout: &Arc<Layout>, tx: &Arc<Transaction>) -> QueryResult<StatInfo> {
        let cached = {
            let mut cache = self.cache.lock();
            cache.num_calls += 1;
            if cache.num_calls > REFRESH_INTERVAL {
                cache.table_stats.clear();
                cache.num_calls = 0;
            }
            cache.table_stats.get(table_name).copied()
        };
        if let Some(info) = cached {
            return Ok(info);
        }

        let info = Self::calc_table_stats(table_name, layout, tx)?;
        self.cache.lock().table_stats.insert(table_name.to_string(), info);
        Ok(info)
    }

    /// Recompute the statistics of every catalogued table
    pub fn refresh(&self, tx: &Arc<Transaction>) -> QueryResult<()> {
        let mut table_stats = HashMap::new();
        for name in self.table_manager.table_names(tx)? {
            let layout = Arc::new(self.table_manager.layout(&name, tx)?);
            let info = Self::calc_table_stats(&name, &layout, tx)?;
            table_stats.insert(name, info);
        }
        let mut cache = self.cache.lock();
        cache.table_stats = table_stats;
        cache.num_calls = 0;
        Ok(())
    }

    fn calc_table_stats(table_name: &str, layout: &Arc<Layout>, tx: &Arc<Transaction>) -> QueryResult<StatInfo> {
        let mut num_records = 0;
        let mut scan = TableScan::new(tx.clone(), table_name, layout.clone())?;
        while scan.next()? {
            num_records += 1;
        }
        scan.close()?;
        let num_blocks = tx.size(&format!("{}.tbl", table_name))?;
        debug!("Statistics for {}: {} blocks, {} records", table_name, num_blocks, num_records);
        Ok(StatInfo::new(num_blocks, num_records))
    }
}
