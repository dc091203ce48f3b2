use std::sync::Arc;
use log::debug;

use crate::catalog::MetadataManager;
use crate::query::executor::operators::{Scan, SelectScan, UpdateScan};
use crate::query::executor::result::{QueryError, QueryResult};
use crate::query::parser::ast::{CreateTableData, DeleteData, InsertData, ModifyData};
use crate::query::planner::plan::TablePlan;
use crate::transaction::Transaction;

/// Runs modifying statements directly against table scans.
/// Each method returns the number of affected records.
pub struct BasicUpdatePlanner {
    metadata: Arc<MetadataManager>,
}

impl BasicUpdatePlanner {
    pub fn new(metadata: Arc<MetadataManager>) -> Self {
        Self { metadata }
    }

    pub fn execute_insert(&self, data: &InsertData, tx: &Arc<Transaction>) -> QueryResult<usize> {
        if data.fields.len() != data.values.len() {
            return Err(QueryError::PlanningError(format!(
                "{} fields but {} values",
                data.fields.len(),
                data.values.len()
            )));
        }
        let plan = TablePlan::new(tx.clone(), &data.table, &self.metadata)?;
        let mut scan = plan.open_table_scan()?;
        let result = (|| -> QueryResult<usize> {
            scan.insert()?;
            for (field, value) in data.fields.iter().zip(&data.values) {
                scan.set_val(field, value)?;
            }
            Ok(1)
        })();
        scan.close()?;
        result
    }

    pub fn execute_delete(&self, data: &DeleteData, tx: &Arc<Transaction>) -> QueryResult<usize> {
        let plan = TablePlan::new(tx.clone(), &data.table, &self.metadata)?;
        let mut scan = SelectScan::new(plan.open_table_scan()?, data.predicate.clone());
        let mut count = 0;
        while scan.next()? {
            scan.delete()?;
            count += 1;
        }
        scan.close()?;
        debug!("Deleted {} records from {}", count, data.table);
        Ok(count)
    }

    pub fn execute_modify(&self, data: &ModifyData, tx: &Arc<Transaction>) -> QueryResult<usize> {
        let plan = TablePlan::new(tx.clone(), &data.table, &self.metadata)?;
        let mut scan = SelectScan::new(plan.open_table_scan()?, data.predicate.clone());
        let mut count = 0;
        while scan.next()? {
            let value = data.new_value.evaluate(&scan)?;
            scan.set_val(&data.field, &value)?;
            count += 1;
        }
        scan.close()?;
        debug!("Modified {} records of {}", count, data.table);
        Ok(count)
    }

    pub fn execute_create_table(&self, data: &CreateTableData, tx: &Arc<Transaction>) -> QueryResult<usize> {
        self.metadata.create_table(&data.table, &data.schema, tx)?;
        Ok(0)
    }
}
