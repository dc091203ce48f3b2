// Query Planner Module
//
// This module is responsible for translating parsed SQL statements into
// executable query plans, and for running modifying statements.

pub mod plan;
pub mod basic_query_planner;
pub mod basic_update_planner;

use std::sync::Arc;
use log::debug;

use crate::catalog::MetadataManager;
use crate::query::executor::result::{ExecutionResult, QueryError, QueryResult, QueryResultSet};
use crate::query::parser::{self, Statement};
use crate::transaction::Transaction;

// Export key types
pub use self::plan::{Plan, ProductPlan, ProjectPlan, SelectPlan, TablePlan};
pub use self::basic_query_planner::BasicQueryPlanner;
pub use self::basic_update_planner::BasicUpdatePlanner;

/// Entry point from SQL text to plans and update counts
pub struct Planner {
    query_planner: BasicQueryPlanner,
    update_planner: BasicUpdatePlanner,
}

impl Planner {
    pub fn new(metadata: Arc<MetadataManager>) -> Self {
        Self {
            query_planner: BasicQueryPlanner::new(metadata.clone()),
            update_planner: BasicUpdatePlanner::new(metadata),
        }
    }

    /// Plan a SELECT statement
    pub fn create_query_plan(&self, sql: &str, tx: &Arc<Transaction>) -> QueryResult<Box<dyn Plan>> {
        match parser::parse(sql)? {
            Statement::Query(data) => self.query_planner.create_plan(&data, tx),
            _ => Err(QueryError::PlanningError("expected a SELECT statement".to_string())),
        }
    }

    /// Run an INSERT, DELETE, UPDATE or CREATE TABLE statement
    pub fn execute_update(&self, sql: &str, tx: &Arc<Transaction>) -> QueryResult<usize> {
        match parser::parse(sql)? {
            Statement::Query(_) => Err(QueryError::PlanningError(
                "SELECT is not an update statement".to_string(),
            )),
            statement => self.run_update(&statement, tx),
        }
    }

    /// Run any statement, collecting query output into memory
    pub fn execute(&self, sql: &str, tx: &Arc<Transaction>) -> QueryResult<ExecutionResult> {
        let statement = parser::parse(sql)?;
        debug!("Executing {:?}", statement);
        match statement {
            Statement::Query(data) => {
                let plan = self.query_planner.create_plan(&data, tx)?;
                let columns = plan.schema().fields().to_vec();
                let mut result = QueryResultSet::new(columns.clone());
                let mut scan = plan.open()?;
                while scan.next()? {
                    let row = columns
                        .iter()
                        .map(|c| scan.get_val(c))
                        .collect::<QueryResult<Vec<_>>>()?;
                    result.add_row(row);
                }
                scan.close()?;
                Ok(ExecutionResult::Rows(result))
            }
            statement => Ok(ExecutionResult::Affected(self.run_update(&statement, tx)?)),
        }
    }

    fn run_update(&self, statement: &Statement, tx: &Arc<Transaction>) -> QueryResult<usize> {
        match statement {
            Statement::Insert(data) => self.update_planner.execute_insert(data, tx),
            Statement::Delete(data) => self.update_planner.execute_delete(data, tx),
            Statement::Modify(data) => self.update_planner.execute_modify(data, tx),
            Statement::CreateTable(data) => self.update_planner.execute_create_table(data, tx),
            Statement::Query(_) => Err(QueryError::PlanningError(
                "SELECT is not an update statement".to_string(),
            )),
        }
    }
}
