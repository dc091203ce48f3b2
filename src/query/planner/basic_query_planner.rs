use std::sync::Arc;

use crate::catalog::MetadataManager;
use crate::query::executor::result::{QueryError, QueryResult};
use crate::query::parser::ast::QueryData;
use crate::query::planner::plan::{Plan, ProductPlan, ProjectPlan, SelectPlan, TablePlan};
use crate::transaction::Transaction;

/// Builds the product of the FROM tables in order, then selects, then projects.
/// No reordering or index use.
pub struct BasicQueryPlanner {
    metadata: Arc<MetadataManager>,
}

impl BasicQueryPlanner {
    pub fn new(metadata: Arc<MetadataManager>) -> Self {
        Self { metadata }
    }

    pub fn create_plan(&self, data: &QueryData, tx: &Arc<Transaction>) -> QueryResult<Box<dyn Plan>> {
        let mut plan: Option<Box<dyn Plan>> = None;
        for table in &data.tables {
            let table_plan: Box<dyn Plan> = Box::new(TablePlan::new(tx.clone(), table, &self.metadata)?);
            plan = Some(match plan {
                Some(left) => Box::new(ProductPlan::new(left, table_plan)),
                None => table_plan,
            });
        }
        let plan = plan.ok_or_else(|| QueryError::PlanningError("query names no table".to_string()))?;

        for term in data.predicate.terms() {
            if !term.applies_to(plan.schema()) {
                return Err(QueryError::ColumnNotFound(term.to_string()));
            }
        }
        let plan: Box<dyn Plan> = if data.predicate.is_empty() {
            plan
        } else {
            Box::new(SelectPlan::new(plan, data.predicate.clone()))
        };

        if data.fields.is_empty() {
            return Ok(plan);
        }
        Ok(Box::new(ProjectPlan::new(plan, &data.fields)?))
    }
}
