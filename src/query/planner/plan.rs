// Query Plans
//
// A plan estimates the cost of a relational expression and opens the scan
// that evaluates it.

use std::sync::Arc;

use crate::catalog::{MetadataManager, StatInfo};
use crate::query::executor::expression::Predicate;
use crate::query::executor::operators::{ProductScan, ProjectScan, Scan, SelectScan, TableScan};
use crate::query::executor::result::{QueryError, QueryResult};
use crate::record::{Layout, Schema};
use crate::transaction::Transaction;

pub trait Plan {
    fn open(&self) -> QueryResult<Box<dyn Scan>>;

    /// Estimated block accesses to run the scan to completion
    fn blocks_accessed(&self) -> u64;

    /// Estimated number of output records
    fn records_output(&self) -> u64;

    /// Estimated number of distinct values of `field` in the output
    fn distinct_values(&self, field: &str) -> u64;

    fn schema(&self) -> &Schema;
}

/// Reads a stored table
pub struct TablePlan {
    tx: Arc<Transaction>,
    table_name: String,
    layout: Arc<Layout>,
    stat_info: StatInfo,
}

impl TablePlan {
    pub fn new(tx: Arc<Transaction>, table_name: &str, metadata: &MetadataManager) -> QueryResult<Self> {
        let layout = Arc::new(metadata.layout(table_name, &tx)?);
        let stat_info = metadata.stat_info(table_name, &layout, &tx)?;
        Ok(Self {
            tx,
            table_name: table_name.to_string(),
            layout,
            stat_info,
        })
    }

    /// Open the underlying updatable scan
    pub fn open_table_scan(&self) -> QueryResult<TableScan> {
        TableScan::new(self.tx.clone(), &self.table_name, self.layout.clone())
    }
}

impl Plan for TablePlan {
    fn open(&self) -> QueryResult<Box<dyn Scan>> {
        Ok(Box::new(self.open_table_scan()?))
    }

    fn blocks_accessed(&self) -> u64 {
        self.stat_info.blocks_accessed()
    }

    fn records_output(&self) -> u64 {
        self.stat_info.records_output()
    }

    fn distinct_values(&self, field: &str) -> u64 {
        self.stat_info.distinct_values(field)
    }

    fn schema(&self) -> &Schema {
        self.layout.schema()
    }
}

/// Filters the records of its input
pub struct SelectPlan {
    plan: Box<dyn Plan>,
    predicate: Predicate,
}

impl SelectPlan {
    pub fn new(plan: Box<dyn Plan>, predicate: Predicate) -> Self {
        Self { plan, predicate }
    }
}

impl Plan for SelectPlan {
    fn open(&self) -> QueryResult<Box<dyn Scan>> {
        Ok(Box::new(SelectScan::new(self.plan.open()?, self.predicate.clone())))
    }

    fn blocks_accessed(&self) -> u64 {
        self.plan.blocks_accessed()
    }

    fn records_output(&self) -> u64 {
        self.plan.records_output() / self.predicate.reduction_factor(self.plan.as_ref()).max(1)
    }

    fn distinct_values(&self, field: &str) -> u64 {
        if self.predicate.equates_with_constant(field).is_some() {
            return 1;
        }
        match self.predicate.equates_with_field(field) {
            Some(other) => self
                .plan
                .distinct_values(field)
                .min(self.plan.distinct_values(other)),
            None => self.plan.distinct_values(field),
        }
    }

    fn schema(&self) -> &Schema {
        self.plan.schema()
    }
}

/// Keeps only the named fields of its input
pub struct ProjectPlan {
    plan: Box<dyn Plan>,
    schema: Schema,
}

impl ProjectPlan {
    pub fn new(plan: Box<dyn Plan>, fields: &[String]) -> QueryResult<Self> {
        let mut schema = Schema::new();
        for field in fields {
            if !plan.schema().has_field(field) {
                return Err(QueryError::ColumnNotFound(field.clone()));
            }
            schema.add(field, plan.schema());
        }
        Ok(Self { plan, schema })
    }
}

impl Plan for ProjectPlan {
    fn open(&self) -> QueryResult<Box<dyn Scan>> {
        Ok(Box::new(ProjectScan::new(
            self.plan.open()?,
            self.schema.fields().to_vec(),
        )))
    }

    fn blocks_accessed(&self) -> u64 {
        self.plan.blocks_accessed()
    }

    fn records_output(&self) -> u64 {
        self.plan.records_output()
    }

    fn distinct_values(&self, field: &str) -> u64 {
        self.plan.distinct_values(field)
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Cross product of two inputs
pub struct ProductPlan {
    left: Box<dyn Plan>,
    right: Box<dyn Plan>,
    schema: Schema,
}

impl ProductPlan {
    pub fn new(left: Box<dyn Plan>, right: Box<dyn Plan>) -> Self {
        let mut schema = Schema::new();
        schema.add_all(left.schema());
        schema.add_all(right.schema());
        Self { left, right, schema }
    }
}

impl Plan for ProductPlan {
    fn open(&self) -> QueryResult<Box<dyn Scan>> {
        let left = self.left.open()?;
        let right = self.right.open()?;
        Ok(Box::new(ProductScan::new(left, right)?))
    }

    fn blocks_accessed(&self) -> u64 {
        self.left.blocks_accessed().saturating_add(
            self.left
                .records_output()
                .saturating_mul(self.right.blocks_accessed()),
        )
    }

    fn records_output(&self) -> u64 {
        self.left
            .records_output()
            .saturating_mul(self.right.records_output())
    }

    fn distinct_values(&self, field: &str) -> u64 {
        if self.left.schema().has_field(field) {
            self.left.distinct_values(field)
        } else {
            self.right.distinct_values(field)
        }
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
