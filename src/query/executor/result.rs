// Query Result Implementation
//
// This module defines the error and result types for query execution.

use thiserror::Error;

use crate::query::executor::expression::Constant;
use crate::query::parser::ParseError;
use crate::record::RecordError;
use crate::transaction::TransactionError;

/// Errors raised while planning or running a statement
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),

    #[error("Name {name} is longer than {max} bytes")]
    NameTooLong { name: String, max: usize },

    #[error("Records of table {table} take {slot_size} bytes, more than a {block_size}-byte block")]
    RecordTooLarge { table: String, slot_size: usize, block_size: usize },

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Record error: {0}")]
    RecordError(#[from] RecordError),

    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Planning error: {0}")]
    PlanningError(String),
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Rows produced by a query, in output column order
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Constant>>,
}

impl QueryResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        QueryResultSet {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<Constant>) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Constant>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Outcome of running one SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Rows(QueryResultSet),
    /// Number of records inserted, deleted or modified
    Affected(usize),
}
