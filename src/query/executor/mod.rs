// Query Executor Module
//
// This module is responsible for running query plans and producing results.
// It implements the iterator-based execution model for query processing.

pub mod expression;
pub mod result;
pub mod operators;

// Export key types
pub use self::expression::{Constant, Expression, Predicate, Term};
pub use self::result::{ExecutionResult, QueryError, QueryResult, QueryResultSet};
pub use self::operators::{ProductScan, ProjectScan, Scan, SelectScan, TableScan, UpdateScan};
