// AmberDB Query Processing Module
//
// This module contains components for SQL parsing, query planning and execution.

pub mod parser;
pub mod planner;
pub mod executor;

// Export key public interfaces
pub use parser::Parser;
pub use planner::{Plan, Planner};
pub use executor::{Constant, ExecutionResult, QueryError, QueryResult, QueryResultSet, Scan, UpdateScan};
