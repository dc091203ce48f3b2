// Abstract Syntax Tree for SQL statements

use crate::query::executor::expression::{Constant, Expression, Predicate};
use crate::record::Schema;

/// A parsed SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Query(QueryData),
    Insert(InsertData),
    Delete(DeleteData),
    Modify(ModifyData),
    CreateTable(CreateTableData),
}

/// SELECT fields FROM tables [WHERE predicate]
#[derive(Debug, Clone, PartialEq)]
pub struct QueryData {
    /// Empty for `SELECT *`
    pub fields: Vec<String>,
    pub tables: Vec<String>,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertData {
    pub table: String,
    pub fields: Vec<String>,
    pub values: Vec<Constant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteData {
    pub table: String,
    pub predicate: Predicate,
}

/// UPDATE table SET field = expression [WHERE predicate]
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyData {
    pub table: String,
    pub field: String,
    pub new_value: Expression,
    pub predicate: Predicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableData {
    pub table: String,
    pub schema: Schema,
}
