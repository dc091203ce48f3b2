// Projection Operator
//
// Restricts which fields of the input are visible.

use crate::query::executor::expression::Constant;
use crate::query::executor::operators::Scan;
use crate::query::executor::result::{QueryError, QueryResult};

pub struct ProjectScan {
    scan: Box<dyn Scan>,
    fields: Vec<String>,
}

impl ProjectScan {
    pub fn new(scan: Box<dyn Scan>, fields: Vec<String>) -> Self {
        Self { scan, fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn check_field(&self, field: &str) -> QueryResult<()> {
        if self.has_field(field) {
            Ok(())
        } else {
            Err(QueryError::ColumnNotFound(field.to_string()))
        }
    }
}

impl Scan for ProjectScan {
    fn before_first(&mut self) -> QueryResult<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> QueryResult<bool> {
        self.scan.next()
    }

    fn get_int(&self, field: &str) -> QueryResult<i32> {
        self.check_field(field)?;
        self.scan.get_int(field)
    }

    fn get_string(&self, field: &str) -> QueryResult<String> {
        self.check_field(field)?;
        self.scan.get_string(field)
    }

    fn get_val(&self, field: &str) -> QueryResult<Constant> {
        self.check_field(field)?;
        self.scan.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.scan.close()
    }
}
