// Product Operator
//
// Nested-loop cross product: every record of the left input paired with
// every record of the right input.

use crate::query::executor::expression::Constant;
use crate::query::executor::operators::Scan;
use crate::query::executor::result::{QueryError, QueryResult};

pub struct ProductScan {
    left: Box<dyn Scan>,
    right: Box<dyn Scan>,
    left_positioned: bool,
}

impl ProductScan {
    pub fn new(left: Box<dyn Scan>, right: Box<dyn Scan>) -> QueryResult<Self> {
        let mut scan = Self {
            left,
            right,
            left_positioned: false,
        };
        scan.before_first()?;
        Ok(scan)
    }

    fn side(&self, field: &str) -> QueryResult<&dyn Scan> {
        if self.left.has_field(field) {
            Ok(self.left.as_ref())
        } else if self.right.has_field(field) {
            Ok(self.right.as_ref())
        } else {
            Err(QueryError::ColumnNotFound(field.to_string()))
        }
    }
}

impl Scan for ProductScan {
    fn before_first(&mut self) -> QueryResult<()> {
        self.left.before_first()?;
        self.left_positioned = self.left.next()?;
        self.right.before_first()
    }

    fn next(&mut self) -> QueryResult<bool> {
        if !self.left_positioned {
            return Ok(false);
        }
        if self.right.next()? {
            return Ok(true);
        }
        self.right.before_first()?;
        self.left_positioned = self.left.next()?;
        Ok(self.left_positioned && self.right.next()?)
    }

    fn get_int(&self, field: &str) -> QueryResult<i32> {
        self.side(field)?.get_int(field)
    }

    fn get_string(&self, field: &str) -> QueryResult<String> {
        self.side(field)?.get_string(field)
    }

    fn get_val(&self, field: &str) -> QueryResult<Constant> {
        self.side(field)?.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.left.has_field(field) || self.right.has_field(field)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.left.close()?;
        self.right.close()
    }
}
