// Select Operator
//
// Passes through only the records that satisfy a predicate.

use crate::query::executor::expression::{Constant, Predicate};
use crate::query::executor::operators::{Scan, UpdateScan};
use crate::query::executor::result::QueryResult;
use crate::record::Rid;

/// Filters its input by `predicate`. Updatable whenever the input is.
pub struct SelectScan<S> {
    scan: S,
    predicate: Predicate,
}

impl<S: Scan> SelectScan<S> {
    pub fn new(scan: S, predicate: Predicate) -> Self {
        Self { scan, predicate }
    }

    pub fn into_inner(self) -> S {
        self.scan
    }
}

impl<S: Scan> Scan for SelectScan<S> {
    fn before_first(&mut self) -> QueryResult<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> QueryResult<bool> {
        while self.scan.next()? {
            if self.predicate.is_satisfied(&self.scan)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_int(&self, field: &str) -> QueryResult<i32> {
        self.scan.get_int(field)
    }

    fn get_string(&self, field: &str) -> QueryResult<String> {
        self.scan.get_string(field)
    }

    fn get_val(&self, field: &str) -> QueryResult<Constant> {
        self.scan.get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        self.scan.has_field(field)
    }

    fn close(&mut self) -> QueryResult<()> {
        self.scan.close()
    }
}

impl<S: UpdateScan> UpdateScan for SelectScan<S> {
    fn set_int(&mut self, field: &str, value: i32) -> QueryResult<()> {
        self.scan.set_int(field, value)
    }

    fn set_string(&mut self, field: &str, value: &str) -> QueryResult<()> {
        self.scan.set_string(field, value)
    }

    fn set_val(&mut self, field: &str, value: &Constant) -> QueryResult<()> {
        self.scan.set_val(field, value)
    }

    fn insert(&mut self) -> QueryResult<()> {
        self.scan.insert()
    }

    fn delete(&mut self) -> QueryResult<()> {
        self.scan.delete()
    }

    fn rid(&self) -> QueryResult<Rid> {
        self.scan.rid()
    }

    fn move_to_rid(&mut self, rid: Rid) -> QueryResult<()> {
        self.scan.move_to_rid(rid)
    }
}
