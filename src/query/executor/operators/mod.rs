// Query Operators Module
//
// Scans in the iterator-based execution model. Each scan walks the records
// of its input one at a time; scans compose by wrapping one another.

pub mod table_scan;
pub mod select;
pub mod project;
pub mod product;

use crate::query::executor::expression::Constant;
use crate::query::executor::result::QueryResult;
use crate::record::Rid;

pub use table_scan::TableScan;
pub use select::SelectScan;
pub use project::ProjectScan;
pub use product::ProductScan;

/// The Scan trait defines the interface for every read-only operator.
pub trait Scan {
    /// Position before the first record
    fn before_first(&mut self) -> QueryResult<()>;

    /// Move to the next record. Returns false once the input is exhausted.
    fn next(&mut self) -> QueryResult<bool>;

    fn get_int(&self, field: &str) -> QueryResult<i32>;

    fn get_string(&self, field: &str) -> QueryResult<String>;

    fn get_val(&self, field: &str) -> QueryResult<Constant>;

    fn has_field(&self, field: &str) -> bool;

    /// Release the pins held by the scan
    fn close(&mut self) -> QueryResult<()>;
}

/// A scan whose current record can be modified in place.
pub trait UpdateScan: Scan {
    fn set_int(&mut self, field: &str, value: i32) -> QueryResult<()>;

    fn set_string(&mut self, field: &str, value: &str) -> QueryResult<()>;

    fn set_val(&mut self, field: &str, value: &Constant) -> QueryResult<()>;

    /// Add a new record and make it current
    fn insert(&mut self) -> QueryResult<()>;

    fn delete(&mut self) -> QueryResult<()>;

    fn rid(&self) -> QueryResult<Rid>;

    fn move_to_rid(&mut self, rid: Rid) -> QueryResult<()>;
}

impl<S: Scan + ?Sized> Scan for Box<S> {
    fn before_first(&mut self) -> QueryResult<()> {
        (**self).before_first()
    }

    fn next(&mut self) -> QueryResult<bool> {
        (**self).next()
    }

    fn get_int(&self, field: &str) -> QueryResult<i32> {
        (**self).get_int(field)
    }

    fn get_string(&self, field: &str) -> QueryResult<String> {
        (**self).get_string(field)
    }

    fn get_val(&self, field: &str) -> QueryResult<Constant> {
        (**self).get_val(field)
    }

    fn has_field(&self, field: &str) -> bool {
        (**self).has_field(field)
    }

    fn close(&mut self) -> QueryResult<()> {
        (**self).close()
    }
}

impl<S: UpdateScan + ?Sized> UpdateScan for Box<S> {
    fn set_int(&mut self, field: &str, value: i32) -> QueryResult<()> {
        (**self).set_int(field, value)
    }

    fn set_string(&mut self, field: &str, value: &str) -> QueryResult<()> {
        (**self).set_string(field, value)
    }

    fn set_val(&mut self, field: &str, value: &Constant) -> QueryResult<()> {
        (**self).set_val(field, value)
    }

    fn insert(&mut self) -> QueryResult<()> {
        (**self).insert()
    }

    fn delete(&mut self) -> QueryResult<()> {
        (**self).delete()
    }

    fn rid(&self) -> QueryResult<Rid> {
        (**self).rid()
    }

    fn move_to_rid(&mut self, rid: Rid) -> QueryResult<()> {
        (**self).move_to_rid(rid)
    }
}
