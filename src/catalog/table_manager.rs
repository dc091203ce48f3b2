// Table Catalog Module
//
// Table metadata lives in two ordinary tables:
//   tblcat(tblname, slotsize)
//   fldcat(tblname, fldname, type, length, offset)

use std::collections::HashMap;
use std::sync::Arc;
use log::info;

use crate::query::executor::operators::{Scan, TableScan, UpdateScan};
use crate::query::executor::result::{QueryError, QueryResult};
use crate::record::{FieldType, Layout, Schema};
use crate::transaction::Transaction;

/// Longest table or field name the catalog stores
pub const MAX_NAME: usize = 16;

pub const TABLE_CATALOG: &str = "tblcat";
pub const FIELD_CATALOG: &str = "fldcat";

pub struct TableManager {
    tcat_layout: Arc<Layout>,
    fcat_layout: Arc<Layout>,
}

impl TableManager {
    /// Open the catalog, registering the catalog tables themselves when
    /// `is_new`
    pub fn new(is_new: bool, tx: &Arc<Transaction>) -> QueryResult<Self> {
        let mut tcat_schema = Schema::new();
        tcat_schema.add_string_field("tblname", MAX_NAME);
        tcat_schema.add_int_field("slotsize");

        let mut fcat_schema = Schema::new();
        fcat_schema.add_string_field("tblname", MAX_NAME);
        fcat_schema.add_string_field("fldname", MAX_NAME);
        fcat_schema.add_int_field("type");
        fcat_schema.add_int_field("length");
        fcat_schema.add_int_field("offset");

        let manager = Self {
            tcat_layout: Arc::new(Layout::new(tcat_schema.clone())),
            fcat_layout: Arc::new(Layout::new(fcat_schema.clone())),
        };

        if is_new {
            info!("Creating catalog tables");
            manager.create_table(TABLE_CATALOG, &tcat_schema, tx)?;
            manager.create_table(FIELD_CATALOG, &fcat_schema, tx)?;
        }
        Ok(manager)
    }

    pub fn create_table(&self, name: &str, schema: &Schema, tx: &Arc<Transaction>) -> QueryResult<()> {
        check_name(name)?;
        for field in schema.fields() {
            check_name(field)?;
        }
        if self.find_slot_size(name, tx)?.is_some() {
            return Err(QueryError::TableAlreadyExists(name.to_string()));
        }

        let layout = Layout::new(schema.clone());
        if layout.slot_size() > tx.block_size() {
            return Err(QueryError::RecordTooLarge {
                table: name.to_string(),
                slot_size: layout.slot_size(),
                block_size: tx.block_size(),
            });
        }

        let mut tcat = TableScan::new(tx.clone(), TABLE_CATALOG, self.tcat_layout.clone())?;
        tcat.insert()?;
        tcat.set_string("tblname", name)?;
        tcat.set_int("slotsize", layout.slot_size() as i32)?;
        tcat.close()?;

        let mut fcat = TableScan::new(tx.clone(), FIELD_CATALOG, self.fcat_layout.clone())?;
        for field in schema.fields() {
            fcat.insert()?;
            fcat.set_string("tblname", name)?;
            fcat.set_string("fldname", field)?;
            fcat.set_int("type", schema.field_type(field).map_or(0, |t| t.code()))?;
            fcat.set_int("length", schema.length(field).unwrap_or(0) as i32)?;
            fcat.set_int("offset", layout.offset(field).unwrap_or(0) as i32)?;
        }
        fcat.close()?;
        Ok(())
    }

    /// Rebuild the layout of `name` from the catalog
    pub fn layout(&self, name: &str, tx: &Arc<Transaction>) -> QueryResult<Layout> {
        let slot_size = self
            .find_slot_size(name, tx)?
            .ok_or_else(|| QueryError::TableNotFound(name.to_string()))?;

        let mut schema = Schema::new();
        let mut offsets = HashMap::new();
        let mut fcat = TableScan::new(tx.clone(), FIELD_CATALOG, self.fcat_layout.clone())?;
        while fcat.next()? {
            if fcat.get_string("tblname")? != name {
                continue;
            }
            let field = fcat.get_string("fldname")?;
            let code = fcat.get_int("type")?;
            let field_type = FieldType::from_code(code).ok_or_else(|| {
                QueryError::CatalogError(format!("unknown type code {} for {}.{}", code, name, field))
            })?;
            schema.add_field(field.clone(), field_type, fcat.get_int("length")? as usize);
            offsets.insert(field, fcat.get_int("offset")? as usize);
        }
        fcat.close()?;
        Ok(Layout::from_parts(schema, offsets, slot_size))
    }

    /// Names of every table in the catalog, in creation order
    pub fn table_names(&self, tx: &Arc<Transaction>) -> QueryResult<Vec<String>> {
        let mut names = Vec::new();
        let mut tcat = TableScan::new(tx.clone(), TABLE_CATALOG, self.tcat_layout.clone())?;
        while tcat.next()? {
            names.push(tcat.get_string("tblname")?);
        }
        tcat.close()?;
        Ok(names)
    }

    fn find_slot_size(&self, name: &str, tx: &Arc<Transaction>) -> QueryResult<Option<usize>> {
        let mut tcat = TableScan::new(tx.clone(), TABLE_CATALOG, self.tcat_layout.clone())?;
        let mut found = None;
        while tcat.next()? {
            if tcat.get_string("tblname")? == name {
                found = Some(tcat.get_int("slotsize")? as usize);
                break;
            }
        }
        tcat.close()?;
        Ok(found)
    }
}

fn check_name(name: &str) -> QueryResult<()> {
    if name.len() > MAX_NAME {
        return Err(QueryError::NameTooLong {
            name: name.to_string(),
            max: MAX_NAME,
        });
    }
    Ok(())
}
