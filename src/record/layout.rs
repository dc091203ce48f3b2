use std::collections::HashMap;

use crate::record::schema::{FieldType, Schema};
use crate::storage::page::{Page, INT_SIZE};

/// Physical placement of a schema's fields within a record slot.
///
/// Each slot starts with an int-width EMPTY/USED flag, followed by the fields
/// in schema order. String fields reserve room for their declared maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    schema: Schema,
    offsets: HashMap<String, usize>,
    slot_size: usize,
}

impl Layout {
    pub fn new(schema: Schema) -> Self {
        let mut offsets = HashMap::new();
        let mut pos = INT_SIZE;
        for name in schema.fields() {
            offsets.insert(name.clone(), pos);
            pos += Self::length_in_bytes(&schema, name);
        }
        Self {
            schema,
            offsets,
            slot_size: pos,
        }
    }

    /// Rebuild a layout read back from the catalog
    pub fn from_parts(schema: Schema, offsets: HashMap<String, usize>, slot_size: usize) -> Self {
        Self {
            schema,
            offsets,
            slot_size,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Byte offset of `field` within a slot
    pub fn offset(&self, field: &str) -> Option<usize> {
        self.offsets.get(field).copied()
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    fn length_in_bytes(schema: &Schema, name: &str) -> usize {
        match schema.field_type(name) {
            Some(FieldType::Varchar) => Page::max_length(schema.length(name).unwrap_or(0)),
            _ => INT_SIZE,
        }
    }
}
