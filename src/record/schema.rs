// Schema Module
//
// Field names, types and maximum lengths of a table's record.

use std::collections::HashMap;
use std::fmt;

/// Data types a field can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    Varchar,
}

impl FieldType {
    /// Code stored in the field catalog
    pub fn code(&self) -> i32 {
        match self {
            FieldType::Integer => 4,
            FieldType::Varchar => 12,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            4 => Some(FieldType::Integer),
            12 => Some(FieldType::Varchar),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Integer => write!(f, "INT"),
            FieldType::Varchar => write!(f, "VARCHAR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FieldInfo {
    field_type: FieldType,
    length: usize,
}

/// The record schema of a table. Field order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<String>,
    info: HashMap<String, FieldInfo>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. Re-adding an existing name updates its type and length.
    pub fn add_field(&mut self, name: impl Into<String>, field_type: FieldType, length: usize) {
        let name = name.into();
        if !self.info.contains_key(&name) {
            self.fields.push(name.clone());
        }
        self.info.insert(name, FieldInfo { field_type, length });
    }

    pub fn add_int_field(&mut self, name: impl Into<String>) {
        self.add_field(name, FieldType::Integer, 0);
    }

    /// Add a string field holding at most `max_len` characters
    pub fn add_string_field(&mut self, name: impl Into<String>, max_len: usize) {
        self.add_field(name, FieldType::Varchar, max_len);
    }

    /// Copy one field definition from `other`. Unknown names are ignored.
    pub fn add(&mut self, name: &str, other: &Schema) {
        if let Some(info) = other.info.get(name) {
            self.add_field(name, info.field_type, info.length);
        }
    }

    pub fn add_all(&mut self, other: &Schema) {
        for name in &other.fields {
            self.add(name, other);
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.info.contains_key(name)
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.info.get(name).map(|i| i.field_type)
    }

    /// Declared length; zero for integer fields
    pub fn length(&self, name: &str) -> Option<usize> {
        self.info.get(name).map(|i| i.length)
    }
}
