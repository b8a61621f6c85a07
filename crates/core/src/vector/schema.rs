//! Attribute table schema
//!
//! Field definitions follow dBASE III conventions since every dataset the
//! tool touches ends up in a `.dbf` file: names are at most 10 bytes and
//! are matched case-insensitively.

use crate::error::{Error, Result};
use std::fmt;

/// Maximum length of a dBASE field name in bytes
pub const MAX_FIELD_NAME_LEN: usize = 10;

/// Column type of an attribute field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Fixed-width text
    Character { length: u8 },
    /// Fixed-point decimal stored as text
    Numeric { length: u8, decimals: u8 },
    /// Floating point stored as text
    Float { length: u8, decimals: u8 },
    /// Binary 32-bit integer
    Integer,
    /// Binary 64-bit float
    Double,
    Logical,
    Date,
}

impl FieldKind {
    /// Whether values of this kind are numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldKind::Numeric { .. } | FieldKind::Float { .. } | FieldKind::Integer | FieldKind::Double
        )
    }

    /// Whether values of this kind are whole numbers
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            FieldKind::Integer | FieldKind::Numeric { decimals: 0, .. }
        )
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Character { length } => write!(f, "Character({})", length),
            FieldKind::Numeric { length, decimals } => write!(f, "Numeric({}.{})", length, decimals),
            FieldKind::Float { length, decimals } => write!(f, "Float({}.{})", length, decimals),
            FieldKind::Integer => write!(f, "Integer"),
            FieldKind::Double => write!(f, "Double"),
            FieldKind::Logical => write!(f, "Logical"),
            FieldKind::Date => write!(f, "Date"),
        }
    }
}

/// A named attribute column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Numeric field with the given width and decimal places
    pub fn numeric(name: impl Into<String>, length: u8, decimals: u8) -> Self {
        Self::new(name, FieldKind::Numeric { length, decimals })
    }

    pub fn character(name: impl Into<String>, length: u8) -> Self {
        Self::new(name, FieldKind::Character { length })
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Ordered list of attribute fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Build a schema from field definitions, validating each one
    pub fn from_fields(fields: impl IntoIterator<Item = FieldDef>) -> Result<Self> {
        let mut schema = Self::new();
        for field in fields {
            schema.push(field)?;
        }
        Ok(schema)
    }

    /// Append a field.
    ///
    /// Fails on empty, over-long or duplicate names.
    pub fn push(&mut self, field: FieldDef) -> Result<()> {
        if field.name.is_empty() || field.name.len() > MAX_FIELD_NAME_LEN {
            return Err(Error::InvalidParameter {
                name: "field name",
                value: field.name,
                reason: format!("must be 1..={} bytes", MAX_FIELD_NAME_LEN),
            });
        }
        if self.contains(&field.name) {
            return Err(Error::invalid_input(format!(
                "duplicate field name: {}",
                field.name
            )));
        }
        self.fields.push(field);
        Ok(())
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.is_named(name))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.is_named(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Remove a field, returning its definition if it was present
    pub fn remove(&mut self, name: &str) -> Option<FieldDef> {
        self.position(name).map(|idx| self.fields.remove(idx))
    }

    /// Field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let schema = Schema::from_fields([FieldDef::numeric("Id", 6, 0)]).unwrap();
        assert!(schema.contains("ID"));
        assert_eq!(schema.find("id").unwrap().name, "Id");
    }

    #[test]
    fn test_rejects_long_and_duplicate_names() {
        let mut schema = Schema::new();
        assert!(schema.push(FieldDef::numeric("ABCDEFGHIJK", 6, 0)).is_err());
        schema.push(FieldDef::numeric("Id", 6, 0)).unwrap();
        assert!(schema.push(FieldDef::character("ID", 10)).is_err());
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut schema = Schema::from_fields([
            FieldDef::numeric("A", 6, 0),
            FieldDef::numeric("B", 6, 0),
            FieldDef::numeric("C", 6, 0),
        ])
        .unwrap();
        assert!(schema.remove("b").is_some());
        assert!(schema.remove("b").is_none());
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["A", "C"]);
    }

    #[test]
    fn test_integral_kinds() {
        assert!(FieldKind::Numeric { length: 6, decimals: 0 }.is_integral());
        assert!(!FieldKind::Numeric { length: 19, decimals: 11 }.is_integral());
        assert!(FieldKind::Double.is_numeric());
        assert!(!FieldKind::Logical.is_numeric());
    }
}
