//! Vector data structures
//!
//! - Feature: geometry + attributes
//! - FeatureCollection: features sharing one attribute schema and CRS

mod schema;

pub use schema::{FieldDef, FieldKind, Schema, MAX_FIELD_NAME_LEN};

use crate::crs::CRS;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date { year: u32, month: u32, day: u32 },
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Numeric value, if the attribute holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Whole-number value; floats are accepted only when integral
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            AttributeValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }
}

/// Attribute values of one record, keyed by field name
pub type Attributes = HashMap<String, AttributeValue>;

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes, keyed by the schema's field name
    pub properties: Attributes,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: Attributes::new(),
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: Attributes::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    pub fn remove_property(&mut self, key: &str) -> Option<AttributeValue> {
        self.properties.remove(key)
    }
}

/// Collection of features sharing one schema
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    schema: Schema,
    crs: Option<CRS>,
}

impl FeatureCollection {
    pub fn new(schema: Schema) -> Self {
        Self {
            features: Vec::new(),
            schema,
            crs: None,
        }
    }

    pub fn with_crs(mut self, crs: Option<CRS>) -> Self {
        self.crs = crs;
        self
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Feature> {
        self.features.iter_mut()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Drop a field from the schema and from every feature.
    ///
    /// Returns the removed definition, or `None` if no such field exists.
    pub fn remove_field(&mut self, name: &str) -> Option<FieldDef> {
        let removed = self.schema.remove(name)?;
        for feature in &mut self.features {
            feature.remove_property(&removed.name);
        }
        Some(removed)
    }

    /// Values of one field across all features, `Null` where unset
    pub fn column(&self, name: &str) -> Option<Vec<AttributeValue>> {
        let field = self.schema.find(name)?;
        Some(
            self.features
                .iter()
                .map(|f| {
                    f.get_property(&field.name)
                        .cloned()
                        .unwrap_or(AttributeValue::Null)
                })
                .collect(),
        )
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
