//! Field values collected across workflow steps.
//!
//! Each step is responsible for a handful of named fields. Values accumulate
//! in a [`Fields`] map as the user moves forward; the map only ever grows or
//! overwrites existing keys — it is never partially cleared except on an
//! explicit reset of the whole workflow.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A geographic point attached to location fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create a coordinate pair.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A single collected field value.
///
/// The untagged serde representation keeps snapshots readable as natural
/// JSON: `true`, `42.0`, `"plumbing"`, `{"lat":..,"lng":..}`, `[..]`.
///
/// # Example
///
/// ```
/// use stepflow::{Coordinates, FieldValue};
///
/// let value = FieldValue::from(Coordinates::new(52.37, 4.89));
/// let json = serde_json::to_value(&value).unwrap();
/// assert_eq!(json["lat"], 52.37);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Coordinates(Coordinates),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Borrow the value as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the value as a number, if it is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow the value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Coordinates> for FieldValue {
    fn from(value: Coordinates) -> Self {
        FieldValue::Coordinates(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

/// Collected field values keyed by name.
///
/// Backed by a `BTreeMap` so iteration and serialization order are stable
/// across snapshot round-trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    /// Create an empty field map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Returns true if the field is present.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Set a field, overwriting any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Merge another map into this one. Existing keys are overwritten,
    /// absent keys are added; nothing is removed.
    pub fn merge(&mut self, other: Fields) {
        self.0.extend(other.0);
    }

    /// Shorthand for looking up a text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Shorthand for looking up a numeric field.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    /// Shorthand for looking up a boolean field.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_bool)
    }

    /// Number of collected fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no fields have been collected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<N: Into<String>, V: Into<FieldValue>> FromIterator<(N, V)> for Fields {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
