//! Normalized view over instance data.
//!
//! The traversal never inspects a concrete instance representation directly.
//! Each representation implements [`InstanceView`] once, at the boundary, and
//! the engine only sees fields, ordered entries and scalars.

use crate::error::{RenderError, Result};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// An atomic instance value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Number(String),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => write!(f, "{}", s),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Position of an element inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Index(usize),
    Key(String),
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKey::Index(i) => write!(f, "{}", i),
            EntryKey::Key(k) => write!(f, "{}", k),
        }
    }
}

pub trait InstanceView {
    fn is_null(&self) -> bool;

    fn as_scalar(&self) -> Option<Scalar>;

    /// Named fields, in storage order, when the value is mapping-like.
    fn as_fields(&self) -> Option<Vec<(&str, &Self)>>;

    /// Ordered `(key, value)` pairs when the value is a list or a mapping.
    /// Lists are keyed by position, mappings by their keys.
    fn as_entries(&self) -> Option<Vec<(EntryKey, &Self)>>;

    fn field(&self, name: &str) -> Option<&Self> {
        self.as_fields()?
            .into_iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    /// The class the value declares itself an instance of, if it carries one.
    fn type_tag(&self) -> Option<&str> {
        None
    }

    /// Stable identity for the lifetime of a render, used to detect cycles.
    fn identity(&self) -> usize {
        (self as *const Self).cast::<()>() as usize
    }

    /// Null, an empty sequence, or an empty mapping.
    fn is_empty(&self) -> bool {
        if self.is_null() {
            return true;
        }
        if self.as_scalar().is_some() {
            return false;
        }
        self.as_entries().map(|e| e.is_empty()).unwrap_or(false)
    }
}

/// Field carrying the declared class of a JSON/YAML instance.
pub const TYPE_TAG: &str = "@type";

impl InstanceView for Value {
    fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Value::String(s) => Some(Scalar::Str(s.clone())),
            Value::Number(n) => Some(Scalar::Number(n.to_string())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            _ => None,
        }
    }

    fn as_fields(&self) -> Option<Vec<(&str, &Self)>> {
        self.as_object()
            .map(|map| map.iter().map(|(k, v)| (k.as_str(), v)).collect())
    }

    fn as_entries(&self) -> Option<Vec<(EntryKey, &Self)>> {
        match self {
            Value::Array(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (EntryKey::Index(i), v))
                    .collect(),
            ),
            Value::Object(map) => Some(
                map.iter()
                    .map(|(k, v)| (EntryKey::Key(k.clone()), v))
                    .collect(),
            ),
            _ => None,
        }
    }

    fn field(&self, name: &str) -> Option<&Self> {
        self.as_object()?.get(name)
    }

    fn type_tag(&self) -> Option<&str> {
        self.get(TYPE_TAG)?.as_str()
    }
}

pub fn from_yaml_str(input: &str) -> Result<Value> {
    serde_yaml::from_str(input).map_err(|e| RenderError::Instance(e.to_string()))
}

pub fn from_json_str(input: &str) -> Result<Value> {
    serde_json::from_str(input).map_err(|e| RenderError::Instance(e.to_string()))
}

/// Loads instance data from a file, as JSON for `.json` and YAML otherwise.
pub fn from_path(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => from_json_str(&content),
        _ => from_yaml_str(&content),
    }
}
