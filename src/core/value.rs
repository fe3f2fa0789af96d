//! DK-001: Property values, the typed wrapper for every resource input.
//!
//! Values are write-once: constructors validate (finite numbers, unique and
//! non-empty map keys) and nothing hands out a mutable view afterwards.

use super::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A resource input value.
///
/// Map equality ignores key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    String(String),
    Map(IndexMap<String, PropertyValue>),
}

impl PropertyValue {
    /// Wrap a string. Empty strings are valid.
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Wrap a number. NaN and infinities are rejected; `-0` is stored as `0`.
    pub fn number(n: f64) -> Result<Self> {
        if !n.is_finite() {
            return Err(Error::invalid("", format!("number must be finite, got {}", n)));
        }
        Ok(Self::Number(n + 0.0))
    }

    pub fn bool(b: bool) -> Self {
        Self::Bool(b)
    }

    /// Build a map from key/value pairs. Duplicate or empty keys are rejected.
    pub fn map<K, I>(entries: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, PropertyValue)>,
    {
        let mut map = IndexMap::new();
        for (key, value) in entries {
            let key = key.into();
            if key.is_empty() {
                return Err(Error::invalid("", "map key must not be empty"));
            }
            if map.contains_key(&key) {
                return Err(Error::invalid(key, "duplicate map key"));
            }
            map.insert(key, value);
        }
        Ok(Self::Map(map))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, PropertyValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Unambiguous encoding used for hashing. Strings and map keys are
    /// quoted and escaped, map keys sorted, and `-0` folds into `0`, so two
    /// values encode the same iff they compare equal.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        match self {
            Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Self::Number(n) => out.push_str(&(n + 0.0).to_string()),
            Self::String(s) => out.push_str(&format!("{:?}", s)),
            Self::Map(m) => {
                let mut keys: Vec<&String> = m.keys().collect();
                keys.sort();
                out.push('{');
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&format!("{:?}:", key));
                    m[key].write_canonical(out);
                }
                out.push('}');
            }
        }
    }

    /// Type name as shown in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Map(_) => "map",
        }
    }
}

/// Display form: strings quoted, map keys sorted.
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Map(m) => {
                let mut keys: Vec<&String> = m.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, m[*key])?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Unvalidated shape used only while deserializing snapshots.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Number(f64),
    String(String),
    Map(IndexMap<String, RawValue>),
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawValue::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<RawValue> for PropertyValue {
    type Error = Error;

    fn try_from(raw: RawValue) -> Result<Self> {
        match raw {
            RawValue::Bool(b) => Ok(Self::Bool(b)),
            RawValue::Number(n) => Self::number(n),
            RawValue::String(s) => Ok(Self::String(s)),
            RawValue::Map(m) => {
                let mut entries = Vec::with_capacity(m.len());
                for (k, v) in m {
                    entries.push((k, Self::try_from(v)?));
                }
                Self::map(entries)
            }
        }
    }
}

// ============================================================================
// Input conversion
// ============================================================================

/// Conversion from a typed argument field into a validated [`PropertyValue`].
pub trait IntoPropertyValue {
    fn into_property_value(self) -> Result<PropertyValue>;
}

impl IntoPropertyValue for PropertyValue {
    fn into_property_value(self) -> Result<PropertyValue> {
        Ok(self)
    }
}

impl IntoPropertyValue for String {
    fn into_property_value(self) -> Result<PropertyValue> {
        Ok(PropertyValue::String(self))
    }
}

impl IntoPropertyValue for &str {
    fn into_property_value(self) -> Result<PropertyValue> {
        Ok(PropertyValue::string(self))
    }
}

impl IntoPropertyValue for f64 {
    fn into_property_value(self) -> Result<PropertyValue> {
        PropertyValue::number(self)
    }
}

impl IntoPropertyValue for i32 {
    fn into_property_value(self) -> Result<PropertyValue> {
        PropertyValue::number(f64::from(self))
    }
}

impl IntoPropertyValue for u32 {
    fn into_property_value(self) -> Result<PropertyValue> {
        PropertyValue::number(f64::from(self))
    }
}

impl IntoPropertyValue for bool {
    fn into_property_value(self) -> Result<PropertyValue> {
        Ok(PropertyValue::Bool(self))
    }
}

/// A string-to-string map input, checked for duplicate keys on conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringMap {
    entries: Vec<(String, String)>,
}

impl StringMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Duplicates are kept until conversion rejects them.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for StringMap {
    fn from(entries: [(K, V); N]) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoPropertyValue for StringMap {
    fn into_property_value(self) -> Result<PropertyValue> {
        PropertyValue::map(
            self.entries
                .into_iter()
                .map(|(k, v)| (k, PropertyValue::String(v))),
        )
    }
}
