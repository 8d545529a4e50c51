//! Ordered key/values blocks.
//!
//! `mapping`, `require`, and `reject` blocks are authored as YAML mappings
//! from a tag key to a list of tag values, and their declaration order
//! carries meaning: routing priority is resolved by it. A plain map would
//! erase that order, so every decoded value records a document-wide
//! declaration index, assigned by an [`OrderCursor`] the caller threads
//! through each [`parse_key_values`] call.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;
use std::borrow::Borrow;
use std::fmt;

use crate::error::{MappingError, Result};

/// A tag key (`highway`, `building`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

/// A tag value (`primary`, `yes`, ...). Distinct from [`Key`]; the two are
/// never interchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(String);

impl Key {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Value {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value(s)
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Value {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tag value together with its document-wide declaration index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedValue {
    pub value: Value,
    pub order: usize,
}

/// Monotonic declaration-order counter for one document decode.
///
/// A document decode creates a single cursor and threads it through every
/// ordered block it encounters, in document order, so the assigned indices
/// form one total order over all values declared anywhere in the document.
#[derive(Debug, Default)]
pub struct OrderCursor {
    next: usize,
}

impl OrderCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next declaration index and advances the cursor.
    pub fn advance(&mut self) -> usize {
        let order = self.next;
        self.next += 1;
        order
    }
}

/// Ordered multimap from a tag key to its declared values.
///
/// Keys iterate in first-declaration order; the values of a key keep the
/// order the document listed them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyValues(IndexMap<Key, Vec<OrderedValue>>);

impl KeyValues {
    pub fn get(&self, key: &str) -> Option<&[OrderedValue]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &[OrderedValue])> {
        self.0.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, key: Key, value: OrderedValue) {
        self.0.entry(key).or_default().push(value);
    }
}

/// Decodes one ordered key/values block.
///
/// For each `(key, value-list)` pair in document order, for each value in
/// that list in document order, the value is recorded with the cursor's
/// current index and the cursor advances. Any non-string key or value and
/// any value list that is not a sequence fail the decode; a null block is
/// the empty multimap.
pub fn parse_key_values(node: &YamlValue, cursor: &mut OrderCursor) -> Result<KeyValues> {
    let mut kv = KeyValues::default();
    let map = match node {
        YamlValue::Null => return Ok(kv),
        YamlValue::Mapping(map) => map,
        _ => return Err(MappingError::ExpectedMapping("key/values block".into())),
    };

    for (key_node, values_node) in map {
        let key = key_node
            .as_str()
            .ok_or_else(|| MappingError::KeyNotString(node_repr(key_node)))?;
        let values = values_node
            .as_sequence()
            .ok_or_else(|| MappingError::ExpectedValueList(key.to_string()))?;
        for value_node in values {
            let value = value_node.as_str().ok_or_else(|| MappingError::ValueNotString {
                key: key.to_string(),
                value: node_repr(value_node),
            })?;
            kv.push(
                Key::from(key),
                OrderedValue {
                    value: Value::from(value),
                    order: cursor.advance(),
                },
            );
        }
    }
    Ok(kv)
}

/// Short human-readable description of a YAML node, for error messages.
pub(crate) fn node_repr(node: &YamlValue) -> String {
    match node {
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::String(s) => format!("`{s}`"),
        YamlValue::Sequence(_) => "a list".to_string(),
        YamlValue::Mapping(_) => "a mapping".to_string(),
        YamlValue::Tagged(tagged) => format!("tagged value {}", tagged.tag),
    }
}
