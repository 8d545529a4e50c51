//! Mapping document model.
//!
//! A mapping document declares destination tables, the tag key/values that
//! route elements into them, per-table filters, and a handful of top-level
//! blocks (`tags`, `areas`, `generalized_tables`) consumed by the host
//! pipeline. Documents load through [`Mapping::from_path`] or `str::parse`,
//! which decode the YAML and then normalize the result.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;

use crate::error::{MappingError, Result};

mod decode;
mod kv;

pub use kv::{Key, KeyValues, OrderCursor, OrderedValue, Value, parse_key_values};

/// Root of a mapping document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping {
    pub tables: IndexMap<String, Table>,
    pub generalized_tables: IndexMap<String, GeneralizedTable>,
    pub tags: Tags,
    pub areas: Areas,
    /// Passthrough for the host pipeline, not interpreted here.
    pub single_id_space: bool,
}

impl Mapping {
    pub fn from_path(path: &Path) -> Result<Self> {
        std::fs::read_to_string(path)?.parse()
    }

    /// Back-fills names from declaration keys and migrates the deprecated
    /// `fields` alias into `columns`. Idempotent.
    fn normalize(&mut self) {
        for (name, table) in &mut self.tables {
            table.name = name.clone();
            if table.fields.is_empty() && !table.old_fields.is_empty() {
                table.fields = table.old_fields.clone();
            }
        }
        for (name, table) in &mut self.generalized_tables {
            table.name = name.clone();
        }
    }
}

impl FromStr for Mapping {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self> {
        let root: YamlValue = serde_yaml::from_str(s)?;
        let mut mapping = decode::decode_document(&root)?;
        mapping.normalize();
        Ok(mapping)
    }
}

/// Destination table declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Declaration key of this table, filled by the normalizer.
    pub name: String,
    pub kind: GeometryKind,
    pub mapping: KeyValues,
    pub sub_mappings: IndexMap<String, SubMapping>,
    pub type_mappings: TypeMappings,
    pub fields: Vec<Field>,
    /// Deprecated `fields` block, migrated into `fields` when no
    /// `columns` block is present.
    pub(crate) old_fields: Vec<Field>,
    pub filters: Option<Filters>,
}

/// Named tag group inside a table's `mappings` block. Elements matched
/// through a sub-mapping carry its name alongside the table name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubMapping {
    pub mapping: KeyValues,
}

/// Per-geometry tag blocks that extend a table's primary mapping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeMappings {
    pub points: KeyValues,
    pub linestrings: KeyValues,
    pub polygons: KeyValues,
}

impl TypeMappings {
    /// The block that extends the primary mapping when building for `target`.
    pub fn for_kind(&self, target: GeometryKind) -> Option<&KeyValues> {
        match target {
            GeometryKind::Point => Some(&self.points),
            GeometryKind::Linestring => Some(&self.linestrings),
            GeometryKind::Polygon => Some(&self.polygons),
            GeometryKind::Geometry | GeometryKind::Relation | GeometryKind::RelationMember => None,
        }
    }
}

/// Per-table filter declarations, applied after the tag index matched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filters {
    /// Deprecated key/value pairs, compiled to reject filters.
    pub exclude_tags: Option<Vec<(Key, Value)>>,
    pub require: KeyValues,
    pub reject: KeyValues,
    pub require_regexp: IndexMap<Key, String>,
    pub reject_regexp: IndexMap<Key, String>,
}

/// Output column of a destination table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub key: Option<Key>,
    #[serde(default)]
    pub keys: Vec<Key>,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub args: IndexMap<String, YamlValue>,
    #[serde(default)]
    pub from_member: bool,
}

/// Top-level `tags` block controlling which keys the host pipeline caches.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tags {
    pub load_all: bool,
    pub include: Vec<Key>,
    pub exclude: Vec<Key>,
}

/// Top-level `areas` block with hints for the closed-way area heuristic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Areas {
    pub area_tags: Option<Vec<Key>>,
    pub linear_tags: Option<Vec<Key>>,
}

/// Derived table materialized by the host pipeline from a source table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralizedTable {
    /// Declaration key of this table, filled by the normalizer.
    #[serde(skip)]
    pub name: String,
    pub source: String,
    pub tolerance: f64,
    pub sql_filter: Option<String>,
}

/// Geometry class a destination table accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Point,
    Linestring,
    Polygon,
    /// Wildcard kind, contributes to every concrete geometry.
    Geometry,
    Relation,
    RelationMember,
}

impl GeometryKind {
    pub const ALL: [GeometryKind; 6] = [
        GeometryKind::Point,
        GeometryKind::Linestring,
        GeometryKind::Polygon,
        GeometryKind::Geometry,
        GeometryKind::Relation,
        GeometryKind::RelationMember,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::Linestring => "linestring",
            GeometryKind::Polygon => "polygon",
            GeometryKind::Geometry => "geometry",
            GeometryKind::Relation => "relation",
            GeometryKind::RelationMember => "relation_member",
        }
    }

    /// Whether a table of this kind contributes when building for `target`.
    pub fn matches(&self, target: GeometryKind) -> bool {
        *self == target || *self == GeometryKind::Geometry
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryKind {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "point" => Ok(GeometryKind::Point),
            "linestring" => Ok(GeometryKind::Linestring),
            "polygon" => Ok(GeometryKind::Polygon),
            "geometry" => Ok(GeometryKind::Geometry),
            "relation" => Ok(GeometryKind::Relation),
            "relation_member" => Ok(GeometryKind::RelationMember),
            "" => Err(MappingError::MissingTableType),
            other => Err(MappingError::UnknownGeometryKind(other.to_string())),
        }
    }
}
