//! Classification index construction.
//!
//! [`Mapping::tag_tables`] compiles the per-table tag declarations into one
//! two-level index from tag key to tag value to destination tables. The index
//! preserves document declaration order: contributions from different tables
//! interleave exactly as authored, which is what gives routing its priority
//! semantics.

use std::fmt;

use indexmap::IndexMap;

use crate::config::{GeometryKind, Key, KeyValues, Mapping, Value};

/// Routing target of a classification index entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestTable {
    pub name: String,
    /// Set when the entry came from a named sub-mapping of the table.
    pub sub_mapping: Option<String>,
}

impl fmt::Display for DestTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_mapping {
            Some(sub) => write!(f, "{}:{}", self.name, sub),
            None => f.write_str(&self.name),
        }
    }
}

/// A destination plus the declaration index of the tag value that routed
/// to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedDestTable {
    pub table: DestTable,
    pub order: usize,
}

/// Compiled classification index: tag key to tag value to destinations.
///
/// Keys and values iterate in first-declaration order. Each destination list
/// is sorted by the document-wide declaration index of the entry that
/// produced it, so tables interleave in authored order rather than grouping
/// by table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagTables(IndexMap<Key, IndexMap<Value, Vec<OrderedDestTable>>>);

impl TagTables {
    /// Destinations routed to by one `key=value` tag; empty when unmapped.
    pub fn destinations(&self, key: &str, value: &str) -> &[OrderedDestTable] {
        self.0
            .get(key)
            .and_then(|values| values.get(value))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&Key, &IndexMap<Value, Vec<OrderedDestTable>>)> {
        self.0.iter()
    }

    /// Number of distinct tag keys.
    pub fn key_count(&self) -> usize {
        self.0.len()
    }

    /// Number of `key=value -> destination` routes.
    pub fn route_count(&self) -> usize {
        self.0
            .values()
            .flat_map(|values| values.values())
            .map(Vec::len)
            .sum()
    }

    fn add(&mut self, block: &KeyValues, dest: &DestTable) {
        for (key, values) in block.iter() {
            for ordered in values {
                self.0
                    .entry(key.clone())
                    .or_default()
                    .entry(ordered.value.clone())
                    .or_default()
                    .push(OrderedDestTable {
                        table: dest.clone(),
                        order: ordered.order,
                    });
            }
        }
    }

    fn finish(&mut self) {
        for values in self.0.values_mut() {
            for dests in values.values_mut() {
                dests.sort_by_key(|dest| dest.order);
            }
        }
    }
}

impl Mapping {
    /// Builds the classification index for `kind`.
    ///
    /// Tables contribute in declaration order when their kind matches `kind`
    /// (the `geometry` wildcard always matches). Per table: the primary
    /// mapping, then each sub-mapping in declaration order, then the
    /// `type_mappings` block for `kind`. A final sort puts every destination
    /// list in document declaration order.
    pub fn tag_tables(&self, kind: GeometryKind) -> TagTables {
        let mut index = TagTables::default();
        for table in self.tables.values() {
            if !table.kind.matches(kind) {
                continue;
            }
            let primary = DestTable {
                name: table.name.clone(),
                sub_mapping: None,
            };
            index.add(&table.mapping, &primary);
            for (sub_name, sub) in &table.sub_mappings {
                let dest = DestTable {
                    name: table.name.clone(),
                    sub_mapping: Some(sub_name.clone()),
                };
                index.add(&sub.mapping, &dest);
            }
            if let Some(block) = table.type_mappings.for_kind(kind) {
                index.add(block, &primary);
            }
        }
        index.finish();
        index
    }
}
