//! Derived views over a mapping document.
//!
//! The host pipeline uses these to decide which tag keys to retain while
//! decoding elements and to generate per-table schemas.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::config::{Field, GeometryKind, Key, Mapping, Table};

impl Table {
    /// Tag keys referenced by this table's field definitions.
    pub fn extra_tags(&self) -> HashSet<Key> {
        let mut keys = HashSet::new();
        for field in &self.fields {
            if let Some(key) = &field.key {
                if !key.as_str().is_empty() {
                    keys.insert(key.clone());
                }
            }
            for key in &field.keys {
                keys.insert(key.clone());
            }
        }
        keys
    }
}

impl Mapping {
    /// Tag keys the host must retain when decoding elements for `kind`.
    ///
    /// Union of the field keys of every matching table, the keys named by
    /// deprecated `exclude_tags` blocks, the document's globally included
    /// keys, and `area`, which the closed-way heuristic always inspects.
    pub fn extra_tags(&self, kind: GeometryKind) -> HashSet<Key> {
        let mut keys = HashSet::new();
        for table in self.tables.values() {
            if !table.kind.matches(kind) {
                continue;
            }
            keys.extend(table.extra_tags());
            if let Some(pairs) = table.filters.as_ref().and_then(|f| f.exclude_tags.as_ref()) {
                keys.extend(pairs.iter().map(|(key, _)| key.clone()));
            }
        }
        keys.extend(self.tags.include.iter().cloned());
        keys.insert(Key::from("area"));
        keys
    }

    /// Field definitions of every table matching `kind`, in declaration
    /// order. Consumed by schema generation, not interpreted here.
    pub fn fields_by_table(&self, kind: GeometryKind) -> IndexMap<&str, &[Field]> {
        self.tables
            .values()
            .filter(|table| table.kind.matches(kind))
            .map(|table| (table.name.as_str(), table.fields.as_slice()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(yaml: &str) -> Mapping {
        yaml.parse().unwrap()
    }

    fn names(keys: &HashSet<Key>) -> Vec<&str> {
        let mut names: Vec<&str> = keys.iter().map(Key::as_str).collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn table_extra_tags_collects_field_keys() {
        let doc = mapping(
            r#"
tables:
  pois:
    type: point
    columns:
      - name: osm_id
        type: id
      - name: height
        type: string
        key: height
      - name: class
        type: mapping_value
        keys: [amenity, shop]
    mapping:
      amenity: [cafe]
"#,
        );

        let keys = doc.tables["pois"].extra_tags();
        assert_eq!(names(&keys), vec!["amenity", "height", "shop"]);
    }

    #[test]
    fn aggregate_covers_matching_and_wildcard_tables() {
        let doc = mapping(
            r#"
tags:
  include: [name]
tables:
  pois:
    type: point
    columns:
      - name: religion
        type: string
        key: religion
    mapping:
      amenity: [place_of_worship]
  all:
    type: geometry
    columns:
      - name: layer
        type: string
        key: layer
    mapping:
      natural: [water]
  roads:
    type: linestring
    columns:
      - name: oneway
        type: string
        key: oneway
    mapping:
      highway: [primary]
"#,
        );

        let keys = doc.extra_tags(GeometryKind::Point);
        assert_eq!(names(&keys), vec!["area", "layer", "name", "religion"]);
    }

    #[test]
    fn aggregate_includes_exclude_tags_keys() {
        let doc = mapping(
            r#"
tables:
  roads:
    type: linestring
    mapping:
      highway: [primary]
    filters:
      exclude_tags:
        - [construction, "yes"]
"#,
        );

        let keys = doc.extra_tags(GeometryKind::Linestring);
        assert_eq!(names(&keys), vec!["area", "construction"]);
    }

    #[test]
    fn fields_by_table_filters_on_kind() {
        let doc = mapping(
            r#"
tables:
  pois:
    type: point
    columns:
      - name: osm_id
        type: id
    mapping:
      amenity: [cafe]
  all:
    type: geometry
    mapping:
      natural: [water]
  roads:
    type: linestring
    mapping:
      highway: [primary]
"#,
        );

        let by_table = doc.fields_by_table(GeometryKind::Point);
        let tables: Vec<&str> = by_table.keys().copied().collect();
        assert_eq!(tables, vec!["pois", "all"]);
        assert_eq!(by_table["pois"].len(), 1);
        assert!(by_table["all"].is_empty());
    }
}
