//! Mapping document decode.
//!
//! Order-insensitive subtrees (columns, tags, areas, generalized tables,
//! regexp maps) deserialize with serde. The ordered key/values blocks are
//! walked by hand so that a single [`OrderCursor`] threads through all of
//! them in document order, giving every declared value a document-wide
//! declaration index.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_yaml::Value as YamlValue;

use super::kv::{KeyValues, OrderCursor, node_repr, parse_key_values};
use super::{Filters, GeometryKind, Mapping, SubMapping, Table, TypeMappings};
use crate::error::{MappingError, Result};

pub(crate) fn decode_document(root: &YamlValue) -> Result<Mapping> {
    let mut cursor = OrderCursor::new();
    let mut mapping = Mapping::default();
    let map = match root {
        YamlValue::Null => return Ok(mapping),
        YamlValue::Mapping(map) => map,
        _ => return Err(MappingError::ExpectedMapping("mapping document".into())),
    };

    for (key_node, value) in map {
        let Some(key) = key_node.as_str() else {
            return Err(MappingError::KeyNotString(node_repr(key_node)));
        };
        match key {
            "tables" => mapping.tables = decode_tables(value, &mut cursor)?,
            "generalized_tables" => mapping.generalized_tables = from_yaml(value)?,
            "tags" => mapping.tags = from_yaml(value)?,
            "areas" => mapping.areas = from_yaml(value)?,
            "use_single_id_space" => mapping.single_id_space = from_yaml(value)?,
            // Unknown top-level keys belong to host-pipeline extensions.
            _ => {}
        }
    }
    Ok(mapping)
}

/// serde decode that treats a null node as the type's default.
fn from_yaml<T: DeserializeOwned + Default>(value: &YamlValue) -> Result<T> {
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_value(value.clone())?)
}

fn decode_tables(node: &YamlValue, cursor: &mut OrderCursor) -> Result<IndexMap<String, Table>> {
    let mut tables = IndexMap::new();
    let map = match node {
        YamlValue::Null => return Ok(tables),
        YamlValue::Mapping(map) => map,
        _ => return Err(MappingError::ExpectedMapping("tables block".into())),
    };

    for (name_node, table_node) in map {
        let Some(name) = name_node.as_str() else {
            return Err(MappingError::KeyNotString(node_repr(name_node)));
        };
        let table = decode_table(table_node, cursor).map_err(|e| e.in_table(name))?;
        tables.insert(name.to_string(), table);
    }
    Ok(tables)
}

fn decode_table(node: &YamlValue, cursor: &mut OrderCursor) -> Result<Table> {
    let Some(map) = node.as_mapping() else {
        return Err(MappingError::ExpectedMapping("table definition".into()));
    };

    let mut kind = None;
    let mut mapping = KeyValues::default();
    let mut sub_mappings = IndexMap::new();
    let mut type_mappings = TypeMappings::default();
    let mut fields = Vec::new();
    let mut old_fields = Vec::new();
    let mut filters = None;

    for (key_node, value) in map {
        let Some(key) = key_node.as_str() else {
            return Err(MappingError::KeyNotString(node_repr(key_node)));
        };
        match key {
            "type" => kind = Some(decode_kind(value)?),
            "mapping" => mapping = parse_key_values(value, cursor)?,
            "mappings" => sub_mappings = decode_sub_mappings(value, cursor)?,
            "type_mappings" => type_mappings = decode_type_mappings(value, cursor)?,
            "columns" => fields = from_yaml(value)?,
            "fields" => old_fields = from_yaml(value)?,
            "filters" => filters = Some(decode_filters(value, cursor)?),
            _ => {}
        }
    }

    Ok(Table {
        // Names come from the declaration keys; the normalizer fills them in.
        name: String::new(),
        kind: kind.ok_or(MappingError::MissingTableType)?,
        mapping,
        sub_mappings,
        type_mappings,
        fields,
        old_fields,
        filters,
    })
}

fn decode_kind(node: &YamlValue) -> Result<GeometryKind> {
    match node {
        YamlValue::String(s) => s.parse(),
        YamlValue::Null => Err(MappingError::MissingTableType),
        other => Err(MappingError::UnknownGeometryKind(node_repr(other))),
    }
}

fn decode_sub_mappings(
    node: &YamlValue,
    cursor: &mut OrderCursor,
) -> Result<IndexMap<String, SubMapping>> {
    let mut subs = IndexMap::new();
    let map = match node {
        YamlValue::Null => return Ok(subs),
        YamlValue::Mapping(map) => map,
        _ => return Err(MappingError::ExpectedMapping("mappings block".into())),
    };

    for (name_node, sub_node) in map {
        let Some(name) = name_node.as_str() else {
            return Err(MappingError::KeyNotString(node_repr(name_node)));
        };
        let mut sub = SubMapping::default();
        match sub_node {
            YamlValue::Null => {}
            YamlValue::Mapping(sub_map) => {
                for (key_node, value) in sub_map {
                    if key_node.as_str() == Some("mapping") {
                        sub.mapping = parse_key_values(value, cursor)?;
                    }
                }
            }
            _ => {
                return Err(MappingError::ExpectedMapping(format!("sub-mapping `{name}`")));
            }
        }
        subs.insert(name.to_string(), sub);
    }
    Ok(subs)
}

fn decode_type_mappings(node: &YamlValue, cursor: &mut OrderCursor) -> Result<TypeMappings> {
    let mut type_mappings = TypeMappings::default();
    let map = match node {
        YamlValue::Null => return Ok(type_mappings),
        YamlValue::Mapping(map) => map,
        _ => return Err(MappingError::ExpectedMapping("type_mappings block".into())),
    };

    for (key_node, value) in map {
        let Some(key) = key_node.as_str() else {
            return Err(MappingError::KeyNotString(node_repr(key_node)));
        };
        match key {
            "points" => type_mappings.points = parse_key_values(value, cursor)?,
            "linestrings" => type_mappings.linestrings = parse_key_values(value, cursor)?,
            "polygons" => type_mappings.polygons = parse_key_values(value, cursor)?,
            _ => {}
        }
    }
    Ok(type_mappings)
}

fn decode_filters(node: &YamlValue, cursor: &mut OrderCursor) -> Result<Filters> {
    let mut filters = Filters::default();
    let map = match node {
        YamlValue::Null => return Ok(filters),
        YamlValue::Mapping(map) => map,
        _ => return Err(MappingError::ExpectedMapping("filters block".into())),
    };

    for (key_node, value) in map {
        let Some(key) = key_node.as_str() else {
            return Err(MappingError::KeyNotString(node_repr(key_node)));
        };
        match key {
            "require" => filters.require = parse_key_values(value, cursor)?,
            "reject" => filters.reject = parse_key_values(value, cursor)?,
            "require_regexp" => filters.require_regexp = from_yaml(value)?,
            "reject_regexp" => filters.reject_regexp = from_yaml(value)?,
            "exclude_tags" => {
                if !value.is_null() {
                    filters.exclude_tags = Some(from_yaml(value)?);
                }
            }
            _ => {}
        }
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(yaml: &str) -> Result<Mapping> {
        let root: YamlValue = serde_yaml::from_str(yaml).unwrap();
        decode_document(&root)
    }

    #[test]
    fn cursor_spans_the_whole_document() {
        let mapping = decode(
            r#"
tables:
  first:
    type: point
    mapping:
      amenity: [cafe, bar]
  second:
    type: point
    mapping:
      shop: [bakery]
"#,
        )
        .unwrap();

        let first = &mapping.tables["first"].mapping;
        let second = &mapping.tables["second"].mapping;
        assert_eq!(first.get("amenity").unwrap()[1].order, 1);
        assert_eq!(second.get("shop").unwrap()[0].order, 2);
    }

    #[test]
    fn tables_keep_declaration_order() {
        let mapping = decode(
            r#"
tables:
  zebra: {type: point, mapping: {a: [x]}}
  apple: {type: point, mapping: {b: [y]}}
"#,
        )
        .unwrap();
        let names: Vec<&str> = mapping.tables.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zebra", "apple"]);
    }

    #[test]
    fn decodes_sub_and_type_mappings() {
        let mapping = decode(
            r#"
tables:
  transport:
    type: linestring
    mapping:
      highway: [primary]
    mappings:
      rail:
        mapping:
          railway: [tram]
    type_mappings:
      linestrings:
        barrier: [fence]
"#,
        )
        .unwrap();

        let table = &mapping.tables["transport"];
        assert!(table.sub_mappings["rail"].mapping.get("railway").is_some());
        assert!(table.type_mappings.linestrings.get("barrier").is_some());
        assert!(table.type_mappings.points.is_empty());
    }

    #[test]
    fn decodes_filters_and_exclude_tags() {
        let mapping = decode(
            r#"
tables:
  roads:
    type: linestring
    mapping:
      highway: [primary]
    filters:
      require:
        surface: [paved]
      reject:
        access: ["no"]
      require_regexp:
        ref: "^A[0-9]+"
      exclude_tags:
        - [note, ignore]
"#,
        )
        .unwrap();

        let filters = mapping.tables["roads"].filters.as_ref().unwrap();
        assert!(filters.require.get("surface").is_some());
        assert!(filters.reject.get("access").is_some());
        assert_eq!(filters.require_regexp.get("ref").unwrap(), "^A[0-9]+");
        assert_eq!(
            filters.exclude_tags.as_ref().unwrap()[0],
            ("note".into(), "ignore".into())
        );
    }

    #[test]
    fn errors_carry_table_context() {
        let err = decode(
            r#"
tables:
  roads:
    type: linestring
    mapping:
      highway: primary
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("table `roads`"));
        assert!(err.to_string().contains("must be a list"));
    }

    #[test]
    fn missing_type_is_fatal() {
        let err = decode("tables: {roads: {mapping: {highway: [primary]}}}").unwrap_err();
        assert_eq!(err.to_string(), "table `roads`: missing table type");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mapping = decode(
            r#"
schema_version: 2
tables:
  pois:
    type: point
    comment: not a recognized key
    mapping:
      amenity: [cafe]
"#,
        )
        .unwrap();
        assert_eq!(mapping.tables.len(), 1);
    }

    #[test]
    fn decodes_top_level_blocks() {
        let mapping = decode(
            r#"
tags:
  load_all: true
  include: [name]
  exclude: [created_by]
areas:
  area_tags: [building]
use_single_id_space: true
generalized_tables:
  roads_gen:
    source: roads
    tolerance: 50.0
"#,
        )
        .unwrap();

        assert!(mapping.tags.load_all);
        assert_eq!(mapping.tags.include, vec!["name".into()]);
        assert_eq!(mapping.areas.area_tags, Some(vec!["building".into()]));
        assert!(mapping.single_id_space);
        assert_eq!(mapping.generalized_tables["roads_gen"].tolerance, 50.0);
    }
}
