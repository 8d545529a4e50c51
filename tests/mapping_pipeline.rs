use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tagmap::{GeometryKind, Mapping};

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixture")
        .join("mapping.yml")
}

fn tags(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn fixture_routes_and_filters_end_to_end() {
    let mapping = Mapping::from_path(&fixture_path()).expect("load fixture");
    let index = mapping.tag_tables(GeometryKind::Linestring);
    let filters = mapping.element_filters().expect("compile filters");

    // A primary highway routes to roads and passes its filter chain.
    let dests = index.destinations("highway", "primary");
    assert_eq!(dests.len(), 1);
    assert_eq!(dests[0].table.name, "roads");
    let element = tags(&[("highway", "primary"), ("name", "High Street")]);
    assert!(filters.accepts("roads", &element, "highway", false));

    // A closed way tagged area=yes is rejected by the roads chain, both by
    // the area heuristic and by the declared reject filter.
    let pedestrian_square = tags(&[("highway", "service"), ("area", "yes")]);
    assert!(!filters.accepts("roads", &pedestrian_square, "highway", true));

    // Sub-mapping routes carry the sub-mapping name.
    let rail = index.destinations("railway", "tram");
    assert_eq!(rail.len(), 1);
    assert_eq!(rail[0].table.sub_mapping.as_deref(), Some("rail"));

    // The geometry wildcard table takes linestring waterways too.
    assert_eq!(index.destinations("waterway", "stream")[0].table.name, "water");
}

#[test]
fn fixture_wildcard_table_spans_kinds() {
    let mapping = Mapping::from_path(&fixture_path()).expect("load fixture");

    for kind in GeometryKind::ALL {
        let index = mapping.tag_tables(kind);
        assert_eq!(
            index.destinations("natural", "water")[0].table.name,
            "water",
            "natural=water should route for {kind}"
        );
    }

    // The per-kind extension blocks stay with their kind.
    let points = mapping.tag_tables(GeometryKind::Point);
    assert!(points.destinations("landuse", "basin").is_empty());
    let polygons = mapping.tag_tables(GeometryKind::Polygon);
    assert_eq!(polygons.destinations("landuse", "basin")[0].table.name, "water");

    // Relation kinds see only the primary mapping of the wildcard table.
    let relations = mapping.tag_tables(GeometryKind::Relation);
    assert_eq!(relations.key_count(), 2);
    assert_eq!(relations.route_count(), 2);
    assert_eq!(relations.destinations("waterway", "riverbank")[0].table.name, "water");
    assert!(relations.destinations("waterway", "stream").is_empty());
}

#[test]
fn fixture_views_feed_the_host_pipeline() {
    let mapping = Mapping::from_path(&fixture_path()).expect("load fixture");

    let keys = mapping.extra_tags(GeometryKind::Linestring);
    let mut names: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["area", "name", "ref", "tunnel"]);

    let by_table = mapping.fields_by_table(GeometryKind::Point);
    let tables: Vec<&str> = by_table.keys().copied().collect();
    assert_eq!(tables, vec!["pois", "water"]);
    assert_eq!(by_table["pois"].len(), 4);
}

#[test]
fn fixture_passthrough_blocks_survive_decode() {
    let mapping = Mapping::from_path(&fixture_path()).expect("load fixture");

    assert!(mapping.single_id_space);
    assert_eq!(mapping.tags.exclude.len(), 2);
    assert_eq!(mapping.areas.linear_tags.as_ref().map(Vec::len), Some(2));

    let roads_gen = &mapping.generalized_tables["roads_gen"];
    assert_eq!(roads_gen.name, "roads_gen");
    assert_eq!(roads_gen.source, "roads");
    assert_eq!(roads_gen.tolerance, 50.0);
    assert!(
        roads_gen
            .sql_filter
            .as_deref()
            .is_some_and(|f| f.contains("motorway"))
    );
}
