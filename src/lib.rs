//! # Tagmap: Tag-Classification Compiler
//!
//! Tagmap compiles a declarative YAML mapping document into the two runtime
//! artifacts a geospatial import pipeline routes elements with:
//!
//! - a [`TagTables`] classification index from tag key/value to destination
//!   tables, preserving document declaration order across every table;
//! - per-table [`ElementFilter`] chains that accept or reject an element
//!   after routing, including the closed-way area/linear heuristic.
//!
//! Both artifacts are built once from an immutable [`Mapping`] and are safe
//! to share read-only across worker threads.
//!
//! ## Example
//!
//! ```
//! use tagmap::{GeometryKind, Mapping};
//!
//! let doc = r#"
//! tables:
//!   roads:
//!     type: linestring
//!     mapping:
//!       highway: [motorway, primary]
//! "#;
//!
//! let mapping: Mapping = doc.parse().unwrap();
//! let index = mapping.tag_tables(GeometryKind::Linestring);
//! assert_eq!(index.destinations("highway", "primary")[0].table.name, "roads");
//!
//! let filters = mapping.element_filters().unwrap();
//! assert!(filters.for_table("roads").is_empty());
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod routing;

mod views;

pub use config::{Field, GeometryKind, Key, KeyValues, Mapping, OrderedValue, Value};
pub use error::{MappingError, Result};
pub use filter::{ElementFilter, FilterWarning, Polarity, TableFilters, ValueMatcher};
pub use routing::{DestTable, OrderedDestTable, TagTables};
