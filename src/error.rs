//! Error types for mapping compilation.

use thiserror::Error;

/// Fatal failure while decoding or compiling a mapping document.
///
/// Any of these aborts the compile; a document is never partially activated.
#[derive(Debug, Error)]
pub enum MappingError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A structural node (document root, `tables`, a table body, ...) was not
    /// a YAML mapping.
    #[error("{0} must be a mapping")]
    ExpectedMapping(String),

    /// A key inside an ordered key/values block was not a string scalar.
    #[error("mapping key {0} is not a string")]
    KeyNotString(String),

    /// The values for a key were not given as a list.
    #[error("values for mapping key `{0}` must be a list")]
    ExpectedValueList(String),

    /// A single value inside a value list was not a string scalar.
    #[error("value {value} for mapping key `{key}` is not a string")]
    ValueNotString { key: String, value: String },

    #[error("missing table type")]
    MissingTableType,

    #[error(
        "unknown geometry type `{0}`, expected one of \
         point, linestring, polygon, geometry, relation, relation_member"
    )]
    UnknownGeometryKind(String),

    #[error("invalid regexp for key `{key}` in table `{table}`: {source}")]
    InvalidRegexp {
        table: String,
        key: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// Wraps any decode failure with the name of the table it occurred in.
    #[error("table `{table}`: {source}")]
    Table {
        table: String,
        #[source]
        source: Box<MappingError>,
    },
}

impl MappingError {
    pub(crate) fn in_table(self, table: &str) -> Self {
        MappingError::Table {
            table: table.to_string(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, MappingError>;
