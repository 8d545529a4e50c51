//! Filter compilation.
//!
//! Turns each table's declared filters into an ordered predicate chain.
//! Families are appended in a fixed order: the area/linear heuristic,
//! deprecated `exclude_tags`, `require`, `reject`, `require_regexp`,
//! `reject_regexp`. Regex patterns compile eagerly here so a bad pattern
//! fails the startup compile instead of a per-element hot path.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use tracing::warn;

use super::{ANY_VALUE, ElementFilter, NIL_VALUE, Polarity, ValueMatcher};
use crate::config::{GeometryKind, Key, Mapping, Value};
use crate::error::{MappingError, Result};

/// Non-fatal compile diagnostic.
///
/// Collected in the compile output so hosts and tests can assert on them;
/// also emitted through `tracing` as they occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterWarning {
    /// `exclude_tags` is deprecated; its pairs compile as reject clauses.
    DeprecatedExcludeTags { table: String },
    /// `__any__` was combined with other values; only `__any__` applies.
    AnyWithOtherValues { table: String, key: Key },
    /// `__nil__` has no supported semantics and matches as a literal.
    NilValue { table: String, key: Key },
}

impl fmt::Display for FilterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterWarning::DeprecatedExcludeTags { table } => write!(
                f,
                "table `{table}`: exclude_tags is deprecated, use filters.reject"
            ),
            FilterWarning::AnyWithOtherValues { table, key } => write!(
                f,
                "table `{table}`: key `{key}` combines __any__ with other values, \
                 only __any__ applies"
            ),
            FilterWarning::NilValue { table, key } => write!(
                f,
                "table `{table}`: key `{key}` uses unsupported __nil__, \
                 matching it as a literal value"
            ),
        }
    }
}

/// Compiled filter chains for every table of a mapping document.
#[derive(Debug, Clone, Default)]
pub struct TableFilters {
    by_table: IndexMap<String, Vec<ElementFilter>>,
    warnings: Vec<FilterWarning>,
}

impl TableFilters {
    /// Filter chain for `table`; empty for tables with no filters.
    pub fn for_table(&self, table: &str) -> &[ElementFilter] {
        self.by_table.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Diagnostics raised while compiling, in emission order.
    pub fn warnings(&self) -> &[FilterWarning] {
        &self.warnings
    }

    /// Tables with a non-empty chain, in table declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ElementFilter])> {
        self.by_table
            .iter()
            .map(|(name, chain)| (name.as_str(), chain.as_slice()))
    }

    /// Evaluates `table`'s chain left-to-right; every predicate must keep.
    pub fn accepts(
        &self,
        table: &str,
        tags: &HashMap<String, String>,
        matched_key: &str,
        closed: bool,
    ) -> bool {
        self.for_table(table)
            .iter()
            .all(|filter| filter.keep(tags, matched_key, closed))
    }
}

impl Mapping {
    /// Compiles every table's filter declarations into predicate chains.
    ///
    /// Fails on an invalid regexp pattern; deprecation and sentinel misuse
    /// only produce [`FilterWarning`]s.
    pub fn element_filters(&self) -> Result<TableFilters> {
        let mut by_table = IndexMap::new();
        let mut warnings = Vec::new();

        for table in self.tables.values() {
            let mut chain = Vec::new();

            // The heuristic applies to the exact kind only; geometry
            // wildcard tables receive both polygon and linestring elements
            // and cannot drop either side.
            match table.kind {
                GeometryKind::Linestring => {
                    if let Some(area_tags) = &self.areas.area_tags {
                        chain.push(ElementFilter::RejectAreas {
                            area_tags: area_tags.iter().cloned().collect(),
                        });
                    }
                }
                GeometryKind::Polygon => {
                    if let Some(linear_tags) = &self.areas.linear_tags {
                        chain.push(ElementFilter::RejectLinear {
                            linear_tags: linear_tags.iter().cloned().collect(),
                        });
                    }
                }
                _ => {}
            }

            if let Some(filters) = &table.filters {
                if let Some(pairs) = &filters.exclude_tags {
                    note(
                        &mut warnings,
                        FilterWarning::DeprecatedExcludeTags {
                            table: table.name.clone(),
                        },
                    );
                    for (key, value) in pairs {
                        chain.push(tag_filter(
                            &table.name,
                            key,
                            vec![value.clone()],
                            Polarity::Reject,
                            &mut warnings,
                        ));
                    }
                }
                for (key, values) in filters.require.iter() {
                    chain.push(tag_filter(
                        &table.name,
                        key,
                        values.iter().map(|v| v.value.clone()).collect(),
                        Polarity::Require,
                        &mut warnings,
                    ));
                }
                for (key, values) in filters.reject.iter() {
                    chain.push(tag_filter(
                        &table.name,
                        key,
                        values.iter().map(|v| v.value.clone()).collect(),
                        Polarity::Reject,
                        &mut warnings,
                    ));
                }
                for (key, pattern) in &filters.require_regexp {
                    chain.push(regexp_filter(&table.name, key, pattern, Polarity::Require)?);
                }
                for (key, pattern) in &filters.reject_regexp {
                    chain.push(regexp_filter(&table.name, key, pattern, Polarity::Reject)?);
                }
            }

            if !chain.is_empty() {
                by_table.insert(table.name.clone(), chain);
            }
        }

        Ok(TableFilters { by_table, warnings })
    }
}

fn note(warnings: &mut Vec<FilterWarning>, warning: FilterWarning) {
    warn!("{warning}");
    warnings.push(warning);
}

/// Compiles one require/reject clause from its configured value set.
fn tag_filter(
    table: &str,
    key: &Key,
    mut values: Vec<Value>,
    polarity: Polarity,
    warnings: &mut Vec<FilterWarning>,
) -> ElementFilter {
    for value in &values {
        if value.as_str() == NIL_VALUE {
            note(
                warnings,
                FilterWarning::NilValue {
                    table: table.to_string(),
                    key: key.clone(),
                },
            );
        }
    }

    let matcher = if values.iter().any(|v| v.as_str() == ANY_VALUE) {
        if values.len() > 1 {
            note(
                warnings,
                FilterWarning::AnyWithOtherValues {
                    table: table.to_string(),
                    key: key.clone(),
                },
            );
        }
        ValueMatcher::Present
    } else if values.len() == 1 {
        ValueMatcher::Equals(values.remove(0))
    } else {
        ValueMatcher::OneOf(values)
    };

    ElementFilter::Tag {
        key: key.clone(),
        matcher,
        polarity,
    }
}

fn regexp_filter(
    table: &str,
    key: &Key,
    pattern: &str,
    polarity: Polarity,
) -> Result<ElementFilter> {
    let regex = Regex::new(pattern).map_err(|e| MappingError::InvalidRegexp {
        table: table.to_string(),
        key: key.to_string(),
        source: Box::new(e),
    })?;
    Ok(ElementFilter::Tag {
        key: key.clone(),
        matcher: ValueMatcher::Matches(regex),
        polarity,
    })
}
