//! Compiled element filters.
//!
//! After the classification index routes an element to a table, the table's
//! filter chain decides whether the element actually stays. Chains are
//! compiled once per document by [`Mapping::element_filters`] and evaluated
//! left-to-right; every predicate must keep the element.
//!
//! [`Mapping::element_filters`]: crate::config::Mapping::element_filters

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::config::{Key, Value};

mod compile;

pub use compile::{FilterWarning, TableFilters};

/// Sentinel value matching any value of a key.
pub const ANY_VALUE: &str = "__any__";
/// Reserved sentinel with no supported semantics; matched as a literal.
pub const NIL_VALUE: &str = "__nil__";

/// Keep/drop orientation of a tag clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Keep the element only when the clause matches.
    Require,
    /// Drop the element when the clause matches.
    Reject,
}

impl Polarity {
    fn keep(self, matched: bool) -> bool {
        match self {
            Polarity::Require => matched,
            Polarity::Reject => !matched,
        }
    }
}

/// How a tag clause matches the element's value for its key.
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    /// `__any__`: key presence alone counts.
    Present,
    /// One configured value, direct equality.
    Equals(Value),
    /// Several configured values, set membership.
    OneOf(Vec<Value>),
    /// Configured pattern matches the value.
    Matches(Regex),
}

impl ValueMatcher {
    fn matches(&self, value: &str) -> bool {
        match self {
            ValueMatcher::Present => true,
            ValueMatcher::Equals(expected) => expected.as_str() == value,
            ValueMatcher::OneOf(values) => values.iter().any(|v| v.as_str() == value),
            ValueMatcher::Matches(pattern) => pattern.is_match(value),
        }
    }
}

/// One compiled predicate in a table's filter chain.
///
/// Predicates are pure functions of their inputs and safe to share across
/// worker threads.
#[derive(Debug, Clone)]
pub enum ElementFilter {
    /// Drops closed elements that read as areas from a linestring table.
    RejectAreas { area_tags: HashSet<Key> },
    /// Drops closed elements that read as linear from a polygon table.
    RejectLinear { linear_tags: HashSet<Key> },
    /// Require/reject tag clause.
    Tag {
        key: Key,
        matcher: ValueMatcher,
        polarity: Polarity,
    },
}

impl ElementFilter {
    /// Whether the element stays in the table.
    ///
    /// `matched_key` is the tag key that routed the element here and
    /// `closed` whether its geometry is a closed polyline; only the
    /// area/linear variants look at either.
    pub fn keep(&self, tags: &HashMap<String, String>, matched_key: &str, closed: bool) -> bool {
        match self {
            ElementFilter::RejectAreas { area_tags } => {
                if !closed {
                    return true;
                }
                // area=yes forces area, area=no forces line, otherwise the
                // per-key hint decides.
                match tags.get("area").map(String::as_str) {
                    Some("yes") => false,
                    Some("no") => true,
                    _ => !area_tags.contains(matched_key),
                }
            }
            ElementFilter::RejectLinear { linear_tags } => {
                if !closed {
                    return true;
                }
                match tags.get("area").map(String::as_str) {
                    Some("no") => false,
                    Some("yes") => true,
                    _ => !linear_tags.contains(matched_key),
                }
            }
            ElementFilter::Tag {
                key,
                matcher,
                polarity,
            } => {
                let matched = tags
                    .get(key.as_str())
                    .is_some_and(|value| matcher.matches(value));
                polarity.keep(matched)
            }
        }
    }
}
