#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Merging per-record results by shape.
pub mod combine;
/// Combiner and catalog configuration types.
pub mod config;
/// Centralized constants used by the combiner, identities, and sources.
pub mod constants;
/// Catalog entries and the pairs that flow through a query.
pub mod data;
/// Per-run counters.
pub mod metrics;
/// Parser trait and closure-backed parser.
pub mod parser;
/// Built-in parsers.
pub mod parsers;
/// Lazy transform chain.
pub mod query;
/// Catalog traits and built-in catalogs.
pub mod source;
/// Labelled containers and their dynamic operations.
pub mod structure;
/// Shared type aliases.
pub mod types;
/// Cell and label parsing helpers.
pub mod utils;

mod errors;

pub use combine::{Combined, Combiner, ResultSet, default_identity, entry_identity};
pub use config::{CombineOptions, DirectoryCatalogConfig};
pub use data::{Entry, Key, KeyFn, Pair};
pub use errors::{AccessError, RecordError};
pub use metrics::RunStats;
pub use parser::{FnParser, Parser};
pub use parsers::{DelimitedParser, TableOptions};
pub use query::{CancelToken, GroupBy, Query, Run, Stage};
pub use source::{Catalog, DirectoryCatalog, FetchRequest, Filter, InMemoryCatalog, SortKey};
pub use structure::{Args, Kind, Label, Selector, Structure, StructureError, Value};
pub use types::{EndpointName, FieldName, FieldSet, FieldValue, PathTemplate};
