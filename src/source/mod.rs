//! Catalog interfaces and the shared entry-selection logic.
//!
//! Ownership model:
//! - `Catalog` is the query-facing interface that lists an endpoint's entries.
//! - `FetchRequest` describes which entries a run wants and in what order.
//! - `select_entries` validates a request and applies filters, explicit items,
//!   sorting and the limit, so every catalog behaves the same way.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::data::{Entry, KeyFn};
use crate::errors::AccessError;
use crate::types::{EndpointName, FieldName, FieldSet, FieldValue};

/// Source implementation modules.
pub mod sources;
/// Utility helpers used by source implementations.
pub mod utilities;

pub use sources::directory::DirectoryCatalog;
pub use sources::in_memory::InMemoryCatalog;

/// Predicate over a raw field value.
pub type FieldPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Restriction on one entry field.
#[derive(Clone)]
pub enum Filter {
    /// Field equals the value.
    Equals(FieldValue),
    /// Field equals any of the values.
    OneOf(Vec<FieldValue>),
    /// Field equals none of the values.
    Exclude(Vec<FieldValue>),
    /// Field satisfies the predicate.
    Predicate(FieldPredicate),
}

impl Filter {
    /// Filter that keeps values for which `predicate` holds.
    pub fn predicate(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(predicate))
    }

    /// Whether `value` passes the filter.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Equals(expected) => expected == value,
            Self::OneOf(options) => options.iter().any(|option| option == value),
            Self::Exclude(options) => options.iter().all(|option| option != value),
            Self::Predicate(predicate) => predicate(value),
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(value) => f.debug_tuple("Equals").field(value).finish(),
            Self::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Self::Exclude(values) => f.debug_tuple("Exclude").field(values).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for Filter {
    fn from(value: &str) -> Self {
        Self::Equals(value.to_string())
    }
}

impl From<String> for Filter {
    fn from(value: String) -> Self {
        Self::Equals(value)
    }
}

impl From<i64> for Filter {
    fn from(value: i64) -> Self {
        Self::Equals(value.to_string())
    }
}

impl From<i32> for Filter {
    fn from(value: i32) -> Self {
        Self::Equals(value.to_string())
    }
}

impl From<Vec<&str>> for Filter {
    fn from(values: Vec<&str>) -> Self {
        Self::OneOf(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Filter {
    fn from(values: Vec<String>) -> Self {
        Self::OneOf(values)
    }
}

/// Entry order requested by a run.
#[derive(Clone)]
pub enum SortKey {
    /// Lexicographic order over the named fields' text.
    Fields(Vec<FieldName>),
    /// Order by a caller-computed label.
    By(KeyFn),
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Self::By(_) => f.write_str("By(..)"),
        }
    }
}

/// Which entries of an endpoint a run wants.
#[derive(Clone, Debug, Default)]
pub struct FetchRequest {
    /// Endpoint to list.
    pub endpoint: EndpointName,
    /// Per-field filters, all of which must pass.
    pub filters: IndexMap<FieldName, Filter>,
    /// Explicit entries to select; an entry matches when every field of any
    /// item equals the entry's value for that field.
    pub items: Option<Vec<FieldSet>>,
    /// Order of the returned entries; catalog order when absent.
    pub sort: Option<SortKey>,
    /// Applied after filtering and sorting.
    pub limit: Option<usize>,
}

impl FetchRequest {
    /// Unfiltered request for every entry of `endpoint`.
    pub fn new(endpoint: impl Into<EndpointName>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Check every filter, item and sort field against the endpoint's `fields`.
    pub fn validate(&self, fields: &[FieldName]) -> Result<(), AccessError> {
        let known = |name: &str| fields.iter().any(|field| field == name);
        let unknown_field = |field: &str| AccessError::UnknownField {
            endpoint: self.endpoint.clone(),
            field: field.to_string(),
        };
        if let Some(field) = self.filters.keys().find(|field| !known(field)) {
            return Err(unknown_field(field));
        }
        if let Some(items) = &self.items
            && let Some(field) = items.iter().flat_map(|item| item.keys()).find(|field| !known(field))
        {
            return Err(unknown_field(field));
        }
        if let Some(SortKey::Fields(sort_fields)) = &self.sort
            && let Some(field) = sort_fields.iter().find(|field| !known(field))
        {
            return Err(AccessError::UnknownSortField {
                endpoint: self.endpoint.clone(),
                field: field.clone(),
            });
        }
        Ok(())
    }

    /// Whether `entry` passes the filters and the explicit items.
    pub fn matches(&self, entry: &Entry) -> bool {
        let filtered = self.filters.iter().all(|(field, filter)| {
            entry
                .field(field)
                .is_some_and(|value| filter.matches(value))
        });
        filtered
            && self.items.as_ref().is_none_or(|items| {
                items.iter().any(|item| {
                    item.iter()
                        .all(|(field, value)| entry.field(field) == Some(value.as_str()))
                })
            })
    }
}

/// Query-facing catalog interface.
///
/// `fetch` returns a finite, fully materialised list. For a fixed catalog
/// state the same request must produce the same entries in the same order.
pub trait Catalog {
    /// Ordered field names of `endpoint`.
    fn fields(&self, endpoint: &str) -> Result<Vec<FieldName>, AccessError>;
    /// Entries of `request.endpoint` selected by the request.
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Entry>, AccessError>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn fields(&self, endpoint: &str) -> Result<Vec<FieldName>, AccessError> {
        (**self).fields(endpoint)
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Entry>, AccessError> {
        (**self).fetch(request)
    }
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn fields(&self, endpoint: &str) -> Result<Vec<FieldName>, AccessError> {
        (**self).fields(endpoint)
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Entry>, AccessError> {
        (**self).fetch(request)
    }
}

/// Validate `request` against `fields`, then filter, sort (stable) and limit
/// `entries`.
pub fn select_entries(
    request: &FetchRequest,
    fields: &[FieldName],
    entries: impl IntoIterator<Item = Entry>,
) -> Result<Vec<Entry>, AccessError> {
    request.validate(fields)?;
    let mut selected: Vec<Entry> = entries
        .into_iter()
        .filter(|entry| request.matches(entry))
        .collect();
    match &request.sort {
        Some(SortKey::Fields(sort_fields)) => selected.sort_by_cached_key(|entry| {
            sort_fields
                .iter()
                .map(|field| entry.field(field).unwrap_or_default().to_string())
                .collect::<Vec<_>>()
        }),
        Some(SortKey::By(key)) => selected.sort_by_cached_key(|entry| key(entry)),
        None => {}
    }
    if let Some(limit) = request.limit {
        selected.truncate(limit);
    }
    Ok(selected)
}
