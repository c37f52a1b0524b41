use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::data::Entry;
use crate::errors::AccessError;
use crate::source::{Catalog, FetchRequest, select_entries};
use crate::types::{EndpointName, FieldName};

/// Catalog over entries held in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    endpoints: IndexMap<EndpointName, EndpointEntries>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct EndpointEntries {
    fields: Vec<FieldName>,
    #[serde(default)]
    entries: Vec<Entry>,
}

impl InMemoryCatalog {
    /// Catalog with no endpoints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `endpoint` with its ordered field names.
    pub fn with_endpoint<I, F>(mut self, endpoint: impl Into<EndpointName>, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldName>,
    {
        self.endpoints.insert(
            endpoint.into(),
            EndpointEntries {
                fields: fields.into_iter().map(Into::into).collect(),
                entries: Vec::new(),
            },
        );
        self
    }

    /// Append `entry` to `endpoint`. Entries keep insertion order.
    pub fn insert(&mut self, endpoint: &str, entry: Entry) -> Result<(), AccessError> {
        let slot = self
            .endpoints
            .get_mut(endpoint)
            .ok_or_else(|| AccessError::UnknownEndpoint {
                endpoint: endpoint.to_string(),
            })?;
        check_entry_fields(endpoint, &slot.fields, &entry)?;
        slot.entries.push(entry);
        Ok(())
    }

    /// Load a catalog from a JSON manifest:
    /// `{"nvspl": {"fields": ["site", "year"], "entries": [{"path": "...", "fields": {"site": "TRLA", "year": "2015"}}]}}`.
    ///
    /// Relative entry paths are resolved against `base` when one is given.
    pub fn from_manifest(json: &str, base: Option<&Path>) -> Result<Self, AccessError> {
        let mut endpoints: IndexMap<EndpointName, EndpointEntries> = serde_json::from_str(json)?;
        for (endpoint, slot) in endpoints.iter_mut() {
            for entry in slot.entries.iter_mut() {
                check_entry_fields(endpoint, &slot.fields, entry)?;
                if let Some(base) = base
                    && entry.path.is_relative()
                {
                    entry.path = base.join(&entry.path);
                }
            }
        }
        Ok(Self { endpoints })
    }

    fn endpoint(&self, endpoint: &str) -> Result<&EndpointEntries, AccessError> {
        self.endpoints
            .get(endpoint)
            .ok_or_else(|| AccessError::UnknownEndpoint {
                endpoint: endpoint.to_string(),
            })
    }
}

fn check_entry_fields(endpoint: &str, fields: &[FieldName], entry: &Entry) -> Result<(), AccessError> {
    match entry.fields.keys().find(|name| !fields.contains(name)) {
        Some(field) => Err(AccessError::UnknownField {
            endpoint: endpoint.to_string(),
            field: field.clone(),
        }),
        None => Ok(()),
    }
}

impl Catalog for InMemoryCatalog {
    fn fields(&self, endpoint: &str) -> Result<Vec<FieldName>, AccessError> {
        Ok(self.endpoint(endpoint)?.fields.clone())
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Entry>, AccessError> {
        let slot = self.endpoint(&request.endpoint)?;
        select_entries(request, &slot.fields, slot.entries.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "nvspl": {
            "fields": ["site", "year"],
            "entries": [
                {"path": "TRLA2015.txt", "fields": {"site": "TRLA", "year": "2015"}},
                {"path": "/abs/DENA2014.txt", "fields": {"site": "DENA", "year": "2014"}}
            ]
        },
        "srcid": {"fields": ["site"]}
    }"#;

    #[test]
    fn manifest_loads_endpoints_and_resolves_paths() {
        let catalog = InMemoryCatalog::from_manifest(MANIFEST, Some(Path::new("/data"))).unwrap();
        assert_eq!(catalog.fields("nvspl").unwrap(), ["site", "year"]);
        let entries = catalog.fetch(&FetchRequest::new("nvspl")).unwrap();
        assert_eq!(entries[0].path, Path::new("/data/TRLA2015.txt"));
        assert_eq!(entries[1].path, Path::new("/abs/DENA2014.txt"));
        assert!(catalog.fetch(&FetchRequest::new("srcid")).unwrap().is_empty());
    }

    #[test]
    fn manifest_rejects_undeclared_fields_and_bad_json() {
        let bad_field = r#"{"nvspl": {"fields": ["site"], "entries": [{"path": "a", "fields": {"year": "1"}}]}}"#;
        assert!(matches!(
            InMemoryCatalog::from_manifest(bad_field, None),
            Err(AccessError::UnknownField { .. })
        ));
        assert!(matches!(
            InMemoryCatalog::from_manifest("{", None),
            Err(AccessError::Manifest(_))
        ));
    }

    #[test]
    fn unknown_endpoint_is_reported() {
        let mut catalog = InMemoryCatalog::new().with_endpoint("nvspl", ["site"]);
        assert!(matches!(
            catalog.fetch(&FetchRequest::new("loudevents")),
            Err(AccessError::UnknownEndpoint { endpoint }) if endpoint == "loudevents"
        ));
        assert!(catalog.insert("metadata", Entry::new("x")).is_err());
        catalog
            .insert("nvspl", Entry::new("x").with_field("site", "TRLA"))
            .unwrap();
        assert_eq!(catalog.fetch(&FetchRequest::new("nvspl")).unwrap().len(), 1);
    }
}
