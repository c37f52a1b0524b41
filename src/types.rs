/// Catalog endpoint name (one kind of data file).
/// Examples: `nvspl`, `srcid`, `loudevents`
pub type EndpointName = String;
/// Name of a per-entry catalog field.
/// Examples: `site`, `year`, `month`, `hour`
pub type FieldName = String;
/// Raw per-entry field value, as extracted from the file path.
/// Examples: `TRLA`, `2015`, `06`
pub type FieldValue = String;
/// Field values identifying one explicit entry for `Query::items`.
/// Example: `{site: TRLA, year: 2015}`
pub type FieldSet = indexmap::IndexMap<FieldName, FieldValue>;
/// Path template describing where an endpoint's files live, relative to a root.
/// Example: `{site}{year:\d{4}}/NVSPL_{site}{year}_{year2}_{month}_{day}_{hour}.txt`
pub type PathTemplate = String;
