use std::path::{Component, Path};

use indexmap::IndexMap;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::DirectoryCatalogConfig;
use crate::data::Entry;
use crate::errors::AccessError;
use crate::source::utilities::template::PathPattern;
use crate::source::{Catalog, FetchRequest, select_entries};
use crate::types::{EndpointName, FieldName};

/// Catalog that discovers entries by walking a directory tree.
///
/// Each endpoint is a path template relative to the root; every file whose
/// relative path matches the template becomes an entry whose fields are the
/// template's placeholders. The tree is walked on every fetch, so files added
/// between runs are picked up.
#[derive(Clone, Debug)]
pub struct DirectoryCatalog {
    config: DirectoryCatalogConfig,
    patterns: IndexMap<EndpointName, PathPattern>,
}

impl DirectoryCatalog {
    /// Compile every endpoint template. Malformed templates are configuration
    /// errors.
    pub fn new(config: DirectoryCatalogConfig) -> Result<Self, AccessError> {
        let patterns = config
            .endpoints
            .iter()
            .map(|(endpoint, template)| Ok((endpoint.clone(), PathPattern::compile(template)?)))
            .collect::<Result<IndexMap<_, _>, AccessError>>()?;
        Ok(Self { config, patterns })
    }

    /// Directory the endpoint templates are relative to.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    fn pattern(&self, endpoint: &str) -> Result<&PathPattern, AccessError> {
        self.patterns
            .get(endpoint)
            .ok_or_else(|| AccessError::UnknownEndpoint {
                endpoint: endpoint.to_string(),
            })
    }

    /// All entries of `endpoint`, ordered by relative path.
    fn scan(&self, endpoint: &str, pattern: &PathPattern) -> Result<Vec<Entry>, AccessError> {
        let root = &self.config.root;
        if !root.is_dir() {
            return Err(AccessError::CatalogUnavailable {
                endpoint: endpoint.to_string(),
                reason: format!("root {} is not a directory", root.display()),
            });
        }
        let mut candidates: Vec<(String, Entry)> = Vec::new();
        for item in WalkDir::new(root)
            .follow_links(self.config.follow_links)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|item| item.file_type().is_file())
        {
            let Some(relative) = relative_key(root, item.path()) else {
                continue;
            };
            if let Some(fields) = pattern.extract(&relative) {
                let entry = Entry {
                    path: item.path().to_path_buf(),
                    fields,
                };
                candidates.push((relative, entry));
            }
        }
        candidates.sort_by(|left, right| left.0.cmp(&right.0));
        debug!(
            endpoint = %endpoint,
            root = %root.display(),
            count = candidates.len(),
            "scanned directory catalog"
        );
        Ok(candidates.into_iter().map(|(_, entry)| entry).collect())
    }
}

/// `/`-joined path of `path` below `root`, independent of the platform
/// separator.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

impl Catalog for DirectoryCatalog {
    fn fields(&self, endpoint: &str) -> Result<Vec<FieldName>, AccessError> {
        Ok(self.pattern(endpoint)?.fields().to_vec())
    }

    fn fetch(&self, request: &FetchRequest) -> Result<Vec<Entry>, AccessError> {
        let pattern = self.pattern(&request.endpoint)?;
        // Validate before touching the filesystem.
        request.validate(pattern.fields())?;
        let entries = self.scan(&request.endpoint, pattern)?;
        select_entries(request, pattern.fields(), entries)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::source::Filter;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "STime,dbA\n").unwrap();
    }

    #[test]
    fn walks_and_extracts_fields() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "TRLA2015/NVSPL_TRLA2015_06_01_13.txt");
        write(dir.path(), "TRLA2015/NVSPL_TRLA2015_06_01_12.txt");
        write(dir.path(), "DENA2014/NVSPL_DENA2014_01_02_00.txt");
        write(dir.path(), "DENA2014/readme.md");
        let catalog = DirectoryCatalog::new(
            DirectoryCatalogConfig::new(dir.path())
                .with_endpoint("nvspl", r"{site}{year:\d{4}}/NVSPL_{site}{year}_{month}_{day}_{hour}.txt"),
        )
        .unwrap();
        assert_eq!(
            catalog.fields("nvspl").unwrap(),
            ["site", "year", "month", "day", "hour"]
        );

        let all = catalog.fetch(&FetchRequest::new("nvspl")).unwrap();
        let hours: Vec<&str> = all.iter().filter_map(|entry| entry.field("hour")).collect();
        assert_eq!(hours, ["00", "12", "13"]);

        let mut request = FetchRequest::new("nvspl");
        request.filters.insert("site".into(), Filter::from("TRLA"));
        request.limit = Some(1);
        let trla = catalog.fetch(&request).unwrap();
        assert_eq!(trla.len(), 1);
        assert_eq!(trla[0].field("hour"), Some("12"));
    }

    #[test]
    fn missing_root_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = DirectoryCatalog::new(
            DirectoryCatalogConfig::new(dir.path().join("absent")).with_endpoint("srcid", "{site}.txt"),
        )
        .unwrap();
        assert!(matches!(
            catalog.fetch(&FetchRequest::new("srcid")),
            Err(AccessError::CatalogUnavailable { .. })
        ));
        assert!(matches!(
            catalog.fetch(&FetchRequest::new("nvspl")),
            Err(AccessError::UnknownEndpoint { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn broken_links_are_skipped_during_the_walk() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "TRLA.txt");
        std::os::unix::fs::symlink(dir.path().join("gone.txt"), dir.path().join("DENA.txt"))
            .unwrap();
        let catalog = DirectoryCatalog::new(
            DirectoryCatalogConfig::new(dir.path())
                .with_follow_links(true)
                .with_endpoint("srcid", "{site}.txt"),
        )
        .unwrap();
        let entries = catalog.fetch(&FetchRequest::new("srcid")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field("site"), Some("TRLA"));
    }
}
