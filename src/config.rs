use std::path::PathBuf;

use indexmap::IndexMap;

use crate::constants::combine::OVERLAP_THRESHOLD;
use crate::types::{EndpointName, PathTemplate};

/// Controls how per-identity results are merged by the combiner.
#[derive(Clone, Debug, PartialEq)]
pub struct CombineOptions {
    /// Minimum shared-label fraction (inclusive) required on every compared
    /// axis before results are merged into a higher-dimensional structure.
    pub overlap_threshold: f64,
}

impl Default for CombineOptions {
    fn default() -> Self {
        Self {
            overlap_threshold: OVERLAP_THRESHOLD,
        }
    }
}

/// Configuration for a filesystem-backed catalog.
#[derive(Clone, Debug)]
pub struct DirectoryCatalogConfig {
    /// Root directory that endpoint templates are relative to.
    pub root: PathBuf,
    /// Whether symlinks are followed while walking the root.
    pub follow_links: bool,
    /// Path template per endpoint, in registration order.
    pub endpoints: IndexMap<EndpointName, PathTemplate>,
}

impl DirectoryCatalogConfig {
    /// Create a config rooted at `root` with no endpoints.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_links: true,
            endpoints: IndexMap::new(),
        }
    }

    /// Override whether symlinks are followed during the walk.
    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Register an endpoint whose files match `template`.
    ///
    /// Placeholders are written `{field}` or `{field:pattern}`; a field may
    /// appear more than once, in which case every occurrence must match the
    /// same text. A repeat without its own pattern reuses the first one.
    pub fn with_endpoint(
        mut self,
        endpoint: impl Into<EndpointName>,
        template: impl Into<PathTemplate>,
    ) -> Self {
        self.endpoints.insert(endpoint.into(), template.into());
        self
    }
}
