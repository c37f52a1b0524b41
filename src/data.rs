use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::structure::{Label, Structure};
use crate::types::{FieldName, FieldValue};

/// One catalog record: a data file plus the fields extracted from its path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Location of the file this entry describes.
    pub path: PathBuf,
    /// Field values in catalog field order (e.g. `site`, `year`, `month`).
    #[serde(default)]
    pub fields: IndexMap<FieldName, FieldValue>,
}

impl Entry {
    /// Entry for `path` with no fields.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add or replace a field.
    pub fn with_field(mut self, name: impl Into<FieldName>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Field value as text.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Whether the entry carries `name`.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field value as a text label.
    pub fn field_label(&self, name: &str) -> Option<Label> {
        self.field(name).map(Label::from)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// What a pair is keyed by: its source entry, or the label of its group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Key {
    /// A single record.
    Entry(Entry),
    /// A group formed by a grouping stage.
    Group(Label),
}

impl Key {
    /// The entry, unless this is a group.
    pub fn entry(&self) -> Option<&Entry> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Group(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry(entry) => write!(f, "{entry}"),
            Self::Group(label) => write!(f, "group {label}"),
        }
    }
}

/// Unit of flow through a query.
pub type Pair = (Key, Structure);

/// Caller-supplied key derived from an entry, used for sorting and grouping.
pub type KeyFn = Arc<dyn Fn(&Entry) -> Label + Send + Sync>;

/// Label built from `fields` of an entry: the field text for a single field,
/// a tuple label for several. `None` when a field is missing.
pub fn fields_label(entry: &Entry, fields: &[FieldName]) -> Option<Label> {
    match fields {
        [single] => entry.field_label(single),
        many => many
            .iter()
            .map(|field| entry.field_label(field))
            .collect::<Option<Vec<_>>>()
            .map(Label::Tuple),
    }
}
