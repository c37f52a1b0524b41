use std::fmt;

use tracing::debug;

use super::run::PairStream;
use super::stage::isolate;
use crate::data::{Key, KeyFn, Pair, fields_label};
use crate::errors::{AccessError, RecordError};
use crate::metrics::SharedStats;
use crate::source::SortKey;
use crate::structure::{Label, Structure, concat};
use crate::types::FieldName;

/// How a grouping stage derives each pair's group label from its entry.
#[derive(Clone)]
pub enum GroupBy {
    /// One field gives its text; several give a tuple of their texts.
    Fields(Vec<FieldName>),
    /// A label computed from the entry.
    By(KeyFn),
}

impl fmt::Debug for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Self::By(_) => f.write_str("By(..)"),
        }
    }
}

impl GroupBy {
    /// Group label for the pair keyed by `key`.
    ///
    /// Labels come from entries, so a pair that is already a group cannot be
    /// regrouped.
    pub fn label_of(&self, key: &Key) -> Result<Label, RecordError> {
        let entry = match key {
            Key::Entry(entry) => entry,
            Key::Group(label) => {
                return Err(RecordError::Failed(format!(
                    "group {label} has no entry fields to regroup by"
                )));
            }
        };
        match self {
            Self::Fields(fields) => fields_label(entry, fields).ok_or_else(|| {
                RecordError::Failed(format!(
                    "entry {entry} is missing one of the grouping fields {fields:?}"
                ))
            }),
            Self::By(key_fn) => Ok(key_fn(entry)),
        }
    }

    /// Catalog order that makes equal labels adjacent.
    pub fn sort_key(&self) -> SortKey {
        match self {
            Self::Fields(fields) => SortKey::Fields(fields.clone()),
            Self::By(key_fn) => SortKey::By(key_fn.clone()),
        }
    }
}

/// Coalesces maximal runs of adjacent pairs with equal labels.
///
/// Buffers only the run in progress. Non-adjacent repeats of a label produce
/// separate groups.
pub(crate) struct AdjacentGroups<'a> {
    upstream: PairStream<'a>,
    group_by: &'a GroupBy,
    stats: SharedStats,
    pending: Option<(Label, Vec<Structure>)>,
    exhausted: bool,
}

impl<'a> AdjacentGroups<'a> {
    pub(crate) fn new(upstream: PairStream<'a>, group_by: &'a GroupBy, stats: SharedStats) -> Self {
        Self {
            upstream,
            group_by,
            stats,
            pending: None,
            exhausted: false,
        }
    }

    fn emit(&self, label: Label, mut members: Vec<Structure>) -> Pair {
        self.stats.borrow_mut().groups += 1;
        let structure = if members.len() == 1 {
            members.remove(0)
        } else {
            match concat(&members) {
                Ok(joined) => joined,
                Err(err) => {
                    debug!(
                        group = %label,
                        members = members.len(),
                        error = %err,
                        "group members are not concatenable; keeping them as a list"
                    );
                    Structure::List(members)
                }
            }
        };
        (Key::Group(label), structure)
    }
}

impl Iterator for AdjacentGroups<'_> {
    type Item = Result<Pair, AccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.exhausted {
                let (label, members) = self.pending.take()?;
                return Some(Ok(self.emit(label, members)));
            }
            let (key, structure) = match self.upstream.next() {
                Some(Ok(pair)) => pair,
                Some(Err(err)) => return Some(Err(err)),
                None => {
                    self.exhausted = true;
                    continue;
                }
            };
            let label = match isolate(&self.stats, &key, &structure, self.group_by.label_of(&key)) {
                Some(Ok(label)) => label,
                Some(Err(err)) => return Some(Err(err)),
                None => continue,
            };
            if let Some((current, members)) = &mut self.pending
                && *current == label
            {
                members.push(structure);
                continue;
            }
            if let Some((done, members)) = self.pending.replace((label, vec![structure])) {
                return Some(Ok(self.emit(done, members)));
            }
        }
    }
}
