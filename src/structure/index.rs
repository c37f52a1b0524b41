use std::collections::HashMap;

use indexmap::IndexSet;

use super::value::{IndexKind, Label};

/// Ordered labels of one axis. Labels may repeat after concatenation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Index {
    labels: Vec<Label>,
}

impl Index {
    /// Index over `labels` in the given order.
    pub fn new(labels: Vec<Label>) -> Self {
        Self { labels }
    }

    /// Positional index `0..len`.
    pub fn range(len: usize) -> Self {
        Self {
            labels: (0..len as i64).map(Label::Int).collect(),
        }
    }

    /// Number of labels, repeats included.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the axis has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in axis order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Label at `position`.
    pub fn get(&self, position: usize) -> Option<&Label> {
        self.labels.get(position)
    }

    /// Position of the first occurrence of `label`.
    pub fn position(&self, label: &Label) -> Option<usize> {
        self.labels.iter().position(|candidate| candidate == label)
    }

    /// Whether `label` occurs at least once.
    pub fn contains(&self, label: &Label) -> bool {
        self.position(label).is_some()
    }

    /// Distinct labels present in both indexes, in `self` order.
    pub fn intersection(&self, other: &Self) -> Self {
        let theirs: IndexSet<&Label> = other.labels.iter().collect();
        let shared: IndexSet<Label> = self
            .labels
            .iter()
            .filter(|label| theirs.contains(label))
            .cloned()
            .collect();
        Self::new(shared.into_iter().collect())
    }

    /// Labels of both indexes, `self` first. A repeated label appears as
    /// many times as the index that repeats it most.
    pub fn union(&self, other: &Self) -> Self {
        Self::union_all([self, other])
    }

    /// Union over many indexes, in first-appearance order.
    ///
    /// Repeats are matched by occurrence: the union holds each label as many
    /// times as the index that repeats it most.
    pub fn union_all<'a>(indexes: impl IntoIterator<Item = &'a Index>) -> Self {
        let all: IndexSet<(&Label, usize)> = indexes
            .into_iter()
            .flat_map(|index| index.occurrences())
            .collect();
        Self::new(all.into_iter().map(|(label, _)| label.clone()).collect())
    }

    /// Labels of `self` followed by labels of `other`, repeats kept.
    pub fn append(&self, other: &Self) -> Self {
        let mut labels = self.labels.clone();
        labels.extend(other.labels.iter().cloned());
        Self::new(labels)
    }

    /// Two-level index: every label becomes `(outer, label)`.
    pub fn prefixed(&self, outer: &Label) -> Self {
        Self::new(self.labels.iter().map(|label| outer.nest(label)).collect())
    }

    /// For every label of `target`, its first position in `self`.
    pub fn lookup(&self, target: &Index) -> Vec<Option<usize>> {
        let mut first: HashMap<&Label, usize> = HashMap::with_capacity(self.len());
        for (pos, label) in self.labels.iter().enumerate() {
            first.entry(label).or_insert(pos);
        }
        target
            .labels
            .iter()
            .map(|label| first.get(label).copied())
            .collect()
    }

    /// For every label of `target`, the position in `self` of the same
    /// occurrence: the second `a` of `target` maps to the second `a` here.
    pub fn align(&self, target: &Index) -> Vec<Option<usize>> {
        let positions: HashMap<(&Label, usize), usize> = self
            .occurrences()
            .enumerate()
            .map(|(pos, key)| (key, pos))
            .collect();
        target
            .occurrences()
            .map(|key| positions.get(&key).copied())
            .collect()
    }

    /// Each label paired with how many times it appeared before.
    fn occurrences(&self) -> impl Iterator<Item = (&Label, usize)> {
        let mut seen: HashMap<&Label, usize> = HashMap::new();
        self.labels.iter().map(move |label| {
            let count = seen.entry(label).or_insert(0);
            *count += 1;
            (label, *count - 1)
        })
    }

    /// Labels at `positions`, in the given order. Positions past the end are
    /// skipped.
    pub(crate) fn take(&self, positions: &[usize]) -> Self {
        Self::new(
            positions
                .iter()
                .filter_map(|&pos| self.labels.get(pos).cloned())
                .collect(),
        )
    }

    /// Common kind of all labels, `Mixed` when they disagree.
    pub fn kind(&self) -> IndexKind {
        let mut kinds = self.labels.iter().map(Label::kind);
        let Some(first) = kinds.next() else {
            return IndexKind::Empty;
        };
        if kinds.all(|kind| kind == first) {
            first
        } else {
            IndexKind::Mixed
        }
    }
}

impl FromIterator<Label> for Index {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
