use std::ops::Range;

use ndarray::Array1;

use super::error::StructureError;
use super::index::Index;
use super::reduce::Reduction;
use super::value::{Label, Value};

/// One-dimensional labelled values.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    name: Option<Label>,
    index: Index,
    values: Array1<Value>,
}

impl Series {
    /// Series over `values`, one per label of `index`.
    pub fn new(index: Index, values: Vec<Value>) -> Result<Self, StructureError> {
        if index.len() != values.len() {
            return Err(StructureError::ShapeMismatch(format!(
                "series index has {} labels but {} values were given",
                index.len(),
                values.len()
            )));
        }
        Ok(Self {
            name: None,
            index,
            values: Array1::from(values),
        })
    }

    pub(crate) fn from_parts(index: Index, values: Array1<Value>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self {
            name: None,
            index,
            values,
        }
    }

    /// Series from `(label, value)` pairs in order.
    pub fn from_pairs<L, V>(pairs: impl IntoIterator<Item = (L, V)>) -> Self
    where
        L: Into<Label>,
        V: Into<Value>,
    {
        let (labels, values): (Vec<Label>, Vec<Value>) = pairs
            .into_iter()
            .map(|(label, value)| (label.into(), value.into()))
            .unzip();
        Self::from_parts(Index::new(labels), Array1::from(values))
    }

    /// Copy named `name`.
    pub fn with_name(mut self, name: impl Into<Label>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name, usually the column the series came from.
    pub fn name(&self) -> Option<&Label> {
        self.name.as_ref()
    }

    /// Labels.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Values in label order.
    pub fn values(&self) -> &Array1<Value> {
        &self.values
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the first entry labelled `label`.
    pub fn get(&self, label: &Label) -> Option<&Value> {
        self.index.position(label).map(|pos| &self.values[pos])
    }

    /// Value at `position`.
    pub fn value_at(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Conform to `target`, filling labels missing here with `Null`.
    /// Repeated labels are matched by occurrence.
    pub fn reindex(&self, target: &Index) -> Self {
        let values = self
            .index
            .align(target)
            .into_iter()
            .map(|pos| pos.map_or(Value::Null, |pos| self.values[pos].clone()))
            .collect::<Array1<_>>();
        Self {
            name: self.name.clone(),
            index: target.clone(),
            values,
        }
    }

    /// Reduce every value to one.
    pub fn reduce(&self, reduction: Reduction) -> Value {
        reduction.apply(self.values.iter())
    }

    /// Entries at `positions`; positions past the end are skipped.
    pub(crate) fn take(&self, positions: &[usize]) -> Self {
        let values = positions
            .iter()
            .filter_map(|&pos| self.values.get(pos).cloned())
            .collect::<Array1<_>>();
        Self {
            name: self.name.clone(),
            index: self.index.take(positions),
            values,
        }
    }

    /// Entries in `range`, clamped to the entries present.
    pub fn slice(&self, range: Range<usize>) -> Self {
        let positions: Vec<usize> = range.collect();
        self.take(&positions)
    }

    /// First `n` entries.
    pub fn head(&self, n: usize) -> Self {
        self.slice(0..n.min(self.len()))
    }

    /// Last `n` entries.
    pub fn tail(&self, n: usize) -> Self {
        self.slice(self.len().saturating_sub(n)..self.len())
    }

    /// Drop missing values.
    pub fn dropna(&self) -> Self {
        let keep: Vec<usize> = self
            .values
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_null())
            .map(|(pos, _)| pos)
            .collect();
        self.take(&keep)
    }

    /// Entries for each of `labels`, in the order given. Every label must exist.
    pub fn select_labels(&self, labels: &[Label]) -> Result<Self, StructureError> {
        let positions = self
            .index
            .lookup(&Index::new(labels.to_vec()))
            .into_iter()
            .zip(labels)
            .map(|(pos, label)| {
                pos.ok_or_else(|| StructureError::KeyNotFound {
                    label: label.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.take(&positions))
    }

    /// Two-level copy whose labels are `(outer, label)`.
    pub fn prefixed(&self, outer: &Label) -> Self {
        Self {
            name: self.name.clone(),
            index: self.index.prefixed(outer),
            values: self.values.clone(),
        }
    }

    /// End-to-end concatenation. The name survives only when all names agree.
    pub fn concat(parts: &[&Series]) -> Self {
        let mut labels = Vec::new();
        let mut values = Vec::new();
        for part in parts {
            labels.extend(part.index.labels().iter().cloned());
            values.extend(part.values.iter().cloned());
        }
        let name = parts
            .first()
            .and_then(|first| first.name.clone())
            .filter(|name| parts.iter().all(|part| part.name.as_ref() == Some(name)));
        Self {
            name,
            index: Index::new(labels),
            values: Array1::from(values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels() -> Series {
        Series::from_pairs([("a", 30.0), ("b", f64::NAN), ("c", 42.5)])
    }

    #[test]
    fn new_rejects_length_mismatch() {
        let err = Series::new(Index::range(2), vec![Value::Int(1)]).unwrap_err();
        assert!(matches!(err, StructureError::ShapeMismatch(_)));
    }

    #[test]
    fn reindex_fills_missing_labels_with_null() {
        let target: Index = ["c", "z"].into_iter().map(Label::from).collect();
        let aligned = levels().reindex(&target);
        assert_eq!(aligned.values().to_vec(), vec![Value::Float(42.5), Value::Null]);
    }

    #[test]
    fn head_tail_and_dropna() {
        let series = levels();
        assert_eq!(series.head(2).len(), 2);
        assert_eq!(series.tail(1).get(&Label::from("c")), Some(&Value::Float(42.5)));
        assert_eq!(series.head(10).len(), 3);
        assert_eq!(series.slice(1..9).len(), 2);
        assert_eq!(series.dropna().len(), 2);
    }

    #[test]
    fn select_labels_requires_every_label() {
        let series = levels();
        let picked = series
            .select_labels(&[Label::from("c"), Label::from("a")])
            .unwrap();
        assert_eq!(picked.value_at(0), Some(&Value::Float(42.5)));
        let err = series.select_labels(&[Label::from("q")]).unwrap_err();
        assert_eq!(err, StructureError::KeyNotFound { label: "q".into() });
    }
}
