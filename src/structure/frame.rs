use std::ops::Range;

use ndarray::{Array1, Array2, Axis, s};

use super::error::StructureError;
use super::index::Index;
use super::reduce::Reduction;
use super::series::Series;
use super::value::{Label, Value};

/// Two-dimensional labelled table, stored row-major as `rows x columns`.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    index: Index,
    columns: Index,
    values: Array2<Value>,
}

impl Frame {
    /// Frame over `values`, which must be `index.len() x columns.len()`.
    pub fn new(index: Index, columns: Index, values: Array2<Value>) -> Result<Self, StructureError> {
        if values.dim() != (index.len(), columns.len()) {
            return Err(StructureError::ShapeMismatch(format!(
                "frame labels are {}x{} but values are {:?}",
                index.len(),
                columns.len(),
                values.dim()
            )));
        }
        Ok(Self {
            index,
            columns,
            values,
        })
    }

    pub(crate) fn from_parts(index: Index, columns: Index, values: Array2<Value>) -> Self {
        debug_assert_eq!(values.dim(), (index.len(), columns.len()));
        Self {
            index,
            columns,
            values,
        }
    }

    /// Build from row vectors; every row must have one value per column.
    pub fn from_rows(
        index: Index,
        columns: Index,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, StructureError> {
        let width = columns.len();
        if let Some((pos, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != width) {
            return Err(StructureError::ShapeMismatch(format!(
                "row {pos} has {} values but the frame has {width} columns",
                row.len()
            )));
        }
        let height = rows.len();
        let flat: Vec<Value> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((height, width), flat)
            .map_err(|err| StructureError::ShapeMismatch(err.to_string()))?;
        Self::new(index, columns, values)
    }

    /// Columns from labelled series, aligned on the union of their indexes.
    /// Repeated row labels are matched by occurrence.
    pub fn from_series(columns: Vec<(Label, Series)>) -> Self {
        let index = Index::union_all(columns.iter().map(|(_, series)| series.index()));
        let mut values = Array2::from_elem((index.len(), columns.len()), Value::Null);
        for (col, (_, series)) in columns.iter().enumerate() {
            let aligned = series.reindex(&index);
            values.column_mut(col).assign(aligned.values());
        }
        let columns = columns.into_iter().map(|(label, _)| label).collect();
        Self {
            index,
            columns,
            values,
        }
    }

    /// Row labels.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Column labels.
    pub fn columns(&self) -> &Index {
        &self.columns
    }

    /// Cells, `rows x columns`.
    pub fn values(&self) -> &Array2<Value> {
        &self.values
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Whether the frame has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First column labelled `label`, named after it.
    pub fn column(&self, label: &Label) -> Option<Series> {
        self.columns.position(label).map(|pos| self.column_at(pos))
    }

    /// Column at `position` as a named series.
    ///
    /// # Panics
    ///
    /// Panics if `position` is not below the column count.
    pub fn column_at(&self, position: usize) -> Series {
        let series = Series::from_parts(self.index.clone(), self.values.column(position).to_owned());
        match self.columns.get(position) {
            Some(name) => series.with_name(name.clone()),
            None => series,
        }
    }

    /// Row `position` as a series indexed by column labels.
    ///
    /// # Panics
    ///
    /// Panics if `position` is not below the row count.
    pub fn row_at(&self, position: usize) -> Series {
        let series = Series::from_parts(self.columns.clone(), self.values.row(position).to_owned());
        match self.index.get(position) {
            Some(name) => series.with_name(name.clone()),
            None => series,
        }
    }

    /// Columns named by `labels`, in the order given.
    pub fn select_columns(&self, labels: &[Label]) -> Result<Self, StructureError> {
        let positions = positions_of(&self.columns, labels)?;
        Ok(Self {
            index: self.index.clone(),
            columns: self.columns.take(&positions),
            values: self.values.select(Axis(1), &positions),
        })
    }

    /// Rows named by `labels`, in the order given.
    pub fn select_rows(&self, labels: &[Label]) -> Result<Self, StructureError> {
        let positions = positions_of(&self.index, labels)?;
        Ok(self.take_rows(&positions))
    }

    /// Rows at `positions`, which must all be in range.
    pub(crate) fn take_rows(&self, positions: &[usize]) -> Self {
        Self {
            index: self.index.take(positions),
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), positions),
        }
    }

    /// Rows in `range`, clamped to the rows present.
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.index.len());
        let positions: Vec<usize> = (range.start.min(end)..end).collect();
        self.take_rows(&positions)
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Self {
        self.slice_rows(0..n)
    }

    /// Last `n` rows.
    pub fn tail(&self, n: usize) -> Self {
        let rows = self.index.len();
        self.slice_rows(rows.saturating_sub(n)..rows)
    }

    /// Drop every row holding a missing value.
    pub fn dropna(&self) -> Self {
        let keep: Vec<usize> = self
            .values
            .outer_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|value| !value.is_null()))
            .map(|(pos, _)| pos)
            .collect();
        self.take_rows(&keep)
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Self {
        Self {
            index: self.columns.clone(),
            columns: self.index.clone(),
            values: self.values.t().to_owned(),
        }
    }

    /// Reduce down each column (`axis` 0) or across each row (`axis` 1).
    pub fn reduce(&self, reduction: Reduction, axis: usize) -> Result<Series, StructureError> {
        let labels = match axis {
            0 => self.columns.clone(),
            1 => self.index.clone(),
            other => return Err(bad_axis(other, 1)),
        };
        let reduced: Array1<Value> = self
            .values
            .map_axis(Axis(axis), |lane| reduction.apply(lane.iter()));
        Ok(Series::from_parts(labels, reduced))
    }

    /// Conform to `index` x `columns`, filling absent cells with `Null`.
    ///
    /// The n-th occurrence of a repeated label takes the n-th matching row or
    /// column of `self`.
    pub fn reindex(&self, index: &Index, columns: &Index) -> Self {
        let rows = self.index.align(index);
        let cols = self.columns.align(columns);
        let values = Array2::from_shape_fn((index.len(), columns.len()), |(r, c)| {
            match (rows[r], cols[c]) {
                (Some(r), Some(c)) => self.values[[r, c]].clone(),
                _ => Value::Null,
            }
        });
        Self {
            index: index.clone(),
            columns: columns.clone(),
            values,
        }
    }

    /// Copy with a two-level `(outer, row)` index.
    pub fn prefixed(&self, outer: &Label) -> Self {
        Self {
            index: self.index.prefixed(outer),
            columns: self.columns.clone(),
            values: self.values.clone(),
        }
    }

    /// Vertical stack; columns are the union of every part's columns.
    ///
    /// Rows are copied in order without matching labels, so row labels may
    /// repeat across parts.
    pub fn concat(parts: &[&Frame]) -> Self {
        let columns = Index::union_all(parts.iter().map(|part| part.columns()));
        let height = parts.iter().map(|part| part.index.len()).sum();
        let mut values = Array2::from_elem((height, columns.len()), Value::Null);
        let mut index = Vec::with_capacity(height);
        let mut offset = 0;
        for part in parts {
            let rows = offset..offset + part.index.len();
            for (col, target) in columns.align(&part.columns).into_iter().enumerate() {
                if let Some(target) = target {
                    values
                        .slice_mut(s![rows.clone(), target])
                        .assign(&part.values.column(col));
                }
            }
            index.extend(part.index.labels().iter().cloned());
            offset = rows.end;
        }
        Self {
            index: Index::new(index),
            columns,
            values,
        }
    }
}

pub(crate) fn positions_of(index: &Index, labels: &[Label]) -> Result<Vec<usize>, StructureError> {
    index
        .lookup(&Index::new(labels.to_vec()))
        .into_iter()
        .zip(labels)
        .map(|(pos, label)| {
            pos.ok_or_else(|| StructureError::KeyNotFound {
                label: label.to_string(),
            })
        })
        .collect()
}

pub(crate) fn bad_axis(axis: usize, max: usize) -> StructureError {
    StructureError::InvalidArgument {
        name: "axis".into(),
        details: format!("axis {axis} is out of range 0..={max}"),
    }
}
