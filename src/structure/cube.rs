use ndarray::{Array3, Array4, Axis};

use super::error::StructureError;
use super::frame::{bad_axis, positions_of, Frame};
use super::index::Index;
use super::reduce::Reduction;
use super::value::{Label, Value};

/// Three-dimensional labelled structure: `items x major x minor`.
///
/// Each item is a frame whose rows run along the major axis and whose columns
/// run along the minor axis.
#[derive(Clone, Debug, PartialEq)]
pub struct Cube {
    items: Index,
    major_axis: Index,
    minor_axis: Index,
    values: Array3<Value>,
}

impl Cube {
    /// Stack frames as items, aligned on the union of their rows and columns.
    /// Repeated row labels are matched by occurrence.
    pub fn from_frames(frames: Vec<(Label, Frame)>) -> Self {
        let major_axis = Index::union_all(frames.iter().map(|(_, frame)| frame.index()));
        let minor_axis = Index::union_all(frames.iter().map(|(_, frame)| frame.columns()));
        let mut values = Array3::from_elem(
            (frames.len(), major_axis.len(), minor_axis.len()),
            Value::Null,
        );
        for (pos, (_, frame)) in frames.iter().enumerate() {
            let aligned = frame.reindex(&major_axis, &minor_axis);
            values.index_axis_mut(Axis(0), pos).assign(aligned.values());
        }
        let items = frames.into_iter().map(|(label, _)| label).collect();
        Self {
            items,
            major_axis,
            minor_axis,
            values,
        }
    }

    /// Item labels.
    pub fn items(&self) -> &Index {
        &self.items
    }

    /// Row labels shared by every item.
    pub fn major_axis(&self) -> &Index {
        &self.major_axis
    }

    /// Column labels shared by every item.
    pub fn minor_axis(&self) -> &Index {
        &self.minor_axis
    }

    /// Cells, `items x major x minor`.
    pub fn values(&self) -> &Array3<Value> {
        &self.values
    }

    /// `(items, major, minor)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.values.dim()
    }

    /// Whether the cube has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First item labelled `label`.
    pub fn item(&self, label: &Label) -> Option<Frame> {
        self.items.position(label).map(|pos| self.item_at(pos))
    }

    /// Item at `position` as a frame.
    ///
    /// # Panics
    ///
    /// Panics if `position` is not below the item count.
    pub fn item_at(&self, position: usize) -> Frame {
        Frame::from_parts(
            self.major_axis.clone(),
            self.minor_axis.clone(),
            self.values.index_axis(Axis(0), position).to_owned(),
        )
    }

    /// Items named by `labels`, in the order given.
    pub fn select_items(&self, labels: &[Label]) -> Result<Self, StructureError> {
        let positions = positions_of(&self.items, labels)?;
        Ok(self.take_items(&positions))
    }

    /// Items at `positions`, which must all be in range.
    pub(crate) fn take_items(&self, positions: &[usize]) -> Self {
        Self {
            items: self.items.take(positions),
            major_axis: self.major_axis.clone(),
            minor_axis: self.minor_axis.clone(),
            values: self.values.select(Axis(0), positions),
        }
    }

    /// Reduce across items (`axis` 0, giving `major x minor`), along the major
    /// axis (1, giving `minor x items`) or along the minor axis (2, giving
    /// `major x items`).
    pub fn reduce(&self, reduction: Reduction, axis: usize) -> Result<Frame, StructureError> {
        if axis > 2 {
            return Err(bad_axis(axis, 2));
        }
        let reduced = self
            .values
            .map_axis(Axis(axis), |lane| reduction.apply(lane.iter()));
        Ok(match axis {
            0 => Frame::from_parts(self.major_axis.clone(), self.minor_axis.clone(), reduced),
            1 => Frame::from_parts(
                self.minor_axis.clone(),
                self.items.clone(),
                reduced.t().to_owned(),
            ),
            _ => Frame::from_parts(
                self.major_axis.clone(),
                self.items.clone(),
                reduced.t().to_owned(),
            ),
        })
    }

    /// Append items; the other axes become the union of every part's axes.
    pub fn concat(parts: &[&Cube]) -> Self {
        let frames = parts
            .iter()
            .flat_map(|cube| {
                (0..cube.items.len()).filter_map(move |pos| {
                    cube.items.get(pos).map(|label| (label.clone(), cube.item_at(pos)))
                })
            })
            .collect();
        Self::from_frames(frames)
    }
}

/// Four-dimensional labelled structure: `labels x items x major x minor`.
#[derive(Clone, Debug, PartialEq)]
pub struct Hypercube {
    labels: Index,
    items: Index,
    major_axis: Index,
    minor_axis: Index,
    values: Array4<Value>,
}

impl Hypercube {
    /// Stack cubes, aligned on the union of each of their three axes.
    pub fn from_cubes(cubes: Vec<(Label, Cube)>) -> Self {
        let items = Index::union_all(cubes.iter().map(|(_, cube)| cube.items()));
        let major_axis = Index::union_all(cubes.iter().map(|(_, cube)| cube.major_axis()));
        let minor_axis = Index::union_all(cubes.iter().map(|(_, cube)| cube.minor_axis()));
        let mut values = Array4::from_elem(
            (cubes.len(), items.len(), major_axis.len(), minor_axis.len()),
            Value::Null,
        );
        for (outer, (_, cube)) in cubes.iter().enumerate() {
            let found = cube.items.align(&items);
            for (inner, pos) in found.into_iter().enumerate() {
                if let Some(pos) = pos {
                    let aligned = cube.item_at(pos).reindex(&major_axis, &minor_axis);
                    values
                        .index_axis_mut(Axis(0), outer)
                        .index_axis_mut(Axis(0), inner)
                        .assign(aligned.values());
                }
            }
        }
        let labels = cubes.into_iter().map(|(label, _)| label).collect();
        Self {
            labels,
            items,
            major_axis,
            minor_axis,
            values,
        }
    }

    /// Cube labels.
    pub fn labels(&self) -> &Index {
        &self.labels
    }

    /// Item labels shared by every cube.
    pub fn items(&self) -> &Index {
        &self.items
    }

    /// Row labels.
    pub fn major_axis(&self) -> &Index {
        &self.major_axis
    }

    /// Column labels.
    pub fn minor_axis(&self) -> &Index {
        &self.minor_axis
    }

    /// Cells, `labels x items x major x minor`.
    pub fn values(&self) -> &Array4<Value> {
        &self.values
    }

    /// `(labels, items, major, minor)`.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        self.values.dim()
    }

    /// Whether the hypercube has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First cube labelled `label`.
    pub fn cube(&self, label: &Label) -> Option<Cube> {
        self.labels.position(label).map(|pos| Cube {
            items: self.items.clone(),
            major_axis: self.major_axis.clone(),
            minor_axis: self.minor_axis.clone(),
            values: self.values.index_axis(Axis(0), pos).to_owned(),
        })
    }
}
