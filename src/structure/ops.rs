use std::fmt;
use std::ops::Range;

use indexmap::IndexMap;

use super::error::StructureError;
use super::frame::Frame;
use super::index::Index;
use super::reduce::Reduction;
use super::series::Series;
use super::value::{Label, Value};
use super::Structure;
use crate::constants::structure::DEFAULT_HEAD_ROWS;

/// Argument to an index stage.
#[derive(Clone, Debug, PartialEq)]
pub enum Selector {
    /// One label: a series entry, a frame column, a cube item.
    Label(Label),
    /// Several labels, kept in the order given.
    Labels(Vec<Label>),
    /// One position; negative positions count from the end.
    Position(isize),
    /// Positional range along the first axis, clamped to its length.
    Range(Range<usize>),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => write!(f, "label '{label}'"),
            Self::Labels(labels) => write!(f, "{} labels", labels.len()),
            Self::Position(pos) => write!(f, "position {pos}"),
            Self::Range(range) => write!(f, "range {}..{}", range.start, range.end),
        }
    }
}

impl From<Label> for Selector {
    fn from(value: Label) -> Self {
        Self::Label(value)
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::Label(Label::from(value))
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Self::Label(Label::from(value))
    }
}

impl From<Vec<Label>> for Selector {
    fn from(value: Vec<Label>) -> Self {
        Self::Labels(value)
    }
}

impl From<Range<usize>> for Selector {
    fn from(value: Range<usize>) -> Self {
        Self::Range(value)
    }
}

/// Arguments to a call stage.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args {
    positional: Vec<Value>,
    keyword: IndexMap<String, Value>,
}

impl Args {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Set a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Positional arguments in order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword argument `name`.
    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    /// Non-negative integer passed as `name=` or at `position`, else `default`.
    pub fn usize_arg(
        &self,
        name: &str,
        position: usize,
        default: usize,
    ) -> Result<usize, StructureError> {
        let Some(value) = self.keyword(name).or_else(|| self.positional.get(position)) else {
            return Ok(default);
        };
        value
            .as_i64()
            .and_then(|raw| usize::try_from(raw).ok())
            .ok_or_else(|| StructureError::InvalidArgument {
                name: name.to_string(),
                details: format!("expected a non-negative integer, got {value}"),
            })
    }
}

/// Methods reachable through attribute access and invoked by a call stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// Mean, skipping nulls.
    Mean,
    /// Sum, skipping nulls.
    Sum,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// Number of non-null values.
    Count,
    /// Median, skipping nulls.
    Median,
    /// First `n` rows (default 5).
    Head,
    /// Last `n` rows (default 5).
    Tail,
    /// Drop rows or entries with missing values.
    DropNa,
    /// Swap rows and columns of a frame.
    Transpose,
}

impl Method {
    /// Attribute name the method is reached by.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Tail => "tail",
            Self::DropNa => "dropna",
            Self::Transpose => "transpose",
            other => other.reduction().map_or("", |reduction| reduction.name()),
        }
    }

    /// Method reached by attribute `name`.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "mean" => Self::Mean,
            "sum" => Self::Sum,
            "min" => Self::Min,
            "max" => Self::Max,
            "count" => Self::Count,
            "median" => Self::Median,
            "head" => Self::Head,
            "tail" => Self::Tail,
            "dropna" => Self::DropNa,
            "transpose" => Self::Transpose,
            _ => return None,
        })
    }

    fn reduction(&self) -> Option<Reduction> {
        match self {
            Self::Mean => Some(Reduction::Mean),
            Self::Sum => Some(Reduction::Sum),
            Self::Min => Some(Reduction::Min),
            Self::Max => Some(Reduction::Max),
            Self::Count => Some(Reduction::Count),
            Self::Median => Some(Reduction::Median),
            _ => None,
        }
    }

    fn available_on(&self, structure: &Structure) -> bool {
        match structure {
            Structure::Series(_) => !matches!(self, Self::Transpose),
            Structure::Frame(_) => true,
            Structure::Cube(_) => self.reduction().is_some(),
            _ => false,
        }
    }
}

/// A method read off a structure, waiting for its arguments.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundMethod {
    receiver: Box<Structure>,
    method: Method,
}

impl BoundMethod {
    /// Structure the method was read from.
    pub fn receiver(&self) -> &Structure {
        &self.receiver
    }

    /// Which method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Run the method on its receiver.
    pub fn invoke(&self, args: &Args) -> Result<Structure, StructureError> {
        let method = self.method;
        if let Some(reduction) = method.reduction() {
            let axis = args.usize_arg("axis", 0, 0)?;
            return match self.receiver.as_ref() {
                Structure::Series(series) if axis == 0 => {
                    Ok(Structure::Scalar(series.reduce(reduction)))
                }
                Structure::Series(_) => Err(super::frame::bad_axis(axis, 0)),
                Structure::Frame(frame) => Ok(frame.reduce(reduction, axis)?.into()),
                Structure::Cube(cube) => Ok(cube.reduce(reduction, axis)?.into()),
                other => Err(no_method(other, method)),
            };
        }
        match (method, self.receiver.as_ref()) {
            (Method::Head, Structure::Series(series)) => {
                Ok(series.head(args.usize_arg("n", 0, DEFAULT_HEAD_ROWS)?).into())
            }
            (Method::Head, Structure::Frame(frame)) => {
                Ok(frame.head(args.usize_arg("n", 0, DEFAULT_HEAD_ROWS)?).into())
            }
            (Method::Tail, Structure::Series(series)) => {
                Ok(series.tail(args.usize_arg("n", 0, DEFAULT_HEAD_ROWS)?).into())
            }
            (Method::Tail, Structure::Frame(frame)) => {
                Ok(frame.tail(args.usize_arg("n", 0, DEFAULT_HEAD_ROWS)?).into())
            }
            (Method::DropNa, Structure::Series(series)) => Ok(series.dropna().into()),
            (Method::DropNa, Structure::Frame(frame)) => Ok(frame.dropna().into()),
            (Method::Transpose, Structure::Frame(frame)) => Ok(frame.transpose().into()),
            (method, other) => Err(no_method(other, method)),
        }
    }
}

fn no_method(structure: &Structure, method: Method) -> StructureError {
    StructureError::NoAttribute {
        kind: structure.type_name(),
        name: method.name().to_string(),
    }
}

fn resolve_position(position: isize, len: usize) -> Result<usize, StructureError> {
    let resolved = if position < 0 {
        len.checked_sub(position.unsigned_abs())
    } else {
        Some(position as usize)
    };
    resolved
        .filter(|pos| *pos < len)
        .ok_or(StructureError::PositionOutOfBounds { position, len })
}

fn clamp(range: &Range<usize>, len: usize) -> Range<usize> {
    let end = range.end.min(len);
    range.start.min(end)..end
}

/// Labels of an axis as a positional series of values.
fn axis_structure(index: &Index) -> Structure {
    let values = index.labels().iter().map(Label::to_value).collect();
    Series::from_parts(Index::range(index.len()), values).into()
}

impl Structure {
    /// Attribute access: structural properties, methods, then column or item
    /// names.
    pub fn attr(&self, name: &str) -> Result<Structure, StructureError> {
        if let Some(found) = self.property(name) {
            return Ok(found);
        }
        if let Some(method) = Method::from_name(name)
            && method.available_on(self)
        {
            return Ok(Structure::Method(BoundMethod {
                receiver: Box::new(self.clone()),
                method,
            }));
        }
        let label = Label::from(name);
        let member = match self {
            Structure::Frame(frame) => frame.column(&label).map(Structure::from),
            Structure::Cube(cube) => cube.item(&label).map(Structure::from),
            Structure::Hypercube(hyper) => hyper.cube(&label).map(Structure::from),
            _ => None,
        };
        member.ok_or_else(|| StructureError::NoAttribute {
            kind: self.type_name(),
            name: name.to_string(),
        })
    }

    fn property(&self, name: &str) -> Option<Structure> {
        if matches!(
            self,
            Structure::Scalar(_) | Structure::List(_) | Structure::Method(_)
        ) {
            return None;
        }
        let found = match (name, self) {
            ("shape", _) => Structure::List(
                self.shape()
                    .into_iter()
                    .map(|len| Structure::Scalar(Value::Int(len as i64)))
                    .collect(),
            ),
            ("ndim", _) => Value::Int(self.ndim() as i64).into(),
            ("size", _) => Value::Int(self.size() as i64).into(),
            ("empty", _) => Value::Bool(self.size() == 0).into(),
            ("index", Structure::Series(series)) => axis_structure(series.index()),
            ("name", Structure::Series(series)) => series
                .name()
                .map_or(Value::Null, Label::to_value)
                .into(),
            ("values", Structure::Series(series)) => {
                Series::from_parts(Index::range(series.len()), series.values().clone()).into()
            }
            ("index", Structure::Frame(frame)) => axis_structure(frame.index()),
            ("columns", Structure::Frame(frame)) => axis_structure(frame.columns()),
            ("values", Structure::Frame(frame)) => {
                let (rows, cols) = frame.shape();
                Frame::from_parts(Index::range(rows), Index::range(cols), frame.values().clone())
                    .into()
            }
            ("T", Structure::Frame(frame)) => frame.transpose().into(),
            ("items", Structure::Cube(cube)) => axis_structure(cube.items()),
            ("major_axis", Structure::Cube(cube)) => axis_structure(cube.major_axis()),
            ("minor_axis", Structure::Cube(cube)) => axis_structure(cube.minor_axis()),
            ("labels", Structure::Hypercube(hyper)) => axis_structure(hyper.labels()),
            ("items", Structure::Hypercube(hyper)) => axis_structure(hyper.items()),
            ("major_axis", Structure::Hypercube(hyper)) => axis_structure(hyper.major_axis()),
            ("minor_axis", Structure::Hypercube(hyper)) => axis_structure(hyper.minor_axis()),
            _ => return None,
        };
        Some(found)
    }

    /// Index access.
    ///
    /// | structure | label | labels | position | range |
    /// |-----------|-------|--------|----------|-------|
    /// | series    | value | series | value    | series |
    /// | frame     | column | frame (columns) | row series | frame (rows) |
    /// | cube      | item frame | cube | item frame | cube |
    /// | hypercube | cube  | -      | -        | -     |
    /// | list      | -     | -      | element  | list  |
    pub fn select(&self, selector: &Selector) -> Result<Structure, StructureError> {
        match (self, selector) {
            (Structure::Series(series), Selector::Label(label)) => series
                .get(label)
                .cloned()
                .map(Structure::Scalar)
                .ok_or_else(|| StructureError::KeyNotFound {
                    label: label.to_string(),
                }),
            (Structure::Series(series), Selector::Labels(labels)) => {
                Ok(series.select_labels(labels)?.into())
            }
            (Structure::Series(series), Selector::Position(pos)) => {
                let pos = resolve_position(*pos, series.len())?;
                Ok(Structure::Scalar(series.values()[pos].clone()))
            }
            (Structure::Series(series), Selector::Range(range)) => {
                Ok(series.slice(clamp(range, series.len())).into())
            }
            (Structure::Frame(frame), Selector::Label(label)) => frame
                .column(label)
                .map(Structure::from)
                .ok_or_else(|| StructureError::KeyNotFound {
                    label: label.to_string(),
                }),
            (Structure::Frame(frame), Selector::Labels(labels)) => {
                Ok(frame.select_columns(labels)?.into())
            }
            (Structure::Frame(frame), Selector::Position(pos)) => {
                let pos = resolve_position(*pos, frame.index().len())?;
                Ok(frame.row_at(pos).into())
            }
            (Structure::Frame(frame), Selector::Range(range)) => {
                Ok(frame.slice_rows(clamp(range, frame.index().len())).into())
            }
            (Structure::Cube(cube), Selector::Label(label)) => cube
                .item(label)
                .map(Structure::from)
                .ok_or_else(|| StructureError::KeyNotFound {
                    label: label.to_string(),
                }),
            (Structure::Cube(cube), Selector::Labels(labels)) => {
                Ok(cube.select_items(labels)?.into())
            }
            (Structure::Cube(cube), Selector::Position(pos)) => {
                let pos = resolve_position(*pos, cube.items().len())?;
                Ok(cube.item_at(pos).into())
            }
            (Structure::Cube(cube), Selector::Range(range)) => {
                let positions: Vec<usize> = clamp(range, cube.items().len()).collect();
                Ok(cube.take_items(&positions).into())
            }
            (Structure::Hypercube(hyper), Selector::Label(label)) => hyper
                .cube(label)
                .map(Structure::from)
                .ok_or_else(|| StructureError::KeyNotFound {
                    label: label.to_string(),
                }),
            (Structure::List(items), Selector::Position(pos)) => {
                let pos = resolve_position(*pos, items.len())?;
                Ok(items[pos].clone())
            }
            (Structure::List(items), Selector::Range(range)) => {
                Ok(Structure::List(items[clamp(range, items.len())].to_vec()))
            }
            (other, selector) => Err(StructureError::NotIndexable {
                kind: other.type_name(),
                selector: selector.to_string(),
            }),
        }
    }

    /// Invocation. Only bound methods are callable.
    pub fn call(&self, args: &Args) -> Result<Structure, StructureError> {
        match self {
            Structure::Method(bound) => bound.invoke(args),
            other => Err(StructureError::NotCallable {
                kind: other.type_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::Cube;

    fn levels() -> Structure {
        Frame::from_rows(
            Index::range(3),
            ["dbA", "L90"].into_iter().map(Label::from).collect(),
            vec![
                vec![Value::Float(30.0), Value::Float(20.0)],
                vec![Value::Float(40.0), Value::Float(24.0)],
                vec![Value::Float(50.0), Value::Null],
            ],
        )
        .unwrap()
        .into()
    }

    #[test]
    fn attribute_then_call_reduces_a_column() {
        let mean = levels()
            .attr("dbA")
            .unwrap()
            .attr("mean")
            .unwrap()
            .call(&Args::new())
            .unwrap();
        assert_eq!(mean, Structure::Scalar(Value::Float(40.0)));
    }

    #[test]
    fn properties_report_structure() {
        let frame = levels();
        assert_eq!(
            frame.attr("shape").unwrap(),
            Structure::List(vec![Value::Int(3).into(), Value::Int(2).into()])
        );
        assert_eq!(frame.attr("ndim").unwrap(), Structure::from(Value::Int(2)));
        assert_eq!(frame.attr("empty").unwrap(), Structure::from(Value::Bool(false)));
        let columns = frame.attr("columns").unwrap();
        assert_eq!(columns.select(&Selector::Position(-1)).unwrap(), Structure::from(Value::from("L90")));
        assert!(matches!(
            frame.attr("nope"),
            Err(StructureError::NoAttribute { kind: "frame", .. })
        ));
    }

    #[test]
    fn call_arguments_are_validated() {
        let head = levels()
            .attr("head")
            .unwrap()
            .call(&Args::new().arg(2))
            .unwrap();
        assert_eq!(head.shape(), vec![2, 2]);
        let by_row = levels()
            .attr("sum")
            .unwrap()
            .call(&Args::new().kwarg("axis", 1))
            .unwrap();
        assert_eq!(by_row.shape(), vec![3]);
        let bad = levels().attr("head").unwrap().call(&Args::new().arg(-1));
        assert!(matches!(bad, Err(StructureError::InvalidArgument { .. })));
    }

    #[test]
    fn selectors_follow_the_structure() {
        let frame = levels();
        let row = frame.select(&Selector::Position(1)).unwrap();
        assert_eq!(row.select(&"L90".into()).unwrap(), Structure::from(Value::Float(24.0)));
        assert_eq!(frame.select(&Selector::Range(1..10)).unwrap().shape(), vec![2, 2]);
        assert!(matches!(
            frame.select(&Selector::Position(3)),
            Err(StructureError::PositionOutOfBounds { position: 3, len: 3 })
        ));
        assert!(matches!(
            Structure::from(Value::Int(1)).select(&Selector::Position(0)),
            Err(StructureError::NotIndexable { .. })
        ));
    }

    #[test]
    fn only_methods_are_callable() {
        let err = levels().call(&Args::new()).unwrap_err();
        assert_eq!(err, StructureError::NotCallable { kind: "frame" });
        let cube = Structure::from(Cube::from_frames(Vec::new()));
        assert!(cube.attr("head").is_err());
        assert!(cube.attr("mean").is_ok());
    }
}
