//! Labelled containers that parsers produce and chained operations transform.
//!
//! [`Structure`] is a closed set of shapes. The engine never assumes which
//! variant a record holds until an operation needs it; every dynamic
//! operation ([`Structure::attr`], [`Structure::select`], [`Structure::call`])
//! returns a new structure or a [`StructureError`].

mod concat;
mod cube;
mod error;
mod frame;
mod index;
mod ops;
mod reduce;
mod series;
mod value;

pub use concat::concat;
pub use cube::{Cube, Hypercube};
pub use error::StructureError;
pub use frame::Frame;
pub use index::Index;
pub use ops::{Args, BoundMethod, Method, Selector};
pub use reduce::Reduction;
pub use series::Series;
pub use value::{IndexKind, Label, ScalarClass, Value};

/// Any value flowing through a query.
#[derive(Clone, Debug, PartialEq)]
pub enum Structure {
    /// A single value.
    Scalar(Value),
    /// Labelled values.
    Series(Series),
    /// Labelled table.
    Frame(Frame),
    /// Stack of frames.
    Cube(Cube),
    /// Stack of cubes.
    Hypercube(Hypercube),
    /// Structures that could not be concatenated, or a list-valued attribute.
    List(Vec<Structure>),
    /// A method read by an attribute stage, awaiting a call stage.
    Method(BoundMethod),
}

/// Shape classification used when merging results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Scalar of the given class.
    Scalar(ScalarClass),
    /// One-dimensional.
    Series,
    /// Two-dimensional.
    Frame,
    /// Three-dimensional.
    Cube,
    /// Four-dimensional.
    Hypercube,
    /// Lists and methods, which never merge.
    Other,
}

impl Structure {
    /// Shape classification of this structure.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Scalar(value) => Kind::Scalar(value.class()),
            Self::Series(_) => Kind::Series,
            Self::Frame(_) => Kind::Frame,
            Self::Cube(_) => Kind::Cube,
            Self::Hypercube(_) => Kind::Hypercube,
            Self::List(_) | Self::Method(_) => Kind::Other,
        }
    }

    /// Lowercase name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Series(_) => "series",
            Self::Frame(_) => "frame",
            Self::Cube(_) => "cube",
            Self::Hypercube(_) => "hypercube",
            Self::List(_) => "list",
            Self::Method(_) => "method",
        }
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        match self {
            Self::Scalar(_) | Self::Method(_) => 0,
            Self::Series(_) | Self::List(_) => 1,
            Self::Frame(_) => 2,
            Self::Cube(_) => 3,
            Self::Hypercube(_) => 4,
        }
    }

    /// Length of every axis; empty for scalars and methods.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Scalar(_) | Self::Method(_) => Vec::new(),
            Self::Series(series) => vec![series.len()],
            Self::List(items) => vec![items.len()],
            Self::Frame(frame) => {
                let (rows, cols) = frame.shape();
                vec![rows, cols]
            }
            Self::Cube(cube) => {
                let (items, major, minor) = cube.shape();
                vec![items, major, minor]
            }
            Self::Hypercube(hyper) => {
                let (labels, items, major, minor) = hyper.shape();
                vec![labels, items, major, minor]
            }
        }
    }

    /// Number of cells; 1 for scalars.
    pub fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// The value, for scalars.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// The series, for series.
    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Self::Series(series) => Some(series),
            _ => None,
        }
    }

    /// The frame, for frames.
    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Self::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// The cube, for cubes.
    pub fn as_cube(&self) -> Option<&Cube> {
        match self {
            Self::Cube(cube) => Some(cube),
            _ => None,
        }
    }
}

impl From<Value> for Structure {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<Series> for Structure {
    fn from(value: Series) -> Self {
        Self::Series(value)
    }
}

impl From<Frame> for Structure {
    fn from(value: Frame) -> Self {
        Self::Frame(value)
    }
}

impl From<Cube> for Structure {
    fn from(value: Cube) -> Self {
        Self::Cube(value)
    }
}

impl From<Hypercube> for Structure {
    fn from(value: Hypercube) -> Self {
        Self::Hypercube(value)
    }
}

impl From<Vec<Structure>> for Structure {
    fn from(value: Vec<Structure>) -> Self {
        Self::List(value)
    }
}
