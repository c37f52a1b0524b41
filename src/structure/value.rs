use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// A single cell, or a scalar result of a reduction.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Missing value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float; `NaN` is a value, not a missing one.
    Float(f64),
    /// Text that could not be read as anything else.
    Text(String),
    /// Timestamp without a time zone.
    DateTime(NaiveDateTime),
    /// Difference of two timestamps.
    Duration(TimeDelta),
}

/// Coarse class of a scalar, used to decide whether scalars can be merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarClass {
    /// Missing.
    Null,
    /// Boolean.
    Boolean,
    /// Integer or float.
    Numeric,
    /// Timestamp or duration.
    Temporal,
    /// Text.
    Text,
}

impl Value {
    /// Class of this scalar. `NaN` floats stay numeric.
    pub fn class(&self) -> ScalarClass {
        match self {
            Self::Null => ScalarClass::Null,
            Self::Bool(_) => ScalarClass::Boolean,
            Self::Int(_) | Self::Float(_) => ScalarClass::Numeric,
            Self::DateTime(_) | Self::Duration(_) => ScalarClass::Temporal,
            Self::Text(_) => ScalarClass::Text,
        }
    }

    /// Missing values: `Null` and `NaN`.
    pub fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Numeric view used by reductions. Booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) if !v.is_nan() => Some(*v),
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Integer view used for call arguments such as `axis` and `n`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Label view of this value, when it has one.
    pub fn to_label(&self) -> Option<Label> {
        match self {
            Self::Int(v) => Some(Label::Int(*v)),
            Self::Text(v) => Some(Label::Text(v.clone())),
            Self::DateTime(v) => Some(Label::DateTime(*v)),
            _ => None,
        }
    }

    /// Order two values of the same class; `None` across classes or for nulls.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Duration(a), Self::Duration(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Self::Duration(v) => write!(f, "{}s", v.num_seconds()),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<TimeDelta> for Value {
    fn from(value: TimeDelta) -> Self {
        Self::Duration(value)
    }
}

/// An axis label: row index entry, column name, cube item, or identity.
///
/// `Tuple` labels model multi-level indexes, for example
/// `(identity, timestamp)` after stacking per-identity frames.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    /// Integer, including positional indexes.
    Int(i64),
    /// Text.
    Text(String),
    /// Timestamp.
    DateTime(NaiveDateTime),
    /// Multi-level label, outermost level first.
    Tuple(Vec<Label>),
}

/// Homogeneous kind of the labels on one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// No labels.
    Empty,
    /// All integers.
    Int,
    /// All text.
    Text,
    /// All timestamps.
    DateTime,
    /// All tuples.
    Tuple,
    /// Labels of more than one kind.
    Mixed,
}

impl Label {
    /// Kind of this single label.
    pub fn kind(&self) -> IndexKind {
        match self {
            Self::Int(_) => IndexKind::Int,
            Self::Text(_) => IndexKind::Text,
            Self::DateTime(_) => IndexKind::DateTime,
            Self::Tuple(_) => IndexKind::Tuple,
        }
    }

    /// Value view of this label. Tuples render as text.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(v) => Value::Int(*v),
            Self::Text(v) => Value::Text(v.clone()),
            Self::DateTime(v) => Value::DateTime(*v),
            Self::Tuple(_) => Value::Text(self.to_string()),
        }
    }

    /// Prefix `inner` with `self`, flattening tuple labels on both sides.
    pub fn nest(&self, inner: &Self) -> Self {
        let mut parts = Vec::new();
        for label in [self, inner] {
            match label {
                Self::Tuple(items) => parts.extend(items.iter().cloned()),
                other => parts.push(other.clone()),
            }
        }
        Self::Tuple(parts)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Self::Tuple(items) => {
                f.write_str("(")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Label {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<NaiveDateTime> for Label {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}
