use thiserror::Error;

/// Failure of a dynamic operation on a [`Structure`](super::Structure).
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StructureError {
    /// Attribute lookup for a name the structure does not have.
    #[error("'{kind}' has no attribute '{name}'")]
    NoAttribute {
        /// Type name of the receiver.
        kind: &'static str,
        /// Requested attribute.
        name: String,
    },
    /// Call on something that is not a method.
    #[error("'{kind}' is not callable")]
    NotCallable {
        /// Type name of the receiver.
        kind: &'static str,
    },
    /// Selector the structure does not support.
    #[error("'{kind}' cannot be indexed by {selector}")]
    NotIndexable {
        /// Type name of the receiver.
        kind: &'static str,
        /// Description of the selector.
        selector: String,
    },
    /// Label selection for a label that is absent.
    #[error("label '{label}' not found")]
    KeyNotFound {
        /// Missing label.
        label: String,
    },
    /// Position outside `-len..len`.
    #[error("position {position} is out of bounds for length {len}")]
    PositionOutOfBounds {
        /// Requested position; negative counts from the end.
        position: isize,
        /// Length of the axis.
        len: usize,
    },
    /// Method argument of the wrong type or value.
    #[error("invalid argument '{name}': {details}")]
    InvalidArgument {
        /// Argument name.
        name: String,
        /// What was wrong with it.
        details: String,
    },
    /// Structures of mixed or unsupported kinds.
    #[error("cannot concatenate {kinds}")]
    NotConcatenable {
        /// Kinds that were given.
        kinds: String,
    },
    /// Labels and values disagree in length.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}
