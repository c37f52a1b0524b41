use std::io;

use thiserror::Error;

use crate::structure::StructureError;
use crate::types::{EndpointName, FieldName};

/// Errors that abort a query before or during a run.
///
/// Per-record failures never surface here; they are logged and the record is
/// skipped. Only setup problems and cancellation reach the caller.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The query names an endpoint the catalog does not have.
    #[error("no endpoint '{endpoint}' exists in the catalog")]
    UnknownEndpoint {
        /// Requested endpoint.
        endpoint: EndpointName,
    },
    /// A filter or item field is not one of the endpoint's fields.
    #[error("endpoint '{endpoint}' has no field '{field}'")]
    UnknownField {
        /// Endpoint being queried.
        endpoint: EndpointName,
        /// Offending field.
        field: FieldName,
    },
    /// A sort field is not one of the endpoint's fields.
    #[error("cannot sort endpoint '{endpoint}' by unknown field '{field}'")]
    UnknownSortField {
        /// Endpoint being queried.
        endpoint: EndpointName,
        /// Offending field.
        field: FieldName,
    },
    /// The catalog cannot list the endpoint, e.g. its root directory is gone.
    #[error("catalog endpoint '{endpoint}' is unavailable: {reason}")]
    CatalogUnavailable {
        /// Endpoint being listed.
        endpoint: EndpointName,
        /// What went wrong.
        reason: String,
    },
    /// Invalid builder or catalog setup.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A JSON manifest could not be read into entries.
    #[error("catalog manifest is invalid: {0}")]
    Manifest(#[from] serde_json::Error),
    /// The run's cancel token was triggered.
    #[error("run cancelled")]
    Cancelled,
}

/// Failure while parsing one record or transforming one pair.
///
/// Every variant except `Cancelled` is recovered by the run: the record is
/// logged and skipped.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record's file could not be opened or read.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The delimited reader rejected the file.
    #[error("delimited read failed: {0}")]
    Csv(#[from] csv::Error),
    /// The file was read but its contents make no sense.
    #[error("malformed record '{path}': {details}")]
    Malformed {
        /// Record path.
        path: String,
        /// What was wrong with it.
        details: String,
    },
    /// An operation on the parsed structure failed.
    #[error(transparent)]
    Structure(#[from] StructureError),
    /// Any other failure, described.
    #[error("{0}")]
    Failed(String),
    /// Cancellation raised from inside a parser or stage.
    #[error("run cancelled")]
    Cancelled,
}

impl RecordError {
    /// True for the cancellation signal, which must never be swallowed.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
