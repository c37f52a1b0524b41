//! Parser interface: how one kind of data file becomes a [`Structure`].

use crate::data::Entry;
use crate::errors::{AccessError, RecordError};
use crate::source::FetchRequest;
use crate::structure::Structure;
use crate::types::EndpointName;

/// Reads the files of one catalog endpoint.
///
/// A run calls [`Parser::prepare_state`] once, before any file is read, and
/// then lends the resulting state mutably to every [`Parser::parse`] call.
/// Parse failures are per-record: the run logs them and moves on. Returning
/// [`RecordError::Cancelled`] stops the whole run instead.
pub trait Parser {
    /// Extra per-query options this parser understands.
    type Options: Clone + Default;
    /// Run-scoped state derived from the request and options.
    type State: Default;

    /// Catalog endpoint whose entries this parser reads.
    fn endpoint(&self) -> &str;

    /// Build the run's state. Failures abort the run before any parse.
    fn prepare_state(
        &self,
        _request: &FetchRequest,
        _options: &Self::Options,
    ) -> Result<Self::State, AccessError> {
        Ok(Self::State::default())
    }

    /// Read one entry into a structure. Errors skip the entry; only
    /// `RecordError::Cancelled` ends the run.
    fn parse(&self, entry: &Entry, state: &mut Self::State) -> Result<Structure, RecordError>;
}

/// Parser backed by a closure, with no options or state.
pub struct FnParser<F> {
    endpoint: EndpointName,
    parse: F,
}

impl<F> FnParser<F>
where
    F: Fn(&Entry) -> Result<Structure, RecordError>,
{
    /// Parser for `endpoint` that calls `parse` on every entry.
    pub fn new(endpoint: impl Into<EndpointName>, parse: F) -> Self {
        Self {
            endpoint: endpoint.into(),
            parse,
        }
    }
}

impl<F> Parser for FnParser<F>
where
    F: Fn(&Entry) -> Result<Structure, RecordError>,
{
    type Options = ();
    type State = ();

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn parse(&self, entry: &Entry, _state: &mut ()) -> Result<Structure, RecordError> {
        (self.parse)(entry)
    }
}

impl<P: Parser + ?Sized> Parser for &P {
    type Options = P::Options;
    type State = P::State;

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn prepare_state(
        &self,
        request: &FetchRequest,
        options: &Self::Options,
    ) -> Result<Self::State, AccessError> {
        (**self).prepare_state(request, options)
    }

    fn parse(&self, entry: &Entry, state: &mut Self::State) -> Result<Structure, RecordError> {
        (**self).parse(entry, state)
    }
}
