//! Lazy per-record transform chain.
//!
//! A [`Query`] names an endpoint (through its parser), the entries wanted from
//! it, and an ordered list of [`Stage`]s. Nothing runs until [`Query::iter`]
//! or [`Query::combine`]; each call starts a fresh pass, so a query can be
//! combined any number of times.

mod group;
mod run;
mod stage;

use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

pub use group::GroupBy;
pub use run::{CancelToken, Run};
pub use stage::{MapFn, Stage};

use crate::combine::{Combined, Combiner};
use crate::data::{Entry, Key};
use crate::errors::{AccessError, RecordError};
use crate::parser::Parser;
use crate::source::{Catalog, FetchRequest, Filter, SortKey};
use crate::structure::{Args, Label, Selector, Structure};
use crate::types::{FieldName, FieldSet};
use run::{ParseSource, PairStream, new_stats};

/// Records of one endpoint plus the operations to apply to each.
///
/// Builder methods consume and return the query; a running [`Run`] borrows
/// it, so the chain cannot change while a pass is in progress.
pub struct Query<C, P: Parser> {
    catalog: C,
    parser: P,
    request: FetchRequest,
    options: P::Options,
    stages: Vec<Stage>,
    cancel: CancelToken,
}

impl<C: Catalog, P: Parser> Query<C, P> {
    /// Query every entry of the parser's endpoint.
    ///
    /// Fails with [`AccessError::UnknownEndpoint`] when the catalog has no
    /// such endpoint.
    pub fn new(catalog: C, parser: P) -> Result<Self, AccessError> {
        catalog.fields(parser.endpoint())?;
        let request = FetchRequest::new(parser.endpoint());
        Ok(Self {
            catalog,
            parser,
            request,
            options: P::Options::default(),
            stages: Vec::new(),
            cancel: CancelToken::new(),
        })
    }

    /// Restrict `field` (equality, any-of, exclusion or predicate).
    pub fn filter(mut self, field: impl Into<FieldName>, filter: impl Into<Filter>) -> Self {
        self.request.filters.insert(field.into(), filter.into());
        self
    }

    /// Select explicit entries by their field values.
    pub fn items(mut self, items: impl IntoIterator<Item = FieldSet>) -> Self {
        self.request.items = Some(items.into_iter().collect());
        self
    }

    /// Order entries by `fields`, compared in turn. Overrides any earlier sort.
    pub fn sort_by_fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldName>,
    {
        self.request.sort = Some(SortKey::Fields(
            fields.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Order entries by `key`. Overrides any earlier sort.
    pub fn sort_by(mut self, key: impl Fn(&Entry) -> Label + Send + Sync + 'static) -> Self {
        self.request.sort = Some(SortKey::By(Arc::new(key)));
        self
    }

    /// Keep at most `limit` entries, after filtering and sorting.
    pub fn limit(mut self, limit: usize) -> Self {
        self.request.limit = Some(limit);
        self
    }

    /// Parser-specific options, passed to `prepare_state` at the start of
    /// every pass.
    pub fn with_options(mut self, options: P::Options) -> Self {
        self.options = options;
        self
    }

    /// Share `cancel` with the caller so a run can be stopped from outside.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token checked between records of every run.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Replace each structure by its attribute `name`.
    pub fn attr(self, name: impl Into<String>) -> Self {
        self.then(Stage::Attr(name.into()))
    }

    /// Replace each structure by the part `selector` picks.
    pub fn index(self, selector: impl Into<Selector>) -> Self {
        self.then(Stage::Index(selector.into()))
    }

    /// Invoke each (method) structure with `args`.
    pub fn call(self, args: Args) -> Self {
        self.then(Stage::Call(args))
    }

    /// Replace each structure by `map(key, structure)`.
    pub fn map(
        self,
        map: impl Fn(&Key, &Structure) -> Result<Structure, RecordError> + Send + Sync + 'static,
    ) -> Self {
        self.then(Stage::Map(Arc::new(map)))
    }

    /// Group adjacent entries by the values of `fields`, sorting by the same
    /// fields so equal values are adjacent.
    pub fn group_by_fields<I, F>(self, fields: I) -> Result<Self, AccessError>
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldName>,
    {
        let fields: Vec<FieldName> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(AccessError::Configuration(
                "group_by_fields needs at least one field".into(),
            ));
        }
        Ok(self.group(GroupBy::Fields(fields)))
    }

    /// Group adjacent entries by `key`, sorting by the same key.
    pub fn group_by(self, key: impl Fn(&Entry) -> Label + Send + Sync + 'static) -> Self {
        self.group(GroupBy::By(Arc::new(key)))
    }

    /// Append a grouping stage and make the catalog order match it.
    pub fn group(mut self, group_by: GroupBy) -> Self {
        self.request.sort = Some(group_by.sort_key());
        self.then(Stage::Group(group_by))
    }

    fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Chained stages in application order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Catalog request every run fetches.
    pub fn request(&self) -> &FetchRequest {
        &self.request
    }

    /// Start a pass: prepare the parser state and fetch entries now, parse
    /// and transform lazily as the run is pulled.
    pub fn iter(&self) -> Result<Run<'_>, AccessError> {
        let state = self.parser.prepare_state(&self.request, &self.options)?;
        let entries = self.catalog.fetch(&self.request)?;
        debug!(
            endpoint = %self.request.endpoint,
            located = entries.len(),
            stages = self.stages.len(),
            "starting run"
        );
        let stats = new_stats(entries.len());
        let mut stream: PairStream<'_> = Box::new(ParseSource::new(
            &self.parser,
            state,
            entries,
            self.cancel.clone(),
            Rc::clone(&stats),
        ));
        for stage in &self.stages {
            stream = stage.apply(stream, Rc::clone(&stats));
        }
        Ok(Run::new(stream, self.cancel.clone(), stats))
    }

    /// Combine results with a customised finisher, identity or threshold.
    pub fn combiner(&self) -> Combiner<'_, C, P> {
        Combiner::new(self)
    }

    /// Run the chain and merge every result into one structure.
    pub fn combine(&self) -> Result<Combined, AccessError> {
        self.combiner().run()
    }
}
