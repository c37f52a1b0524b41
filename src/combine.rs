//! Merging per-record results into one structure.
//!
//! Results are bucketed by identity, each bucket is concatenated and passed
//! through a finisher, and the finished results are merged according to their
//! shape:
//!
//! | results | merged into |
//! |---------|-------------|
//! | scalars of one class | series keyed by identity |
//! | series with overlapping indexes | frame, one column per identity |
//! | series otherwise | series with an `(identity, label)` index |
//! | frames overlapping on rows and columns | cube, one item per identity |
//! | frames overlapping on columns only, same index kind | frame with an `(identity, row)` index |
//! | cubes overlapping on every axis | hypercube |
//!
//! Anything else comes back as the raw identity-to-result mapping.

use indexmap::IndexMap;
use tracing::warn;

use crate::config::CombineOptions;
use crate::constants::identity::{DAY_FIELD, HOUR_FIELD, MONTH_FIELD, PREFIX_FIELDS};
use crate::constants::messages::{CONCAT_FALLBACK_MSG, FINISH_FAILURE_MSG};
use crate::data::{Entry, Key, Pair};
use crate::errors::{AccessError, RecordError};
use crate::parser::Parser;
use crate::query::Query;
use crate::source::Catalog;
use crate::structure::{
    Cube, Frame, Hypercube, Index, Kind, Label, Series, Structure, concat,
};

/// Identity to finished result, in order of first appearance.
pub type ResultSet = IndexMap<Label, Structure>;

/// Outcome of combining a query.
#[derive(Clone, Debug, PartialEq)]
pub enum Combined {
    /// A single identity's result, or the merge of all of them.
    Value(Structure),
    /// Results that could not be merged (or none at all), by identity.
    Mapping(ResultSet),
}

impl Combined {
    /// The merged value, if there is one.
    pub fn as_value(&self) -> Option<&Structure> {
        match self {
            Self::Value(structure) => Some(structure),
            Self::Mapping(_) => None,
        }
    }

    /// The unmerged mapping, if merging did not apply.
    pub fn as_mapping(&self) -> Option<&ResultSet> {
        match self {
            Self::Value(_) => None,
            Self::Mapping(results) => Some(results),
        }
    }

    /// Consume into the merged value, if there is one.
    pub fn into_value(self) -> Option<Structure> {
        match self {
            Self::Value(structure) => Some(structure),
            Self::Mapping(_) => None,
        }
    }
}

type FinishFn<'q> = Box<dyn Fn(Structure) -> Result<Structure, RecordError> + 'q>;
type IdentifyFn<'q> = Box<dyn Fn(&Key) -> Label + 'q>;

/// Configures and runs the combination of one query.
pub struct Combiner<'q, C, P: Parser> {
    query: &'q Query<C, P>,
    finish: FinishFn<'q>,
    identify: IdentifyFn<'q>,
    options: CombineOptions,
}

impl<'q, C: Catalog, P: Parser> Combiner<'q, C, P> {
    pub(crate) fn new(query: &'q Query<C, P>) -> Self {
        Self {
            query,
            finish: Box::new(Ok::<Structure, RecordError>),
            identify: Box::new(default_identity),
            options: CombineOptions::default(),
        }
    }

    /// Apply `finish` to each identity's concatenated result before merging.
    /// Identities whose finisher fails are logged and left out.
    pub fn finish_with(
        mut self,
        finish: impl Fn(Structure) -> Result<Structure, RecordError> + 'q,
    ) -> Self {
        self.finish = Box::new(finish);
        self
    }

    /// Replace [`default_identity`].
    pub fn identify_by(mut self, identify: impl Fn(&Key) -> Label + 'q) -> Self {
        self.identify = Box::new(identify);
        self
    }

    /// Fraction of shared labels required to merge along an axis. Defaults
    /// to [`OVERLAP_THRESHOLD`](crate::constants::combine::OVERLAP_THRESHOLD).
    pub fn overlap_threshold(mut self, threshold: f64) -> Self {
        self.options.overlap_threshold = threshold;
        self
    }

    /// Replace every option at once.
    pub fn with_options(mut self, options: CombineOptions) -> Self {
        self.options = options;
        self
    }

    /// Run a fresh pass over the query and combine its results.
    pub fn run(&self) -> Result<Combined, AccessError> {
        combine_pairs(
            self.query.iter()?,
            &*self.identify,
            &*self.finish,
            &self.options,
        )
    }
}

/// Bucket, concatenate, finish and merge `pairs`.
pub fn combine_pairs(
    pairs: impl IntoIterator<Item = Result<Pair, AccessError>>,
    identify: &dyn Fn(&Key) -> Label,
    finish: &dyn Fn(Structure) -> Result<Structure, RecordError>,
    options: &CombineOptions,
) -> Result<Combined, AccessError> {
    let mut buckets: IndexMap<Label, Vec<Structure>> = IndexMap::new();
    for pair in pairs {
        let (key, structure) = pair?;
        buckets.entry(identify(&key)).or_default().push(structure);
    }
    let mut results = ResultSet::with_capacity(buckets.len());
    for (identity, members) in buckets {
        let flat = flatten(&identity, members);
        match finish(flat) {
            Ok(finished) => {
                results.insert(identity, finished);
            }
            Err(err) if err.is_cancellation() => return Err(AccessError::Cancelled),
            Err(err) => {
                warn!(identity = %identity, error = %err, FINISH_FAILURE_MSG);
            }
        }
    }
    Ok(merge_results(results, options.overlap_threshold))
}

fn flatten(identity: &Label, mut members: Vec<Structure>) -> Structure {
    if members.len() == 1 {
        return members.remove(0);
    }
    match concat(&members) {
        Ok(joined) => joined,
        Err(err) => {
            warn!(
                identity = %identity,
                members = members.len(),
                error = %err,
                CONCAT_FALLBACK_MSG
            );
            Structure::List(members)
        }
    }
}

/// Identity of a pair: its group label, or [`entry_identity`] of its entry.
pub fn default_identity(key: &Key) -> Label {
    match key {
        Key::Entry(entry) => entry_identity(entry),
        Key::Group(label) => label.clone(),
    }
}

/// Text identity built from the well-known fields of an entry.
///
/// `unit`, `site` and `year` are concatenated; `month` follows after a space,
/// `day` after a `-` (only when a month is present) and `hour` after a space
/// with a trailing `:`. An entry with none of these fields is identified by
/// its path. For example `{unit: DENA, site: TRLA, year: 2015, month: 06,
/// day: 01, hour: 13}` gives `DENATRLA2015 06-01 13:`.
pub fn entry_identity(entry: &Entry) -> Label {
    let mut parts: Vec<&str> = PREFIX_FIELDS
        .iter()
        .filter_map(|field| entry.field(field))
        .collect();
    let month = entry.field(MONTH_FIELD);
    if let Some(month) = month {
        if !parts.is_empty() {
            parts.push(" ");
        }
        parts.push(month);
    }
    if let Some(day) = entry.field(DAY_FIELD) {
        if month.is_some() {
            parts.push("-");
        }
        parts.push(day);
    }
    if let Some(hour) = entry.field(HOUR_FIELD) {
        if !parts.is_empty() {
            parts.push(" ");
        }
        parts.push(hour);
        parts.push(":");
    }
    if parts.is_empty() {
        Label::Text(entry.path.display().to_string())
    } else {
        Label::Text(parts.concat())
    }
}

/// Fraction of labels shared by every index, relative to the longest one.
///
/// `0.0` when there are no indexes or the longest is empty.
pub fn overlap_fraction<'a>(indexes: impl IntoIterator<Item = &'a Index>) -> f64 {
    let indexes: Vec<&Index> = indexes.into_iter().collect();
    let longest = indexes.iter().map(|index| index.len()).max().unwrap_or(0);
    if longest == 0 {
        return 0.0;
    }
    let mutual = indexes
        .iter()
        .skip(1)
        .fold(indexes[0].clone(), |shared, index| shared.intersection(index));
    mutual.len() as f64 / longest as f64
}

/// Merge finished results by shape. See the module docs for the rules.
pub fn merge_results(mut results: ResultSet, threshold: f64) -> Combined {
    if results.len() <= 1 {
        return match results.pop() {
            Some((_, single)) => Combined::Value(single),
            None => Combined::Mapping(results),
        };
    }
    let mut kinds = results.values().map(Structure::kind);
    let first = kinds.next();
    if !kinds.all(|kind| Some(kind) == first) {
        return Combined::Mapping(results);
    }
    let merged = match first {
        Some(Kind::Scalar(_)) => merge_scalars(&results),
        Some(Kind::Series) => merge_series(&results, threshold),
        Some(Kind::Frame) => merge_frames(&results, threshold),
        Some(Kind::Cube) => merge_cubes(&results, threshold),
        _ => None,
    };
    match merged {
        Some(structure) => Combined::Value(structure),
        None => Combined::Mapping(results),
    }
}

fn typed<'r, T>(
    results: &'r ResultSet,
    pick: impl Fn(&'r Structure) -> Option<&'r T>,
) -> Option<Vec<(Label, &'r T)>> {
    results
        .iter()
        .map(|(identity, structure)| pick(structure).map(|typed| (identity.clone(), typed)))
        .collect()
}

fn merge_scalars(results: &ResultSet) -> Option<Structure> {
    let scalars = typed(results, Structure::as_scalar)?;
    Some(Series::from_pairs(scalars.into_iter().map(|(identity, value)| (identity, value.clone()))).into())
}

fn merge_series(results: &ResultSet, threshold: f64) -> Option<Structure> {
    let series = typed(results, Structure::as_series)?;
    if overlap_fraction(series.iter().map(|(_, s)| s.index())) >= threshold {
        let columns = series
            .into_iter()
            .map(|(identity, s)| (identity, s.clone()))
            .collect();
        return Some(Frame::from_series(columns).into());
    }
    let nested: Vec<Series> = series
        .iter()
        .map(|(identity, s)| s.prefixed(identity))
        .collect();
    Some(Series::concat(&nested.iter().collect::<Vec<_>>()).into())
}

fn merge_frames(results: &ResultSet, threshold: f64) -> Option<Structure> {
    let frames = typed(results, Structure::as_frame)?;
    if overlap_fraction(frames.iter().map(|(_, f)| f.columns())) < threshold {
        return None;
    }
    if overlap_fraction(frames.iter().map(|(_, f)| f.index())) >= threshold {
        let items = frames
            .into_iter()
            .map(|(identity, f)| (identity, f.clone()))
            .collect();
        return Some(Cube::from_frames(items).into());
    }
    let index_kind = frames.first().map(|(_, f)| f.index().kind());
    if !frames.iter().all(|(_, f)| Some(f.index().kind()) == index_kind) {
        return None;
    }
    let nested: Vec<Frame> = frames
        .iter()
        .map(|(identity, f)| f.prefixed(identity))
        .collect();
    Some(Frame::concat(&nested.iter().collect::<Vec<_>>()).into())
}

fn merge_cubes(results: &ResultSet, threshold: f64) -> Option<Structure> {
    let cubes = typed(results, Structure::as_cube)?;
    let overlaps = [
        overlap_fraction(cubes.iter().map(|(_, c)| c.items())),
        overlap_fraction(cubes.iter().map(|(_, c)| c.major_axis())),
        overlap_fraction(cubes.iter().map(|(_, c)| c.minor_axis())),
    ];
    if overlaps.iter().any(|overlap| *overlap < threshold) {
        return None;
    }
    let items = cubes
        .into_iter()
        .map(|(identity, c)| (identity, c.clone()))
        .collect();
    Some(Hypercube::from_cubes(items).into())
}
