use std::fmt;
use std::sync::Arc;

use tracing::warn;

use super::group::{AdjacentGroups, GroupBy};
use super::run::PairStream;
use crate::constants::messages::SKIP_STAGE_FAILURE_MSG;
use crate::data::Key;
use crate::errors::{AccessError, RecordError};
use crate::metrics::SharedStats;
use crate::structure::{Args, Selector, Structure};

/// Caller-supplied transformation of one pair's structure.
pub type MapFn = Arc<dyn Fn(&Key, &Structure) -> Result<Structure, RecordError> + Send + Sync>;

/// One deferred operation in a query's chain.
#[derive(Clone)]
pub enum Stage {
    /// Attribute lookup by name.
    Attr(String),
    /// Selection by label, labels, position or range.
    Index(Selector),
    /// Call of a bound method.
    Call(Args),
    /// Caller-supplied transformation.
    Map(MapFn),
    /// Grouping of adjacent pairs.
    Group(GroupBy),
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attr(name) => f.debug_tuple("Attr").field(name).finish(),
            Self::Index(selector) => f.debug_tuple("Index").field(selector).finish(),
            Self::Call(args) => f.debug_tuple("Call").field(args).finish(),
            Self::Map(_) => f.write_str("Map(..)"),
            Self::Group(group_by) => f.debug_tuple("Group").field(group_by).finish(),
        }
    }
}

impl Stage {
    /// Wrap `upstream` with this stage. Nothing is pulled until the result is.
    pub(crate) fn apply<'a>(&'a self, upstream: PairStream<'a>, stats: SharedStats) -> PairStream<'a> {
        match self {
            Self::Attr(name) => transform(upstream, stats, move |_, structure| {
                Ok(structure.attr(name)?)
            }),
            Self::Index(selector) => transform(upstream, stats, move |_, structure| {
                Ok(structure.select(selector)?)
            }),
            Self::Call(args) => transform(upstream, stats, move |_, structure| {
                Ok(structure.call(args)?)
            }),
            Self::Map(map) => transform(upstream, stats, move |key, structure| map(key, structure)),
            Self::Group(group_by) => Box::new(AdjacentGroups::new(upstream, group_by, stats)),
        }
    }
}

fn transform<'a, F>(upstream: PairStream<'a>, stats: SharedStats, op: F) -> PairStream<'a>
where
    F: Fn(&Key, &Structure) -> Result<Structure, RecordError> + 'a,
{
    Box::new(upstream.filter_map(move |item| {
        let (key, structure) = match item {
            Ok(pair) => pair,
            Err(err) => return Some(Err(err)),
        };
        let outcome = op(&key, &structure);
        isolate(&stats, &key, &structure, outcome).map(|result| result.map(|next| (key, next)))
    }))
}

/// Per-pair fault isolation shared by every stage.
///
/// Success passes through. Cancellation becomes [`AccessError::Cancelled`] and
/// ends the run. Any other failure is logged with the pair's key and data,
/// counted, and the pair is dropped (`None`).
pub(crate) fn isolate<T>(
    stats: &SharedStats,
    key: &Key,
    structure: &Structure,
    outcome: Result<T, RecordError>,
) -> Option<Result<T, AccessError>> {
    match outcome {
        Ok(value) => Some(Ok(value)),
        Err(err) if err.is_cancellation() => Some(Err(AccessError::Cancelled)),
        Err(err) => {
            warn!(
                record = %key,
                error = %err,
                data = ?structure,
                SKIP_STAGE_FAILURE_MSG
            );
            stats.borrow_mut().stage_failures += 1;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Entry, Pair};
    use crate::query::run::new_stats;
    use crate::structure::{Series, Value};

    fn stream<'a>(pairs: Vec<(&'a str, Structure)>) -> PairStream<'a> {
        Box::new(
            pairs
                .into_iter()
                .map(|(path, structure)| Ok::<Pair, AccessError>((Key::Entry(Entry::new(path)), structure))),
        )
    }

    #[test]
    fn attr_stage_skips_pairs_that_fail() {
        let stats = new_stats(2);
        let stage = Stage::Attr("mean".into());
        let upstream = stream(vec![
            ("a.txt", Series::from_pairs([(0, 2.0), (1, 4.0)]).into()),
            ("b.txt", Value::Int(7).into()),
        ]);
        let out: Vec<_> = stage.apply(upstream, stats.clone()).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(stats.borrow().stage_failures, 1);
    }

    #[test]
    fn cancellation_is_never_swallowed() {
        let stats = new_stats(2);
        let stage = Stage::Map(Arc::new(
            |_: &Key, _: &Structure| -> Result<Structure, RecordError> { Err(RecordError::Cancelled) },
        ));
        let upstream = stream(vec![("a.txt", Value::Int(1).into())]);
        let out: Vec<_> = stage.apply(upstream, stats.clone()).collect();
        assert!(matches!(out.as_slice(), [Err(AccessError::Cancelled)]));
        assert_eq!(stats.borrow().stage_failures, 0);
    }
}
