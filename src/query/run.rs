use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

use crate::constants::messages::SKIP_UNPARSEABLE_MSG;
use crate::data::{Entry, Key, Pair};
use crate::errors::AccessError;
use crate::metrics::{RunStats, SharedStats};
use crate::parser::Parser;

/// Lazy stream of pairs flowing between stages.
pub(crate) type PairStream<'a> = Box<dyn Iterator<Item = Result<Pair, AccessError>> + 'a>;

/// Shared flag that stops a run at the next pull or parse.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop every run sharing this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Head of every run: parses entries one at a time, in catalog order.
pub(crate) struct ParseSource<'a, P: Parser> {
    parser: &'a P,
    state: P::State,
    entries: std::vec::IntoIter<Entry>,
    cancel: CancelToken,
    stats: SharedStats,
}

impl<'a, P: Parser> ParseSource<'a, P> {
    pub(crate) fn new(
        parser: &'a P,
        state: P::State,
        entries: Vec<Entry>,
        cancel: CancelToken,
        stats: SharedStats,
    ) -> Self {
        Self {
            parser,
            state,
            entries: entries.into_iter(),
            cancel,
            stats,
        }
    }
}

impl<P: Parser> Iterator for ParseSource<'_, P> {
    type Item = Result<Pair, AccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cancel.is_cancelled() {
                return Some(Err(AccessError::Cancelled));
            }
            let entry = self.entries.next()?;
            match self.parser.parse(&entry, &mut self.state) {
                Ok(structure) => {
                    self.stats.borrow_mut().parsed += 1;
                    return Some(Ok((Key::Entry(entry), structure)));
                }
                Err(err) if err.is_cancellation() => return Some(Err(AccessError::Cancelled)),
                Err(err) => {
                    warn!(
                        endpoint = %self.parser.endpoint(),
                        record = %entry,
                        error = %err,
                        SKIP_UNPARSEABLE_MSG
                    );
                    self.stats.borrow_mut().parse_failures += 1;
                }
            }
        }
    }
}

/// One pass over a query's chain.
///
/// Yields `(key, structure)` pairs in catalog order (or group order after a
/// grouping stage). Failing records are skipped, never yielded. The only
/// error a run yields is [`AccessError::Cancelled`], after which it is
/// exhausted; an exhausted run keeps returning `None`.
pub struct Run<'a> {
    stream: PairStream<'a>,
    cancel: CancelToken,
    stats: SharedStats,
    done: bool,
}

impl<'a> Run<'a> {
    pub(crate) fn new(stream: PairStream<'a>, cancel: CancelToken, stats: SharedStats) -> Self {
        Self {
            stream,
            cancel,
            stats,
            done: false,
        }
    }

    /// Counters collected so far.
    pub fn stats(&self) -> RunStats {
        self.stats.borrow().clone()
    }

    /// Token this run checks.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

impl Iterator for Run<'_> {
    type Item = Result<Pair, AccessError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.cancel.is_cancelled() {
            self.done = true;
            return Some(Err(AccessError::Cancelled));
        }
        match self.stream.next() {
            Some(Ok(pair)) => Some(Ok(pair)),
            Some(Err(err)) => {
                self.done = true;
                Some(Err(err))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Run<'_> {}

/// Fresh counters for a run over `located` entries.
pub(crate) fn new_stats(located: usize) -> SharedStats {
    Rc::new(std::cell::RefCell::new(RunStats {
        located,
        ..RunStats::default()
    }))
}
