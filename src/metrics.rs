use std::cell::RefCell;
use std::rc::Rc;

/// Counters collected while a run is consumed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Entries returned by the catalog for this run.
    pub located: usize,
    /// Entries parsed successfully.
    pub parsed: usize,
    /// Entries skipped because parsing failed.
    pub parse_failures: usize,
    /// Pairs skipped because a chained operation failed.
    pub stage_failures: usize,
    /// Groups emitted by grouping stages.
    pub groups: usize,
}

impl RunStats {
    /// Total number of skipped entries and pairs.
    pub fn failures(&self) -> usize {
        self.parse_failures + self.stage_failures
    }
}

/// Run-local handle shared by the stages of one run.
pub(crate) type SharedStats = Rc<RefCell<RunStats>>;
