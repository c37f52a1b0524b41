/// Constants used by the result combiner.
pub mod combine {
    /// Fraction of labels all results must share on an axis before they are
    /// merged into a higher-dimensional structure. The comparison is inclusive.
    pub const OVERLAP_THRESHOLD: f64 = 0.75;
}

/// Constants used when deriving default result identities from entry fields.
pub mod identity {
    /// Fields concatenated without separators at the front of an identity.
    pub const PREFIX_FIELDS: [&str; 3] = ["unit", "site", "year"];
    /// Month field, preceded by a space when anything precedes it.
    pub const MONTH_FIELD: &str = "month";
    /// Day field, preceded by `-` when a month is present.
    pub const DAY_FIELD: &str = "day";
    /// Hour field, preceded by a space and followed by `:`.
    pub const HOUR_FIELD: &str = "hour";
}

/// Constants used by structure operations.
pub mod structure {
    /// Row count used by `head` and `tail` when no `n` is given.
    pub const DEFAULT_HEAD_ROWS: usize = 5;
    /// Timestamp layouts tried, in order, when reading text cells and labels.
    pub const TIMESTAMP_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
    ];
    /// Date-only layouts tried after `TIMESTAMP_FORMATS`.
    pub const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
}

/// Constants used by the directory-backed catalog.
pub mod directory {
    /// Pattern used for a template placeholder with no explicit pattern.
    pub const DEFAULT_FIELD_PATTERN: &str = "[^/]+?";
}

/// Log messages shared by the run, its stages and the combiner.
pub mod messages {
    /// Logged when a record fails to parse and is skipped.
    pub const SKIP_UNPARSEABLE_MSG: &str = "skipping record that failed to parse";
    /// Logged when a chained operation fails on a pair and the pair is skipped.
    pub const SKIP_STAGE_FAILURE_MSG: &str = "skipping pair after failed operation";
    /// Logged when per-identity structures cannot be concatenated.
    pub const CONCAT_FALLBACK_MSG: &str = "could not concatenate results; keeping them as a list";
    /// Logged when the finisher fails for an identity.
    pub const FINISH_FAILURE_MSG: &str = "finisher failed; omitting identity";
}
