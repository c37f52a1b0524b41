/// Delimited-text table parser (CSV, TSV).
pub mod delimited;

pub use delimited::{DelimitedParser, TableLayout, TableOptions};
