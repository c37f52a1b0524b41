use std::fs::File;

use tracing::debug;

use crate::data::Entry;
use crate::errors::{AccessError, RecordError};
use crate::parser::Parser;
use crate::source::FetchRequest;
use crate::structure::{Frame, Index, Label, Structure, Value};
use crate::types::EndpointName;
use crate::utils::{parse_cell, parse_label};

/// Per-query options for [`DelimitedParser`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableOptions {
    /// Read only these columns, in this order. The index column is always
    /// read, even when it is not listed.
    pub columns: Option<Vec<String>>,
    /// Override the parser's index column for this query.
    pub index_column: Option<String>,
}

impl TableOptions {
    /// Read only `columns`.
    pub fn with_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Index column for this query only.
    pub fn with_index_column(mut self, column: impl Into<String>) -> Self {
        self.index_column = Some(column.into());
        self
    }
}

/// Column selection resolved once per run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableLayout {
    /// Columns to read, index column first when one is set. `None` reads all.
    pub columns: Option<Vec<String>>,
    /// Column that becomes the row index.
    pub index_column: Option<String>,
}

/// Parses delimited text files into frames with inferred cell types.
///
/// The header row names the columns. Lines starting with the comment byte are
/// skipped, which covers version banners such as `%% SRCID v2`.
#[derive(Clone, Debug)]
pub struct DelimitedParser {
    endpoint: EndpointName,
    delimiter: u8,
    comment: Option<u8>,
    index_column: Option<String>,
}

impl DelimitedParser {
    /// Comma-separated parser with a positional index.
    pub fn csv(endpoint: impl Into<EndpointName>) -> Self {
        Self {
            endpoint: endpoint.into(),
            delimiter: b',',
            comment: None,
            index_column: None,
        }
    }

    /// Tab-separated parser with a positional index.
    pub fn tsv(endpoint: impl Into<EndpointName>) -> Self {
        Self {
            delimiter: b'\t',
            ..Self::csv(endpoint)
        }
    }

    /// Use `column` as the row index instead of a positional index.
    pub fn with_index_column(mut self, column: impl Into<String>) -> Self {
        self.index_column = Some(column.into());
        self
    }

    /// Skip lines starting with `comment`.
    pub fn with_comment(mut self, comment: u8) -> Self {
        self.comment = Some(comment);
        self
    }

    fn read(&self, entry: &Entry, layout: &TableLayout) -> Result<Frame, RecordError> {
        let file = File::open(&entry.path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .comment(self.comment)
            .trim(csv::Trim::All)
            .from_reader(file);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let locate = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| RecordError::Malformed {
                    path: entry.to_string(),
                    details: format!("missing column '{name}'"),
                })
        };
        let index_pos = layout.index_column.as_deref().map(locate).transpose()?;
        let value_positions: Vec<usize> = match &layout.columns {
            Some(columns) => columns
                .iter()
                .map(|name| locate(name))
                .collect::<Result<Vec<_>, _>>()?,
            None => (0..headers.len()).collect(),
        }
        .into_iter()
        .filter(|pos| Some(*pos) != index_pos)
        .collect();

        let mut labels: Vec<Label> = Vec::new();
        let mut rows: Vec<Vec<Value>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(pos) = index_pos {
                labels.push(parse_label(record.get(pos).unwrap_or_default()));
            }
            rows.push(
                value_positions
                    .iter()
                    .map(|&pos| parse_cell(record.get(pos).unwrap_or_default()))
                    .collect(),
            );
        }
        let index = match index_pos {
            Some(_) => Index::new(labels),
            None => Index::range(rows.len()),
        };
        let columns = value_positions
            .iter()
            .map(|&pos| headers[pos].as_str().into())
            .collect();
        Ok(Frame::from_rows(index, columns, rows)?)
    }
}

impl Parser for DelimitedParser {
    type Options = TableOptions;
    type State = TableLayout;

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn prepare_state(
        &self,
        _request: &FetchRequest,
        options: &TableOptions,
    ) -> Result<TableLayout, AccessError> {
        let index_column = options
            .index_column
            .clone()
            .or_else(|| self.index_column.clone());
        let columns = match (&options.columns, &index_column) {
            (Some(columns), _) if columns.is_empty() => {
                return Err(AccessError::Configuration(
                    "column selection must name at least one column".into(),
                ));
            }
            (Some(columns), Some(index)) if !columns.contains(index) => {
                let mut with_index = vec![index.clone()];
                with_index.extend(columns.iter().cloned());
                Some(with_index)
            }
            (columns, _) => columns.clone(),
        };
        debug!(
            endpoint = %self.endpoint,
            index = ?index_column,
            columns = ?columns,
            "resolved table layout"
        );
        Ok(TableLayout {
            columns,
            index_column,
        })
    }

    fn parse(&self, entry: &Entry, layout: &mut TableLayout) -> Result<Structure, RecordError> {
        Ok(self.read(entry, layout)?.into())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const NVSPL: &str = "SiteID,STime,H12p5,dbA\n\
                         TRLA,2015-06-01 13:00:00,20.1,35.0\n\
                         TRLA,2015-06-01 13:00:01,-Infinity,36.5\n";

    fn entry_with(contents: &str) -> (tempfile::TempDir, Entry) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NVSPL_TRLA2015_06_01_13.txt");
        fs::write(&path, contents).unwrap();
        (dir, Entry::new(path))
    }

    #[test]
    fn reads_all_columns_with_positional_index() {
        let (_dir, entry) = entry_with(NVSPL);
        let parser = DelimitedParser::csv("nvspl");
        let mut layout = parser
            .prepare_state(&FetchRequest::new("nvspl"), &TableOptions::default())
            .unwrap();
        let parsed = parser.parse(&entry, &mut layout).unwrap();
        let frame = parsed.as_frame().unwrap();
        assert_eq!(frame.shape(), (2, 4));
        assert_eq!(frame.index(), &Index::range(2));
        assert_eq!(frame.values()[[1, 2]], Value::Float(f64::NEG_INFINITY));
    }

    #[test]
    fn selected_columns_always_include_the_index() {
        let (_dir, entry) = entry_with(NVSPL);
        let parser = DelimitedParser::csv("nvspl").with_index_column("STime");
        let options = TableOptions::default().with_columns(["dbA"]);
        let mut layout = parser
            .prepare_state(&FetchRequest::new("nvspl"), &options)
            .unwrap();
        assert_eq!(
            layout.columns,
            Some(vec!["STime".to_string(), "dbA".to_string()])
        );
        let parsed = parser.parse(&entry, &mut layout).unwrap();
        let frame = parsed.as_frame().unwrap();
        assert_eq!(frame.columns(), &Index::new(vec![Label::from("dbA")]));
        assert!(matches!(frame.index().get(0), Some(Label::DateTime(_))));
    }

    #[test]
    fn missing_columns_and_ragged_rows_are_record_errors() {
        let (_dir, entry) = entry_with(NVSPL);
        let parser = DelimitedParser::csv("nvspl");
        let mut layout = parser
            .prepare_state(
                &FetchRequest::new("nvspl"),
                &TableOptions::default().with_columns(["dbC"]),
            )
            .unwrap();
        assert!(matches!(
            parser.parse(&entry, &mut layout),
            Err(RecordError::Malformed { .. })
        ));

        let (_dir, ragged) = entry_with("a,b\n1,2\n3\n");
        let mut layout = TableLayout::default();
        assert!(matches!(
            parser.parse(&ragged, &mut layout),
            Err(RecordError::Csv(_))
        ));
    }

    #[test]
    fn tsv_with_comment_banner() {
        let (_dir, entry) = entry_with("%% SRCID v2\nsrcID\tlen\n1.0\t12\n");
        let parser = DelimitedParser::tsv("srcid").with_comment(b'%');
        let parsed = parser.parse(&entry, &mut TableLayout::default()).unwrap();
        let frame = parsed.as_frame().unwrap();
        assert_eq!(frame.shape(), (1, 2));
        assert_eq!(frame.values()[[0, 1]], Value::Int(12));
    }

    #[test]
    fn empty_column_selection_is_rejected() {
        let parser = DelimitedParser::csv("nvspl");
        let options = TableOptions::default().with_columns(Vec::<String>::new());
        assert!(matches!(
            parser.prepare_state(&FetchRequest::new("nvspl"), &options),
            Err(AccessError::Configuration(_))
        ));
    }
}
