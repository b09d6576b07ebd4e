//! Delimited motif-hit tables.
//!
//! A table is a header row followed by data rows. Every cell is kept as
//! text so the enriched output can reproduce the input columns unchanged;
//! typed [`GenomicRecord`]s are extracted on demand through [`ColumnNames`].
//!
//! ```text
//! TF      Source  Start  Stop  Strand  Pvalue  Mached Sequence
//! SP1     MA0079  100    109   +       2.1e-5  GGGGCGGGGC
//! GATA1   MA0035  140    147   -       4.0e-4  AGATAAGA
//! ```

use std::io::Write;

use thiserror::Error;

use super::TableFormat;
use crate::config::{ColumnNames, ALIGNMENT_COLUMN, LAYER_COLUMN, SEQ_COLUMN};
use crate::pipeline::ProcessingError;
use crate::sequence::span_len;
use crate::record::{coerce_coordinate, coerce_score_text, non_empty, Coerced, EnrichedRecord, GenomicRecord, Strand};

/// Errors that can occur while reading or writing a table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed delimited text: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Table has no header row")]
    NoHeader,

    #[error("Required column '{0}' not found in header")]
    MissingColumn(String),

    #[error("Expected {expected} enriched records for the table, got {found}")]
    RowCountMismatch { expected: usize, found: usize },
}

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// A parsed table, all cells as trimmed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column names. Rows wider than the header get synthetic `ColumnN` names.
    pub headers: Vec<String>,
    /// Data rows, each padded to the header width
    pub rows: Vec<Vec<String>>,
}

/// Column positions resolved against a header.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    label: usize,
    start: usize,
    stop: usize,
    source: Option<usize>,
    strand: Option<usize>,
    score: Option<usize>,
    sequence: Option<usize>,
    mode: Option<usize>,
}

impl Table {
    /// Returns the number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column named `name`.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Gets a cell, empty if the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Replaces the column named `name`, or appends it if absent.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> TableResult<()> {
        if values.len() != self.rows.len() {
            return Err(TableError::RowCountMismatch {
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.widen_headers();
        let column = match self.column(name) {
            Some(col) => col,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };
        let width = self.headers.len();
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.resize(width, String::new());
            row[column] = value;
        }
        Ok(())
    }

    /// Names every cell past the header as `ColumnN` (1-based) and pads
    /// short rows, so each row matches the header width.
    fn widen_headers(&mut self) {
        let widest = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        for idx in self.headers.len()..widest {
            self.headers.push(format!("Column{}", idx + 1));
        }
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    fn resolve(&self, columns: &ColumnNames) -> TableResult<ColumnIndex> {
        let required = |name: &str| self.column(name).ok_or_else(|| TableError::MissingColumn(name.to_string()));
        Ok(ColumnIndex {
            label: required(&columns.label)?,
            start: required(&columns.start)?,
            stop: required(&columns.stop)?,
            source: self.column(&columns.source),
            strand: self.column(&columns.strand),
            score: self.column(&columns.score),
            sequence: columns.sequence.iter().find_map(|name| self.column(name)),
            mode: self.column(&columns.mode),
        })
    }

    /// Extracts typed records, one per data row.
    ///
    /// Cells that are present but cannot be coerced become `None` and are
    /// reported as [`ProcessingError::Coercion`] warnings.
    pub fn records(&self, columns: &ColumnNames) -> TableResult<(Vec<GenomicRecord>, Vec<ProcessingError>)> {
        let index = self.resolve(columns)?;
        if index.score.is_none() {
            log::warn!("Score column '{}' not found; no record will be aligned", columns.score);
        }
        if index.sequence.is_none() {
            log::warn!("Matched sequence column not found (tried {:?})", columns.sequence);
        }

        let mut records = Vec::with_capacity(self.rows.len());
        let mut warnings = Vec::new();

        for row in 0..self.rows.len() {
            let optional = |col: Option<usize>| col.and_then(|c| non_empty(self.cell(row, c)));

            let mut record = GenomicRecord::new(row);
            record.label = non_empty(self.cell(row, index.label));
            record.source = optional(index.source);
            record.matched_sequence = optional(index.sequence);
            record.mode = optional(index.mode);

            let start = coerce_coordinate(self.cell(row, index.start));
            let stop = coerce_coordinate(self.cell(row, index.stop));
            let score = index
                .score
                .map(|c| coerce_score_text(self.cell(row, c)))
                .unwrap_or(Coerced::Missing);
            let strand_text = optional(index.strand);

            let raw = |col: usize| self.cell(row, col).to_string();
            let mut invalid: Vec<(&'static str, String)> = Vec::new();
            if start.is_invalid() {
                invalid.push(("Start", raw(index.start)));
            }
            if stop.is_invalid() {
                invalid.push(("Stop", raw(index.stop)));
            }
            if let (true, Some(col)) = (score.is_invalid(), index.score) {
                invalid.push(("score", raw(col)));
            }

            record.start = start.value();
            record.stop = stop.value();
            record.score = score.value();
            record.strand = strand_text.as_deref().and_then(Strand::parse);
            if let (Some(col), Some(_), None) = (index.strand, &strand_text, record.strand) {
                invalid.push(("Strand", raw(col)));
            }

            let context = record.context();
            // Spans too long to materialize lose both coordinates.
            if let (Some(a), Some(b)) = (record.start, record.stop) {
                if span_len(a.min(b), a.max(b)).is_none() {
                    invalid.push(("Span", format!("{}..{}", a, b)));
                    record.start = None;
                    record.stop = None;
                }
            }

            for (field, raw) in invalid {
                warnings.push(ProcessingError::Coercion {
                    context: context.clone(),
                    field,
                    raw,
                });
            }
            records.push(record);
        }

        Ok((records, warnings))
    }
}

/// Parses delimited text into a [`Table`].
pub fn parse_table_str(content: &str, format: TableFormat) -> TableResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(TableError::NoHeader);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    let mut table = Table { headers, rows };
    if table.rows.iter().any(|row| row.len() > table.headers.len()) {
        log::warn!("Some rows are wider than the header; extra cells get generated column names");
    }
    table.widen_headers();
    Ok(table)
}

/// Writes a table as delimited text.
pub fn write_table<W: Write>(writer: W, table: &Table, format: TableFormat) -> TableResult<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(format.delimiter())
        .flexible(true)
        .from_writer(writer);
    out.write_record(&table.headers)?;
    for row in &table.rows {
        out.write_record(row)?;
    }
    out.flush()?;
    Ok(())
}

/// Writes the input table followed by the SEQ, alignment and Layer columns.
///
/// `records` must hold one enriched record per table row, in row order.
pub fn write_enriched<W: Write>(
    writer: W,
    table: &Table,
    records: &[EnrichedRecord],
    format: TableFormat,
) -> TableResult<()> {
    if records.len() != table.len() {
        return Err(TableError::RowCountMismatch {
            expected: table.len(),
            found: records.len(),
        });
    }

    let mut enriched = table.clone();
    enriched.set_column(
        SEQ_COLUMN,
        records.iter().map(|r| r.normalized_sequence.clone()).collect(),
    )?;
    enriched.set_column(
        ALIGNMENT_COLUMN,
        records.iter().map(|r| r.alignment.clone().unwrap_or_default()).collect(),
    )?;
    enriched.set_column(
        LAYER_COLUMN,
        records
            .iter()
            .map(|r| r.layer.map(|l| l.to_string()).unwrap_or_default())
            .collect(),
    )?;
    write_table(writer, &enriched, format)
}
