//! Genomic motif-hit records.
//!
//! A [`GenomicRecord`] is one row of evidence read from the input table.
//! Every field is optional: values that are absent or cannot be coerced to
//! the expected type are stored as `None`, never as zero or NaN.
//!
//! [`EnrichedRecord`] wraps a record together with the fields the pipeline
//! derives for it (SEQ, alignment, layer).

use std::fmt;

/// Orientation of a motif hit on the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    /// `+`
    Forward,
    /// `-`
    Reverse,
}

impl Strand {
    /// Parses a strand symbol. Anything other than `+` or `-` is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One row of motif-hit evidence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenomicRecord {
    /// Zero-based data row index in the source table (header excluded)
    pub row: usize,
    /// Grouping key, usually the transcription-factor name
    pub label: Option<String>,
    /// Source identifier (database or motif id)
    pub source: Option<String>,
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub strand: Option<Strand>,
    pub matched_sequence: Option<String>,
    /// Significance score (p-value)
    pub score: Option<f64>,
    /// Regulatory mode annotation, display only
    pub mode: Option<String>,
}

impl GenomicRecord {
    /// Creates a record with the given row index and all fields missing.
    pub fn new(row: usize) -> Self {
        Self {
            row,
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_span(mut self, start: i64, stop: i64) -> Self {
        self.start = Some(start);
        self.stop = Some(stop);
        self
    }

    pub fn with_strand(mut self, strand: Strand) -> Self {
        self.strand = Some(strand);
        self
    }

    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.matched_sequence = Some(sequence.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = coerce_score(score);
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Returns the identifying fields used in diagnostics.
    pub fn context(&self) -> RecordContext {
        RecordContext {
            row: self.row,
            label: self.label.clone(),
            source: self.source.clone(),
            start: self.start,
            stop: self.stop,
        }
    }

    /// Header used for the deduplicated alignment set: label followed by source.
    pub fn header(&self) -> String {
        format!(
            "{}{}",
            self.label.as_deref().unwrap_or(""),
            self.source.as_deref().unwrap_or("")
        )
    }
}

/// Identifying fields of a record, carried by errors and warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordContext {
    pub row: usize,
    pub label: Option<String>,
    pub source: Option<String>,
    pub start: Option<i64>,
    pub stop: Option<i64>,
}

impl fmt::Display for RecordContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "NA".to_string())
        }
        write!(
            f,
            "row {} (TF={}, Source={}, Start={}, Stop={})",
            self.row + 1,
            show(&self.label),
            show(&self.source),
            show(&self.start),
            show(&self.stop)
        )
    }
}

/// A record together with the fields derived by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: GenomicRecord,
    /// Strand-normalized, length-adjusted matched sequence (SEQ)
    pub normalized_sequence: String,
    /// Projection onto the window, `None` when the record is not eligible
    pub alignment: Option<String>,
    /// Visual track index, `None` when excluded from layout or merged away
    pub layer: Option<usize>,
}

impl EnrichedRecord {
    pub fn new(record: GenomicRecord, normalized_sequence: String, alignment: Option<String>) -> Self {
        Self {
            record,
            normalized_sequence,
            alignment,
            layer: None,
        }
    }
}

/// Outcome of coercing a raw cell to a typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced<T> {
    /// Cell was empty
    Missing,
    /// Cell held a usable value
    Value(T),
    /// Cell was non-empty but could not be coerced
    Invalid,
}

impl<T> Coerced<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Coerced::Value(v) => Some(v),
            Coerced::Missing | Coerced::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Coerced::Invalid)
    }
}

/// Coerces a cell to an integer coordinate.
///
/// Integral text is parsed directly; decimal text such as `"100.0"` is
/// truncated toward zero, matching how spreadsheet exports often write
/// coordinates.
pub fn coerce_coordinate(raw: &str) -> Coerced<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Coerced::Missing;
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Coerced::Value(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() < i64::MAX as f64 => {
            Coerced::Value(value.trunc() as i64)
        }
        _ => Coerced::Invalid,
    }
}

/// Coerces a cell to a finite score.
pub fn coerce_score_text(raw: &str) -> Coerced<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Coerced::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(value) => match coerce_score(value) {
            Some(v) => Coerced::Value(v),
            None => Coerced::Invalid,
        },
        Err(_) => Coerced::Invalid,
    }
}

fn coerce_score(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Returns `None` for empty or whitespace-only cells.
pub fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
