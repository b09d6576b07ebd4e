//! Record enrichment pipeline.
//!
//! For each record the pipeline computes SEQ and, when the record passes the
//! eligibility gate, its alignment to the window. It then lays out all
//! records that carry a label, both coordinates and a score (and a mode, for
//! annotated tables), and finally collects the deduplicated alignment set.
//!
//! A fatal error on one record is logged with the record's identifying
//! fields. Under [`BatchPolicy::FailFast`] it aborts the batch; under
//! [`BatchPolicy::Collect`] the record is kept without an alignment and the
//! error is reported alongside the warnings.

use thiserror::Error;

use crate::alignment_set::{AlignmentLengthMismatch, AlignmentSet};
use crate::config::{BatchPolicy, PipelineConfig};
use crate::layout::{layout, Interval};
use crate::projection::{check_eligibility, project, Eligibility};
use crate::record::{EnrichedRecord, GenomicRecord, RecordContext};
use crate::sequence::{normalize_sequence, validate_symbols};

/// Errors raised while processing a single record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    /// A cell could not be coerced; the field was treated as missing.
    #[error("{context}: could not read {field} from '{raw}', treated as missing")]
    Coercion {
        context: RecordContext,
        field: &'static str,
        raw: String,
    },

    /// The record cannot be processed.
    #[error("{context}: {reason}")]
    Fatal { context: RecordContext, reason: String },
}

impl ProcessingError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProcessingError::Fatal { .. })
    }

    pub fn context(&self) -> &RecordContext {
        match self {
            ProcessingError::Coercion { context, .. } | ProcessingError::Fatal { context, .. } => context,
        }
    }
}

/// Enriches one record with SEQ and its alignment.
///
/// Coordinates and score are already coerced, so the only failure is an
/// eligible record whose matched sequence holds symbols outside the
/// nucleotide alphabet.
pub fn process_record(record: GenomicRecord, config: &PipelineConfig) -> Result<EnrichedRecord, ProcessingError> {
    match enrich(record, config) {
        (enriched, None) => Ok(enriched),
        (_, Some(err)) => Err(err),
    }
}

/// Computes SEQ once and the alignment when allowed. A fatal record comes
/// back without an alignment, together with its error.
fn enrich(record: GenomicRecord, config: &PipelineConfig) -> (EnrichedRecord, Option<ProcessingError>) {
    let normalized = normalize_sequence(
        record.matched_sequence.as_deref(),
        record.strand,
        record.start,
        record.stop,
    );

    let eligibility = check_eligibility(&record, &config.window, config.significance);
    let alignment = match (eligibility, record.start, record.stop) {
        (Eligibility::Eligible, Some(start), Some(stop)) => {
            if let Some(Err((pos, symbol))) = record.matched_sequence.as_deref().map(validate_symbols) {
                let err = ProcessingError::Fatal {
                    context: record.context(),
                    reason: format!(
                        "invalid symbol '{}' at position {} of matched sequence",
                        symbol,
                        pos + 1
                    ),
                };
                return (EnrichedRecord::new(record, normalized, None), Some(err));
            }
            Some(project(&normalized, start, stop, &config.window))
        }
        _ => {
            log::trace!("{}: no alignment ({})", record.context(), eligibility);
            None
        }
    };

    (EnrichedRecord::new(record, normalized, alignment), None)
}

/// Everything produced by one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One entry per input record, in input order
    pub records: Vec<EnrichedRecord>,
    /// Non-fatal issues, plus fatal ones under [`BatchPolicy::Collect`]
    pub errors: Vec<ProcessingError>,
    /// Alignments skipped from the deduplicated set
    pub length_mismatches: Vec<AlignmentLengthMismatch>,
    pub alignments: AlignmentSet,
    pub layer_count: usize,
}

impl BatchReport {
    pub fn aligned_count(&self) -> usize {
        self.records.iter().filter(|r| r.alignment.is_some()).count()
    }

    pub fn laid_out_count(&self) -> usize {
        self.records.iter().filter(|r| r.layer.is_some()).count()
    }

    pub fn fatal_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_fatal()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.errors.len() - self.fatal_count() + self.length_mismatches.len()
    }
}

/// Runs the full pipeline over `records`.
///
/// `coercion_warnings` are issues found while reading the table; they are
/// carried into the report unchanged.
pub fn run_batch(
    records: Vec<GenomicRecord>,
    coercion_warnings: Vec<ProcessingError>,
    config: &PipelineConfig,
) -> Result<BatchReport, ProcessingError> {
    let mut errors = coercion_warnings;
    for warning in &errors {
        log::warn!("{}", warning);
    }

    let mut enriched = Vec::with_capacity(records.len());
    for record in records {
        let (done, failure) = enrich(record, config);
        if let Some(err) = failure {
            log::error!("Failed to process record: {}", err);
            if config.policy == BatchPolicy::FailFast {
                return Err(err);
            }
            errors.push(err);
        }
        enriched.push(done);
    }

    let layer_count = assign_record_layers(&mut enriched, config.tolerance, config.mode_required);

    let (alignments, length_mismatches) = AlignmentSet::from_records(config.window.len(), &enriched);

    let report = BatchReport {
        records: enriched,
        errors,
        length_mismatches,
        alignments,
        layer_count,
    };
    log::info!(
        "Processed {} records: {} aligned to window {}, {} unique alignments, {} laid out on {} layers",
        report.records.len(),
        report.aligned_count(),
        config.window,
        report.alignments.len(),
        report.laid_out_count(),
        report.layer_count
    );
    Ok(report)
}

/// Lays out every record with a label, both coordinates and a score, and
/// stores the layer on it. Returns the number of layers used.
///
/// With `mode_required`, records without a regulatory mode are skipped too.
pub fn assign_record_layers(records: &mut [EnrichedRecord], tolerance: f64, mode_required: bool) -> usize {
    let mut members = Vec::new();
    let mut items: Vec<(String, Interval)> = Vec::new();
    for (idx, enriched) in records.iter().enumerate() {
        let r = &enriched.record;
        if mode_required && r.mode.is_none() {
            continue;
        }
        if let (Some(label), Some(start), Some(stop), Some(_)) = (&r.label, r.start, r.stop, r.score) {
            members.push(idx);
            items.push((label.clone(), Interval::new(start, stop)));
        }
    }

    let result = layout(&items, tolerance);
    for (pos, &idx) in members.iter().enumerate() {
        records[idx].layer = result.layers[pos];
    }
    log::debug!(
        "{} of {} records eligible for layout, {} merged as near-duplicates",
        items.len(),
        records.len(),
        result.merged_count()
    );
    result.layer_count()
}
