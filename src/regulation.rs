//! Regulatory-mode annotation against a TRRUST reference table.
//!
//! The reference is the TRRUST raw export: tab-separated, no header, with
//! columns `TF`, `Target`, `Mode`, `PMID`. A factor's mode summarizes the
//! distinct modes of all reference rows naming it (case-insensitive).

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::formats::table::{Table, TableError};

/// Errors that can occur while loading the reference table.
#[derive(Error, Debug)]
pub enum RegulationError {
    #[error("Failed to read reference table: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Malformed reference table: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Reference line {line}: expected at least 3 columns (TF, Target, Mode), found {found}")]
    TooFewColumns { line: usize, found: usize },

    #[error("Label column '{0}' not found in table")]
    MissingLabelColumn(String),

    #[error("Table error: {0}")]
    TableError(#[from] TableError),
}

/// Result type for annotation operations.
pub type RegulationResult<T> = Result<T, RegulationError>;

/// Summary of how a factor regulates its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegulatoryMode {
    Activation,
    Repression,
    /// Both activation and repression are recorded
    Dual,
    /// The factor is listed but only with other modes
    Unknown,
    /// The factor is not in the reference
    NoEvidence,
}

impl RegulatoryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegulatoryMode::Activation => "activation",
            RegulatoryMode::Repression => "repression",
            RegulatoryMode::Dual => "activation & repression",
            RegulatoryMode::Unknown => "unknown",
            RegulatoryMode::NoEvidence => "no evidence",
        }
    }

    fn from_modes(modes: &BTreeSet<String>) -> Self {
        match (modes.contains("activation"), modes.contains("repression")) {
            (true, true) => RegulatoryMode::Dual,
            (true, false) => RegulatoryMode::Activation,
            (false, true) => RegulatoryMode::Repression,
            (false, false) => RegulatoryMode::Unknown,
        }
    }
}

impl fmt::Display for RegulatoryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lower-cased reference modes per upper-cased factor name.
#[derive(Debug, Clone, Default)]
pub struct RegulationIndex {
    modes: HashMap<String, BTreeSet<String>>,
}

impl RegulationIndex {
    /// Parses TRRUST raw data.
    pub fn parse_str(content: &str) -> RegulationResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut index = Self::default();
        for (line, result) in reader.records().enumerate() {
            let record = result?;
            if record.iter().all(str::is_empty) {
                continue;
            }
            if record.len() < 3 {
                return Err(RegulationError::TooFewColumns {
                    line: line + 1,
                    found: record.len(),
                });
            }
            index.insert(&record[0], &record[2]);
        }
        log::debug!("Loaded regulation modes for {} factors", index.len());
        Ok(index)
    }

    /// Reads TRRUST raw data from a file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> RegulationResult<Self> {
        let content = std::fs::read_to_string(&path)?;
        let index = Self::parse_str(&content)?;
        log::info!(
            "Loaded {} factors from {}",
            index.len(),
            path.as_ref().display()
        );
        Ok(index)
    }

    pub fn insert(&mut self, factor: &str, mode: &str) {
        self.modes
            .entry(factor.trim().to_uppercase())
            .or_default()
            .insert(mode.trim().to_lowercase());
    }

    /// Number of distinct factors.
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Looks up a factor's mode, ignoring case.
    pub fn mode_of(&self, factor: &str) -> RegulatoryMode {
        match self.modes.get(&factor.trim().to_uppercase()) {
            Some(modes) => RegulatoryMode::from_modes(modes),
            None => RegulatoryMode::NoEvidence,
        }
    }
}

/// Writes each row's regulatory mode into `mode_column`, looked up by the
/// value in `label_column`. Returns the number of rows with evidence.
pub fn annotate_table(
    table: &mut Table,
    index: &RegulationIndex,
    label_column: &str,
    mode_column: &str,
) -> RegulationResult<usize> {
    let label = table
        .column(label_column)
        .ok_or_else(|| RegulationError::MissingLabelColumn(label_column.to_string()))?;

    let modes: Vec<RegulatoryMode> = (0..table.len())
        .map(|row| index.mode_of(table.cell(row, label)))
        .collect();
    let with_evidence = modes
        .iter()
        .filter(|m| **m != RegulatoryMode::NoEvidence)
        .count();

    table.set_column(mode_column, modes.iter().map(|m| m.to_string()).collect())?;

    log::info!(
        "Annotated {} rows, {} with regulation evidence",
        table.len(),
        with_evidence
    );
    Ok(with_evidence)
}
