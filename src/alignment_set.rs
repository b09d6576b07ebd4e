//! Deduplicated alignment set.
//!
//! Alignments are unique by content: the first header seen for a given
//! alignment string is kept and later duplicates are ignored. Entries keep
//! first-seen order.

use std::collections::HashSet;

use thiserror::Error;

use crate::record::EnrichedRecord;

/// An alignment whose length does not match the window.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("alignment length mismatch ({found} != {expected}), skipped: {header}")]
pub struct AlignmentLengthMismatch {
    pub header: String,
    pub expected: usize,
    pub found: usize,
}

/// One unique alignment and the header it was first seen with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentEntry {
    pub header: String,
    pub alignment: String,
}

#[derive(Debug, Clone, Default)]
pub struct AlignmentSet {
    expected_len: usize,
    entries: Vec<AlignmentEntry>,
    seen: HashSet<String>,
}

impl AlignmentSet {
    /// Creates an empty set accepting alignments of `expected_len` characters.
    pub fn new(expected_len: usize) -> Self {
        Self {
            expected_len,
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Builds the set from enriched records, in record order.
    ///
    /// Returns the set and the length mismatches that were skipped.
    pub fn from_records<'a, I>(expected_len: usize, records: I) -> (Self, Vec<AlignmentLengthMismatch>)
    where
        I: IntoIterator<Item = &'a EnrichedRecord>,
    {
        let mut set = Self::new(expected_len);
        let mut rejected = Vec::new();
        for enriched in records {
            if let Some(alignment) = &enriched.alignment {
                if let Err(mismatch) = set.insert(enriched.record.header(), alignment) {
                    log::warn!("{}", mismatch);
                    rejected.push(mismatch);
                }
            }
        }
        (set, rejected)
    }

    /// Inserts an alignment unless an identical one is already present.
    ///
    /// Returns `Ok(true)` if it was added, `Ok(false)` if it was a duplicate.
    pub fn insert(&mut self, header: String, alignment: &str) -> Result<bool, AlignmentLengthMismatch> {
        let found = alignment.chars().count();
        if found != self.expected_len {
            return Err(AlignmentLengthMismatch {
                header,
                expected: self.expected_len,
                found,
            });
        }
        if !self.seen.insert(alignment.to_string()) {
            return Ok(false);
        }
        self.entries.push(AlignmentEntry {
            header,
            alignment: alignment.to_string(),
        });
        Ok(true)
    }

    pub fn entries(&self) -> &[AlignmentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn expected_len(&self) -> usize {
        self.expected_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::GenomicRecord;

    fn enriched(label: &str, source: &str, alignment: Option<&str>) -> EnrichedRecord {
        let record = GenomicRecord::new(0).with_label(label).with_source(source);
        EnrichedRecord::new(record, String::new(), alignment.map(str::to_string))
    }

    #[test]
    fn test_first_header_wins() {
        let mut set = AlignmentSet::new(6);
        assert_eq!(set.insert("SP1a".to_string(), "ACGT--"), Ok(true));
        assert_eq!(set.insert("GATA1b".to_string(), "ACGT--"), Ok(false));
        assert_eq!(set.len(), 1);
        assert_eq!(set.entries()[0].header, "SP1a");
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut set = AlignmentSet::new(6);
        let err = set.insert("X".to_string(), "ACG").unwrap_err();
        assert_eq!(err.expected, 6);
        assert_eq!(err.found, 3);
        assert!(set.is_empty());
    }

    #[test]
    fn test_from_records_keeps_order() {
        let records = vec![
            enriched("B", "1", Some("--AC")),
            enriched("A", "2", None),
            enriched("C", "3", Some("GT--")),
            enriched("D", "4", Some("--AC")),
            enriched("E", "5", Some("GT")),
        ];
        let (set, rejected) = AlignmentSet::from_records(4, &records);
        let headers: Vec<&str> = set.entries().iter().map(|e| e.header.as_str()).collect();
        assert_eq!(headers, vec!["B1", "C3"]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].header, "E5");
    }
}
