//! Projection of strand-normalized fragments onto a fixed coordinate window.
//!
//! For every genomic position in the window, the fragment's base at that
//! position is emitted if the fragment covers it, and a gap otherwise. The
//! result always has exactly [`Window::len`] characters.

use std::fmt;

use crate::record::GenomicRecord;
use crate::sequence::{span_len, GAP};

/// Default significance threshold (strict `<`) for a record to be projected.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.001;

/// The caller's genomic window of interest, inclusive on both ends.
///
/// The two bounds are stored in ascending order, so `Window::new(200, 100)`
/// and `Window::new(100, 200)` describe the same window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: i64,
    stop: i64,
}

impl Window {
    pub fn new(user_start: i64, user_stop: i64) -> Self {
        Self {
            start: user_start.min(user_stop),
            stop: user_start.max(user_stop),
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn stop(&self) -> i64 {
        self.stop
    }

    /// Number of positions in the window, `|user_stop - user_start| + 1`.
    pub fn len(&self) -> usize {
        (self.stop.abs_diff(self.start) as usize).saturating_add(1)
    }

    /// A window always holds at least one position.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True if the closed span `[start, stop]` shares a position with the window.
    pub fn overlaps(&self, start: i64, stop: i64) -> bool {
        !(stop < self.start || start > self.stop)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.stop)
    }
}

/// Projects `sequence`, covering genomic span `[start, stop]`, onto `window`.
///
/// Position `i` of the window receives `sequence[i - start]` when
/// `start <= i <= stop` and that offset exists in `sequence`; every other
/// position receives [`GAP`].
pub fn project(sequence: &str, start: i64, stop: i64, window: &Window) -> String {
    let residues: Vec<char> = sequence.chars().collect();
    (window.start..=window.stop)
        .map(|i| {
            if start <= i && i <= stop {
                usize::try_from(i.abs_diff(start))
                    .ok()
                    .and_then(|offset| residues.get(offset).copied())
                    .unwrap_or(GAP)
            } else {
                GAP
            }
        })
        .collect()
}

/// Why a record does or does not receive an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    MissingCoordinates,
    MissingScore,
    NotSignificant,
    InvertedSpan,
    SpanTooLong,
    OutsideWindow,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Eligibility::Eligible => "eligible",
            Eligibility::MissingCoordinates => "missing start or stop",
            Eligibility::MissingScore => "missing score",
            Eligibility::NotSignificant => "score not below threshold",
            Eligibility::InvertedSpan => "start after stop",
            Eligibility::SpanTooLong => "span too long",
            Eligibility::OutsideWindow => "outside window",
        };
        write!(f, "{}", text)
    }
}

/// Gate applied before projection: coordinates and score present, score
/// strictly below `threshold`, span well-formed and overlapping the window.
pub fn check_eligibility(record: &GenomicRecord, window: &Window, threshold: f64) -> Eligibility {
    let (Some(start), Some(stop)) = (record.start, record.stop) else {
        return Eligibility::MissingCoordinates;
    };
    let Some(score) = record.score else {
        return Eligibility::MissingScore;
    };
    if score >= threshold {
        return Eligibility::NotSignificant;
    }
    if start > stop {
        return Eligibility::InvertedSpan;
    }
    if span_len(start, stop).is_none() {
        return Eligibility::SpanTooLong;
    }
    if !window.overlaps(start, stop) {
        return Eligibility::OutsideWindow;
    }
    Eligibility::Eligible
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_normalizes_order() {
        let w = Window::new(200, 100);
        assert_eq!(w.start(), 100);
        assert_eq!(w.stop(), 200);
        assert_eq!(w.len(), 101);
        assert_eq!(w, Window::new(100, 200));
        assert_eq!(Window::new(7, 7).len(), 1);
    }

    #[test]
    fn test_window_overlaps() {
        let w = Window::new(100, 110);
        assert!(w.overlaps(90, 100));
        assert!(w.overlaps(110, 120));
        assert!(w.overlaps(95, 130));
        assert!(!w.overlaps(90, 99));
        assert!(!w.overlaps(111, 120));
    }

    #[test]
    fn test_project_full_overlap() {
        let w = Window::new(100, 104);
        assert_eq!(project("GAATT", 100, 104, &w), "GAATT");
    }

    #[test]
    fn test_project_partial_overlap() {
        let w = Window::new(98, 103);
        assert_eq!(project("ACGT", 100, 103, &w), "--ACGT");

        let w = Window::new(102, 107);
        assert_eq!(project("ACGT", 100, 103, &w), "GT----");
    }

    #[test]
    fn test_project_short_sequence_pads_with_gaps() {
        let w = Window::new(100, 105);
        assert_eq!(project("AC", 100, 105, &w), "AC----");
    }

    #[test]
    fn test_project_outside_window_is_all_gaps() {
        let w = Window::new(1, 4);
        assert_eq!(project("ACGT", 50, 53, &w), "----");
    }

    #[test]
    fn test_project_length_postcondition() {
        let fragments = [("ACGTACGT", 10, 17), ("A", 0, 0), ("", 5, 9), ("ACGT", 3, 12)];
        for (user_start, user_stop) in [(0, 0), (0, 20), (8, 12), (15, 40), (-5, 2)] {
            let w = Window::new(user_start, user_stop);
            for (seq, start, stop) in fragments {
                let aln = project(seq, start, stop, &w);
                assert_eq!(aln.chars().count() as i64, user_stop - user_start + 1);
            }
        }
    }

    #[test]
    fn test_descending_window_matches_ascending() {
        let asc = project("ACGT", 100, 103, &Window::new(99, 102));
        let desc = project("ACGT", 100, 103, &Window::new(102, 99));
        assert_eq!(asc, "-ACG");
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_case_preserved() {
        let w = Window::new(1, 4);
        assert_eq!(project("acGt", 1, 4, &w), "acGt");
    }

    fn record(start: i64, stop: i64, score: f64) -> GenomicRecord {
        GenomicRecord::new(0).with_span(start, stop).with_score(score)
    }

    #[test]
    fn test_eligibility() {
        let w = Window::new(100, 200);
        assert_eq!(check_eligibility(&record(150, 160, 1e-4), &w, 0.001), Eligibility::Eligible);
        assert_eq!(
            check_eligibility(&record(150, 160, 0.001), &w, 0.001),
            Eligibility::NotSignificant
        );
        assert_eq!(
            check_eligibility(&record(10, 20, 1e-4), &w, 0.001),
            Eligibility::OutsideWindow
        );
        assert_eq!(
            check_eligibility(&record(160, 150, 1e-4), &w, 0.001),
            Eligibility::InvertedSpan
        );
        assert_eq!(
            check_eligibility(&GenomicRecord::new(0).with_score(1e-4), &w, 0.001),
            Eligibility::MissingCoordinates
        );
        assert_eq!(
            check_eligibility(&GenomicRecord::new(0).with_span(150, 160), &w, 0.001),
            Eligibility::MissingScore
        );
    }

    #[test]
    fn test_eligibility_rejects_overlong_span() {
        let w = Window::new(100, 200);
        assert_eq!(
            check_eligibility(&record(i64::MIN, i64::MAX, 1e-4), &w, 0.001),
            Eligibility::SpanTooLong
        );
        assert_eq!(
            check_eligibility(&record(0, 20_000_000, 1e-4), &w, 0.001),
            Eligibility::SpanTooLong
        );
    }

    #[test]
    fn test_project_extreme_fragment_start() {
        let w = Window::new(i64::MAX - 3, i64::MAX);
        assert_eq!(project("ACGT", i64::MIN, i64::MAX, &w), "----");
        assert_eq!(project("ACGT", i64::MAX - 1, i64::MAX, &w), "--AC");
    }

    #[test]
    fn test_eligibility_boundary_touch() {
        let w = Window::new(100, 200);
        assert!(check_eligibility(&record(90, 100, 1e-5), &w, 0.001).is_eligible());
        assert!(check_eligibility(&record(200, 210, 1e-5), &w, 0.001).is_eligible());
    }
}
