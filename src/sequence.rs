//! Nucleotide sequence helpers.
//!
//! This module provides:
//! - Case-preserving base complement (including IUPAC ambiguity codes)
//! - Reverse complement
//! - Strand normalization of matched sequences to their genomic span (SEQ)

use crate::record::Strand;

/// Gap character used for padding and uncovered positions.
pub const GAP: char = '-';

/// Symbols accepted in a matched sequence (upper case; lower case is also accepted).
pub const ALPHABET: &str = "ACGTUNRYKMSWBDHV-";

/// Returns the complement of a single base, preserving case.
///
/// # Rules:
/// - Watson-Crick pairs: A↔T, C↔G; U complements to A
/// - Ambiguity codes: R↔Y, K↔M, B↔V, D↔H; S, W and N are self-complementary
/// - Gaps and unknown symbols are returned unchanged
pub fn complement_base(c: char) -> char {
    let upper = match c.to_ascii_uppercase() {
        'A' => 'T',
        'T' | 'U' => 'A',
        'C' => 'G',
        'G' => 'C',
        'R' => 'Y',
        'Y' => 'R',
        'K' => 'M',
        'M' => 'K',
        'B' => 'V',
        'V' => 'B',
        'D' => 'H',
        'H' => 'D',
        'S' => 'S',
        'W' => 'W',
        'N' => 'N',
        _ => return c,
    };
    if c.is_ascii_lowercase() {
        upper.to_ascii_lowercase()
    } else {
        upper
    }
}

/// Returns the reverse complement of a sequence.
pub fn reverse_complement(sequence: &str) -> String {
    sequence.chars().rev().map(complement_base).collect()
}

/// Returns the position and value of the first symbol outside [`ALPHABET`].
pub fn validate_symbols(sequence: &str) -> Result<(), (usize, char)> {
    match sequence
        .chars()
        .enumerate()
        .find(|&(_, c)| !ALPHABET.contains(c.to_ascii_uppercase()))
    {
        Some(bad) => Err(bad),
        None => Ok(()),
    }
}

/// Longest span a single hit may cover, matching the window limit.
pub const MAX_SPAN_LEN: u64 = crate::config::MAX_WINDOW_LEN;

/// Number of positions in `[start, stop]`.
///
/// Returns `None` for an inverted span, or one longer than [`MAX_SPAN_LEN`]
/// (which includes spans whose length does not fit in 64 bits).
pub fn span_len(start: i64, stop: i64) -> Option<usize> {
    if start > stop {
        return None;
    }
    let len = stop.abs_diff(start).checked_add(1)?;
    if len > MAX_SPAN_LEN {
        return None;
    }
    usize::try_from(len).ok()
}

/// Computes the SEQ field of a record.
///
/// The matched sequence is reverse-complemented on the reverse strand and
/// then truncated, or right-padded with [`GAP`], to exactly
/// `stop - start + 1` characters.
///
/// Returns an empty string when the sequence is missing or empty, when either
/// coordinate is missing, or when [`span_len`] rejects the span.
pub fn normalize_sequence(
    sequence: Option<&str>,
    strand: Option<Strand>,
    start: Option<i64>,
    stop: Option<i64>,
) -> String {
    let (Some(sequence), Some(start), Some(stop)) = (sequence, start, stop) else {
        return String::new();
    };
    let Some(expected_len) = span_len(start, stop).filter(|_| !sequence.is_empty()) else {
        return String::new();
    };

    let oriented = match strand {
        Some(Strand::Reverse) => reverse_complement(sequence),
        _ => sequence.to_string(),
    };

    let mut fixed: String = oriented.chars().take(expected_len).collect();
    let have = fixed.chars().count();
    fixed.extend(std::iter::repeat(GAP).take(expected_len - have));
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complement_base() {
        assert_eq!(complement_base('A'), 'T');
        assert_eq!(complement_base('t'), 'a');
        assert_eq!(complement_base('C'), 'G');
        assert_eq!(complement_base('g'), 'c');
        assert_eq!(complement_base('U'), 'A');
        assert_eq!(complement_base('N'), 'N');
        assert_eq!(complement_base('R'), 'Y');
        assert_eq!(complement_base('-'), '-');
        assert_eq!(complement_base('*'), '*');
    }

    #[test]
    fn test_reverse_complement() {
        assert_eq!(reverse_complement("AATTC"), "GAATT");
        assert_eq!(reverse_complement("ACGT"), "ACGT");
        assert_eq!(reverse_complement("aaCG"), "CGtt");
        assert_eq!(reverse_complement(""), "");
    }

    #[test]
    fn test_reverse_complement_is_involution() {
        for seq in ["ACGT", "GATTACA", "acgtNRYkm-", "SWBDHV"] {
            assert_eq!(reverse_complement(&reverse_complement(seq)), seq);
        }
    }

    #[test]
    fn test_validate_symbols() {
        assert!(validate_symbols("ACGTN-acgtn").is_ok());
        assert_eq!(validate_symbols("ACG7T"), Err((3, '7')));
        assert_eq!(validate_symbols("AC GT"), Err((2, ' ')));
    }

    #[test]
    fn test_normalize_forward_exact() {
        let seq = normalize_sequence(Some("ACGTA"), Some(Strand::Forward), Some(100), Some(104));
        assert_eq!(seq, "ACGTA");
    }

    #[test]
    fn test_normalize_reverse() {
        let seq = normalize_sequence(Some("AATTC"), Some(Strand::Reverse), Some(100), Some(104));
        assert_eq!(seq, "GAATT");
    }

    #[test]
    fn test_normalize_pads_and_truncates() {
        let padded = normalize_sequence(Some("ACG"), Some(Strand::Forward), Some(1), Some(6));
        assert_eq!(padded, "ACG---");

        let truncated = normalize_sequence(Some("ACGTACGT"), Some(Strand::Forward), Some(1), Some(3));
        assert_eq!(truncated, "ACG");
    }

    #[test]
    fn test_normalize_length_law() {
        for (start, stop) in [(0, 0), (5, 9), (10, 40), (-3, 3)] {
            for raw in ["A", "ACGTACGT", "ACGTACGTACGTACGTACGTACGT"] {
                let seq = normalize_sequence(Some(raw), Some(Strand::Reverse), Some(start), Some(stop));
                assert_eq!(seq.chars().count() as i64, stop - start + 1);
            }
        }
    }

    #[test]
    fn test_normalize_missing_strand_keeps_orientation() {
        let seq = normalize_sequence(Some("AAC"), None, Some(1), Some(3));
        assert_eq!(seq, "AAC");
    }

    #[test]
    fn test_normalize_empty_cases() {
        assert_eq!(normalize_sequence(None, Some(Strand::Forward), Some(1), Some(3)), "");
        assert_eq!(normalize_sequence(Some(""), Some(Strand::Forward), Some(1), Some(3)), "");
        assert_eq!(normalize_sequence(Some("ACG"), Some(Strand::Forward), None, Some(3)), "");
        assert_eq!(normalize_sequence(Some("ACG"), Some(Strand::Forward), Some(5), Some(3)), "");
    }

    #[test]
    fn test_span_len() {
        assert_eq!(span_len(5, 5), Some(1));
        assert_eq!(span_len(-3, 3), Some(7));
        assert_eq!(span_len(1, MAX_SPAN_LEN as i64), Some(MAX_SPAN_LEN as usize));
        assert_eq!(span_len(0, MAX_SPAN_LEN as i64), None);
        assert_eq!(span_len(9, 3), None);
        assert_eq!(span_len(i64::MIN, i64::MAX), None);
    }

    #[test]
    fn test_normalize_overflowing_span_is_empty() {
        let seq = normalize_sequence(Some("ACG"), Some(Strand::Forward), Some(i64::MIN), Some(i64::MAX));
        assert_eq!(seq, "");

        let seq = normalize_sequence(Some("ACG"), Some(Strand::Reverse), Some(i64::MIN), Some(0));
        assert_eq!(seq, "");
    }

    #[test]
    fn test_normalize_span_above_cap_is_empty() {
        let stop = MAX_SPAN_LEN as i64 + 1;
        assert_eq!(normalize_sequence(Some("ACG"), Some(Strand::Forward), Some(1), Some(stop)), "");

        let at_cap = normalize_sequence(Some("ACG"), Some(Strand::Forward), Some(2), Some(stop));
        assert_eq!(at_cap.len(), MAX_SPAN_LEN as usize);
        assert!(at_cap.starts_with("ACG---"));
    }
}
