//! FASTA-style export of the deduplicated alignment set.
//!
//! ## Format
//!
//! Each unique alignment is written as a header line followed by the
//! alignment on a single line, in first-seen order:
//!
//! ```text
//! >SP1MA0079
//! --GGGGCGGG
//! >GATA1MA0035
//! AGATAAGA--
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::alignment_set::AlignmentSet;

/// Writes every entry of `set` as a two-line record.
pub fn write_alignment_set<W: Write>(mut writer: W, set: &AlignmentSet) -> io::Result<()> {
    for entry in set.entries() {
        writeln!(writer, ">{}", entry.header)?;
        writeln!(writer, "{}", entry.alignment)?;
    }
    writer.flush()
}

/// Writes the alignment set to `path`, or to stdout when `path` is `-`.
pub fn write_alignment_file<P: AsRef<Path>>(path: P, set: &AlignmentSet) -> io::Result<()> {
    let path = path.as_ref();
    if path.as_os_str() == "-" {
        let stdout = io::stdout();
        let handle = stdout.lock();
        write_alignment_set(handle, set)
    } else {
        let file = File::create(path)?;
        write_alignment_set(BufWriter::new(file), set)?;
        log::info!(
            "Wrote {} unique alignments to {}",
            set.len(),
            path.display()
        );
        Ok(())
    }
}
