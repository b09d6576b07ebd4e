//! Table and alignment file formats.
//!
//! Supports automatic format detection for delimited motif-hit tables:
//! - TSV (.tsv, .tab, .txt)
//! - CSV (.csv)
//!
//! Format detection priority:
//! 1. Explicit format (-f option)
//! 2. File extension
//! 3. Content-based detection (header line)
//!
//! Spreadsheet workbooks are not read directly; export them as TSV or CSV.

pub mod fasta;
pub mod table;

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use thiserror::Error;

use table::{parse_table_str, Table, TableError};

/// Detected table format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Tsv,
    Csv,
}

impl TableFormat {
    pub fn delimiter(&self) -> u8 {
        match self {
            TableFormat::Tsv => b'\t',
            TableFormat::Csv => b',',
        }
    }
}

impl std::fmt::Display for TableFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableFormat::Tsv => write!(f, "TSV"),
            TableFormat::Csv => write!(f, "CSV"),
        }
    }
}

/// Errors that can occur while loading a table file.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Failed to open file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty file")]
    EmptyFile,

    #[error("Spreadsheet workbooks (.{0}) are not supported.\n\
             Hint: export the sheet as tab- or comma-separated text first.")]
    UnsupportedFormat(String),

    #[error("Could not determine table format.\n\
             Hint: Use -f/--format to specify the format explicitly:\n  \
             motiftrack process -f tsv <file>\n  \
             motiftrack process -f csv <file>")]
    UnknownFormat,

    #[error("Table error: {0}")]
    TableError(#[from] TableError),
}

/// Result type for format operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Detects format from file extension.
pub fn detect_format_from_extension<P: AsRef<Path>>(path: P) -> FormatResult<Option<TableFormat>> {
    let Some(ext) = path.as_ref().extension().and_then(OsStr::to_str) else {
        return Ok(None);
    };
    match ext.to_lowercase().as_str() {
        "tsv" | "tab" | "txt" => Ok(Some(TableFormat::Tsv)),
        "csv" => Ok(Some(TableFormat::Csv)),
        "xlsx" | "xls" | "xlsm" | "ods" => Err(FormatError::UnsupportedFormat(ext.to_string())),
        _ => Ok(None),
    }
}

/// Detects the delimiter by examining the first non-empty line.
pub fn detect_format_from_content(content: &str) -> Option<TableFormat> {
    let header = content.lines().find(|line| !line.trim().is_empty())?;
    if header.contains('\t') {
        Some(TableFormat::Tsv)
    } else if header.contains(',') {
        Some(TableFormat::Csv)
    } else {
        None
    }
}

/// Resolves the format of a table file without parsing its records.
pub fn resolve_format<P: AsRef<Path>>(
    path: P,
    content: &str,
    forced_format: Option<TableFormat>,
) -> FormatResult<TableFormat> {
    if let Some(format) = forced_format {
        return Ok(format);
    }
    if let Some(format) = detect_format_from_extension(&path)? {
        return Ok(format);
    }
    detect_format_from_content(content).ok_or(FormatError::UnknownFormat)
}

/// Reads a whole file into memory.
pub fn read_to_string<P: AsRef<Path>>(path: P) -> FormatResult<String> {
    let file = File::open(&path)?;
    let file_size = file.metadata()?.len() as usize;
    if file_size == 0 {
        return Err(FormatError::EmptyFile);
    }
    let mut reader = BufReader::with_capacity(1024 * 1024, file);
    let mut content = String::with_capacity(file_size);
    reader.read_to_string(&mut content)?;
    Ok(content)
}

/// Loads a table file, optionally forcing its format.
///
/// Returns the table and the format it was read as.
pub fn load_table_with_options<P: AsRef<Path>>(
    path: P,
    forced_format: Option<TableFormat>,
) -> FormatResult<(Table, TableFormat)> {
    // Extension check first so workbooks fail before being read as text
    if forced_format.is_none() {
        detect_format_from_extension(&path)?;
    }
    let content = read_to_string(&path)?;
    let format = resolve_format(&path, &content, forced_format)?;
    let table = parse_table_str(&content, format)?;
    log::info!(
        "Loaded {} rows from {} ({})",
        table.len(),
        path.as_ref().display(),
        format
    );
    Ok((table, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_from_extension() {
        assert_eq!(detect_format_from_extension("hits.tsv").unwrap(), Some(TableFormat::Tsv));
        assert_eq!(detect_format_from_extension("hits.TXT").unwrap(), Some(TableFormat::Tsv));
        assert_eq!(detect_format_from_extension("hits.csv").unwrap(), Some(TableFormat::Csv));
        assert_eq!(detect_format_from_extension("hits.dat").unwrap(), None);
        assert_eq!(detect_format_from_extension("hits").unwrap(), None);
    }

    #[test]
    fn test_workbook_rejected() {
        let err = detect_format_from_extension("annotated_tf_list.xlsx").unwrap_err();
        assert!(matches!(err, FormatError::UnsupportedFormat(ref ext) if ext == "xlsx"));
    }

    #[test]
    fn test_detect_from_content() {
        assert_eq!(detect_format_from_content("TF\tStart\n"), Some(TableFormat::Tsv));
        assert_eq!(detect_format_from_content("\n\nTF,Start\n"), Some(TableFormat::Csv));
        assert_eq!(detect_format_from_content("TF Start\n"), None);
        assert_eq!(detect_format_from_content(""), None);
    }

    #[test]
    fn test_resolve_priority() {
        let content = "TF,Start\n";
        assert_eq!(
            resolve_format("x.tsv", content, Some(TableFormat::Csv)).unwrap(),
            TableFormat::Csv
        );
        assert_eq!(resolve_format("x.tsv", content, None).unwrap(), TableFormat::Tsv);
        assert_eq!(resolve_format("x.dat", content, None).unwrap(), TableFormat::Csv);
        assert!(matches!(
            resolve_format("x.dat", "TF Start", None),
            Err(FormatError::UnknownFormat)
        ));
    }
}
