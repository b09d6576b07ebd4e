//! File-level runs of the processing pipeline.

use std::fs;
use std::fs::File;
use std::path::Path;

use motiftrack::config::{BatchPolicy, ColumnNames, PipelineConfig};
use motiftrack::formats::fasta::write_alignment_file;
use motiftrack::formats::table::{write_enriched, write_table};
use motiftrack::formats::{load_table_with_options, FormatError, TableFormat};
use motiftrack::model::TrackSet;
use motiftrack::pipeline::{run_batch, BatchReport};
use motiftrack::projection::Window;
use motiftrack::regulation::{annotate_table, RegulationIndex};
use tempfile::tempdir;

const HITS_TSV: &str = "TF\tSource\tStart\tStop\tStrand\tPvalue\tMached Sequence\n\
                        SP1\tMA0079\t102\t106\t-\t0.0001\tAATTC\n\
                        GATA1\tMA0035\t104\t111\t+\t0.0004\tAGATAAGA\n\
                        KLF4\tMA0039\t103\t107\t+\t0.5\tCCACA\n";

fn run(path: &Path, window: Window, policy: BatchPolicy) -> BatchReport {
    let (table, _) = load_table_with_options(path, None).unwrap();
    let (records, warnings) = table.records(&ColumnNames::default()).unwrap();
    let config = PipelineConfig::new(window).with_policy(policy);
    run_batch(records, warnings, &config).unwrap()
}

#[test]
fn test_process_tsv_end_to_end() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hits.tsv");
    fs::write(&input, HITS_TSV).unwrap();

    let (table, format) = load_table_with_options(&input, None).unwrap();
    assert_eq!(format, TableFormat::Tsv);
    let (records, warnings) = table.records(&ColumnNames::default()).unwrap();
    assert!(warnings.is_empty());

    let config = PipelineConfig::new(Window::new(100, 109));
    let report = run_batch(records, warnings, &config).unwrap();
    assert_eq!(report.aligned_count(), 2);
    assert_eq!(report.layer_count, 3);

    let enriched_path = dir.path().join("hits.processed.tsv");
    write_enriched(File::create(&enriched_path).unwrap(), &table, &report.records, format).unwrap();
    let enriched = fs::read_to_string(&enriched_path).unwrap();
    let lines: Vec<&str> = enriched.lines().collect();
    assert_eq!(
        lines[0],
        "TF\tSource\tStart\tStop\tStrand\tPvalue\tMached Sequence\tSEQ\talignment\tLayer"
    );
    assert_eq!(lines[1], "SP1\tMA0079\t102\t106\t-\t0.0001\tAATTC\tGAATT\t--GAATT---\t2");
    assert_eq!(lines[2], "GATA1\tMA0035\t104\t111\t+\t0.0004\tAGATAAGA\tAGATAAGA\t----AGATAA\t0");
    assert_eq!(lines[3], "KLF4\tMA0039\t103\t107\t+\t0.5\tCCACA\tCCACA\t\t1");

    let fasta_path = dir.path().join("hits.alignments.fa");
    write_alignment_file(&fasta_path, &report.alignments).unwrap();
    assert_eq!(
        fs::read_to_string(&fasta_path).unwrap(),
        ">SP1MA0079\n--GAATT---\n>GATA1MA0035\n----AGATAA\n"
    );
}

#[test]
fn test_descending_window_matches_ascending() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hits.tsv");
    fs::write(&input, HITS_TSV).unwrap();

    let up = run(&input, Window::new(100, 109), BatchPolicy::FailFast);
    let down = run(&input, Window::new(109, 100), BatchPolicy::FailFast);
    let alignments = |r: &BatchReport| r.records.iter().map(|e| e.alignment.clone()).collect::<Vec<_>>();
    assert_eq!(alignments(&up), alignments(&down));
}

#[test]
fn test_invalid_symbol_policies() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hits.csv");
    fs::write(
        &input,
        "TF,Source,Start,Stop,Strand,Pvalue,Matched Sequence\n\
         SP1,MA0079,102,106,+,0.0001,AAXTC\n\
         GATA1,MA0035,104,111,+,0.0004,AGATAAGA\n",
    )
    .unwrap();

    let (table, _) = load_table_with_options(&input, None).unwrap();
    let (records, warnings) = table.records(&ColumnNames::default()).unwrap();
    let config = PipelineConfig::new(Window::new(100, 109));
    let err = run_batch(records, warnings, &config).unwrap_err();
    assert!(err.is_fatal());

    let report = run(&input, Window::new(100, 109), BatchPolicy::Collect);
    assert_eq!(report.fatal_count(), 1);
    assert_eq!(report.records.len(), 2);
    assert!(report.records[0].alignment.is_none());
    assert_eq!(report.records[1].alignment.as_deref(), Some("----AGATAA"));
}

#[test]
fn test_coercion_warnings_do_not_abort() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hits.tsv");
    fs::write(
        &input,
        "TF\tStart\tStop\tStrand\tPvalue\tMached Sequence\n\
         SP1\tabc\t106\t+\t0.0001\tAATTC\n\
         GATA1\t104.0\t111\t+\t0.0004\tAGATAAGA\n",
    )
    .unwrap();

    let report = run(&input, Window::new(100, 109), BatchPolicy::FailFast);
    assert_eq!(report.warning_count(), 1);
    assert!(report.records[0].alignment.is_none());
    assert_eq!(report.records[1].alignment.as_deref(), Some("----AGATAA"));
}

#[test]
fn test_huge_span_row_warns_and_batch_continues() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hits.tsv");
    fs::write(
        &input,
        format!(
            "TF\tStart\tStop\tStrand\tPvalue\tMached Sequence\n\
             SP1\t{}\t{}\t+\t0.0001\tAATTC\n\
             KLF4\t1\t50000000\t-\t0.0001\tCCACA\n\
             GATA1\t104\t111\t+\t0.0004\tAGATAAGA\n",
            i64::MIN,
            i64::MAX
        ),
    )
    .unwrap();

    let report = run(&input, Window::new(100, 109), BatchPolicy::FailFast);
    assert_eq!(report.warning_count(), 2);
    assert_eq!(report.fatal_count(), 0);
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.records[0].normalized_sequence, "");
    assert!(report.records[0].alignment.is_none());
    assert!(report.records[1].layer.is_none());
    assert_eq!(report.records[2].alignment.as_deref(), Some("----AGATAA"));
    assert_eq!(report.layer_count, 1);
}

#[test]
fn test_annotated_table_lays_out_only_hits_with_mode() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hits.tsv");
    fs::write(
        &input,
        "TF\tStart\tStop\tPvalue\tMode\n\
         SP1\t100\t105\t0.0001\tactivation\n\
         GATA1\t102\t110\t0.0002\t\n",
    )
    .unwrap();

    let (table, _) = load_table_with_options(&input, None).unwrap();
    let columns = ColumnNames::default();
    let (records, warnings) = table.records(&columns).unwrap();
    let config = PipelineConfig::new(Window::new(100, 110))
        .with_mode_required(table.column(&columns.mode).is_some());
    let report = run_batch(records, warnings, &config).unwrap();

    assert_eq!(report.records[0].layer, Some(0));
    assert_eq!(report.records[1].layer, None);
    assert_eq!(report.laid_out_count(), 1);
}

#[test]
fn test_annotate_then_view_tracks() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hits.tsv");
    let trrust = dir.path().join("trrust.tsv");
    fs::write(&input, HITS_TSV).unwrap();
    fs::write(
        &trrust,
        "SP1\tCDKN1A\tActivation\t1\nGATA1\tHBB\tRepression\t2\nGATA1\tKLF1\tActivation\t3\n",
    )
    .unwrap();

    let index = RegulationIndex::from_path(&trrust).unwrap();
    let (mut table, format) = load_table_with_options(&input, None).unwrap();
    assert_eq!(annotate_table(&mut table, &index, "TF", "Mode").unwrap(), 2);

    let annotated = dir.path().join("hits.annotated.tsv");
    write_table(File::create(&annotated).unwrap(), &table, format).unwrap();

    let report = run(&annotated, Window::new(100, 109), BatchPolicy::FailFast);
    let tracks = TrackSet::from_records(&report.records);
    assert_eq!(tracks.len(), 3);
    assert_eq!(tracks.layer_count(), 3);

    let modes: Vec<Option<&str>> = tracks.hits.iter().map(|h| h.mode.as_deref()).collect();
    assert_eq!(
        modes,
        vec![Some("activation"), Some("activation & repression"), Some("no evidence")]
    );
}

#[test]
fn test_workbook_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("annotated_tf_list.xlsx");
    fs::write(&input, b"PK\x03\x04").unwrap();

    let err = load_table_with_options(&input, None).unwrap_err();
    assert!(matches!(err, FormatError::UnsupportedFormat(_)));
}

#[test]
fn test_empty_file_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("hits.tsv");
    fs::write(&input, "").unwrap();

    assert!(matches!(
        load_table_with_options(&input, None),
        Err(FormatError::EmptyFile)
    ));
}
