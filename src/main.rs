//! motiftrack - motif hit projection and track layout
//!
//! Projects transcription-factor motif hits from a delimited table onto a
//! genomic window, lays them out as non-overlapping tracks, and shows them in
//! a terminal viewer.
//!
//! ## Usage
//!
//! ```bash
//! motiftrack process hits.tsv --start 1000 --stop 1200
//! motiftrack annotate hits.tsv --trrust trrust_rawdata.human.tsv
//! motiftrack view hits.tsv --start 1000 --stop 1200
//! ```

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};

use motiftrack::config::{BatchPolicy, ColumnNames, PipelineConfig};
use motiftrack::controller::run_app;
use motiftrack::formats::fasta::write_alignment_file;
use motiftrack::formats::table::{write_enriched, write_table, Table};
use motiftrack::formats::{load_table_with_options, TableFormat};
use motiftrack::layout::DEFAULT_TOLERANCE;
use motiftrack::model::{AppState, TrackSet};
use motiftrack::pipeline::{run_batch, BatchReport};
use motiftrack::projection::{Window, DEFAULT_SIGNIFICANCE};
use motiftrack::regulation::{annotate_table, RegulationIndex};
use motiftrack::ui::glyphs;

/// Table format choice for the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Tab-separated values
    Tsv,
    /// Comma-separated values
    Csv,
    /// Auto-detect from extension and content
    Auto,
}

impl From<FormatArg> for Option<TableFormat> {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Tsv => Some(TableFormat::Tsv),
            FormatArg::Csv => Some(TableFormat::Csv),
            FormatArg::Auto => None,
        }
    }
}

/// motiftrack - project motif hits onto a genomic window and stack them into tracks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add SEQ, alignment and Layer columns and export unique alignments
    Process {
        #[command(flatten)]
        input: InputArgs,

        /// Enriched table output. Use "-" for stdout.
        /// [default: <TABLE stem>.processed.<ext>]
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Unique alignments in FASTA layout. Use "-" for stdout.
        /// [default: <TABLE stem>.alignments.fa]
        #[arg(short = 'a', long = "alignments")]
        alignments: Option<PathBuf>,
    },

    /// Add a regulatory-mode column from a TRRUST reference table
    Annotate {
        /// Motif hit table (TSV or CSV)
        table: PathBuf,

        /// TRRUST raw data (tab-separated: TF, Target, Mode, PMID)
        #[arg(long = "trrust")]
        trrust: PathBuf,

        /// Annotated table output. Use "-" for stdout.
        /// [default: <TABLE stem>.annotated.<ext>]
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Force a specific table format (overrides auto-detection)
        #[arg(short = 'f', long = "format", value_enum, default_value = "auto")]
        format: FormatArg,

        /// Column holding the transcription factor name
        #[arg(long = "tf-column", default_value = "TF")]
        tf_column: String,

        /// Column to write the regulatory mode into
        #[arg(long = "mode-column", default_value = "Mode")]
        mode_column: String,
    },

    /// Run the pipeline and browse the laid-out tracks
    View {
        #[command(flatten)]
        input: InputArgs,

        /// Draw with ASCII characters only
        #[arg(long = "ascii")]
        ascii: bool,
    },
}

/// Options shared by the commands that run the pipeline.
#[derive(Args, Debug)]
struct InputArgs {
    /// Motif hit table (TSV or CSV)
    table: PathBuf,

    /// First position of the projection window (prompted for when omitted)
    #[arg(long = "start", allow_hyphen_values = true)]
    start: Option<i64>,

    /// Last position of the projection window (prompted for when omitted)
    #[arg(long = "stop", allow_hyphen_values = true)]
    stop: Option<i64>,

    /// Hits of one TF whose starts and stops both lie within this distance are merged
    #[arg(long = "tolerance", default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Hits need a score strictly below this to be projected
    #[arg(long = "pvalue-threshold", default_value_t = DEFAULT_SIGNIFICANCE)]
    pvalue_threshold: f64,

    /// Keep going past records with invalid sequence symbols
    #[arg(long = "collect-errors")]
    collect_errors: bool,

    /// Force a specific table format (overrides auto-detection)
    #[arg(short = 'f', long = "format", value_enum, default_value = "auto")]
    format: FormatArg,

    #[command(flatten)]
    columns: ColumnArgs,
}

/// Input column names.
#[derive(Args, Debug)]
struct ColumnArgs {
    #[arg(long = "tf-column", default_value = "TF")]
    tf_column: String,

    #[arg(long = "source-column", default_value = "Source")]
    source_column: String,

    #[arg(long = "start-column", default_value = "Start")]
    start_column: String,

    #[arg(long = "stop-column", default_value = "Stop")]
    stop_column: String,

    #[arg(long = "strand-column", default_value = "Strand")]
    strand_column: String,

    #[arg(long = "pvalue-column", default_value = "Pvalue")]
    pvalue_column: String,

    /// Matched sequence column [default: "Mached Sequence" or "Matched Sequence"]
    #[arg(long = "sequence-column")]
    sequence_column: Option<String>,

    #[arg(long = "mode-column", default_value = "Mode")]
    mode_column: String,
}

impl From<ColumnArgs> for ColumnNames {
    fn from(args: ColumnArgs) -> Self {
        let defaults = ColumnNames::default();
        Self {
            label: args.tf_column,
            source: args.source_column,
            start: args.start_column,
            stop: args.stop_column,
            strand: args.strand_column,
            score: args.pvalue_column,
            sequence: args.sequence_column.map(|c| vec![c]).unwrap_or(defaults.sequence),
            mode: args.mode_column,
        }
    }
}

/// Asks for one window bound on stdin.
fn prompt_coordinate(name: &str) -> Result<i64> {
    eprint!("Enter the {} position of the window: ", name);
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("Failed to read from stdin")?;
    let trimmed = line.trim();
    trimmed
        .parse::<i64>()
        .with_context(|| format!("Invalid {} position: '{}'", name, trimmed))
}

/// `<dir>/<stem>.<suffix>.<ext>` next to the input table.
fn sibling_path(input: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("table");
    input.with_file_name(format!("{}.{}.{}", stem, suffix, ext))
}

fn table_extension(input: &Path, format: TableFormat) -> String {
    match input.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_string(),
        None => match format {
            TableFormat::Tsv => "tsv".to_string(),
            TableFormat::Csv => "csv".to_string(),
        },
    }
}

/// Opens `path` for writing, or stdout when `path` is `-`.
fn create_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(io::stdout().lock()))
    } else {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Output of one pipeline run over a table file.
struct PipelineRun {
    table: Table,
    format: TableFormat,
    window: Window,
    report: BatchReport,
}

/// Loads the table and runs the pipeline.
fn run_pipeline(input: InputArgs) -> Result<PipelineRun> {
    let start = match input.start {
        Some(start) => start,
        None => prompt_coordinate("start")?,
    };
    let stop = match input.stop {
        Some(stop) => stop,
        None => prompt_coordinate("stop")?,
    };

    let policy = if input.collect_errors {
        BatchPolicy::Collect
    } else {
        BatchPolicy::FailFast
    };
    let window = Window::new(start, stop);
    let config = PipelineConfig::new(window)
        .with_tolerance(input.tolerance)
        .with_significance(input.pvalue_threshold)
        .with_policy(policy);
    config.validate()?;

    let (table, format) = load_table_with_options(&input.table, input.format.into())
        .with_context(|| format!("Failed to load {}", input.table.display()))?;
    let columns: ColumnNames = input.columns.into();
    let (records, warnings) = table.records(&columns)?;
    let config = config.with_mode_required(table.column(&columns.mode).is_some());

    let report = run_batch(records, warnings, &config)
        .context("Processing aborted (use --collect-errors to skip invalid records)")?;

    if report.fatal_count() > 0 {
        log::warn!(
            "{} records had invalid sequences and were left without alignment",
            report.fatal_count()
        );
    }
    Ok(PipelineRun {
        table,
        format,
        window,
        report,
    })
}

fn run_process(input: InputArgs, output: Option<PathBuf>, alignments: Option<PathBuf>) -> Result<()> {
    let table_path = input.table.clone();
    let PipelineRun {
        table, format, report, ..
    } = run_pipeline(input)?;

    let output = output.unwrap_or_else(|| sibling_path(&table_path, "processed", &table_extension(&table_path, format)));
    write_enriched(create_output(&output)?, &table, &report.records, format)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Wrote enriched table to {}", output.display());

    let alignments = alignments.unwrap_or_else(|| sibling_path(&table_path, "alignments", "fa"));
    write_alignment_file(&alignments, &report.alignments)
        .with_context(|| format!("Failed to write {}", alignments.display()))?;

    if report.warning_count() > 0 {
        log::warn!("Finished with {} warnings", report.warning_count());
    }
    Ok(())
}

fn run_annotate(
    table_path: PathBuf,
    trrust: PathBuf,
    output: Option<PathBuf>,
    format: FormatArg,
    tf_column: &str,
    mode_column: &str,
) -> Result<()> {
    let index = RegulationIndex::from_path(&trrust).with_context(|| format!("Failed to load {}", trrust.display()))?;
    let (mut table, format) = load_table_with_options(&table_path, format.into())
        .with_context(|| format!("Failed to load {}", table_path.display()))?;

    annotate_table(&mut table, &index, tf_column, mode_column)?;

    let output = output.unwrap_or_else(|| sibling_path(&table_path, "annotated", &table_extension(&table_path, format)));
    write_table(create_output(&output)?, &table, format).with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Wrote annotated table to {}", output.display());
    Ok(())
}

fn run_view(input: InputArgs, ascii: bool) -> Result<()> {
    let PipelineRun { window, report, .. } = run_pipeline(input)?;

    let tracks = TrackSet::from_records(&report.records);
    if tracks.is_empty() {
        log::warn!("No records could be laid out; the viewer will be empty");
    }
    run_app(AppState::new(tracks, window), glyphs::select(!ascii))
}

fn init_logging(verbose: u8, quiet_default: bool) {
    let log_level = match verbose {
        0 if quiet_default => log::LevelFilter::Warn,
        0 | 1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .format_timestamp(None) // Don't show timestamps
        .format_target(false) // Don't show module names
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, matches!(cli.command, Commands::View { .. }));

    match cli.command {
        Commands::Process { input, output, alignments } => run_process(input, output, alignments),
        Commands::Annotate {
            table,
            trrust,
            output,
            format,
            tf_column,
            mode_column,
        } => run_annotate(table, trrust, output, format, &tf_column, &mode_column),
        Commands::View { input, ascii } => run_view(input, ascii),
    }
}
