//! CLI entry point for the complaints analyzer.
//!
//! Provides subcommands for counting complaints by type and borough over a
//! date range, preprocessing monthly resolution-time averages per area
//! code, and extracting chart series from a preprocessed snapshot.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use complaints_analyzer::analyzers::count::count_complaints;
use complaints_analyzer::analyzers::resolution::resolution_averages;
use complaints_analyzer::dashboard::{self, SelectionSlot, SeriesSelection};
use complaints_analyzer::output::{write_count_output, write_json, write_json_file};
use complaints_analyzer::parser::{CountColumns, DateRange, FieldSelector, ResolutionColumns};
use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "complaints_analyzer")]
#[command(about = "A tool to analyze public-complaints CSV data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count complaints by type and borough within a date range
    Count {
        /// Input CSV file
        #[arg(short, long)]
        input: String,

        /// Start date (MM/DD/YYYY)
        #[arg(short, long)]
        start: String,

        /// End date (MM/DD/YYYY)
        #[arg(short, long)]
        end: String,

        /// Output CSV file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Created-date column: header name or zero-based index
        #[arg(long, default_value = "Created Date")]
        created_col: String,

        /// Complaint-type column: header name or zero-based index
        #[arg(long, default_value = "Complaint Type")]
        category_col: String,

        /// Borough column: header name or zero-based index
        #[arg(long, default_value = "Borough")]
        region_col: String,
    },
    /// Compute monthly average resolution times per area code
    Preprocess {
        /// Input CSV file
        #[arg(short, long)]
        input: String,

        /// Output JSON snapshot
        #[arg(short, long, default_value = "preprocessed_data.json")]
        output: String,

        /// Only keep complaints created in this calendar year
        #[arg(short, long)]
        year: Option<i32>,

        /// Created-date column: header name or zero-based index
        #[arg(long, default_value = "22")]
        created_col: String,

        /// Closed-date column: header name or zero-based index
        #[arg(long, default_value = "1")]
        closed_col: String,

        /// Status column: header name or zero-based index
        #[arg(long, default_value = "19")]
        status_col: String,

        /// Area-code column: header name or zero-based index
        #[arg(long, default_value = "8")]
        area_col: String,

        /// Minimum fields per row; shorter rows are skipped
        #[arg(long, default_value_t = 23)]
        min_fields: usize,

        /// Status value marking complaints that are not closed yet
        #[arg(long, default_value = "In Progress")]
        still_open: String,
    },
    /// Extract month-aligned chart series from a preprocessed snapshot
    Series {
        /// Snapshot JSON produced by the preprocess command
        #[arg(short = 'n', long, default_value = "preprocessed_data.json")]
        snapshot: String,

        /// First area code to compare (default: first in the snapshot)
        #[arg(short, long)]
        primary: Option<String>,

        /// Second area code to compare (default: second in the snapshot)
        #[arg(short = 'S', long)]
        secondary: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/complaints_analyzer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("complaints_analyzer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Count {
            input,
            start,
            end,
            output,
            created_col,
            category_col,
            region_col,
        } => {
            // Boundary validation happens before the input is even opened
            let range = DateRange::parse(&start, &end)?;
            let columns = CountColumns {
                created: FieldSelector::parse(&created_col),
                category: FieldSelector::parse(&category_col),
                region: FieldSelector::parse(&region_col),
            };

            let file = open_input(&input)?;
            let outcome = count_complaints(file, &columns, range)?;
            outcome.stats.log_summary();

            write_count_output(output.as_deref(), &outcome.rows)?;
        }
        Commands::Preprocess {
            input,
            output,
            year,
            created_col,
            closed_col,
            status_col,
            area_col,
            min_fields,
            still_open,
        } => {
            let columns = ResolutionColumns {
                created: FieldSelector::parse(&created_col),
                closed: FieldSelector::parse(&closed_col),
                status: FieldSelector::parse(&status_col),
                area_code: FieldSelector::parse(&area_col),
                min_fields,
                year_bound: year,
                still_open,
            };

            let file = open_input(&input)?;
            let outcome = resolution_averages(file, &columns)?;
            outcome.stats.log_summary();

            if outcome.stats.valid == 0 {
                return Ok(());
            }

            write_json_file(&output, &outcome.snapshot)?;
            info!(path = %output, "Snapshot saved");
        }
        Commands::Series {
            snapshot,
            primary,
            secondary,
        } => {
            let snapshot = dashboard::load_snapshot(&snapshot)?;

            let mut selection = SeriesSelection::initial(&snapshot);
            if let Some(area) = primary {
                selection = selection.with_selection(SelectionSlot::Primary, &area);
            }
            if let Some(area) = secondary {
                selection = selection.with_selection(SelectionSlot::Secondary, &area);
            }

            let report = dashboard::report(&snapshot, &selection);
            write_json(std::io::stdout().lock(), &report)?;
        }
    }

    Ok(())
}

fn open_input(path: &str) -> Result<File> {
    File::open(path).with_context(|| format!("failed to open input file {path}"))
}
