#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for EPF pendency report extraction.
//!
//! Uses `indicatif-log-bridge` (via [`epf_cli_utils::init_logger`]) to
//! route `log` output through `indicatif::MultiProgress` so that log lines
//! and the per-document progress bar never fight for the terminal.
//!
//! Output is rendered in full before anything is written, so a failed run
//! never truncates an existing `--output` file.

use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use epf_cli_utils::{IndicatifProgress, MultiProgress};
use epf_pdf::{LineSource, PdfLineSource, TextLineSource};
use epf_pendency::config::DEFAULT_CONFIG_TOML;
use epf_pendency::{
    Aggregator, Categorizer, DocumentParser, DocumentSpec, FieldSelector, PendencyConfig, export,
    summarize_fields, validate_records,
};

#[derive(Parser)]
#[command(name = "epf_pendency", about = "EPF pendency report extraction tool")]
struct Cli {
    /// TOML settings file (header lines, day buckets, officer groups)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Treat documents as form-feed separated text dumps instead of PDFs
    #[arg(long, global = true)]
    text: bool,
    /// Process pages and documents one at a time
    #[arg(long, global = true)]
    sequential: bool,
    /// Number of worker threads (defaults to the number of CPUs)
    #[arg(long, global = true)]
    jobs: Option<usize>,
    /// Write CSV here instead of stdout
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,
    #[arg(
        long,
        short,
        global = true,
        action = clap::ArgAction::Count,
        help = "More log output (-v for debug, -vv for trace); RUST_LOG overrides"
    )]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the claim table from one report
    Parse {
        /// Report to parse
        document: String,
        /// Add coerced numbers, day bucket and officer columns
        #[arg(long)]
        categorize: bool,
    },
    #[command(about = "Merge several reports into one table tagged by pending_at")]
    Aggregate {
        /// Reports as PATH=LABEL (e.g. da.pdf=DA), in output order
        #[arg(required = true)]
        documents: Vec<DocumentSpec>,
    },
    /// Count aggregated claims by two sets of columns
    Summary {
        /// Reports as PATH=LABEL (e.g. da.pdf=DA), in output order
        #[arg(required = true)]
        documents: Vec<DocumentSpec>,
        /// Comma-separated columns for the row axis (e.g. officer or group,task)
        #[arg(long, default_value = "officer")]
        rows: FieldSelector,
        #[arg(
            long,
            default_value = "days_cat",
            help = "Comma-separated columns for the column axis (e.g. days_cat)"
        )]
        columns: FieldSelector,
        /// Only count claims pending at this label
        #[arg(long)]
        pending_at: Option<String>,
    },
    /// Count extracted values that do not match EPFO formats, per column
    Validate {
        /// Reports to check
        #[arg(required = true)]
        documents: Vec<String>,
    },
    /// Print the annotated default settings file
    DefaultConfig,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let multi = epf_cli_utils::init_logger(cli.verbose);
    run(cli, &multi)
}

fn run(cli: Cli, multi: &MultiProgress) -> Result<(), Box<dyn Error>> {
    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()?;
    }

    let config = match &cli.config {
        Some(path) => PendencyConfig::load(path)?,
        None => PendencyConfig::default(),
    };

    let source: Box<dyn LineSource> = if cli.text {
        Box::new(TextLineSource::new())
    } else {
        Box::new(PdfLineSource::new())
    };

    let parallel = !cli.sequential;
    let parser = DocumentParser::new(source.as_ref(), config.header).with_parallel(parallel);
    let categorizer = Categorizer::from_config(&config);

    let mut out = Vec::new();

    match cli.command {
        Commands::Parse {
            document,
            categorize,
        } => {
            let records = parser.parse(&document)?;
            if categorize {
                export::write_categorized(&mut out, &categorizer.categorize(records))?;
            } else {
                export::write_claims(&mut out, &records)?;
            }
        }
        Commands::Aggregate { documents } => {
            let progress = IndicatifProgress::documents_bar(multi, "Parsing reports");
            let table = Aggregator::new(parser, categorizer)
                .with_parallel(parallel)
                .aggregate_with_progress(&documents, &progress)?;
            export::write_aggregated(&mut out, &table)?;
        }
        Commands::Summary {
            documents,
            rows,
            columns,
            pending_at,
        } => {
            let progress = IndicatifProgress::documents_bar(multi, "Parsing reports");
            let table = Aggregator::new(parser, categorizer)
                .with_parallel(parallel)
                .aggregate_with_progress(&documents, &progress)?;
            let summary = summarize_fields(&table, &rows, &columns, pending_at.as_deref());
            log::info!(
                "Summarized {} of {} claims by {rows} x {columns}",
                summary.grand_total(),
                table.len()
            );
            export::write_summary(&mut out, &summary, &rows.to_string())?;
        }
        Commands::Validate { documents } => {
            let reports = documents
                .iter()
                .map(|document| {
                    parser
                        .parse(document)
                        .map(|records| (document, validate_records(document, &records)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            export::write_validation(&mut out, &reports)?;
        }
        Commands::DefaultConfig => {
            out.extend_from_slice(DEFAULT_CONFIG_TOML.as_bytes());
        }
    }

    write_output(cli.output.as_deref(), &out)?;

    Ok(())
}

fn write_output(path: Option<&Path>, bytes: &[u8]) -> io::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, bytes)?;
            log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
            Ok(())
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()
        }
    }
}
