//! Regraph - batch conversion of CAD reconstruction histories to B-Rep graphs
//!
//! ## Commands
//!
//! - `run`: convert every document not yet recorded in the result ledger
//! - `status`: summarize the result ledger
//! - `forget`: drop ledger entries so the next run reprocesses them

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::FutureExt;
use regraph_core::{
    run_when_ready, BatchDriver, BatchReport, Collaborators, ConversionMode, DocumentConverter,
    JsonFileStore, LedgerSummary, ReadyAction, RegraphConfig, ResultLedger,
};
use regraph_toolchain::{readiness_signal, ProcessHost, ProcessToolchain, DEFAULT_PROBE_INTERVAL};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "regraph")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert CAD reconstruction histories into B-Rep topology graphs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: ./regraph.toml when present)
    #[arg(short, long, global = true, env = "REGRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every document not yet in the result ledger
    Run(RunArgs),

    /// Summarize the result ledger
    Status {
        #[command(flatten)]
        ledger: LedgerArgs,
    },

    /// Remove ledger entries so the next run converts those documents again
    Forget {
        /// Document identifiers (file names, e.g. Couch.json)
        doc_ids: Vec<String>,

        /// Also forget every document with an exception or an empty entry
        #[arg(long)]
        all_failed: bool,

        #[command(flatten)]
        ledger: LedgerArgs,
    },
}

/// Where the result ledger lives.
#[derive(Args, Debug, Default)]
struct LedgerArgs {
    /// Output directory for graphs, sequences and the ledger
    #[arg(long, env = "REGRAPH_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Ledger file name inside the output directory
    #[arg(long, env = "REGRAPH_RESULTS_FILE")]
    results_file: Option<String>,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Conversion mode: PerExtrude or PerFace
    #[arg(short, long, env = "REGRAPH_MODE")]
    mode: Option<ConversionMode>,

    /// Directory holding the input documents
    #[arg(short, long, env = "REGRAPH_INPUT_DIR")]
    input_dir: Option<PathBuf>,

    /// Explicit documents to convert, relative to the input directory
    #[arg(short, long = "file", env = "REGRAPH_FILES", value_delimiter = ',')]
    files: Vec<String>,

    /// Regex on file names used when no files are given
    #[arg(long, env = "REGRAPH_PATTERN")]
    pattern: Option<String>,

    #[command(flatten)]
    ledger: LedgerArgs,
}

impl LedgerArgs {
    fn apply(&self, config: &mut RegraphConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(file) = &self.results_file {
            config.results_file = file.clone();
        }
    }
}

impl RunArgs {
    fn apply(&self, config: &mut RegraphConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if !self.files.is_empty() {
            config.files = self.files.clone();
        }
        if let Some(pattern) = &self.pattern {
            config.pattern = pattern.clone();
        }
        self.ledger.apply(config);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    regraph_core::telemetry::init_tracing(cli.json, level);

    let mut config = RegraphConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            let report = cmd_run(config).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Commands::Status { ledger } => {
            ledger.apply(&mut config);
            let summary = cmd_status(&config)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&config, &summary);
            }
            Ok(())
        }
        Commands::Forget {
            doc_ids,
            all_failed,
            ledger,
        } => {
            ledger.apply(&mut config);
            let removed = cmd_forget(&config, &doc_ids, all_failed)?;
            if removed.is_empty() {
                println!("Nothing to forget");
            }
            for doc_id in &removed {
                println!("Forgot {}", doc_id);
            }
            Ok(())
        }
    }
}

fn open_ledger(config: &RegraphConfig) -> Result<ResultLedger> {
    let path = config.results_path();
    ResultLedger::load(Arc::new(JsonFileStore::new(&path)))
        .with_context(|| format!("Failed to load result ledger {}", path.display()))
}

/// Run the batch once the host is ready.
async fn cmd_run(config: RegraphConfig) -> Result<BatchReport> {
    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;
    let documents = config
        .documents()
        .context("Failed to list input documents")?;
    let mut ledger = open_ledger(&config)?;

    let toolchain = Arc::new(ProcessToolchain::new(&config.toolchain));
    let driver = BatchDriver::new(
        DocumentConverter::new(
            config.mode,
            &config.output_dir,
            Collaborators::from_toolchain(toolchain),
        ),
        Arc::new(ProcessHost::new()),
    );

    info!(
        mode = %config.mode,
        documents = documents.len(),
        program = %config.toolchain.program,
        "Starting regraph batch"
    );

    let ready = readiness_signal(config.toolchain.ready_probe.clone(), DEFAULT_PROBE_INTERVAL);
    let batch: ReadyAction<BatchReport> =
        Box::new(move || async move { driver.run(&documents, &mut ledger).await }.boxed());

    run_when_ready(ready, batch)
        .await
        .context("Host never became ready; no documents were processed")
}

fn cmd_status(config: &RegraphConfig) -> Result<LedgerSummary> {
    Ok(open_ledger(config)?.summary())
}

/// Remove `doc_ids` (and failed documents when asked). Returns what was removed.
fn cmd_forget(config: &RegraphConfig, doc_ids: &[String], all_failed: bool) -> Result<Vec<String>> {
    let mut ledger = open_ledger(config)?;

    let mut targets: Vec<String> = doc_ids.to_vec();
    if all_failed {
        targets.extend(ledger.failed_documents());
    }

    let mut removed = Vec::new();
    for doc_id in targets {
        if removed.contains(&doc_id) {
            continue;
        }
        if ledger
            .forget(&doc_id)
            .with_context(|| format!("Failed to update ledger while forgetting {}", doc_id))?
        {
            removed.push(doc_id);
        }
    }
    Ok(removed)
}

fn print_report(report: &BatchReport) {
    println!();
    println!("Documents:        {}", report.total);
    println!("Already recorded: {}", report.skipped_existing);
    println!("Processed:        {}", report.processed);
    println!("  converted:      {}", report.succeeded);
    println!("  unsupported:    {}", report.unsupported);
    println!("  failed:         {}", report.failed);
    println!("Duration:         {}ms", report.duration_ms);
}

fn print_summary(config: &RegraphConfig, summary: &LedgerSummary) {
    println!("Ledger: {}", config.results_path().display());
    println!("Documents: {}", summary.documents);
    println!(
        "Records: {} success, {} skip, {} exception, {} unreconciled",
        summary.success, summary.skip, summary.exception, summary.unreconciled
    );
    if !summary.pending.is_empty() {
        println!("Started but never finished:");
        for doc_id in &summary.pending {
            println!("  - {}", doc_id);
        }
    }
}
