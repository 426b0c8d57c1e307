//! Flexible ROC CLI
//!
//! Computes a flexible ROC curve and its spline-integrated AUC from a file
//! of labeled scores.
//!
//! # Usage
//!
//! ```bash
//! flexroc <datafile> [<flex_width>] [<roc_output>]
//! ```
//!
//! - `datafile`: whitespace-separated `(id, label, score)` triples
//! - `flex_width`: matching half-window in ids (default 0, classic ROC)
//! - `roc_output`: curve artifact path (default `roc.dat`)
//!
//! # Exit Codes
//!
//! - 0: success; prints `ROC AREA: <value>` on stdout
//! - 1: missing datafile (message on stdout) or runtime error (stderr)
//! - 2: malformed arguments (clap usage error)

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use flexroc::config::RocConfig;
use flexroc::events::EventTable;
use flexroc::{curve, integrate};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Flexible ROC curve and AUC from labeled scores
#[derive(Parser, Debug)]
#[command(name = "flexroc")]
#[command(about = "Compute a flexible ROC curve and its AUC from (id, label, score) triples")]
struct Cli {
    /// Input file of whitespace-separated (id, label, score) triples
    datafile: PathBuf,

    /// Matching half-window in ids; 0 scores a classic ROC
    #[arg(default_value_t = 0)]
    flex_width: u64,

    /// Output path for the ROC curve artifact
    #[arg(default_value = "roc.dat")]
    roc_output: PathBuf,
}

fn init_tracing() {
    // Logs go to stderr: stdout is reserved for the ROC AREA line.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flexroc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.kind() == ErrorKind::MissingRequiredArgument => {
            println!("missing datafile");
            std::process::exit(1);
        }
        Err(err) => err.exit(),
    };

    init_tracing();

    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let table = EventTable::from_path(&cli.datafile)
        .with_context(|| format!("reading {}", cli.datafile.display()))?;
    let summary = table.summary();
    info!(
        observations = summary.observations,
        events = summary.events,
        score_mean = summary.score_mean,
        score_min = summary.score_min,
        score_max = summary.score_max,
        "event table loaded"
    );

    let config = RocConfig::with_flex_width(cli.flex_width);
    let roc = curve::sweep(&table, &config);
    info!(
        points = roc.len(),
        flex_width = cli.flex_width,
        "roc curve built"
    );

    roc.write_atomic(&cli.roc_output)
        .with_context(|| format!("writing {}", cli.roc_output.display()))?;
    info!(path = %cli.roc_output.display(), "curve artifact written");

    let area = integrate::area(&roc, config.tolerance).context("integrating roc curve")?;

    println!("ROC AREA: {}", area);
    Ok(())
}
