//! spectree - command-line front end for running a Spec tree from a
//! config file (spec.md Section 1 names this "deliberately out of scope"
//! for the core engine; Section 6 specifies the config, filter/format
//! expression, and wire format surfaces this binary implements).

mod config;
mod error;
mod ingest;
mod output;

use clap::{Parser, Subcommand};
use error::{CliError, Result};
use spectree_expr::{parse_filter, parse_format, FilterSpec, FormatSpec};
use spectree_task::{CapabilityMask, Task, ASSETS_EMIT, ASSETS_GENERATE};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "spectree")]
#[command(about = "Runs a declarative Spec/Task build pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and run the Spec tree described by a config file
    Run {
        /// Path to the root config file (.json, .yaml, or .yml)
        config: PathBuf,

        /// Name of the root Spec (default: "root")
        #[arg(long, default_value = "root")]
        name: String,

        /// Read additional input assets as line-delimited JSON from stdin
        #[arg(long)]
        stdin: bool,

        /// Filter expression, e.g. "filter: mimetype=text/html"
        #[arg(long)]
        filter: Option<String>,

        /// Format expression, e.g. "format: no-base64, length"
        #[arg(long)]
        format: Option<String>,
    },

    /// Load and build the Spec tree without running it, to validate config
    Check {
        /// Path to the root config file (.json, .yaml, or .yml)
        config: PathBuf,

        /// Name of the root Spec (default: "root")
        #[arg(long, default_value = "root")]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            name,
            stdin,
            filter,
            format,
        } => run_tree(&config, &name, stdin, filter.as_deref(), format.as_deref()).await,
        Command::Check { config, name } => {
            let props = crate::config::load_config(&config)?;
            let tree = crate::config::build_tree(&name, props)?;
            tracing::info!(spec = %tree.name, "config is valid");
            Ok(())
        }
    }
}

async fn run_tree(
    config_path: &PathBuf,
    name: &str,
    read_stdin: bool,
    filter_expr: Option<&str>,
    format_expr: Option<&str>,
) -> Result<()> {
    let filter = match filter_expr {
        Some(expr) => parse_filter(expr)?,
        None => FilterSpec::default(),
    };
    let format = match format_expr {
        Some(expr) => parse_format(expr)?,
        None => FormatSpec::default(),
    };

    let props = config::load_config(config_path)?;
    let root = config::build_tree(name, props)?;

    if read_stdin {
        attach_stdin_ingest(&root)?;
    }

    let (rx, _wait) = Arc::clone(&root).collect_output();

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    let (run_result, drain_result) = tokio::join!(
        Arc::clone(&root).run(),
        output::drain_to(rx, &filter, &format, &mut lock)
    );

    run_result.map_err(CliError::from)?;
    drain_result?;
    Ok(())
}

fn attach_stdin_ingest(root: &Arc<spectree_engine::Spec>) -> Result<()> {
    let reader: Box<dyn BufRead + Send> = Box::new(BufReader::new(std::io::stdin()));
    let behavior = ingest::StdinIngestBehavior::new(reader, root.name.clone());
    let mask = CapabilityMask::from_bits(ASSETS_EMIT | ASSETS_GENERATE);
    let task = Task::new("stdin-ingest", mask, Box::new(behavior))?;
    root.enqueue(task)?;
    Ok(())
}
