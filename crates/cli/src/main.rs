mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// Extract hspec-wai HTTP tests to JSON and replay them.
#[derive(Parser)]
#[command(
    name = "specport",
    version,
    about = "Extract hspec-wai HTTP tests to JSON and replay them"
)]
struct Cli {
    /// Only log errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log per-block extraction decisions
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every *Spec.hs under UPSTREAM into JSON specs under OUTPUT
    Extract {
        /// Directory holding Main.hs and the *Spec.hs files
        #[arg(default_value = "./upstream")]
        upstream: PathBuf,
        /// Directory the JSON specs are written to
        #[arg(default_value = "./specs")]
        output: PathBuf,
    },

    /// Replay extracted JSON specs against a running service
    Replay {
        /// Directory of extracted JSON specs
        #[arg(default_value = "./specs")]
        specs_dir: PathBuf,
        /// Base URL of the service under test
        #[arg(long)]
        target: Option<String>,
        /// TOML file with replay options
        #[arg(long)]
        config: Option<PathBuf>,
        /// Only run spec files whose name contains one of these
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
        /// Skip spec files whose name contains one of these
        #[arg(long, value_delimiter = ',')]
        skip: Vec<String>,
        /// Skip tests whose "A > b" description contains this (repeatable)
        #[arg(long = "skip-test")]
        skip_tests: Vec<String>,
        /// Skip specs extracted under these configurations
        #[arg(long, value_delimiter = ',')]
        skip_configs: Vec<String>,
    },
}

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(error) => {
            eprintln!("specport error: {error:#}");
            process::exit(1);
        }
    }
}

/// `Ok(false)` means the command ran but reported failures.
fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    match cli.command {
        Commands::Extract { upstream, output } => {
            commands::extract::cmd_extract(&upstream, &output, cli.quiet)?;
            Ok(true)
        }
        Commands::Replay {
            specs_dir,
            target,
            config,
            only,
            skip,
            skip_tests,
            skip_configs,
        } => {
            let overrides = specport_replay::ReplayOptions {
                target,
                only,
                skip,
                skip_tests,
                skip_configs,
            };
            commands::replay::cmd_replay(&specs_dir, config.as_deref(), overrides)
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("SPECPORT_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // stdout carries TAP and summaries
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
