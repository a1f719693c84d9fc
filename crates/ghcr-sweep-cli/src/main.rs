//! ghcr-sweep CLI - reachability-based garbage collection for ghcr.io packages

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

use commands::TargetArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "ghcr-sweep")]
#[command(author = "ghcr-sweep Contributors")]
#[command(version)]
#[command(about = "Delete container package versions that no live tag references", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect unreferenced versions (dry run unless --dry-run false)
    Sweep {
        #[command(flatten)]
        target: TargetArgs,

        /// Refuse to delete anything if a live tag fails to resolve
        #[arg(long)]
        strict: bool,

        /// Output the full outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List package versions and why each one is live
    Inventory {
        #[command(flatten)]
        target: TargetArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Log to stdout, or to stderr when stdout carries JSON
fn init_tracing(debug: bool, json_output: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug);

    if json_output {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.with_writer(std::io::stdout).init();
    }
}

async fn dispatch(command: Commands) -> error::Result<()> {
    match command {
        Commands::Sweep {
            target,
            strict,
            json,
        } => commands::sweep::run(&target, strict, json).await,

        Commands::Inventory { target, json } => commands::inventory::run(&target, json).await,
    }
}

fn main() {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    let json_output = match &cli.command {
        Commands::Sweep { json, .. } | Commands::Inventory { json, .. } => *json,
    };
    init_tracing(cli.debug, json_output);

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::internal(format!("failed to start runtime: {}", e)))
        .and_then(|runtime| runtime.block_on(dispatch(cli.command)));

    if let Err(err) = result {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
