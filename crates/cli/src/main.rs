//! vendo - keeps vendored Go dependencies consistent with the code using them

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cmd::CheckPhase;
use output::print_error;

#[derive(Parser)]
#[command(name = "vendo")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
  #[arg(short, long, global = true, action = ArgAction::Count)]
  verbose: u8,

  /// Run as if started in DIR
  #[arg(short = 'C', long = "directory", value_name = "DIR", global = true)]
  directory: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Verify the staged vendor tree before committing
  Check {
    /// Which verification to run
    #[arg(value_enum, default_value_t = CheckPhase::All)]
    phase: CheckPhase,
  },

  /// Print the non-standard dependencies of the working tree
  Deps {
    /// Target platforms as OS_ARCH[,OS_ARCH...] (default: from the manifest)
    #[arg(long, value_name = "LIST")]
    platforms: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },
}

fn init_tracing(verbose: u8) {
  let default = match verbose {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}

fn run(cli: Cli) -> Result<()> {
  let root = match cli.directory {
    Some(dir) => dir,
    None => std::env::current_dir().context("cannot determine current directory")?,
  };
  let root = dunce::canonicalize(&root).with_context(|| format!("cannot access {}", root.display()))?;
  debug!(root = %root.display(), "project root");

  match cli.command {
    Commands::Check { phase } => cmd::cmd_check(&root, phase),
    Commands::Deps { platforms, json } => cmd::cmd_deps(&root, platforms.as_deref(), json),
  }
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("error: {e:#}"));
      ExitCode::FAILURE
    }
  }
}
