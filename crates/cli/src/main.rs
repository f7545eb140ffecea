mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::output::{OutputFormat, print_error};

/// rig - resolve units from a rigging manifest
#[derive(Parser)]
#[command(name = "rig")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve a unit and print its value
  Resolve {
    /// Path to the manifest file
    manifest: PathBuf,

    /// Unit id to resolve
    id: String,

    /// Token of the unit
    #[arg(short, long)]
    token: Option<String>,

    /// Resolve every registration of the unit
    #[arg(long)]
    all: bool,

    /// Resolve the unit this many times on the same engine
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    repeat: u32,
  },

  /// Print the matcher tree built from a manifest
  Tree {
    /// Path to the manifest file
    manifest: PathBuf,
  },

  /// Validate a manifest without resolving anything
  Check {
    /// Path to the manifest file
    manifest: PathBuf,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Resolve {
      manifest,
      id,
      token,
      all,
      repeat,
    } => cmd::cmd_resolve(
      &manifest,
      &cmd::ResolveRequest {
        id,
        token,
        all,
        repeat,
      },
      cli.format,
    ),
    Commands::Tree { manifest } => cmd::cmd_tree(&manifest, cli.format),
    Commands::Check { manifest } => cmd::cmd_check(&manifest, cli.format),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{err:#}"));
      ExitCode::FAILURE
    }
  }
}
