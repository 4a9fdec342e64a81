use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use cmd::{BuildArgs, cmd_build};

/// next-tf - package framework build output for edge deployment
#[derive(Parser)]
#[command(name = "next-tf")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run the framework build and assemble lambdas, static bundle and manifest
  Build(BuildArgs),
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let verbose = match &cli.command {
    Commands::Build(args) => args.is_verbose(),
  };
  init_tracing(verbose);

  let result = match cli.command {
    Commands::Build(args) => cmd_build(args),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      output::print_error(&format!("{e:#}"));
      ExitCode::FAILURE
    }
  }
}

/// Log to stderr. `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool) {
  let default_directive = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
