//! polaris-step CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use polaris_step::cli::{self, Cli};
use polaris_step::error::error_chain;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("polaris_step=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("polaris_step=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("polaris-step starting with args: {:?}", cli);

    match cli::run(&cli) {
        Ok(result) => ExitCode::from(result.exit_code()),
        Err(e) => {
            tracing::error!("Error: {}", error_chain(&e));
            ExitCode::from(1)
        }
    }
}
