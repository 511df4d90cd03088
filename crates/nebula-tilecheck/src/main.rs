//! Tile checker: decodes a tile file, prints a summary, re-encodes it under
//! the configured policy and verifies the round trip.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p nebula-tilecheck -- map_32_48.tile --json`.

mod check;
mod summary;

use std::process::ExitCode;

use clap::Parser;
use nebula_config::{CliArgs, Config};
use tracing::{error, info};

use crate::check::{CheckError, check_tile};

fn run(args: &CliArgs, config: &Config) -> Result<(), CheckError> {
    let bytes = std::fs::read(&args.input).map_err(|source| CheckError::Read {
        path: args.input.clone(),
        source,
    })?;
    info!("Checking {} ({} bytes)", args.input.display(), bytes.len());

    let report = check_tile(&bytes, config)?;
    if args.json {
        match serde_json::to_string_pretty(&report.summary) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Failed to serialize summary: {e}"),
        }
    } else {
        println!("{}", report.summary);
        if report.verified {
            println!("round trip: ok");
        }
    }

    if let Some(output) = &args.output {
        std::fs::write(output, &report.encoded).map_err(|source| CheckError::Write {
            path: output.clone(),
            source,
        })?;
        info!("Wrote {} ({} bytes)", output.display(), report.encoded.len());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory; without one, run on defaults.
    let config_dir = args.config.clone().or_else(|| Config::default_dir().ok());

    let mut config = match &config_dir {
        Some(dir) => Config::load_or_create(dir).unwrap_or_else(|e| {
            eprintln!("Failed to load config: {e}, using defaults");
            Config::default()
        }),
        None => Config::default(),
    };
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.as_ref().map(|dir| dir.join("logs"));
    nebula_log::init_logging(log_dir.as_deref(), Some(&config));

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
