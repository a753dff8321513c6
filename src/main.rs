//! Handler schema generator - offline command-line front end of the schema engine.
//!
//! Compiles the request/response types of the given handlers with static source
//! analysis and writes one versioned schema file per handler. Services load those
//! files at start-up instead of analysing sources in production.
//!
//! # Usage
//!
//! ```bash
//! handler-schema [OPTIONS] -o <DIR> <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! ```bash
//! handler-schema ./my-service -H create_user=src/handlers.rs:CreateUser:User -o schemas
//! handler-schema ./my-service --manifest handlers.yaml -f yaml -o schemas -v
//! ```

use anyhow::Result;
use clap::Parser;
use handler_schema::cli::{self, CliArgs};
use log::{info, LevelFilter};

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let args = cli::parse_args_from_parsed(args)?;
    let output_dir = args.output_dir.clone();
    cli::run(args)?;

    info!("Schemas written to {}", output_dir.display());
    Ok(())
}
