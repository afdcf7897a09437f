//! scenestack CLI entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: parse args, run the
//! server-side composite, and exit with appropriate status.
//! For programmatic use, prefer the library API (`scenestack::scenes`).

use clap::Parser;

mod cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = cli::CliArgs::parse();
    cli::run(args)
}
