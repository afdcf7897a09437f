//! Command Line Interface (CLI) layer for scenestack.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for fetching a server-side
//! composite of scenes into local output files. It wires user-provided
//! options to the service clients exposed by the library.
//!
//! If you are embedding scenestack into another application, prefer the
//! library API (`scenestack::scenes`, `scenestack::client`) over calling
//! the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
