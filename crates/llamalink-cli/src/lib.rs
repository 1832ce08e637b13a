//! Command-line adapter for llamalink.
//!
//! `main.rs` is the composition root: it parses arguments, builds a
//! [`CliContext`] and dispatches to [`handlers`]. Handlers are thin: they
//! call into `llamalink-runtime` and format the result for the terminal.

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliContext, bootstrap};
pub use commands::{ChatArgs, Commands, ModelsCommand, ServeArgs};
pub use error::CliError;
pub use parser::Cli;
