//! Command-line interface for the cellular modem state.
//!
//! Provides a hierarchical command system for inspecting and driving the
//! modems behind a [`CellularContext`](crate::services::ofono::CellularContext).
//! Commands are organized by category and automatically generate help text
//! from metadata.

mod commands;
mod context;
pub mod formatting;
mod registry;
mod service;
mod types;

pub use context::{CliContext, OutputFormat};
pub use registry::CommandRegistry;
pub use service::CliService;
pub use types::{ArgType, CliError, Command, CommandArg, CommandMetadata, CommandResult};

#[cfg(test)]
mod tests;
