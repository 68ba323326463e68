use async_trait::async_trait;
use thiserror::Error;

use crate::{ConnuiError, services::ofono::CellularError};

/// Errors that can occur during CLI command execution.
///
/// This enum represents all possible error conditions in the CLI system,
/// from command discovery failures to execution errors. Each variant provides
/// contextual information to help users understand what went wrong.
#[derive(Error, Debug)]
pub enum CliError {
    /// A command or category was not found in the registry.
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// The wrong number of arguments was provided to a command.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// One argument could not be interpreted.
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// Name of the argument
        arg: String,
        /// Why it was rejected
        reason: String,
    },

    /// The configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConnuiError),

    /// The modem service reported an error.
    #[error("{service} error: {details}")]
    ServiceError {
        /// Service that failed
        service: String,
        /// What went wrong
        details: String,
    },

    /// Output could not be serialized.
    #[error("Output error: {0}")]
    OutputError(#[from] serde_json::Error),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<CellularError> for CliError {
    fn from(error: CellularError) -> Self {
        CliError::ServiceError {
            service: "Cellular".to_string(),
            details: error.to_string(),
        }
    }
}

/// Type alias for command execution results.
///
/// All CLI commands return this type, providing either the text to print
/// or a CliError describing what went wrong.
pub type CommandResult = Result<String, CliError>;

/// Specification for a single command argument.
///
/// Drives help generation and the argument-count check done before
/// a command runs.
#[derive(Debug, Clone)]
pub struct CommandArg {
    /// The name of the argument (e.g., "modem", "state").
    pub name: String,

    /// Human-readable description of what this argument does.
    pub description: String,

    /// Whether this argument is required for command execution.
    pub required: bool,

    /// The expected type of this argument for validation and help display.
    pub value_type: ArgType,
}

impl CommandArg {
    /// Optional modem path argument shared by most commands.
    pub fn modem() -> Self {
        CommandArg {
            name: "modem".to_string(),
            description: "Modem object path (first modem when omitted)".to_string(),
            required: false,
            value_type: ArgType::Path,
        }
    }
}

/// Type classification for command arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    /// A general string value.
    String,

    /// A numeric value.
    Number,

    /// An on/off switch.
    Boolean,

    /// A D-Bus object path.
    Path,
}

/// Complete metadata for a CLI command.
///
/// This struct serves as the single source of truth for everything about
/// a command: its identity, arguments, usage examples, and categorization.
#[derive(Debug, Clone)]
pub struct CommandMetadata {
    /// The command name (e.g., "status", "scan").
    pub name: String,

    /// Brief description of what this command does.
    pub description: String,

    /// Specification of all arguments this command accepts.
    pub args: Vec<CommandArg>,

    /// Example usage strings to show in help text.
    pub examples: Vec<String>,

    /// Category this command belongs to (e.g., "sim", "net").
    pub category: String,
}

/// Trait defining the interface for all CLI commands.
///
/// Commands receive their dependencies through their constructors.
#[async_trait]
pub trait Command: Send + Sync {
    /// Executes the command with the provided arguments.
    ///
    /// The registry has already checked the argument count against
    /// [`metadata`](Command::metadata).
    ///
    /// # Errors
    ///
    /// Returns `CliError` for invalid argument values, modem service
    /// failures and I/O failures.
    async fn execute(&self, args: &[String]) -> CommandResult;

    /// Returns the complete metadata for this command.
    fn metadata(&self) -> CommandMetadata;
}
