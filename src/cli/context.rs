use serde::Serialize;

use super::CliError;
use crate::{
    config::Config,
    services::ofono::{CellularContext, ModemPath},
};

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human readable text.
    #[default]
    Text,
    /// One JSON document per result.
    Json,
}

/// Dependencies shared by every command.
pub struct CliContext {
    /// Modem state the commands read and drive.
    pub cellular: CellularContext,
    /// Loaded configuration.
    pub config: Config,
    /// Requested output format.
    pub output: OutputFormat,
}

impl CliContext {
    /// Bundle the command dependencies.
    pub fn new(cellular: CellularContext, config: Config, output: OutputFormat) -> Self {
        Self {
            cellular,
            config,
            output,
        }
    }

    /// Start monitoring and wait until the initial modem state is cached.
    ///
    /// # Errors
    /// Returns `CliError::ServiceError` when the modem service cannot be reached.
    pub async fn ready(&self) -> Result<(), CliError> {
        self.cellular.get().await?;
        self.cellular.settle().await;
        Ok(())
    }

    /// Resolve the optional modem argument, falling back to the first modem.
    ///
    /// # Errors
    /// Returns `CliError::InvalidArgument` for an unknown path or when no modem exists.
    pub async fn modem(&self, arg: Option<&String>) -> Result<ModemPath, CliError> {
        self.ready().await?;

        let path = match arg {
            Some(path) => ModemPath::new(path.as_str()),
            None => self
                .cellular
                .default_modem()
                .ok_or_else(|| CliError::InvalidArgument {
                    arg: "modem".to_string(),
                    reason: "No modems found".to_string(),
                })?,
        };

        if self.cellular.modem(&path).is_none() {
            return Err(CliError::InvalidArgument {
                arg: "modem".to_string(),
                reason: format!("Unknown modem '{path}'"),
            });
        }

        Ok(path)
    }

    /// Render `value` as JSON or through `text`, depending on the output format.
    ///
    /// # Errors
    /// Returns `CliError::OutputError` when JSON serialization fails.
    pub fn render<T: Serialize>(
        &self,
        value: &T,
        text: impl FnOnce(&T) -> String,
    ) -> Result<String, CliError> {
        match self.output {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Text => Ok(text(value)),
        }
    }
}
