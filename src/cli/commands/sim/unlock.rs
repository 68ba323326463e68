use std::sync::Arc;

use async_trait::async_trait;

use super::start_session;
use crate::{
    cli::{CliContext, CliError, Command, CommandArg, CommandResult, types::CommandMetadata},
    services::{ofono::SimStatus, pin::CodeUiState},
};

/// Command to enter the PIN or PUK the SIM is waiting for
///
/// Prompts on the terminal until the SIM accepts a code or the prompt is
/// dismissed with an empty line.
pub struct UnlockCommand {
    context: Arc<CliContext>,
}

impl UnlockCommand {
    /// Creates a new UnlockCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for UnlockCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let path = self.context.modem(args.first()).await?;
        let status = self
            .context
            .cellular
            .sim_state(&path)
            .map_or(SimStatus::Unknown, |sim| sim.status());

        if !status.needs_code() {
            return Ok(format!("SIM on {path} needs no code ({status})"));
        }

        let session = start_session(&self.context, &path).await?;
        let outcome = session.wait().await;
        let rejected = session.retries();
        session.destroy().await;

        match outcome {
            CodeUiState::Ok => Ok(format!(
                "SIM on {path} unlocked ({rejected} code(s) rejected)"
            )),
            CodeUiState::SimError => Err(CliError::ServiceError {
                service: "SIM".to_string(),
                details: "SIM cannot be used".to_string(),
            }),
            _ => Err(CliError::ServiceError {
                service: "SIM".to_string(),
                details: "Code entry cancelled".to_string(),
            }),
        }
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "unlock".to_string(),
            description: "Enter the PIN or PUK the SIM asks for".to_string(),
            category: "sim".to_string(),
            args: vec![CommandArg::modem()],
            examples: vec!["connui-cellular sim unlock".to_string()],
        }
    }
}
