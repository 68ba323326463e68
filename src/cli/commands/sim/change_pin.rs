use std::sync::Arc;

use async_trait::async_trait;

use super::start_session;
use crate::cli::{CliContext, Command, CommandArg, CommandResult, types::CommandMetadata};

/// Command to replace the SIM PIN interactively
pub struct ChangePinCommand {
    context: Arc<CliContext>,
}

impl ChangePinCommand {
    /// Creates a new ChangePinCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for ChangePinCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let path = self.context.modem(args.first()).await?;

        let session = start_session(&self.context, &path).await?;
        let result = session.change_code().await;
        session.destroy().await;
        result?;

        Ok(format!("PIN changed on {path}"))
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "change-pin".to_string(),
            description: "Change the SIM PIN".to_string(),
            category: "sim".to_string(),
            args: vec![CommandArg::modem()],
            examples: vec!["connui-cellular sim change-pin".to_string()],
        }
    }
}
