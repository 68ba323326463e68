use std::sync::Arc;

use async_trait::async_trait;

use crate::cli::{
    CliContext, Command, CommandArg, CommandResult,
    commands::{parse_switch, required, switch_arg},
    formatting::format_switch,
    types::CommandMetadata,
};

/// Command to leave or enter flight mode
pub struct OnlineCommand {
    context: Arc<CliContext>,
}

impl OnlineCommand {
    /// Creates a new OnlineCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for OnlineCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let online = parse_switch("state", required(args, 0, "state")?)?;
        let path = self.context.modem(args.get(1)).await?;

        self.context.cellular.set_online(&path, online).await?;

        Ok(format!("Modem {path} online {}", format_switch(online)))
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "online".to_string(),
            description: "Take the modem online or into flight mode".to_string(),
            category: "modem".to_string(),
            args: vec![switch_arg("on or off"), CommandArg::modem()],
            examples: vec![
                "connui-cellular modem online off".to_string(),
                "connui-cellular modem online on /phonesim".to_string(),
            ],
        }
    }
}
