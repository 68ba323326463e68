use std::sync::Arc;

use async_trait::async_trait;

use crate::cli::{
    CliContext, Command, CommandArg, CommandResult,
    commands::{parse_switch, required, switch_arg},
    formatting::format_switch,
    types::CommandMetadata,
};

/// Command to allow or forbid packet data
pub struct PowerCommand {
    context: Arc<CliContext>,
}

impl PowerCommand {
    /// Creates a new PowerCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for PowerCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let powered = parse_switch("state", required(args, 0, "state")?)?;
        let path = self.context.modem(args.get(1)).await?;

        self.context
            .cellular
            .set_data_powered(&path, powered)
            .await?;

        Ok(format!("Packet data on {path} {}", format_switch(powered)))
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "power".to_string(),
            description: "Switch packet data on or off".to_string(),
            category: "data".to_string(),
            args: vec![switch_arg("on or off"), CommandArg::modem()],
            examples: vec!["connui-cellular data power off".to_string()],
        }
    }
}
