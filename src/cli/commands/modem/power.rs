use std::sync::Arc;

use async_trait::async_trait;

use crate::cli::{
    CliContext, Command, CommandArg, CommandResult,
    commands::{parse_switch, required, switch_arg},
    formatting::format_switch,
    types::CommandMetadata,
};

/// Command to switch the modem radio on or off
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

        self.context.cellular.set_powered(&path, powered).await?;

        Ok(format!("Modem {path} powered {}", format_switch(powered)))
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "power".to_string(),
            description: "Power the modem on or off".to_string(),
            category: "modem".to_string(),
            args: vec![switch_arg("on or off"), CommandArg::modem()],
            examples: vec![
                "connui-cellular modem power on".to_string(),
                "connui-cellular modem power off /ril_0".to_string(),
            ],
        }
    }
}
