use std::sync::Arc;

use async_trait::async_trait;

use crate::cli::{
    CliContext, Command, CommandArg, CommandResult,
    commands::{parse_switch, required, switch_arg},
    formatting::format_switch,
    types::CommandMetadata,
};

/// Command to allow or forbid packet data while roaming
pub struct RoamingCommand {
    context: Arc<CliContext>,
}

impl RoamingCommand {
    /// Creates a new RoamingCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for RoamingCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let allowed = parse_switch("state", required(args, 0, "state")?)?;
        let path = self.context.modem(args.get(1)).await?;

        self.context
            .cellular
            .set_roaming_allowed(&path, allowed)
            .await?;

        Ok(format!("Data roaming on {path} {}", format_switch(allowed)))
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "roaming".to_string(),
            description: "Allow or forbid data roaming".to_string(),
            category: "data".to_string(),
            args: vec![switch_arg("on or off"), CommandArg::modem()],
            examples: vec![
                "connui-cellular data roaming on".to_string(),
                "connui-cellular data roaming off /ril_0".to_string(),
            ],
        }
    }
}
