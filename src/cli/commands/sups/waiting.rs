use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::is_modem_path;
use crate::cli::{
    ArgType, CliContext, Command, CommandArg, CommandResult, commands::parse_switch,
    formatting::format_switch, types::CommandMetadata,
};

/// Command to query or change call waiting
///
/// The request is sent to the network, so it is queued until the modem's
/// supplementary services come up.
pub struct WaitingCommand {
    context: Arc<CliContext>,
}

impl WaitingCommand {
    /// Creates a new WaitingCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for WaitingCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let (state, modem) = match args.first() {
            Some(first) if !is_modem_path(first) => {
                (Some(parse_switch("state", first)?), args.get(1))
            }
            _ => (None, args.first()),
        };
        let path = self.context.modem(modem).await?;
        let cellular = &self.context.cellular;

        let enabled = match state {
            Some(enabled) => cellular.set_call_waiting(&path, enabled).await?,
            None => cellular.call_waiting(&path).await?,
        };

        self.context.render(&json!({ "enabled": enabled }), |_| {
            format!("Call waiting on {path} is {}", format_switch(enabled))
        })
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "waiting".to_string(),
            description: "Show call waiting, or switch it on or off".to_string(),
            category: "sups".to_string(),
            args: vec![
                CommandArg {
                    name: "state".to_string(),
                    description: "on or off; omit to query".to_string(),
                    required: false,
                    value_type: ArgType::Boolean,
                },
                CommandArg::modem(),
            ],
            examples: vec![
                "connui-cellular sups waiting".to_string(),
                "connui-cellular sups waiting on /ril_0".to_string(),
            ],
        }
    }
}
