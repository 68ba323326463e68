use std::sync::Arc;

use async_trait::async_trait;

use crate::cli::{
    CliContext, CliError, Command, CommandArg, CommandResult,
    formatting::{format_field, format_header, format_switch},
    types::CommandMetadata,
};

/// Command to show packet data attachment, bearer and roaming policy
pub struct StatusCommand {
    context: Arc<CliContext>,
}

impl StatusCommand {
    /// Creates a new StatusCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for StatusCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let path = self.context.modem(args.first()).await?;
        let state = self
            .context
            .cellular
            .connmgr_state(&path)
            .ok_or_else(|| CliError::ServiceError {
                service: "Cellular".to_string(),
                details: format!("Modem {path} has no connection manager"),
            })?;

        self.context.render(&state, |state| {
            [
                format_header(&format!("Packet data on {path}")),
                format_field("Attached", format_switch(state.attached)),
                format_field("Powered", format_switch(state.powered)),
                format_field("Suspended", format_switch(state.suspended)),
                format_field("Roaming", format_switch(state.roaming_allowed)),
                format_field("Bearer", state.bearer),
            ]
            .join("\n")
        })
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "status".to_string(),
            description: "Show packet data state".to_string(),
            category: "data".to_string(),
            args: vec![CommandArg::modem()],
            examples: vec!["connui-cellular data status".to_string()],
        }
    }
}
