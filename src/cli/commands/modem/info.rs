use std::sync::Arc;

use async_trait::async_trait;

use crate::cli::{
    CliContext, CliError, Command, CommandArg, CommandResult,
    formatting::{format_field, format_header, format_switch},
    types::CommandMetadata,
};

/// Command to show everything cached about one modem
pub struct InfoCommand {
    context: Arc<CliContext>,
}

impl InfoCommand {
    /// Creates a new InfoCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for InfoCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let path = self.context.modem(args.first()).await?;
        let state = self
            .context
            .cellular
            .modem(&path)
            .ok_or_else(|| CliError::ServiceError {
                service: "Cellular".to_string(),
                details: format!("Modem {path} disappeared"),
            })?;

        self.context.render(&state, |state| {
            let interfaces: Vec<String> =
                state.interfaces.tracked().map(|i| i.to_string()).collect();

            [
                format_header(path.as_str()),
                format_field("Manufacturer", &state.manufacturer),
                format_field("Model", &state.model),
                format_field("Revision", &state.revision),
                format_field("Serial", &state.serial),
                format_field("Powered", format_switch(state.powered)),
                format_field("Online", format_switch(state.online)),
                format_field("Interfaces", interfaces.join(", ")),
                format_field("Emergency", state.emergency_numbers.join(", ")),
            ]
            .join("\n")
        })
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "info".to_string(),
            description: "Show modem details and advertised interfaces".to_string(),
            category: "modem".to_string(),
            args: vec![CommandArg::modem()],
            examples: vec![
                "connui-cellular modem info".to_string(),
                "connui-cellular modem info /ril_0".to_string(),
            ],
        }
    }
}
