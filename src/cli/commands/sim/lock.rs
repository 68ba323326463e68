use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    cli::{
        ArgType, CliContext, Command, CommandArg, CommandResult,
        commands::{parse_switch, required, switch_arg},
        types::CommandMetadata,
    },
    services::ofono::SecurityCode,
};

/// Command to require or stop requiring the PIN at power-up
pub struct LockCommand {
    context: Arc<CliContext>,
}

impl LockCommand {
    /// Creates a new LockCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for LockCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let lock = parse_switch("state", required(args, 0, "state")?)?;
        let pin = required(args, 1, "pin")?;
        let path = self.context.modem(args.get(2)).await?;
        let cellular = &self.context.cellular;

        if lock {
            cellular.lock_pin(&path, SecurityCode::Pin, pin).await?;
            Ok(format!("PIN required at power-up on {path}"))
        } else {
            cellular.unlock_pin(&path, SecurityCode::Pin, pin).await?;
            Ok(format!("PIN no longer required on {path}"))
        }
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "lock".to_string(),
            description: "Enable or disable the PIN lock".to_string(),
            category: "sim".to_string(),
            args: vec![
                switch_arg("on to require the PIN at power-up"),
                CommandArg {
                    name: "pin".to_string(),
                    description: "Current PIN".to_string(),
                    required: true,
                    value_type: ArgType::Number,
                },
                CommandArg::modem(),
            ],
            examples: vec![
                "connui-cellular sim lock on 1234".to_string(),
                "connui-cellular sim lock off 1234 /ril_0".to_string(),
            ],
        }
    }
}
