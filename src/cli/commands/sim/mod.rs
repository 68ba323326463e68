mod change_pin;
mod lock;
mod status;
mod terminal;
mod unlock;

pub use change_pin::ChangePinCommand;
pub use lock::LockCommand;
pub use status::StatusCommand;
pub use terminal::TerminalUi;
pub use unlock::UnlockCommand;

use std::sync::Arc;

use crate::{
    cli::{CliContext, CliError, CommandRegistry},
    config::PinConfig,
    services::{ofono::ModemPath, pin::CodeUi},
};

/// Registers the SIM commands in the "sim" category.
pub fn register_commands(registry: &mut CommandRegistry, context: &Arc<CliContext>) {
    const CATEGORY_NAME: &str = "sim";

    registry.register_command(CATEGORY_NAME, Box::new(StatusCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(UnlockCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(ChangePinCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(LockCommand::new(context.clone())));
}

/// Start an interactive code session following `path`.
async fn start_session(context: &CliContext, path: &ModemPath) -> Result<CodeUi, CliError> {
    let config = PinConfig {
        modem: Some(path.to_string()),
        ..context.config.pin.clone()
    };

    Ok(CodeUi::init(&context.cellular, Arc::new(TerminalUi::new()), &config, false).await?)
}
