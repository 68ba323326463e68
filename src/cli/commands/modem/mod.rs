mod info;
mod list;
mod online;
mod power;

pub use info::InfoCommand;
pub use list::ListCommand;
pub use online::OnlineCommand;
pub use power::PowerCommand;

use std::sync::Arc;

use crate::cli::{CliContext, CommandRegistry};

/// Registers the modem commands in the "modem" category.
pub fn register_commands(registry: &mut CommandRegistry, context: &Arc<CliContext>) {
    const CATEGORY_NAME: &str = "modem";

    registry.register_command(CATEGORY_NAME, Box::new(ListCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(InfoCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(PowerCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(OnlineCommand::new(context.clone())));
}
