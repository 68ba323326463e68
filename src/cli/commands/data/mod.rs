mod power;
mod roaming;
mod status;

pub use power::PowerCommand;
pub use roaming::RoamingCommand;
pub use status::StatusCommand;

use std::sync::Arc;

use crate::cli::{CliContext, CommandRegistry};

/// Registers the packet data commands in the "data" category.
pub fn register_commands(registry: &mut CommandRegistry, context: &Arc<CliContext>) {
    const CATEGORY_NAME: &str = "data";

    registry.register_command(CATEGORY_NAME, Box::new(StatusCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(PowerCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(RoamingCommand::new(context.clone())));
}
