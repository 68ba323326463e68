mod operators;
mod select;
mod status;

pub use operators::OperatorsCommand;
pub use select::SelectCommand;
pub use status::StatusCommand;

use std::sync::Arc;

use crate::cli::{CliContext, CommandRegistry};

/// Registers the network registration commands in the "net" category.
pub fn register_commands(registry: &mut CommandRegistry, context: &Arc<CliContext>) {
    const CATEGORY_NAME: &str = "net";

    registry.register_command(CATEGORY_NAME, Box::new(StatusCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(OperatorsCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(SelectCommand::new(context.clone())));
}
