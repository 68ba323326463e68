mod watch;

pub use watch::WatchCommand;

use std::sync::Arc;

use crate::cli::{CliContext, CommandRegistry};

/// Registers the monitoring commands in the "monitor" category.
pub fn register_commands(registry: &mut CommandRegistry, context: &Arc<CliContext>) {
    const CATEGORY_NAME: &str = "monitor";

    registry.register_command(CATEGORY_NAME, Box::new(WatchCommand::new(context.clone())));
}
