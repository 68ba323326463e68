mod forwarding;
mod waiting;

pub use forwarding::ForwardingCommand;
pub use waiting::WaitingCommand;

use std::sync::Arc;

use crate::{
    cli::{CliContext, CommandRegistry, formatting::format_field},
    services::ofono::{CallForwarding, ForwardingKind},
};

/// Registers the supplementary service commands in the "sups" category.
pub fn register_commands(registry: &mut CommandRegistry, context: &Arc<CliContext>) {
    const CATEGORY_NAME: &str = "sups";

    registry.register_command(CATEGORY_NAME, Box::new(WaitingCommand::new(context.clone())));
    registry.register_command(CATEGORY_NAME, Box::new(ForwardingCommand::new(context.clone())));
}

/// Modem paths are D-Bus object paths and always start with a slash.
fn is_modem_path(arg: &str) -> bool {
    arg.starts_with('/')
}

fn forwarding_lines(forwarding: &CallForwarding) -> String {
    ForwardingKind::ALL
        .iter()
        .map(|kind| {
            let condition = forwarding.condition(*kind);
            let value = match (condition.enabled, condition.timeout) {
                (false, _) => "off".to_string(),
                (true, Some(timeout)) => format!("{} after {timeout}s", condition.number),
                (true, None) => condition.number.clone(),
            };
            format_field(&kind.to_string(), value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
