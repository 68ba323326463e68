use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    cli::{
        CliContext, Command, CommandResult,
        formatting::{format_command, format_description, format_switch},
        types::CommandMetadata,
    },
    services::ofono::{ModemPath, ModemState},
};

#[derive(Serialize)]
struct ModemEntry {
    path: ModemPath,
    #[serde(flatten)]
    state: ModemState,
}

/// Command to list all modems known to oFono
///
/// Shows each modem's path, model and power state
pub struct ListCommand {
    context: Arc<CliContext>,
}

impl ListCommand {
    /// Creates a new ListCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for ListCommand {
    async fn execute(&self, _args: &[String]) -> CommandResult {
        self.context.ready().await?;

        let cellular = &self.context.cellular;
        let entries: Vec<ModemEntry> = cellular
            .modems()
            .into_iter()
            .filter_map(|path| {
                let state = cellular.modem(&path)?;
                Some(ModemEntry { path, state })
            })
            .collect();

        self.context.render(&entries, |entries| {
            if entries.is_empty() {
                return "No modems found".to_string();
            }

            let mut output = format!("Found {} modem(s):\n", entries.len());
            for entry in entries {
                let name = format!("{} {}", entry.state.manufacturer, entry.state.model);
                output.push_str(&format!(
                    "\n  {} {}\n      powered {}, online {}",
                    format_command(entry.path.as_str()),
                    format_description(name.trim()),
                    format_switch(entry.state.powered),
                    format_switch(entry.state.online),
                ));
            }
            output
        })
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "list".to_string(),
            description: "List all modems".to_string(),
            category: "modem".to_string(),
            args: vec![],
            examples: vec![
                "connui-cellular modem list".to_string(),
                "connui-cellular --json modem list".to_string(),
            ],
        }
    }
}
