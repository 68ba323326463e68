use std::{collections::BTreeMap, sync::Arc};

use super::{
    CliContext, CliError, Command,
    commands::{data, modem, monitor, net, sim, sups},
    types::CommandMetadata,
};

/// Registry for CLI commands organized by category.
///
/// ```text
/// registry
/// ├── modem    list, info, power, online
/// ├── sim      status, unlock, change-pin
/// ├── net      status, operators, select
/// ├── data     status, power, roaming
/// ├── sups     waiting, forwarding
/// └── monitor  watch
/// ```
pub struct CommandRegistry {
    /// category name -> (command name -> command implementation)
    categories: BTreeMap<String, BTreeMap<String, Box<dyn Command>>>,
    context: Arc<CliContext>,
}

impl CommandRegistry {
    /// Creates a new empty command registry.
    pub fn new(context: Arc<CliContext>) -> Self {
        Self {
            categories: BTreeMap::new(),
            context,
        }
    }

    /// Registers a command in the specified category.
    ///
    /// The command's metadata name is its key; registering the same name
    /// twice replaces the earlier command.
    pub fn register_command(&mut self, category: &str, command: Box<dyn Command>) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(command.metadata().name, command);
    }

    /// Executes a command by category and name with the provided arguments.
    ///
    /// # Errors
    ///
    /// Returns `CliError::CommandNotFound` if the category or command does
    /// not exist, `CliError::InvalidArguments` for a wrong argument count,
    /// and whatever the command itself returns.
    pub async fn execute(
        &self,
        category: &str,
        command_name: &str,
        args: &[String],
    ) -> Result<String, CliError> {
        let command = self.find(category, command_name)?;
        Self::validate_args(&command.metadata(), args)?;

        command.execute(args).await
    }

    /// Looks up a command.
    ///
    /// # Errors
    /// Returns `CliError::CommandNotFound` if the category or command does not exist.
    pub fn find(&self, category: &str, command_name: &str) -> Result<&dyn Command, CliError> {
        let found_category = self.categories.get(category).ok_or_else(|| {
            CliError::CommandNotFound(format!("Failed to find category '{category}'"))
        })?;

        found_category
            .get(command_name)
            .map(Box::as_ref)
            .ok_or_else(|| {
                CliError::CommandNotFound(format!("Failed to find command '{command_name}'"))
            })
    }

    /// Lists all registered commands organized by category, sorted by name.
    pub fn list_commands(&self) -> Vec<(String, Vec<String>)> {
        self.categories
            .iter()
            .map(|(category, commands)| (category.clone(), commands.keys().cloned().collect()))
            .collect()
    }

    /// Metadata of every command in `category`.
    pub fn category_metadata(&self, category: &str) -> Option<Vec<CommandMetadata>> {
        self.categories
            .get(category)
            .map(|commands| commands.values().map(|command| command.metadata()).collect())
    }

    fn validate_args(metadata: &CommandMetadata, args: &[String]) -> Result<(), CliError> {
        let required_count = metadata.args.iter().filter(|arg| arg.required).count();
        let total_count = metadata.args.len();

        if args.len() < required_count {
            return Err(CliError::InvalidArguments(format!(
                "Expected at least {} arguments, got {}",
                required_count,
                args.len(),
            )));
        }

        if args.len() > total_count {
            return Err(CliError::InvalidArguments(format!(
                "Expected at most {} arguments, got {}",
                total_count,
                args.len(),
            )));
        }

        Ok(())
    }

    /// Registers all available CLI commands in their respective categories.
    pub fn register_all_commands(&mut self) {
        let context = Arc::clone(&self.context);
        modem::register_commands(self, &context);
        sim::register_commands(self, &context);
        net::register_commands(self, &context);
        data::register_commands(self, &context);
        sups::register_commands(self, &context);
        monitor::register_commands(self, &context);
    }
}
