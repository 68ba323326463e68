use std::sync::Arc;

use super::{
    CliContext, CliError, CommandRegistry,
    formatting::{
        format_category, format_command, format_description, format_header, format_subheader,
        format_usage,
    },
};

/// High-level service for managing and executing CLI commands.
///
/// Provides a unified interface for command registration, discovery, and execution.
/// Commands are organized by category and can be listed or executed by name.
pub struct CliService {
    registry: CommandRegistry,
    context: Arc<CliContext>,
}

impl CliService {
    /// Creates a new CLI service with all available commands registered.
    ///
    /// The context is shared by every command.
    pub fn new(context: CliContext) -> Self {
        let context = Arc::new(context);
        let mut registry = CommandRegistry::new(Arc::clone(&context));
        registry.register_all_commands();

        CliService { registry, context }
    }

    /// Executes a command by category and name with the provided arguments.
    ///
    /// `help` as the category, or a category without a command, prints help
    /// text instead.
    ///
    /// # Errors
    /// Returns `CliError::CommandNotFound` if the command doesn't exist in the category.
    /// Returns the command's own error if it fails during execution.
    pub async fn execute_command(
        &self,
        category: &str,
        command_name: &str,
        args: &[String],
    ) -> Result<String, CliError> {
        if category == "help" {
            return match command_name {
                "" => Ok(self.help()),
                category => self.category_help(category),
            };
        }

        if command_name.is_empty() || command_name == "help" {
            return self.category_help(category);
        }

        self.registry.execute(category, command_name, args).await
    }

    /// Lists all available commands organized by category.
    ///
    /// Returns a vector of tuples where each tuple contains a category name
    /// and a vector of command names within that category.
    pub fn list_all(&self) -> Vec<(String, Vec<String>)> {
        self.registry.list_commands()
    }

    /// Stop monitoring once all commands are done.
    pub async fn shutdown(&self) {
        self.context.cellular.destroy().await;
    }

    fn help(&self) -> String {
        let mut lines = vec![
            format_header("connui-cellular"),
            String::new(),
            format_subheader("Usage:"),
            format!("  connui-cellular [--json] {}", format_usage("<category> <command> [args...]")),
            String::new(),
            format_subheader("Categories:"),
        ];

        for (category, commands) in self.list_all() {
            lines.push(format!(
                "  {:<18} {}",
                format_category(&category),
                format_description(&commands.join(", "))
            ));
        }

        lines.join("\n")
    }

    fn category_help(&self, category: &str) -> Result<String, CliError> {
        let metadata = self.registry.category_metadata(category).ok_or_else(|| {
            CliError::CommandNotFound(format!("Failed to find category '{category}'"))
        })?;

        let mut lines = vec![format_header(&format!("{category} commands")), String::new()];

        for command in metadata {
            let args: Vec<String> = command
                .args
                .iter()
                .map(|arg| {
                    if arg.required {
                        format!("<{}>", arg.name)
                    } else {
                        format!("[{}]", arg.name)
                    }
                })
                .collect();

            lines.push(format!(
                "  {} {}",
                format_command(&command.name),
                format_usage(&args.join(" "))
            ));
            lines.push(format!("      {}", format_description(&command.description)));

            for example in &command.examples {
                lines.push(format!("      {}", format_usage(example)));
            }
        }

        Ok(lines.join("\n"))
    }
}
