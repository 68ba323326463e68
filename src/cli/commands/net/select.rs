use std::sync::Arc;

use async_trait::async_trait;

use crate::cli::{
    ArgType, CliContext, CliError, Command, CommandArg, CommandResult, commands::required,
    types::CommandMetadata,
};

/// Command to register on a given operator or return to automatic selection
pub struct SelectCommand {
    context: Arc<CliContext>,
}

impl SelectCommand {
    /// Creates a new SelectCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for SelectCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let target = required(args, 0, "operator")?;
        let path = self.context.modem(args.get(1)).await?;
        let cellular = &self.context.cellular;

        if target == "auto" {
            cellular.register_auto(&path).await?;
            return Ok(format!("Modem {path} selects its operator automatically"));
        }

        let operator = cellular
            .operators(&path, false)
            .await?
            .into_iter()
            .find(|operator| {
                operator.path == target
                    || operator.name.eq_ignore_ascii_case(target)
                    || format!("{}{}", operator.mcc, operator.mnc) == target
            })
            .ok_or_else(|| CliError::InvalidArgument {
                arg: "operator".to_string(),
                reason: format!("No known operator matches '{target}'"),
            })?;

        cellular.select_operator(&path, &operator).await?;

        Ok(format!("Modem {path} registered on {}", operator.name))
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "select".to_string(),
            description: "Register on an operator (path, name or MCC+MNC) or 'auto'".to_string(),
            category: "net".to_string(),
            args: vec![
                CommandArg {
                    name: "operator".to_string(),
                    description: "Operator path, name, MCC+MNC, or 'auto'".to_string(),
                    required: true,
                    value_type: ArgType::String,
                },
                CommandArg::modem(),
            ],
            examples: vec![
                "connui-cellular net select 24491".to_string(),
                "connui-cellular net select auto".to_string(),
            ],
        }
    }
}
