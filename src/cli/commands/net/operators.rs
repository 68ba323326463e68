use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    cli::{
        ArgType, CliContext, CliError, Command, CommandArg, CommandResult,
        formatting::{format_command, format_description},
        types::CommandMetadata,
    },
    services::ofono::OperatorStatus,
};

/// Command to list known operators, optionally scanning for new ones
///
/// A scan can take a minute; the listing is returned by the network
/// registration interface without a scan.
pub struct OperatorsCommand {
    context: Arc<CliContext>,
}

impl OperatorsCommand {
    /// Creates a new OperatorsCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for OperatorsCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let (scan, modem) = match args.first().map(String::as_str) {
            Some("scan") => (true, args.get(1)),
            Some(other) if args.len() > 1 => {
                return Err(CliError::InvalidArgument {
                    arg: "scan".to_string(),
                    reason: format!("expected 'scan', got '{other}'"),
                });
            }
            _ => (false, args.first()),
        };
        let path = self.context.modem(modem).await?;

        let operators = self.context.cellular.operators(&path, scan).await?;

        self.context.render(&operators, |operators| {
            if operators.is_empty() {
                return "No operators found".to_string();
            }

            operators
                .iter()
                .map(|operator| {
                    let marker = match operator.status {
                        OperatorStatus::Current => "*",
                        OperatorStatus::Forbidden => "!",
                        _ => " ",
                    };
                    format!(
                        "{marker} {} {}{} {} {}",
                        format_command(&operator.name),
                        operator.mcc,
                        operator.mnc,
                        operator.best_rat(),
                        format_description(&operator.path),
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "operators".to_string(),
            description: "List operators; 'scan' searches for new ones first".to_string(),
            category: "net".to_string(),
            args: vec![
                CommandArg {
                    name: "scan".to_string(),
                    description: "Literal 'scan' to search the air".to_string(),
                    required: false,
                    value_type: ArgType::String,
                },
                CommandArg::modem(),
            ],
            examples: vec![
                "connui-cellular net operators".to_string(),
                "connui-cellular net operators scan /ril_0".to_string(),
            ],
        }
    }
}
