use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    cli::{
        CliContext, CliError, Command, CommandArg, CommandResult,
        formatting::{format_field, format_header},
        types::CommandMetadata,
    },
    services::ofono::{SimState, SimStatus},
};

#[derive(Serialize)]
struct SimReport {
    status: SimStatus,
    #[serde(flatten)]
    state: SimState,
}

/// Command to show SIM presence, lock status and remaining attempts
pub struct StatusCommand {
    context: Arc<CliContext>,
}

impl StatusCommand {
    /// Creates a new StatusCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl Command for StatusCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let path = self.context.modem(args.first()).await?;
        let state = self
            .context
            .cellular
            .sim_state(&path)
            .ok_or_else(|| CliError::ServiceError {
                service: "Cellular".to_string(),
                details: format!("Modem {path} has no SIM manager"),
            })?;

        let report = SimReport {
            status: state.status(),
            state,
        };

        self.context.render(&report, |report| {
            let retries: Vec<String> = report
                .state
                .retries
                .iter()
                .map(|(code, left)| format!("{code} {left}"))
                .collect();
            let locks: Vec<String> = report
                .state
                .locked_pins
                .iter()
                .map(ToString::to_string)
                .collect();
            let home = format!("{}{}", report.state.mcc, report.state.mnc);

            [
                format_header(&format!("SIM on {path}")),
                format_field("Status", report.status),
                format_field("Provider", &report.state.spn),
                format_field("Home network", home),
                format_field("IMSI", &report.state.imsi),
                format_field("Retries", retries.join(", ")),
                format_field("Locks", locks.join(", ")),
            ]
            .join("\n")
        })
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "status".to_string(),
            description: "Show SIM status and remaining code attempts".to_string(),
            category: "sim".to_string(),
            args: vec![CommandArg::modem()],
            examples: vec![
                "connui-cellular sim status".to_string(),
                "connui-cellular --json sim status /ril_0".to_string(),
            ],
        }
    }
}
