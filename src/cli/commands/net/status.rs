use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{
    cli::{
        CliContext, CliError, Command, CommandArg, CommandResult,
        formatting::{format_bars, format_field, format_header},
        types::CommandMetadata,
    },
    services::ofono::{NetRegState, Rat},
};

#[derive(Serialize)]
struct NetReport {
    rat: Rat,
    bars: u8,
    hsdpa: bool,
    #[serde(flatten)]
    state: NetRegState,
}

/// Command to show registration status, operator and signal strength
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
            .net_state(&path)
            .ok_or_else(|| CliError::ServiceError {
                service: "Cellular".to_string(),
                details: format!("Modem {path} is not registered with a network"),
            })?;

        let report = NetReport {
            rat: state.rat(),
            bars: state.signal_bars(),
            hsdpa: state.hsdpa_allocated(),
            state,
        };

        self.context.render(&report, |report| {
            let state = &report.state;
            let network = format!("{}{}", state.mcc, state.mnc);
            let technology = match (&state.technology, report.hsdpa) {
                (Some(technology), true) => format!("{technology} ({}, HSDPA)", report.rat),
                (Some(technology), false) => format!("{technology} ({})", report.rat),
                (None, _) => String::new(),
            };

            [
                format_header(&format!("Network on {path}")),
                format_field("Status", state.status),
                format_field("Operator", &state.name),
                format_field("Network", network),
                format_field("Technology", technology),
                format_field(
                    "Signal",
                    format!("{} {}%", format_bars(report.bars), state.strength),
                ),
                format_field("Cell", format!("{:04X}:{:X}", state.lac, state.cell_id)),
                format_field("Selection", state.mode),
            ]
            .join("\n")
        })
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "status".to_string(),
            description: "Show network registration and signal strength".to_string(),
            category: "net".to_string(),
            args: vec![CommandArg::modem()],
            examples: vec!["connui-cellular net status".to_string()],
        }
    }
}
