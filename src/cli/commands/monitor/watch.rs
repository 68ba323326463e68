use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, SecondsFormat};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

use crate::{
    cli::{
        ArgType, CliContext, CliError, Command, CommandArg, CommandResult, OutputFormat,
        formatting::{format_category, format_description, format_switch},
        types::CommandMetadata,
    },
    services::ofono::{
        CellularContext, CellularError, ConnMgrState, ModemPath, ModemState, NetRegState,
        SimState, SimStatus, Subscription,
    },
};

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Change {
    Modem { path: ModemPath, state: ModemState },
    Sim { path: ModemPath, state: SimState },
    Net { path: ModemPath, state: NetRegState },
    ConnMgr { path: ModemPath, state: ConnMgrState },
    CodeQuery { path: ModemPath, status: SimStatus },
}

impl Change {
    fn summary(&self) -> (&'static str, &ModemPath, String) {
        match self {
            Self::Modem { path, state } if !state.tracked => ("modem", path, "removed".to_string()),
            Self::Modem { path, state } => (
                "modem",
                path,
                format!(
                    "powered {}, online {}",
                    format_switch(state.powered),
                    format_switch(state.online)
                ),
            ),
            Self::Sim { path, state } => ("sim", path, state.status().to_string()),
            Self::Net { path, state } if !state.tracked => ("net", path, "gone".to_string()),
            Self::Net { path, state } => (
                "net",
                path,
                format!("{} {} {}%", state.status, state.name, state.strength),
            ),
            Self::ConnMgr { path, state } if !state.tracked => ("data", path, "gone".to_string()),
            Self::ConnMgr { path, state } => (
                "data",
                path,
                format!(
                    "attached {}, bearer {}",
                    format_switch(state.attached),
                    state.bearer
                ),
            ),
            Self::CodeQuery { path, status } => ("code", path, format!("{status} requested")),
        }
    }
}

#[derive(Serialize)]
struct Stamped {
    at: String,
    #[serde(flatten)]
    change: Change,
}

/// Command to print state changes as they happen
///
/// Runs until interrupted, or until the given number of changes was printed.
/// With `--json` every change is one JSON object per line.
pub struct WatchCommand {
    context: Arc<CliContext>,
}

impl WatchCommand {
    /// Creates a new WatchCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }

    async fn subscribe(
        cellular: &CellularContext,
        tx: &mpsc::UnboundedSender<Change>,
    ) -> Result<Vec<Subscription>, CellularError> {
        let mut subscriptions = Vec::with_capacity(5);

        let sender = tx.clone();
        subscriptions.push(
            cellular
                .register_modem_observer(move |path, state| {
                    let _ = sender.send(Change::Modem {
                        path: path.clone(),
                        state: state.clone(),
                    });
                })
                .await?,
        );

        let sender = tx.clone();
        subscriptions.push(
            cellular
                .register_sim_observer(move |path, state| {
                    let _ = sender.send(Change::Sim {
                        path: path.clone(),
                        state: state.clone(),
                    });
                })
                .await?,
        );

        let sender = tx.clone();
        subscriptions.push(
            cellular
                .register_net_observer(move |path, state| {
                    let _ = sender.send(Change::Net {
                        path: path.clone(),
                        state: state.clone(),
                    });
                })
                .await?,
        );

        let sender = tx.clone();
        subscriptions.push(
            cellular
                .register_connmgr_observer(move |path, state| {
                    let _ = sender.send(Change::ConnMgr {
                        path: path.clone(),
                        state: state.clone(),
                    });
                })
                .await?,
        );

        let sender = tx.clone();
        subscriptions.push(
            cellular
                .register_code_query_observer(move |path, status| {
                    let _ = sender.send(Change::CodeQuery {
                        path: path.clone(),
                        status,
                    });
                })
                .await?,
        );

        Ok(subscriptions)
    }

    fn line(&self, change: Change) -> Result<String, CliError> {
        let at = Local::now();

        match self.context.output {
            OutputFormat::Json => Ok(serde_json::to_string(&Stamped {
                at: at.to_rfc3339_opts(SecondsFormat::Millis, false),
                change,
            })?),
            OutputFormat::Text => {
                let (kind, path, summary) = change.summary();
                Ok(format!(
                    "{} {:<6} {} {}",
                    format_description(&at.format("%H:%M:%S%.3f").to_string()),
                    format_category(kind),
                    path,
                    summary
                ))
            }
        }
    }
}

#[async_trait]
impl Command for WatchCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let limit = args
            .first()
            .map(|count| {
                count.parse::<usize>().map_err(|_| CliError::InvalidArgument {
                    arg: "count".to_string(),
                    reason: format!("expected a number, got '{count}'"),
                })
            })
            .transpose()?;

        let cellular = &self.context.cellular;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriptions = Self::subscribe(cellular, &tx).await?;
        drop(tx);

        let mut printed = 0;
        let result = loop {
            if limit.is_some_and(|limit| printed >= limit) {
                break Ok(());
            }

            tokio::select! {
                change = rx.recv() => {
                    let Some(change) = change else {
                        break Ok(());
                    };
                    match self.line(change) {
                        Ok(line) => println!("{line}"),
                        Err(err) => break Err(err),
                    }
                    printed += 1;
                }
                signal = tokio::signal::ctrl_c() => {
                    break signal.map_err(CliError::from);
                }
            }
        };

        for subscription in subscriptions {
            if let Err(err) = cellular.close(subscription).await {
                warn!(error = %err, "Cannot close observer");
            }
        }

        result.map(|()| String::new())
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "watch".to_string(),
            description: "Print modem, SIM, network and data changes".to_string(),
            category: "monitor".to_string(),
            args: vec![CommandArg {
                name: "count".to_string(),
                description: "Stop after this many changes".to_string(),
                required: false,
                value_type: ArgType::Number,
            }],
            examples: vec![
                "connui-cellular monitor watch".to_string(),
                "connui-cellular --json monitor watch 10".to_string(),
            ],
        }
    }
}
