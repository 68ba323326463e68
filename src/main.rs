//! connui-cellular - inspect and drive cellular modems through oFono.
//!
//! Every invocation connects to the modem daemon, waits for the initial
//! modem state, runs one command and disconnects again.

use std::{error::Error, path::PathBuf, process};

use clap::Parser;
use connui_cellular::{
    ConnuiError,
    cli::{CliContext, CliService, OutputFormat, formatting::format_error},
    config::Config,
    services::ofono::CellularContext,
    tracing_config,
};
use tracing::{debug, instrument};

#[derive(Parser, Debug)]
#[command(name = "connui-cellular", version)]
#[command(about = "Inspect and control cellular modems through oFono")]
struct Cli {
    /// Configuration file; defaults to the user configuration directory
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Also write logs to a daily rotated file
    #[arg(long)]
    log_file: bool,

    /// Category, command and command arguments, e.g. `sim status`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let _guard = if cli.log_file {
        Some(
            tracing_config::init_with_file(config.general.log_level)
                .map_err(|err| ConnuiError::Logging(err.to_string()))?,
        )
    } else {
        tracing_config::init(config.general.log_level)
            .map_err(|err| ConnuiError::Logging(err.to_string()))?;
        None
    };

    run_cli_command(cli, config).await
}

/// Executes one CLI command through the CliService.
///
/// The first trailing argument selects the category, the second the
/// command; the rest is passed to the command. No arguments print help.
///
/// # Errors
/// Returns error if the modem daemon cannot be reached.
#[instrument(skip_all)]
async fn run_cli_command(cli: Cli, config: Config) -> Result<(), Box<dyn Error>> {
    let cellular = CellularContext::ofono(&config.ofono).await?;
    let output = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let cli_service = CliService::new(CliContext::new(cellular, config, output));

    let category = cli.command.first().map(String::as_str).unwrap_or("help");
    let command = cli.command.get(1).map(String::as_str).unwrap_or("");
    let command_args = cli.command.get(2..).unwrap_or(&[]);
    debug!(category, command, "Running command");

    let result = cli_service
        .execute_command(category, command, command_args)
        .await;
    cli_service.shutdown().await;

    match result {
        Ok(output) => {
            if !output.trim().is_empty() {
                println!("{output}");
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format_error(&e.to_string()));
            process::exit(1);
        }
    }
}
