//! Unit tests for CLI module
//!
//! Tests command registry, argument handling, formatting, and a few
//! commands end to end against the in-memory modem daemon.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use crate::{
    cli::{
        CliContext, CliError, CliService, CommandRegistry, OutputFormat,
        commands::parse_switch,
        formatting::{format_bars, format_field, format_switch},
    },
    config::Config,
    services::ofono::{CellularContext, Interface, MemoryBus},
};

const MODEM: &str = "/phonesim";

fn bus_with_modem() -> Arc<MemoryBus> {
    let bus = Arc::new(MemoryBus::new());
    bus.add_modem(
        MODEM,
        &[
            Interface::SimManager,
            Interface::NetworkRegistration,
            Interface::ConnectionManager,
            Interface::SupplementaryServices,
        ],
    );
    bus
}

fn service(bus: &Arc<MemoryBus>, output: OutputFormat) -> (CliService, CellularContext) {
    let cellular = CellularContext::new(bus.clone());
    let context = CliContext::new(cellular.clone(), Config::default(), output);
    (CliService::new(context), cellular)
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[test]
fn parse_switch_accepts_common_spellings() {
    assert!(parse_switch("state", "on").unwrap());
    assert!(parse_switch("state", "TRUE").unwrap());
    assert!(!parse_switch("state", "off").unwrap());
    assert!(!parse_switch("state", "0").unwrap());
    assert!(matches!(
        parse_switch("state", "maybe"),
        Err(CliError::InvalidArgument { .. })
    ));
}

#[test]
fn format_helpers() {
    assert_eq!(format_switch(true), "on");
    assert_eq!(format_field("Operator", "Phonesim"), "  Operator       Phonesim");
    assert_eq!(format_field("IMSI", ""), "  IMSI           -");
    assert_eq!(format_bars(0), "▯▯▯▯▯");
    assert_eq!(format_bars(9), "▮▮▮▮▮");
}

#[test]
fn registry_lists_every_category_sorted() {
    let bus = Arc::new(MemoryBus::new());
    let context = CliContext::new(
        CellularContext::new(bus),
        Config::default(),
        OutputFormat::Text,
    );
    let mut registry = CommandRegistry::new(Arc::new(context));
    registry.register_all_commands();

    let categories: Vec<String> = registry
        .list_commands()
        .into_iter()
        .map(|(category, _)| category)
        .collect();

    assert_eq!(categories, vec!["data", "modem", "monitor", "net", "sim", "sups"]);
    assert!(registry.find("sim", "change-pin").is_ok());
    assert!(matches!(
        registry.find("audio", "volume"),
        Err(CliError::CommandNotFound(_))
    ));
}

#[tokio::test]
async fn too_many_arguments_are_rejected_before_running() {
    let bus = bus_with_modem();
    let (service, cellular) = service(&bus, OutputFormat::Text);

    let result = service
        .execute_command("modem", "list", &args(&["extra"]))
        .await;

    assert!(matches!(result, Err(CliError::InvalidArguments(_))));
    assert!(!cellular.is_running().await);
}

#[tokio::test]
async fn help_lists_categories() {
    let bus = bus_with_modem();
    let (service, _) = service(&bus, OutputFormat::Text);

    let help = service.execute_command("help", "", &[]).await.unwrap();
    assert!(help.contains("sups"));

    let sim_help = service.execute_command("sim", "", &[]).await.unwrap();
    assert!(sim_help.contains("unlock"));
    assert!(sim_help.contains("change-pin"));
}

#[tokio::test]
async fn modem_list_shows_simulated_modem() {
    let bus = bus_with_modem();
    let (service, _) = service(&bus, OutputFormat::Text);

    let output = service.execute_command("modem", "list", &[]).await.unwrap();
    service.shutdown().await;

    assert!(output.contains("Found 1 modem(s)"));
    assert!(output.contains(MODEM));
}

#[tokio::test]
async fn unknown_modem_argument_is_rejected() {
    let bus = bus_with_modem();
    let (service, _) = service(&bus, OutputFormat::Text);

    let result = service
        .execute_command("net", "status", &args(&["/nope"]))
        .await;
    service.shutdown().await;

    assert!(matches!(result, Err(CliError::InvalidArgument { .. })));
}

#[tokio::test]
async fn roaming_switch_reaches_the_cache() {
    let bus = bus_with_modem();
    let (service, cellular) = service(&bus, OutputFormat::Text);

    service
        .execute_command("data", "roaming", &args(&["on"]))
        .await
        .unwrap();
    cellular.settle().await;

    let state = cellular.connmgr_state(&MODEM.into()).unwrap();
    service.shutdown().await;

    assert!(state.roaming_allowed);
}

#[tokio::test]
async fn call_waiting_as_json() {
    let bus = bus_with_modem();
    let (service, _) = service(&bus, OutputFormat::Json);

    let output = service
        .execute_command("sups", "waiting", &args(&["on", MODEM]))
        .await
        .unwrap();
    service.shutdown().await;

    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["enabled"], serde_json::Value::Bool(true));
    assert_eq!(bus.initiated().last().unwrap().1, "*43#");
}
