//! Unit tests for config module
//!
//! Tests configuration types, defaults, serialization and file creation.

#![allow(clippy::unwrap_used)]

use std::fs;

use crate::config::{BusKind, Config, LogLevel, OFONO_SERVICE};

#[test]
fn config_default() {
    let config = Config::default();

    assert_eq!(config.general.log_level, LogLevel::Info);
    assert_eq!(config.ofono.bus, BusKind::System);
    assert_eq!(config.ofono.service, OFONO_SERVICE);
    assert_eq!(config.pin.emergency_numbers, vec!["112", "911"]);
    assert!(config.pin.correct_command.is_none());
}

#[test]
fn config_serialize_toml() {
    let config = Config::default();

    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("[general]"));
    assert!(toml_str.contains("[ofono]"));
    assert!(toml_str.contains("[pin]"));
}

#[test]
fn config_deserialize_toml() {
    let toml_str = r#"
        [general]
        log_level = "debug"

        [ofono]
        bus = "session"

        [pin]
        correct_command = "touch /tmp/pin-ok"
        modem = "/phonesim"
    "#;

    let config = Config::parse(toml_str, None).unwrap();

    assert_eq!(config.general.log_level, LogLevel::Debug);
    assert_eq!(config.ofono.bus, BusKind::Session);
    assert_eq!(config.ofono.service, OFONO_SERVICE);
    assert_eq!(config.pin.modem.as_deref(), Some("/phonesim"));
    assert_eq!(config.pin.emergency_numbers, vec!["112", "911"]);
}

#[test]
fn config_empty_toml() {
    let config = Config::parse("", None).unwrap();

    assert_eq!(config, Config::default());
}

#[test]
fn config_serialize_roundtrip() {
    let original = Config::default();

    let toml_str = toml::to_string(&original).unwrap();
    let deserialized = Config::parse(&toml_str, None).unwrap();

    assert_eq!(original, deserialized);
}

#[test]
fn config_invalid_toml() {
    let invalid_toml = r#"
        [general
        invalid syntax here
    "#;

    let result = Config::parse(invalid_toml, None);

    assert!(matches!(
        result,
        Err(crate::ConnuiError::TomlParseError { .. })
    ));
}

#[test]
fn config_wrong_value_type() {
    let result = Config::parse("[ofono]\nbus = \"carrier-pigeon\"\n", None);

    assert!(result.is_err());
}

#[test]
fn config_unknown_fields() {
    let toml_with_unknown = r#"
        [general]
        log_level = "info"
        unknown_field = "should be ignored"

        [unknown_section]
        some_field = "ignored"
    "#;

    let config = Config::parse(toml_with_unknown, None).unwrap();
    assert_eq!(config.general.log_level, LogLevel::Info);
}

#[test]
fn load_creates_missing_file_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = Config::load(&path).unwrap();

    assert_eq!(config, Config::default());
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("# connui-cellular configuration file"));
    assert!(written.contains("emergency_numbers"));
}

#[test]
fn load_reads_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[pin]\nemergency_numbers = [\"999\"]\n").unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.pin.emergency_numbers, vec!["999"]);
}
