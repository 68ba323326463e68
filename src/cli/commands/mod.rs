pub mod data;
pub mod modem;
pub mod monitor;
pub mod net;
pub mod sim;
pub mod sups;

use crate::cli::{ArgType, CliError, CommandArg};

/// Parse an on/off style switch argument.
///
/// # Errors
/// Returns `CliError::InvalidArgument` for anything but on/off, true/false, 1/0 or yes/no.
pub(crate) fn parse_switch(arg: &str, value: &str) -> Result<bool, CliError> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        _ => Err(CliError::InvalidArgument {
            arg: arg.to_string(),
            reason: format!("expected on or off, got '{value}'"),
        }),
    }
}

/// Required on/off argument named `state`.
pub(crate) fn switch_arg(description: &str) -> CommandArg {
    CommandArg {
        name: "state".to_string(),
        description: description.to_string(),
        required: true,
        value_type: ArgType::Boolean,
    }
}

/// Positional argument `index`, named `name` in errors.
///
/// # Errors
/// Returns `CliError::InvalidArguments` when the argument is missing.
pub(crate) fn required<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str, CliError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| CliError::InvalidArguments(format!("Missing argument '{name}'")))
}
