use std::sync::Arc;

use async_trait::async_trait;

use super::{forwarding_lines, is_modem_path};
use crate::{
    cli::{
        ArgType, CliContext, CliError, Command, CommandArg, CommandResult,
        formatting::format_header, types::CommandMetadata,
    },
    services::ofono::ForwardingKind,
};

enum Request<'a> {
    Query,
    Register(ForwardingKind, &'a str),
    Erase(ForwardingKind),
}

/// Command to query, register or erase call forwarding
pub struct ForwardingCommand {
    context: Arc<CliContext>,
}

impl ForwardingCommand {
    /// Creates a new ForwardingCommand
    pub fn new(context: Arc<CliContext>) -> Self {
        Self { context }
    }

    fn parse(args: &[String]) -> Result<(Request<'_>, Option<&String>), CliError> {
        let Some(first) = args.first().filter(|arg| !is_modem_path(arg)) else {
            return Ok((Request::Query, args.first()));
        };

        let kind = ForwardingKind::parse(first).ok_or_else(|| CliError::InvalidArgument {
            arg: "condition".to_string(),
            reason: format!("expected busy, no-reply or unreachable, got '{first}'"),
        })?;

        let request = match args.get(1).map(String::as_str) {
            Some("erase" | "off") => Request::Erase(kind),
            Some(number) => Request::Register(kind, number),
            None => {
                return Err(CliError::InvalidArguments(
                    "Missing argument 'number'".to_string(),
                ));
            }
        };

        Ok((request, args.get(2)))
    }
}

#[async_trait]
impl Command for ForwardingCommand {
    async fn execute(&self, args: &[String]) -> CommandResult {
        let (request, modem) = Self::parse(args)?;
        let path = self.context.modem(modem).await?;
        let cellular = &self.context.cellular;

        let forwarding = match request {
            Request::Query => cellular.call_forwarding(&path).await?,
            Request::Register(kind, number) => {
                cellular
                    .set_call_forwarding(&path, kind, Some(number))
                    .await?
            }
            Request::Erase(kind) => cellular.set_call_forwarding(&path, kind, None).await?,
        };

        self.context.render(&forwarding, |forwarding| {
            format!(
                "{}\n{}",
                format_header(&format!("Call forwarding on {path}")),
                forwarding_lines(forwarding)
            )
        })
    }

    fn metadata(&self) -> CommandMetadata {
        CommandMetadata {
            name: "forwarding".to_string(),
            description: "Show call forwarding, or register or erase one condition".to_string(),
            category: "sups".to_string(),
            args: vec![
                CommandArg {
                    name: "condition".to_string(),
                    description: "busy, no-reply or unreachable; omit to query".to_string(),
                    required: false,
                    value_type: ArgType::String,
                },
                CommandArg {
                    name: "number".to_string(),
                    description: "Number to forward to, or 'erase'".to_string(),
                    required: false,
                    value_type: ArgType::String,
                },
                CommandArg::modem(),
            ],
            examples: vec![
                "connui-cellular sups forwarding".to_string(),
                "connui-cellular sups forwarding busy +358401234567".to_string(),
                "connui-cellular sups forwarding no-reply erase".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_arguments_is_a_query() {
        let (request, modem) = ForwardingCommand::parse(&[]).unwrap();

        assert!(matches!(request, Request::Query));
        assert!(modem.is_none());
    }

    #[test]
    fn leading_path_is_a_query_on_that_modem() {
        let args = args(&["/ril_0"]);
        let (request, modem) = ForwardingCommand::parse(&args).unwrap();

        assert!(matches!(request, Request::Query));
        assert_eq!(modem.map(String::as_str), Some("/ril_0"));
    }

    #[test]
    fn erase_and_register_are_told_apart() {
        let erase = args(&["no-reply", "erase"]);
        let register = args(&["busy", "+3581234", "/phonesim"]);

        assert!(matches!(
            ForwardingCommand::parse(&erase).unwrap().0,
            Request::Erase(ForwardingKind::NoReply)
        ));
        let (request, modem) = ForwardingCommand::parse(&register).unwrap();
        assert!(matches!(request, Request::Register(ForwardingKind::Busy, "+3581234")));
        assert_eq!(modem.map(String::as_str), Some("/phonesim"));
    }

    #[test]
    fn unknown_condition_is_rejected() {
        let args = args(&["sometimes", "123"]);

        assert!(matches!(
            ForwardingCommand::parse(&args),
            Err(CliError::InvalidArgument { .. })
        ));
    }
}
