use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::Serialize;
use zbus::zvariant::{OwnedValue, Value};

use super::value;
use crate::services::ofono::CellularError;

/// One entry of a supplementary-service response dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SsSetting {
    /// String valued setting, e.g. a forwarded-to number.
    Text(String),
    /// Numeric setting, e.g. the no-reply timeout.
    Number(u32),
}

impl SsSetting {
    /// Text content, if this is a string setting.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }

    /// Numeric content, if this is a number setting.
    pub fn as_number(&self) -> Option<u32> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(_) => None,
        }
    }
}

/// Decoded result of `SupplementaryServices.Initiate`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SsReply {
    /// Result name, e.g. `CallForwarding` or `CallWaiting`.
    pub kind: String,
    /// Operation performed, e.g. `interrogation` or `activation`.
    pub operation: String,
    /// Result dictionary.
    pub settings: BTreeMap<String, SsSetting>,
}

impl SsReply {
    /// Create a reply with no settings.
    pub fn new(kind: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            operation: operation.into(),
            settings: BTreeMap::new(),
        }
    }

    /// Add a setting.
    pub fn with(mut self, key: impl Into<String>, setting: SsSetting) -> Self {
        self.settings.insert(key.into(), setting);
        self
    }

    /// Decode the variant returned alongside `kind`.
    ///
    /// The variant is a structure whose first field is the operation and
    /// whose last field is the settings dictionary.
    pub fn decode(kind: &str, reply: &Value<'_>) -> Option<Self> {
        let Value::Structure(structure) = value::unwrap(reply) else {
            return None;
        };

        let fields = structure.fields();
        let operation = fields.first().and_then(value::string)?;
        let dict = fields.last()?.try_clone().ok()?;
        let raw = HashMap::<String, OwnedValue>::try_from(dict).ok()?;

        let settings = raw
            .into_iter()
            .filter_map(|(key, setting)| {
                let setting = match value::string(&setting) {
                    Some(text) => SsSetting::Text(text),
                    None => SsSetting::Number(u32::try_from(value::uint(&setting)?).ok()?),
                };
                Some((key, setting))
            })
            .collect();

        Some(Self {
            kind: kind.to_owned(),
            operation,
            settings,
        })
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(SsSetting::as_text)
    }

    fn expect_kind(&self, kind: &str) -> Result<(), CellularError> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(CellularError::NotRecognized(self.kind.clone()))
        }
    }
}

/// Call forwarding conditions that can be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ForwardingKind {
    /// Forward when busy.
    Busy,
    /// Forward when not answered.
    NoReply,
    /// Forward when not reachable.
    Unreachable,
}

impl ForwardingKind {
    /// Every condition, in display order.
    pub const ALL: [ForwardingKind; 3] = [Self::Busy, Self::NoReply, Self::Unreachable];

    /// GSM service code.
    pub fn service_code(self) -> u8 {
        match self {
            Self::Busy => 67,
            Self::NoReply => 61,
            Self::Unreachable => 62,
        }
    }

    /// Key of the forwarded-to number in a forwarding reply.
    pub fn setting_key(self) -> &'static str {
        match self {
            Self::Busy => "VoiceBusy",
            Self::NoReply => "VoiceNoReply",
            Self::Unreachable => "VoiceNotReachable",
        }
    }

    /// Parse a user supplied condition name.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "busy" => Some(Self::Busy),
            "no-reply" | "noreply" => Some(Self::NoReply),
            "unreachable" | "not-reachable" => Some(Self::Unreachable),
            _ => None,
        }
    }
}

impl fmt::Display for ForwardingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Busy => "busy",
            Self::NoReply => "no-reply",
            Self::Unreachable => "unreachable",
        };
        f.write_str(label)
    }
}

/// State of one forwarding condition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ForwardingCondition {
    /// A forwarded-to number is registered.
    pub enabled: bool,
    /// Forwarded-to number, empty when disabled.
    pub number: String,
    /// No-reply timeout in seconds, only reported for [`ForwardingKind::NoReply`].
    pub timeout: Option<u32>,
}

/// Voice call forwarding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CallForwarding {
    /// Forward when busy.
    pub busy: ForwardingCondition,
    /// Forward when not answered.
    pub no_reply: ForwardingCondition,
    /// Forward when not reachable.
    pub unreachable: ForwardingCondition,
}

impl CallForwarding {
    /// Parse a `CallForwarding` reply.
    ///
    /// # Errors
    /// Returns [`CellularError::NotRecognized`] when the reply is of another kind.
    pub fn from_reply(reply: &SsReply) -> Result<Self, CellularError> {
        reply.expect_kind("CallForwarding")?;

        let condition = |kind: ForwardingKind| {
            let number = reply.text(kind.setting_key()).unwrap_or_default().to_owned();
            ForwardingCondition {
                enabled: !number.is_empty(),
                number,
                timeout: None,
            }
        };

        let mut no_reply = condition(ForwardingKind::NoReply);
        no_reply.timeout = reply
            .settings
            .get("VoiceNoReplyTimeout")
            .and_then(SsSetting::as_number);

        Ok(Self {
            busy: condition(ForwardingKind::Busy),
            no_reply,
            unreachable: condition(ForwardingKind::Unreachable),
        })
    }

    /// Condition for `kind`.
    pub fn condition(&self, kind: ForwardingKind) -> &ForwardingCondition {
        match kind {
            ForwardingKind::Busy => &self.busy,
            ForwardingKind::NoReply => &self.no_reply,
            ForwardingKind::Unreachable => &self.unreachable,
        }
    }
}

/// Parse a `CallWaiting` reply into the enabled flag.
///
/// # Errors
/// Returns [`CellularError::NotRecognized`] when the reply is of another kind.
pub fn call_waiting_from_reply(reply: &SsReply) -> Result<bool, CellularError> {
    reply.expect_kind("CallWaiting")?;
    Ok(reply.text("VoiceCallWaiting") == Some("enabled"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn forwarding_enabled_follows_number_presence() {
        let reply = SsReply::new("CallForwarding", "interrogation")
            .with("VoiceBusy", SsSetting::Text("+3581234".to_owned()))
            .with("VoiceNoReply", SsSetting::Text(String::new()))
            .with("VoiceNoReplyTimeout", SsSetting::Number(20));

        let forwarding = CallForwarding::from_reply(&reply).unwrap();

        assert!(forwarding.busy.enabled);
        assert_eq!(forwarding.busy.number, "+3581234");
        assert!(!forwarding.no_reply.enabled);
        assert_eq!(forwarding.no_reply.timeout, Some(20));
        assert!(!forwarding.unreachable.enabled);
    }

    #[test]
    fn unexpected_reply_kind_is_not_recognized() {
        let reply = SsReply::new("CallBarring", "interrogation");

        assert!(matches!(
            CallForwarding::from_reply(&reply),
            Err(CellularError::NotRecognized(kind)) if kind == "CallBarring"
        ));
        assert!(call_waiting_from_reply(&reply).is_err());
    }

    #[test]
    fn call_waiting_reads_voice_setting() {
        let enabled = SsReply::new("CallWaiting", "interrogation")
            .with("VoiceCallWaiting", SsSetting::Text("enabled".to_owned()));
        let disabled = SsReply::new("CallWaiting", "deactivation")
            .with("VoiceCallWaiting", SsSetting::Text("disabled".to_owned()));

        assert!(call_waiting_from_reply(&enabled).unwrap());
        assert!(!call_waiting_from_reply(&disabled).unwrap());
    }

    #[test]
    fn service_codes() {
        let codes: Vec<u8> = ForwardingKind::ALL
            .iter()
            .map(|kind| kind.service_code())
            .collect();
        assert_eq!(codes, vec![67, 61, 62]);
    }
}
