use std::collections::HashMap;

use tracing::debug;
use zbus::zvariant::{OwnedValue, Value};

use super::{
    Bearer, ConnMgrProperty, Interface, Interfaces, ModemProperty, NetRegProperty, PinType,
    RegistrationStatus, SelectionMode, SimProperty, VoiceCallProperty, value,
};

/// A property update decoded at the transport boundary.
///
/// Both the bulk `GetProperties` fetch and incremental `PropertyChanged`
/// signals go through [`PropertyChange::decode`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyChange {
    /// `org.ofono.Modem`
    Modem(ModemProperty),
    /// `org.ofono.SimManager`
    Sim(SimProperty),
    /// `org.ofono.NetworkRegistration`
    NetReg(NetRegProperty),
    /// `org.ofono.ConnectionManager`
    ConnMgr(ConnMgrProperty),
    /// `org.ofono.VoiceCallManager`
    VoiceCall(VoiceCallProperty),
}

impl PropertyChange {
    /// Decode a named property of `interface`.
    ///
    /// Returns `None` for properties this crate does not track and for values
    /// of an unexpected shape.
    pub fn decode(interface: Interface, name: &str, value: &Value<'_>) -> Option<Self> {
        let decoded = match interface {
            Interface::Modem => decode_modem(name, value).map(Self::Modem),
            Interface::SimManager => decode_sim(name, value).map(Self::Sim),
            Interface::NetworkRegistration => decode_netreg(name, value).map(Self::NetReg),
            Interface::ConnectionManager => decode_connmgr(name, value).map(Self::ConnMgr),
            Interface::VoiceCallManager => decode_voicecall(name, value).map(Self::VoiceCall),
            Interface::SupplementaryServices => None,
        };

        if decoded.is_none() {
            debug!(interface = %interface, property = name, "Ignoring property");
        }

        decoded
    }

    /// Decode every entry of a `GetProperties` dictionary.
    pub fn decode_all(interface: Interface, properties: &HashMap<String, OwnedValue>) -> Vec<Self> {
        properties
            .iter()
            .filter_map(|(name, value)| Self::decode(interface, name, value))
            .collect()
    }

    /// Interface the property belongs to.
    pub fn interface(&self) -> Interface {
        match self {
            Self::Modem(_) => Interface::Modem,
            Self::Sim(_) => Interface::SimManager,
            Self::NetReg(_) => Interface::NetworkRegistration,
            Self::ConnMgr(_) => Interface::ConnectionManager,
            Self::VoiceCall(_) => Interface::VoiceCallManager,
        }
    }
}

fn decode_modem(name: &str, value: &Value<'_>) -> Option<ModemProperty> {
    Some(match name {
        "Powered" => ModemProperty::Powered(value::boolean(value)?),
        "Online" => ModemProperty::Online(value::boolean(value)?),
        "Manufacturer" => ModemProperty::Manufacturer(value::string(value)?),
        "Model" => ModemProperty::Model(value::string(value)?),
        "Revision" => ModemProperty::Revision(value::string(value)?),
        "Serial" => ModemProperty::Serial(value::string(value)?),
        "Interfaces" => {
            let names = value::strings(value)?;
            ModemProperty::Interfaces(Interfaces::from_names(names.iter().map(String::as_str)))
        }
        _ => return None,
    })
}

fn decode_sim(name: &str, value: &Value<'_>) -> Option<SimProperty> {
    Some(match name {
        "Present" => SimProperty::Present(value::boolean(value)?),
        "MobileCountryCode" => SimProperty::MobileCountryCode(value::string(value)?),
        "MobileNetworkCode" => SimProperty::MobileNetworkCode(value::string(value)?),
        "SubscriberIdentity" => SimProperty::SubscriberIdentity(value::string(value)?),
        "ServiceProviderName" => SimProperty::ServiceProviderName(value::string(value)?),
        "PinRequired" => SimProperty::PinRequired(PinType::parse(&value::string(value)?)),
        "Retries" => SimProperty::Retries(
            value::byte_map(value)?
                .into_iter()
                .map(|(code, left)| (PinType::parse(&code), left))
                .collect(),
        ),
        "LockedPins" => SimProperty::LockedPins(
            value::strings(value)?
                .iter()
                .map(|code| PinType::parse(code))
                .collect(),
        ),
        _ => return None,
    })
}

fn decode_netreg(name: &str, value: &Value<'_>) -> Option<NetRegProperty> {
    Some(match name {
        "Status" => NetRegProperty::Status(RegistrationStatus::parse(&value::string(value)?)),
        "LocationAreaCode" => {
            NetRegProperty::LocationAreaCode(u16::try_from(value::uint(value)?).ok()?)
        }
        "CellId" => NetRegProperty::CellId(u32::try_from(value::uint(value)?).ok()?),
        "MobileCountryCode" => NetRegProperty::MobileCountryCode(value::string(value)?),
        "MobileNetworkCode" => NetRegProperty::MobileNetworkCode(value::string(value)?),
        "Name" => NetRegProperty::Name(value::string(value)?),
        "Strength" => NetRegProperty::Strength(u8::try_from(value::uint(value)?).ok()?.min(100)),
        "Technology" => NetRegProperty::Technology(value::string(value)?),
        "Mode" => NetRegProperty::Mode(SelectionMode::parse(&value::string(value)?)),
        _ => return None,
    })
}

fn decode_connmgr(name: &str, value: &Value<'_>) -> Option<ConnMgrProperty> {
    Some(match name {
        "Attached" => ConnMgrProperty::Attached(value::boolean(value)?),
        "Powered" => ConnMgrProperty::Powered(value::boolean(value)?),
        "Suspended" => ConnMgrProperty::Suspended(value::boolean(value)?),
        "RoamingAllowed" => ConnMgrProperty::RoamingAllowed(value::boolean(value)?),
        "Bearer" => ConnMgrProperty::Bearer(Bearer::parse(&value::string(value)?)),
        _ => return None,
    })
}

fn decode_voicecall(name: &str, value: &Value<'_>) -> Option<VoiceCallProperty> {
    match name {
        "EmergencyNumbers" => Some(VoiceCallProperty::EmergencyNumbers(value::strings(value)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]

    use super::*;

    #[test]
    fn decodes_sim_properties() {
        assert_eq!(
            PropertyChange::decode(Interface::SimManager, "Present", &Value::Bool(true)),
            Some(PropertyChange::Sim(SimProperty::Present(true)))
        );
        assert_eq!(
            PropertyChange::decode(Interface::SimManager, "PinRequired", &Value::from("puk")),
            Some(PropertyChange::Sim(SimProperty::PinRequired(PinType::Puk)))
        );

        let retries = HashMap::from([("pin".to_owned(), 2u8)]);
        assert_eq!(
            PropertyChange::decode(Interface::SimManager, "Retries", &Value::from(retries)),
            Some(PropertyChange::Sim(SimProperty::Retries(
                [(PinType::Pin, 2)].into_iter().collect()
            )))
        );
    }

    #[test]
    fn wrong_shape_and_unknown_names_are_ignored() {
        assert_eq!(
            PropertyChange::decode(Interface::SimManager, "Present", &Value::from("yes")),
            None
        );
        assert_eq!(
            PropertyChange::decode(Interface::ConnectionManager, "Frobnicate", &Value::Bool(true)),
            None
        );
    }

    #[test]
    fn decodes_modem_interfaces() {
        let value = Value::from(vec!["org.ofono.SimManager", "org.ofono.ConnectionManager"]);
        let Some(PropertyChange::Modem(ModemProperty::Interfaces(set))) =
            PropertyChange::decode(Interface::Modem, "Interfaces", &value)
        else {
            panic!("interfaces not decoded");
        };

        assert!(set.has(Interface::SimManager));
        assert!(set.has(Interface::ConnectionManager));
        assert!(!set.has(Interface::NetworkRegistration));
    }

    #[test]
    fn decodes_netreg_numbers() {
        assert_eq!(
            PropertyChange::decode(Interface::NetworkRegistration, "Strength", &Value::U8(64)),
            Some(PropertyChange::NetReg(NetRegProperty::Strength(64)))
        );
        assert_eq!(
            PropertyChange::decode(
                Interface::NetworkRegistration,
                "LocationAreaCode",
                &Value::U16(4321)
            ),
            Some(PropertyChange::NetReg(NetRegProperty::LocationAreaCode(4321)))
        );
    }
}
