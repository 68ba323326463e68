use std::fmt;

use serde::Serialize;

/// Packet data bearer in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bearer {
    /// Unrecognized bearer.
    #[default]
    Unknown,
    /// No bearer.
    None,
    /// GPRS
    Gprs,
    /// EDGE
    Edge,
    /// UMTS
    Umts,
    /// HSDPA
    Hsdpa,
    /// HSUPA
    Hsupa,
    /// HSPA
    Hspa,
    /// LTE
    Lte,
}

impl Bearer {
    /// Parse the oFono `Bearer` string.
    pub fn parse(value: &str) -> Self {
        match value {
            "none" => Self::None,
            "gprs" => Self::Gprs,
            "edge" => Self::Edge,
            "umts" => Self::Umts,
            "hsdpa" => Self::Hsdpa,
            "hsupa" => Self::Hsupa,
            "hspa" => Self::Hspa,
            "lte" => Self::Lte,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Bearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::None => "none",
            Self::Gprs => "gprs",
            Self::Edge => "edge",
            Self::Umts => "umts",
            Self::Hsdpa => "hsdpa",
            Self::Hsupa => "hsupa",
            Self::Hspa => "hspa",
            Self::Lte => "lte",
        };
        f.write_str(label)
    }
}

/// Cached `org.ofono.ConnectionManager` properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConnMgrState {
    /// Attached to the packet domain.
    pub attached: bool,
    /// Packet data enabled.
    pub powered: bool,
    /// Packet data suspended, e.g. during a voice call on 2G.
    pub suspended: bool,
    /// Data allowed while roaming.
    pub roaming_allowed: bool,
    /// Bearer in use.
    pub bearer: Bearer,
    /// `false` for the sentinel delivered when the interface goes away.
    pub tracked: bool,
}

/// A decoded `org.ofono.ConnectionManager` property.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnMgrProperty {
    /// `Attached`
    Attached(bool),
    /// `Powered`
    Powered(bool),
    /// `Suspended`
    Suspended(bool),
    /// `RoamingAllowed`
    RoamingAllowed(bool),
    /// `Bearer`
    Bearer(Bearer),
}

/// Properties this crate writes back to oFono.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettableProperty {
    /// `org.ofono.Modem.Powered`
    ModemPowered(bool),
    /// `org.ofono.Modem.Online`
    ModemOnline(bool),
    /// `org.ofono.ConnectionManager.RoamingAllowed`
    RoamingAllowed(bool),
    /// `org.ofono.ConnectionManager.Powered`
    DataPowered(bool),
}

impl SettableProperty {
    /// Interface owning the property.
    pub fn interface(self) -> super::Interface {
        match self {
            Self::ModemPowered(_) | Self::ModemOnline(_) => super::Interface::Modem,
            Self::RoamingAllowed(_) | Self::DataPowered(_) => super::Interface::ConnectionManager,
        }
    }

    /// D-Bus property name.
    pub fn name(self) -> &'static str {
        match self {
            Self::ModemPowered(_) | Self::DataPowered(_) => "Powered",
            Self::ModemOnline(_) => "Online",
            Self::RoamingAllowed(_) => "RoamingAllowed",
        }
    }

    /// Value written.
    pub fn value(self) -> bool {
        match self {
            Self::ModemPowered(value)
            | Self::ModemOnline(value)
            | Self::RoamingAllowed(value)
            | Self::DataPowered(value) => value,
        }
    }
}
