use std::fmt;

use bitflags::bitflags;
use serde::{Serialize, Serializer};

/// oFono object path of a modem, e.g. `/ril_0` or `/phonesim`.
///
/// The path is the modem's identity; it is unique among the modems known to a
/// [`CellularContext`](crate::services::ofono::CellularContext).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModemPath(String);

impl ModemPath {
    /// Wrap a D-Bus object path.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// The object path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModemPath {
    fn from(path: &str) -> Self {
        Self(path.to_owned())
    }
}

impl From<String> for ModemPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Capability interfaces a modem can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Interface {
    /// `org.ofono.Modem`, the modem object itself.
    Modem,
    /// `org.ofono.SimManager`
    SimManager,
    /// `org.ofono.NetworkRegistration`
    NetworkRegistration,
    /// `org.ofono.ConnectionManager`
    ConnectionManager,
    /// `org.ofono.SupplementaryServices`
    SupplementaryServices,
    /// `org.ofono.VoiceCallManager`
    VoiceCallManager,
}

impl Interface {
    /// Capability interfaces that get a tracker when advertised.
    pub const TRACKED: [Interface; 5] = [
        Interface::SimManager,
        Interface::NetworkRegistration,
        Interface::ConnectionManager,
        Interface::SupplementaryServices,
        Interface::VoiceCallManager,
    ];

    /// Fully qualified D-Bus interface name.
    pub fn dbus_name(self) -> &'static str {
        match self {
            Self::Modem => "org.ofono.Modem",
            Self::SimManager => "org.ofono.SimManager",
            Self::NetworkRegistration => "org.ofono.NetworkRegistration",
            Self::ConnectionManager => "org.ofono.ConnectionManager",
            Self::SupplementaryServices => "org.ofono.SupplementaryServices",
            Self::VoiceCallManager => "org.ofono.VoiceCallManager",
        }
    }

    /// Parse a D-Bus interface name; unknown interfaces yield `None`.
    pub fn from_dbus_name(name: &str) -> Option<Self> {
        [Self::Modem]
            .into_iter()
            .chain(Self::TRACKED)
            .find(|interface| interface.dbus_name() == name)
    }

    /// The bit representing this interface in [`Interfaces`].
    pub fn flag(self) -> Interfaces {
        match self {
            Self::Modem => Interfaces::MODEM,
            Self::SimManager => Interfaces::SIM_MANAGER,
            Self::NetworkRegistration => Interfaces::NETWORK_REGISTRATION,
            Self::ConnectionManager => Interfaces::CONNECTION_MANAGER,
            Self::SupplementaryServices => Interfaces::SUPPLEMENTARY_SERVICES,
            Self::VoiceCallManager => Interfaces::VOICE_CALL_MANAGER,
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dbus_name())
    }
}

bitflags! {
    /// Set of capability interfaces currently advertised by a modem.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Interfaces: u16 {
        /// `org.ofono.Modem`
        const MODEM = 1 << 0;
        /// `org.ofono.SimManager`
        const SIM_MANAGER = 1 << 1;
        /// `org.ofono.NetworkRegistration`
        const NETWORK_REGISTRATION = 1 << 2;
        /// `org.ofono.ConnectionManager`
        const CONNECTION_MANAGER = 1 << 3;
        /// `org.ofono.SupplementaryServices`
        const SUPPLEMENTARY_SERVICES = 1 << 4;
        /// `org.ofono.VoiceCallManager`
        const VOICE_CALL_MANAGER = 1 << 5;
    }
}

impl Interfaces {
    /// Build the set from the `Interfaces` property; unknown names are skipped.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        names
            .into_iter()
            .filter_map(Interface::from_dbus_name)
            .fold(Self::empty(), |set, interface| set | interface.flag())
    }

    /// Whether `interface` is advertised.
    pub fn has(self, interface: Interface) -> bool {
        self.contains(interface.flag())
    }

    /// Tracked interfaces contained in the set.
    pub fn tracked(self) -> impl Iterator<Item = Interface> {
        Interface::TRACKED
            .into_iter()
            .filter(move |interface| self.has(*interface))
    }
}

impl Serialize for Interfaces {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.tracked().map(Interface::dbus_name))
    }
}

/// Cached `org.ofono.Modem` properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ModemState {
    /// Radio is on.
    pub online: bool,
    /// Modem hardware is powered.
    pub powered: bool,
    /// Manufacturer string.
    pub manufacturer: String,
    /// Model string.
    pub model: String,
    /// Firmware revision.
    pub revision: String,
    /// IMEI or other serial number.
    pub serial: String,
    /// Capability interfaces currently advertised.
    pub interfaces: Interfaces,
    /// Emergency numbers advertised by the voice call manager.
    pub emergency_numbers: Vec<String>,
    /// `false` for the sentinel delivered when the modem goes away.
    pub tracked: bool,
}

impl ModemState {
    /// Sentinel state reported to observers once the modem is removed.
    pub fn removed() -> Self {
        Self::default()
    }
}

/// A decoded `org.ofono.Modem` property.
#[derive(Debug, Clone, PartialEq)]
pub enum ModemProperty {
    /// `Powered`
    Powered(bool),
    /// `Online`
    Online(bool),
    /// `Manufacturer`
    Manufacturer(String),
    /// `Model`
    Model(String),
    /// `Revision`
    Revision(String),
    /// `Serial`
    Serial(String),
    /// `Interfaces`
    Interfaces(Interfaces),
}

/// A decoded `org.ofono.VoiceCallManager` property.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceCallProperty {
    /// `EmergencyNumbers`
    EmergencyNumbers(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interface_names_round_trip_through_flags() {
        let set = Interfaces::from_names([
            "org.ofono.SimManager",
            "org.ofono.NetworkRegistration",
            "org.ofono.MessageManager",
        ]);

        assert!(set.has(Interface::SimManager));
        assert!(set.has(Interface::NetworkRegistration));
        assert!(!set.has(Interface::ConnectionManager));
        assert_eq!(
            set.tracked().collect::<Vec<_>>(),
            vec![Interface::SimManager, Interface::NetworkRegistration]
        );
    }
}
