use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Lock type reported by the SIM's `PinRequired` and `LockedPins` properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PinType {
    /// No code is required.
    None,
    /// SIM PIN.
    Pin,
    /// SIM PIN2.
    Pin2,
    /// SIM PUK.
    Puk,
    /// SIM PUK2.
    Puk2,
    /// Any other lock (`phone`, `network`, `corp`, ...).
    Other(String),
}

impl PinType {
    /// Parse an oFono lock type string.
    pub fn parse(value: &str) -> Self {
        match value {
            "none" => Self::None,
            "pin" => Self::Pin,
            "pin2" => Self::Pin2,
            "puk" => Self::Puk,
            "puk2" => Self::Puk2,
            other => Self::Other(other.to_owned()),
        }
    }

    /// oFono lock type string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Pin => "pin",
            Self::Pin2 => "pin2",
            Self::Puk => "puk",
            Self::Puk2 => "puk2",
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PinType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Security codes that can be entered, changed or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityCode {
    /// SIM PIN.
    Pin,
    /// SIM PIN2.
    Pin2,
    /// SIM PUK.
    Puk,
    /// SIM PUK2.
    Puk2,
}

impl SecurityCode {
    /// oFono lock type string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pin => "pin",
            Self::Pin2 => "pin2",
            Self::Puk => "puk",
            Self::Puk2 => "puk2",
        }
    }

    /// Parse a user supplied code name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "pin" => Some(Self::Pin),
            "pin2" => Some(Self::Pin2),
            "puk" => Some(Self::Puk),
            "puk2" => Some(Self::Puk2),
            _ => None,
        }
    }

    /// The lock type this code unlocks.
    pub fn pin_type(self) -> PinType {
        match self {
            Self::Pin => PinType::Pin,
            Self::Pin2 => PinType::Pin2,
            Self::Puk => PinType::Puk,
            Self::Puk2 => PinType::Puk2,
        }
    }
}

impl fmt::Display for SecurityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status derived from the SIM manager properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimStatus {
    /// Not reported yet, or the SIM manager is gone.
    #[default]
    Unknown,
    /// SIM usable.
    Ok,
    /// No SIM inserted.
    NoSim,
    /// PIN must be entered.
    PinRequired,
    /// PUK must be entered.
    PukRequired,
    /// PUK2 must be entered.
    Puk2Required,
    /// Locked by a code the user cannot enter here.
    Locked,
    /// PUK attempts exhausted; the SIM is permanently blocked.
    Rejected,
}

impl SimStatus {
    /// Whether the status calls for a security code from the user.
    pub fn needs_code(self) -> bool {
        matches!(
            self,
            Self::PinRequired | Self::PukRequired | Self::Puk2Required
        )
    }
}

impl fmt::Display for SimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Ok => "ok",
            Self::NoSim => "no SIM",
            Self::PinRequired => "PIN required",
            Self::PukRequired => "PUK required",
            Self::Puk2Required => "PUK2 required",
            Self::Locked => "locked",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// Cached `org.ofono.SimManager` properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SimState {
    /// `None` until the SIM manager reported presence.
    pub present: Option<bool>,
    /// Home network country code.
    pub mcc: String,
    /// Home network code.
    pub mnc: String,
    /// Subscriber identity.
    pub imsi: String,
    /// Service provider name.
    pub spn: String,
    /// `None` until the SIM manager reported which code it waits for.
    pub pin_required: Option<PinType>,
    /// Remaining attempts per code.
    pub retries: BTreeMap<PinType, u8>,
    /// Codes currently enabled as locks.
    pub locked_pins: Vec<PinType>,
    /// `false` for the sentinel delivered when the SIM manager goes away.
    pub tracked: bool,
}

impl SimState {
    /// Status derived from presence and the required code.
    pub fn status(&self) -> SimStatus {
        if !self.tracked {
            return SimStatus::Unknown;
        }

        match self.present {
            None => SimStatus::Unknown,
            Some(false) => SimStatus::NoSim,
            Some(true) => match &self.pin_required {
                None => SimStatus::Unknown,
                Some(PinType::None | PinType::Pin2) => SimStatus::Ok,
                Some(PinType::Pin) => SimStatus::PinRequired,
                Some(PinType::Puk) if self.retries_left(&PinType::Puk) == Some(0) => {
                    SimStatus::Rejected
                }
                Some(PinType::Puk) => SimStatus::PukRequired,
                Some(PinType::Puk2) => SimStatus::Puk2Required,
                Some(PinType::Other(_)) => SimStatus::Locked,
            },
        }
    }

    /// Remaining attempts for `code`, if the SIM reports them.
    pub fn retries_left(&self, code: &PinType) -> Option<u8> {
        self.retries.get(code).copied()
    }
}

/// A decoded `org.ofono.SimManager` property.
#[derive(Debug, Clone, PartialEq)]
pub enum SimProperty {
    /// `Present`
    Present(bool),
    /// `MobileCountryCode`
    MobileCountryCode(String),
    /// `MobileNetworkCode`
    MobileNetworkCode(String),
    /// `SubscriberIdentity`
    SubscriberIdentity(String),
    /// `ServiceProviderName`
    ServiceProviderName(String),
    /// `PinRequired`
    PinRequired(PinType),
    /// `Retries`
    Retries(BTreeMap<PinType, u8>),
    /// `LockedPins`
    LockedPins(Vec<PinType>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim(present: Option<bool>, pin: Option<&str>) -> SimState {
        SimState {
            present,
            pin_required: pin.map(PinType::parse),
            tracked: true,
            ..SimState::default()
        }
    }

    #[test]
    fn status_follows_presence_and_required_code() {
        assert_eq!(sim(None, Some("pin")).status(), SimStatus::Unknown);
        assert_eq!(sim(Some(false), None).status(), SimStatus::NoSim);
        assert_eq!(sim(Some(true), None).status(), SimStatus::Unknown);
        assert_eq!(sim(Some(true), Some("none")).status(), SimStatus::Ok);
        assert_eq!(sim(Some(true), Some("pin2")).status(), SimStatus::Ok);
        assert_eq!(sim(Some(true), Some("pin")).status(), SimStatus::PinRequired);
        assert_eq!(sim(Some(true), Some("puk")).status(), SimStatus::PukRequired);
        assert_eq!(sim(Some(true), Some("puk2")).status(), SimStatus::Puk2Required);
        assert_eq!(sim(Some(true), Some("phone")).status(), SimStatus::Locked);
    }

    #[test]
    fn exhausted_puk_is_rejected() {
        let mut state = sim(Some(true), Some("puk"));
        state.retries.insert(PinType::Puk, 0);

        assert_eq!(state.status(), SimStatus::Rejected);
    }

    #[test]
    fn untracked_sentinel_is_unknown() {
        let mut state = sim(Some(true), Some("none"));
        state.tracked = false;

        assert_eq!(state.status(), SimStatus::Unknown);
    }
}
