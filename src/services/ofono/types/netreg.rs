use std::fmt;

use serde::Serialize;

/// Registration status of the network registration interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Not reported or unrecognized.
    #[default]
    Unknown,
    /// Not registered and not searching.
    Unregistered,
    /// Registered on the home network.
    Home,
    /// Searching for a network.
    Searching,
    /// Registration denied.
    Denied,
    /// Registered on a foreign network.
    Roaming,
}

impl RegistrationStatus {
    /// Parse the oFono `Status` string.
    pub fn parse(value: &str) -> Self {
        match value {
            "unregistered" => Self::Unregistered,
            "registered" => Self::Home,
            "searching" => Self::Searching,
            "denied" => Self::Denied,
            "roaming" => Self::Roaming,
            _ => Self::Unknown,
        }
    }

    /// Whether the modem is attached to some network.
    pub fn is_registered(self) -> bool {
        matches!(self, Self::Home | Self::Roaming)
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Unregistered => "unregistered",
            Self::Home => "home",
            Self::Searching => "searching",
            Self::Denied => "denied",
            Self::Roaming => "roaming",
        };
        f.write_str(label)
    }
}

/// Radio access technology family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rat {
    /// No technology reported.
    #[default]
    Unknown,
    /// GSM or EDGE.
    Gsm,
    /// UMTS or HSPA.
    Umts,
    /// LTE.
    Lte,
    /// 5G NR.
    Nr,
}

impl Rat {
    /// Map an oFono `Technology` string to its family.
    pub fn from_technology(technology: &str) -> Self {
        match technology {
            "gsm" | "edge" => Self::Gsm,
            "umts" | "hspa" => Self::Umts,
            "lte" => Self::Lte,
            "nr" => Self::Nr,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Rat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Gsm => "2G",
            Self::Umts => "3G",
            Self::Lte => "4G",
            Self::Nr => "5G",
        };
        f.write_str(label)
    }
}

/// Operator selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Not reported.
    #[default]
    Unknown,
    /// Automatic selection, manual registration allowed.
    Auto,
    /// Automatic selection only.
    AutoOnly,
    /// Manually selected operator.
    Manual,
}

impl SelectionMode {
    /// Parse the oFono `Mode` string.
    pub fn parse(value: &str) -> Self {
        match value {
            "auto" => Self::Auto,
            "auto-only" => Self::AutoOnly,
            "manual" => Self::Manual,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Auto => "auto",
            Self::AutoOnly => "auto-only",
            Self::Manual => "manual",
        };
        f.write_str(label)
    }
}

/// Cached `org.ofono.NetworkRegistration` properties.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NetRegState {
    /// Registration status.
    pub status: RegistrationStatus,
    /// Location area code.
    pub lac: u16,
    /// Cell identifier.
    pub cell_id: u32,
    /// Country code of the registered operator.
    pub mcc: String,
    /// Network code of the registered operator.
    pub mnc: String,
    /// Operator name.
    pub name: String,
    /// Signal strength in percent.
    pub strength: u8,
    /// Raw `Technology` string, `None` until reported.
    pub technology: Option<String>,
    /// Selection mode.
    pub mode: SelectionMode,
    /// `false` for the sentinel delivered when the interface goes away.
    pub tracked: bool,
}

impl NetRegState {
    /// Technology family in use.
    pub fn rat(&self) -> Rat {
        self.technology
            .as_deref()
            .map_or(Rat::Unknown, Rat::from_technology)
    }

    /// HSDPA is only reported for the `hspa` technology.
    pub fn hsdpa_allocated(&self) -> bool {
        self.technology.as_deref() == Some("hspa")
    }

    /// Signal strength as 0 to 5 display bars.
    pub fn signal_bars(&self) -> u8 {
        match self.strength {
            81.. => 5,
            61..=80 => 4,
            41..=60 => 3,
            21..=40 => 2,
            1..=20 => 1,
            0 => 0,
        }
    }
}

/// A decoded `org.ofono.NetworkRegistration` property.
#[derive(Debug, Clone, PartialEq)]
pub enum NetRegProperty {
    /// `Status`
    Status(RegistrationStatus),
    /// `LocationAreaCode`
    LocationAreaCode(u16),
    /// `CellId`
    CellId(u32),
    /// `MobileCountryCode`
    MobileCountryCode(String),
    /// `MobileNetworkCode`
    MobileNetworkCode(String),
    /// `Name`
    Name(String),
    /// `Strength`
    Strength(u8),
    /// `Technology`
    Technology(String),
    /// `Mode`
    Mode(SelectionMode),
}

/// Availability of an operator returned by a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatorStatus {
    /// Not reported.
    #[default]
    Unknown,
    /// Can be registered on.
    Available,
    /// Currently registered.
    Current,
    /// Registration not allowed.
    Forbidden,
}

impl OperatorStatus {
    /// Parse the oFono operator `Status` string.
    pub fn parse(value: &str) -> Self {
        match value {
            "available" => Self::Available,
            "current" => Self::Current,
            "forbidden" => Self::Forbidden,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for OperatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unknown => "unknown",
            Self::Available => "available",
            Self::Current => "current",
            Self::Forbidden => "forbidden",
        };
        f.write_str(label)
    }
}

/// An operator record returned by listing or scanning.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NetworkOperator {
    /// Object path used to register on this operator.
    pub path: String,
    /// Operator name.
    pub name: String,
    /// Availability.
    pub status: OperatorStatus,
    /// Country code.
    pub mcc: String,
    /// Network code.
    pub mnc: String,
    /// Raw technology strings supported by the operator.
    pub technologies: Vec<String>,
}

impl NetworkOperator {
    /// Best technology family the operator offers.
    pub fn best_rat(&self) -> Rat {
        self.technologies
            .iter()
            .map(|technology| Rat::from_technology(technology))
            .max_by_key(|rat| match rat {
                Rat::Unknown => 0,
                Rat::Gsm => 1,
                Rat::Umts => 2,
                Rat::Lte => 3,
                Rat::Nr => 4,
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_technology(technology: &str) -> NetRegState {
        NetRegState {
            technology: Some(technology.to_owned()),
            tracked: true,
            ..NetRegState::default()
        }
    }

    #[test]
    fn hspa_is_umts_with_hsdpa() {
        let state = with_technology("hspa");
        assert_eq!(state.rat(), Rat::Umts);
        assert!(state.hsdpa_allocated());
    }

    #[test]
    fn umts_is_umts_without_hsdpa() {
        let state = with_technology("umts");
        assert_eq!(state.rat(), Rat::Umts);
        assert!(!state.hsdpa_allocated());
    }

    #[test]
    fn technology_families() {
        assert_eq!(with_technology("edge").rat(), Rat::Gsm);
        assert_eq!(with_technology("lte").rat(), Rat::Lte);
        assert_eq!(with_technology("nr").rat(), Rat::Nr);
        assert_eq!(with_technology("cdma").rat(), Rat::Unknown);
        assert_eq!(NetRegState::default().rat(), Rat::Unknown);
    }

    #[test]
    fn strength_bands() {
        let bars = |strength| {
            NetRegState {
                strength,
                ..NetRegState::default()
            }
            .signal_bars()
        };

        assert_eq!(bars(100), 5);
        assert_eq!(bars(81), 5);
        assert_eq!(bars(80), 4);
        assert_eq!(bars(61), 4);
        assert_eq!(bars(41), 3);
        assert_eq!(bars(40), 2);
        assert_eq!(bars(1), 1);
        assert_eq!(bars(0), 0);
    }

    #[test]
    fn registration_status_strings() {
        assert_eq!(RegistrationStatus::parse("registered"), RegistrationStatus::Home);
        assert_eq!(RegistrationStatus::parse("roaming"), RegistrationStatus::Roaming);
        assert_eq!(RegistrationStatus::parse("bogus"), RegistrationStatus::Unknown);
    }
}
