use serde::{Deserialize, Serialize};

/// Well-known name of the oFono daemon.
pub const OFONO_SERVICE: &str = "org.ofono";

/// Which message bus the daemon lives on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    /// The system bus, where oFono normally runs.
    #[default]
    System,
    /// The user session bus, e.g. for phonesim test setups.
    Session,
}

/// How to reach the modem daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfonoConfig {
    /// Bus to connect to.
    #[serde(default)]
    pub bus: BusKind,

    /// Well-known name of the daemon.
    #[serde(default = "default_service")]
    pub service: String,
}

impl Default for OfonoConfig {
    fn default() -> Self {
        Self {
            bus: BusKind::default(),
            service: default_service(),
        }
    }
}

fn default_service() -> String {
    OFONO_SERVICE.to_owned()
}
