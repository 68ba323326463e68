//! Configuration schema definitions and loading.
//!
//! The configuration is one TOML file, created with defaults on first use.
//! Every section and field is optional.

mod general;
mod loading;
mod ofono;
mod paths;
mod pin;

#[cfg(test)]
mod tests;

pub use general::{GeneralConfig, LogLevel};
pub use ofono::{BusKind, OFONO_SERVICE, OfonoConfig};
pub use paths::ConfigPaths;
pub use pin::PinConfig;

use serde::{Deserialize, Serialize};

/// Main configuration structure.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// General application settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Modem daemon connection.
    #[serde(default)]
    pub ofono: OfonoConfig,

    /// Security-code session settings.
    #[serde(default)]
    pub pin: PinConfig,
}
