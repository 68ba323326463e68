use serde::{Deserialize, Serialize};

/// Security-code session settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinConfig {
    /// Shell command run after a code was accepted, before reporting success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_command: Option<String>,

    /// Emergency numbers used when the modem advertises none.
    #[serde(default = "default_emergency_numbers")]
    pub emergency_numbers: Vec<String>,

    /// Modem to follow; the first modem found when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modem: Option<String>,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            correct_command: None,
            emergency_numbers: default_emergency_numbers(),
            modem: None,
        }
    }
}

fn default_emergency_numbers() -> Vec<String> {
    ["112", "911"].map(String::from).to_vec()
}
