use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::services::ofono::SecurityCode;

/// Where a security-code session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeUiState {
    /// Nothing has happened yet.
    #[default]
    None,
    /// Waiting for the SIM during device start-up.
    Startup,
    /// Asking for the PIN.
    Pin,
    /// Asking for a new PIN.
    NewPin,
    /// Asking to repeat the new PIN.
    ConfirmPin,
    /// Asking for the PUK of a blocked SIM.
    SimUnlock,
    /// The SIM is missing, locked or rejected.
    SimError,
    /// The user gave up or the session failed.
    PinError,
    /// The SIM is ready.
    Ok,
}

impl CodeUiState {
    /// Whether the session is done asking.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Ok | Self::SimError | Self::PinError)
    }

    /// Whether a code-entry dialog is up.
    pub fn is_prompting(self) -> bool {
        matches!(
            self,
            Self::Pin | Self::NewPin | Self::ConfirmPin | Self::SimUnlock
        )
    }
}

impl fmt::Display for CodeUiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::None => "none",
            Self::Startup => "startup",
            Self::Pin => "pin",
            Self::NewPin => "new-pin",
            Self::ConfirmPin => "confirm-pin",
            Self::SimUnlock => "sim-unlock",
            Self::SimError => "sim-error",
            Self::PinError => "pin-error",
            Self::Ok => "ok",
        };
        f.write_str(label)
    }
}

/// Which code the dialog asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    /// The code the SIM is waiting for.
    Unlock(SecurityCode),
    /// The current PIN, before changing it.
    CurrentPin,
    /// The PIN to set.
    NewPin,
    /// The PIN to set, once more.
    ConfirmPin,
}

/// Extra line shown in the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeMessage {
    /// The last code was wrong; this many attempts are left.
    AttemptsRemaining(u8),
    /// The last code was wrong.
    WrongCode,
    /// The last code was not the right length or contained non-digits.
    InvalidFormat,
    /// The new code and its confirmation differ.
    Mismatch,
}

impl fmt::Display for CodeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttemptsRemaining(1) => f.write_str("1 attempt remaining"),
            Self::AttemptsRemaining(left) => write!(f, "{left} attempts remaining"),
            Self::WrongCode => f.write_str("Incorrect code"),
            Self::InvalidFormat => f.write_str("Code has the wrong format"),
            Self::Mismatch => f.write_str("Codes did not match"),
        }
    }
}

/// One code-entry dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRequest {
    /// Code asked for.
    pub kind: CodeKind,
    /// Attempts left for this code, when the SIM reports them.
    pub attempts_left: Option<u8>,
    /// Message about the previous attempt.
    pub message: Option<CodeMessage>,
}

/// What the user did with a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeResponse {
    /// The user typed a code and confirmed.
    Entered(String),
    /// The user dismissed the dialog.
    Cancelled,
}

/// One-off information for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The network refused the SIM.
    SimRejected,
    /// No SIM is inserted.
    NoSim,
    /// The SIM is permanently blocked.
    SimLocked,
    /// The code was accepted.
    CodeAccepted,
    /// The PIN was changed.
    CodeChanged,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SimRejected => "SIM card rejected",
            Self::NoSim => "No SIM card",
            Self::SimLocked => "SIM card locked",
            Self::CodeAccepted => "Code accepted",
            Self::CodeChanged => "Code changed",
        };
        f.write_str(text)
    }
}

/// The dialogs a security-code session drives.
#[async_trait]
pub trait CodeEntryUi: Send + Sync + 'static {
    /// Show a code-entry dialog and wait for the user.
    async fn request_code(&self, request: CodeRequest) -> CodeResponse;

    /// Show a one-off notice.
    fn notify(&self, notice: Notice);
}
