use std::io::Write;

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::Mutex,
};

use crate::{
    cli::formatting::{format_error, format_subheader},
    services::pin::{CodeEntryUi, CodeKind, CodeRequest, CodeResponse, Notice},
};

/// Code dialogs on the controlling terminal.
///
/// Prompts go to stderr and codes are read line by line from stdin; an empty
/// line or end of input dismisses the dialog.
pub struct TerminalUi {
    input: Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalUi {
    /// Read codes from this process's stdin.
    pub fn new() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    fn prompt(request: &CodeRequest) -> String {
        let label = match request.kind {
            CodeKind::Unlock(code) => format!("Enter {}", code.as_str().to_uppercase()),
            CodeKind::CurrentPin => "Current PIN".to_string(),
            CodeKind::NewPin => "New PIN".to_string(),
            CodeKind::ConfirmPin => "Confirm new PIN".to_string(),
        };

        match request.attempts_left {
            Some(left) => format!("{label} ({left} left): "),
            None => format!("{label}: "),
        }
    }
}

impl Default for TerminalUi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CodeEntryUi for TerminalUi {
    async fn request_code(&self, request: CodeRequest) -> CodeResponse {
        if let Some(message) = request.message {
            eprintln!("{}", format_error(&message.to_string()));
        }
        eprint!("{}", Self::prompt(&request));
        let _ = std::io::stderr().flush();

        match self.input.lock().await.next_line().await {
            Ok(Some(line)) if !line.trim().is_empty() => CodeResponse::Entered(line.trim().to_string()),
            _ => CodeResponse::Cancelled,
        }
    }

    fn notify(&self, notice: Notice) {
        eprintln!("{}", format_subheader(&notice.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ofono::SecurityCode;

    #[test]
    fn prompt_shows_remaining_attempts() {
        let request = CodeRequest {
            kind: CodeKind::Unlock(SecurityCode::Pin),
            attempts_left: Some(2),
            message: None,
        };

        assert_eq!(TerminalUi::prompt(&request), "Enter PIN (2 left): ");
    }

    #[test]
    fn prompt_without_attempts() {
        let request = CodeRequest {
            kind: CodeKind::ConfirmPin,
            attempts_left: None,
            message: None,
        };

        assert_eq!(TerminalUi::prompt(&request), "Confirm new PIN: ");
    }
}
