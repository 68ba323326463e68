//! Integration tests for interactive security-code sessions.

#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use connui_cellular::{
    config::PinConfig,
    services::{
        ofono::{CellularContext, CellularError, Interface, MemoryBus, ModemPath, SecurityCode},
        pin::{
            CodeEntryUi, CodeKind, CodeMessage, CodeRequest, CodeResponse, CodeUi, CodeUiState,
            Notice,
        },
    },
};
use tokio::time::timeout;

const MODEM: &str = "/phonesim";
const WAIT: Duration = Duration::from_secs(5);

/// Answers dialogs from a script and records what it was shown.
#[derive(Default)]
struct ScriptedUi {
    answers: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CodeRequest>>,
    notices: Mutex<Vec<Notice>>,
}

impl ScriptedUi {
    fn answering(answers: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            ..Self::default()
        })
    }

    fn requests(&self) -> Vec<CodeRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeEntryUi for ScriptedUi {
    async fn request_code(&self, request: CodeRequest) -> CodeResponse {
        self.requests.lock().unwrap().push(request);
        match self.answers.lock().unwrap().pop_front() {
            Some(code) => CodeResponse::Entered(code),
            None => CodeResponse::Cancelled,
        }
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

fn path() -> ModemPath {
    ModemPath::from(MODEM)
}

fn config() -> PinConfig {
    PinConfig {
        modem: Some(MODEM.to_string()),
        ..PinConfig::default()
    }
}

fn bus_with_sim(locked_retries: Option<u8>) -> Arc<MemoryBus> {
    let bus = Arc::new(MemoryBus::new());
    bus.add_modem(MODEM, &[Interface::SimManager]);
    if let Some(retries) = locked_retries {
        bus.lock_sim(MODEM, "1234", retries).unwrap();
    }
    bus
}

async fn start(bus: &Arc<MemoryBus>, ui: &Arc<ScriptedUi>) -> (CellularContext, CodeUi) {
    let ctx = CellularContext::new(bus.clone());
    let session = CodeUi::init(&ctx, ui.clone(), &config(), false)
        .await
        .unwrap();
    (ctx, session)
}

mod unlocking {
    use super::*;

    #[tokio::test]
    async fn wrong_then_right_pin_unlocks() {
        let bus = bus_with_sim(Some(3));
        let ui = ScriptedUi::answering(&["0000", "1234"]);
        let (ctx, session) = start(&bus, &ui).await;

        let state = timeout(WAIT, session.wait()).await.unwrap();

        assert_eq!(state, CodeUiState::Ok);
        assert_eq!(session.retries(), 1);

        let requests = ui.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].kind, CodeKind::Unlock(SecurityCode::Pin));
        assert_eq!(requests[0].attempts_left, Some(3));
        assert_eq!(requests[0].message, None);
        assert_eq!(
            requests[1].message,
            Some(CodeMessage::AttemptsRemaining(2))
        );
        assert!(ui.notices().contains(&Notice::CodeAccepted));

        ctx.settle().await;
        assert!(!ctx.sim_state(&path()).unwrap().status().needs_code());
        session.destroy().await;
    }

    #[tokio::test]
    async fn malformed_code_is_not_counted() {
        let bus = bus_with_sim(Some(3));
        let ui = ScriptedUi::answering(&["12", "1234"]);
        let (_ctx, session) = start(&bus, &ui).await;

        let state = timeout(WAIT, session.wait()).await.unwrap();

        assert_eq!(state, CodeUiState::Ok);
        assert_eq!(session.retries(), 0);
        assert_eq!(ui.requests()[1].message, Some(CodeMessage::InvalidFormat));
        session.destroy().await;
    }

    #[tokio::test]
    async fn last_wrong_pin_moves_on_to_the_puk() {
        let bus = bus_with_sim(Some(1));
        let ui = ScriptedUi::answering(&["0000", "12345678", "5678", "5678"]);
        let (_ctx, session) = start(&bus, &ui).await;

        let state = timeout(WAIT, session.wait()).await.unwrap();

        assert_eq!(state, CodeUiState::Ok);
        let kinds: Vec<CodeKind> = ui.requests().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CodeKind::Unlock(SecurityCode::Pin),
                CodeKind::Unlock(SecurityCode::Puk),
                CodeKind::NewPin,
                CodeKind::ConfirmPin,
            ]
        );
        assert_eq!(ui.requests()[1].message, Some(CodeMessage::WrongCode));
        assert_eq!(ui.requests()[1].attempts_left, Some(10));
        session.destroy().await;
    }

    #[tokio::test]
    async fn dismissing_the_dialog_ends_in_pin_error() {
        let bus = bus_with_sim(Some(3));
        let ui = ScriptedUi::answering(&[]);
        let (_ctx, session) = start(&bus, &ui).await;

        let state = timeout(WAIT, session.wait()).await.unwrap();

        assert_eq!(state, CodeUiState::PinError);
        assert_eq!(session.retries(), 0);
        session.destroy().await;
    }

    #[tokio::test]
    async fn unlocked_sim_needs_no_prompt() {
        let bus = bus_with_sim(None);
        let ui = ScriptedUi::answering(&[]);
        let (_ctx, session) = start(&bus, &ui).await;

        let state = timeout(WAIT, session.wait()).await.unwrap();

        assert_eq!(state, CodeUiState::Ok);
        assert!(ui.requests().is_empty());
        session.destroy().await;
    }
}

mod sessions {
    use super::*;

    #[tokio::test]
    async fn only_one_session_per_context() {
        let bus = bus_with_sim(None);
        let ui = ScriptedUi::answering(&[]);
        let (ctx, session) = start(&bus, &ui).await;

        let second = CodeUi::init(&ctx, ui.clone(), &config(), false).await;
        assert!(matches!(second, Err(CellularError::SessionActive)));

        session.destroy().await;
        assert!(!ctx.is_running().await);

        let again = CodeUi::init(&ctx, ui.clone(), &config(), false)
            .await
            .unwrap();
        again.destroy().await;
    }

    #[tokio::test]
    async fn dropped_session_frees_the_context() {
        let bus = bus_with_sim(None);
        let ui = ScriptedUi::answering(&[]);
        let (ctx, session) = start(&bus, &ui).await;

        drop(session);

        assert!(ctx.destroy().await);
        let again = CodeUi::init(&ctx, ui.clone(), &config(), false)
            .await
            .unwrap();
        drop(again);
        let third = CodeUi::init(&ctx, ui.clone(), &config(), false)
            .await
            .unwrap();
        third.destroy().await;
        assert!(!ctx.is_running().await);
    }

    #[tokio::test]
    async fn change_code_asks_again_after_a_mismatch() {
        let bus = bus_with_sim(None);
        let ui = ScriptedUi::answering(&["1234", "1111", "2222", "4321", "4321"]);
        let (ctx, session) = start(&bus, &ui).await;
        timeout(WAIT, session.wait()).await.unwrap();

        timeout(WAIT, session.change_code()).await.unwrap().unwrap();

        let requests = ui.requests();
        assert_eq!(requests[0].kind, CodeKind::CurrentPin);
        assert_eq!(requests[3].kind, CodeKind::NewPin);
        assert_eq!(requests[3].message, Some(CodeMessage::Mismatch));
        assert!(ui.notices().contains(&Notice::CodeChanged));
        assert_eq!(session.state(), CodeUiState::Ok);

        ctx.lock_pin(&path(), SecurityCode::Pin, "4321").await.unwrap();
        session.destroy().await;
    }

    #[tokio::test]
    async fn cancelled_change_reports_canceled() {
        let bus = bus_with_sim(None);
        let ui = ScriptedUi::answering(&[]);
        let (_ctx, session) = start(&bus, &ui).await;
        timeout(WAIT, session.wait()).await.unwrap();

        let result = timeout(WAIT, session.change_code()).await.unwrap();

        assert!(matches!(result, Err(CellularError::Canceled)));
        assert_eq!(session.state(), CodeUiState::PinError);
        session.destroy().await;
    }
}

mod emergency {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_configured_numbers() {
        let bus = bus_with_sim(None);
        let ui = ScriptedUi::answering(&[]);
        let ctx = CellularContext::new(bus.clone());
        let config = PinConfig {
            emergency_numbers: vec!["999".to_string()],
            ..config()
        };
        let session = CodeUi::init(&ctx, ui, &config, false).await.unwrap();

        assert!(session.check_emergency("999"));
        assert!(session.is_emergency());
        assert!(!session.check_emergency("112"));
        assert!(!session.is_emergency());
        session.destroy().await;
    }

    #[tokio::test]
    async fn modem_numbers_take_precedence() {
        let bus = Arc::new(MemoryBus::new());
        bus.add_modem(MODEM, &[Interface::SimManager, Interface::VoiceCallManager]);
        let ui = ScriptedUi::answering(&[]);
        let ctx = CellularContext::new(bus.clone());
        let config = PinConfig {
            emergency_numbers: vec!["999".to_string()],
            ..config()
        };
        let session = CodeUi::init(&ctx, ui, &config, false).await.unwrap();

        assert!(session.check_emergency("112"));
        assert!(!session.check_emergency("999"));
        session.destroy().await;
    }
}
