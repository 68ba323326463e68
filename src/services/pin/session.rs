use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU32, Ordering},
};

use tokio::{
    process::Command,
    sync::{mpsc, oneshot},
};
use tracing::{debug, info, instrument, warn};

use super::types::{
    CodeEntryUi, CodeKind, CodeMessage, CodeRequest, CodeResponse, CodeUiState, Notice,
};
use crate::services::{
    common::Property,
    ofono::{CellularContext, CellularError, ModemPath, SecurityCode, SimStatus},
};

/// State shared between the session task and its [`CodeUi`](super::CodeUi) handle.
#[derive(Debug)]
pub(super) struct Shared {
    pub(super) state: Property<CodeUiState>,
    pub(super) retries: AtomicU32,
    pub(super) active: AtomicBool,
    pub(super) emergency: Property<bool>,
}

impl Shared {
    pub(super) fn new(initial: CodeUiState) -> Self {
        Self {
            state: Property::new(initial),
            retries: AtomicU32::new(0),
            active: AtomicBool::new(true),
            emergency: Property::new(false),
        }
    }
}

pub(super) enum SessionEvent {
    Status(ModemPath, SimStatus),
    CodeQuery(ModemPath, SimStatus),
    ChangeCode(oneshot::Sender<Result<(), CellularError>>),
    Activated,
}

pub(super) struct Session {
    pub(super) ctx: CellularContext,
    pub(super) ui: Arc<dyn CodeEntryUi>,
    pub(super) shared: Arc<Shared>,
    pub(super) correct_command: Option<String>,
    pub(super) modem: Option<ModemPath>,
    pub(super) last_status: SimStatus,
    pub(super) cached_code: Option<String>,
}

impl Session {
    pub(super) async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Status(path, status) => {
                    if self.accepts(&path) {
                        self.status_changed(status);
                    }
                }
                SessionEvent::CodeQuery(path, status) => {
                    if !self.accepts(&path) {
                        continue;
                    }
                    if !self.shared.active.load(Ordering::SeqCst) {
                        debug!(modem = %path, %status, "Dropping code query while inactive");
                        continue;
                    }
                    // Queries raised while a previous code was in flight may be stale.
                    self.ctx.settle().await;
                    self.unlock(&path).await;
                }
                SessionEvent::Activated => {
                    if let Some(path) = self.modem.clone()
                        && self
                            .ctx
                            .sim_state(&path)
                            .is_some_and(|sim| sim.status().needs_code())
                    {
                        self.unlock(&path).await;
                    }
                }
                SessionEvent::ChangeCode(done) => {
                    let result = self.change_code().await;
                    if done.send(result).is_err() {
                        debug!("Change-code requester went away");
                    }
                }
            }
        }

        debug!("Security code session stopped");
    }

    /// Follow the first modem that reports, unless one was configured.
    fn accepts(&mut self, path: &ModemPath) -> bool {
        match &self.modem {
            Some(modem) => modem == path,
            None => {
                info!(modem = %path, "Following modem");
                self.modem = Some(path.clone());
                true
            }
        }
    }

    fn set_state(&self, state: CodeUiState) {
        debug!(%state, "Code session state");
        self.shared.state.set(state);
    }

    fn status_changed(&mut self, status: SimStatus) {
        let previous = std::mem::replace(&mut self.last_status, status);
        if previous == status {
            return;
        }

        let state = self.shared.state.get();
        match status {
            SimStatus::Ok => {
                if !state.is_prompting() {
                    self.set_state(CodeUiState::Ok);
                }
            }
            SimStatus::Rejected => {
                self.set_state(CodeUiState::SimError);
                self.ui.notify(Notice::SimRejected);
            }
            SimStatus::NoSim | SimStatus::Locked => {
                self.set_state(CodeUiState::SimError);
                if state == CodeUiState::Startup {
                    debug!(%status, "Not reporting SIM error during start-up");
                } else if status == SimStatus::NoSim {
                    self.ui.notify(Notice::NoSim);
                } else {
                    self.ui.notify(Notice::SimLocked);
                }
            }
            SimStatus::Unknown
            | SimStatus::PinRequired
            | SimStatus::PukRequired
            | SimStatus::Puk2Required => {}
        }
    }

    async fn prompt(
        &self,
        kind: CodeKind,
        attempts_left: Option<u8>,
        message: Option<CodeMessage>,
    ) -> Option<String> {
        let request = CodeRequest {
            kind,
            attempts_left,
            message,
        };

        match self.ui.request_code(request).await {
            CodeResponse::Entered(code) => Some(code),
            CodeResponse::Cancelled => {
                info!(?kind, "Code entry cancelled");
                self.set_state(CodeUiState::PinError);
                None
            }
        }
    }

    /// Ask for a new PIN twice until both entries agree.
    async fn new_code(&self) -> Option<String> {
        let mut message = None;
        loop {
            self.set_state(CodeUiState::NewPin);
            let code = self.prompt(CodeKind::NewPin, None, message.take()).await?;

            self.set_state(CodeUiState::ConfirmPin);
            let confirmation = self.prompt(CodeKind::ConfirmPin, None, None).await?;

            if code == confirmation {
                return Some(code);
            }
            message = Some(CodeMessage::Mismatch);
        }
    }

    /// Count a rejected code and describe it for the next prompt.
    async fn rejected(
        &mut self,
        path: &ModemPath,
        code: SecurityCode,
        err: &CellularError,
    ) -> CodeMessage {
        if matches!(err, CellularError::InvalidInput { .. }) {
            return CodeMessage::InvalidFormat;
        }

        let retries = self.shared.retries.fetch_add(1, Ordering::SeqCst) + 1;
        self.cached_code = None;
        warn!(modem = %path, %code, retries, error = %err, "Code rejected");

        self.ctx.settle().await;
        self.ctx
            .sim_state(path)
            .and_then(|sim| sim.retries_left(&code.pin_type()))
            .filter(|left| *left > 0)
            .map_or(CodeMessage::WrongCode, CodeMessage::AttemptsRemaining)
    }

    #[instrument(skip(self))]
    async fn unlock(&mut self, path: &ModemPath) {
        let mut message = None;

        loop {
            let Some(sim) = self.ctx.sim_state(path) else {
                warn!(modem = %path, "SIM went away during code entry");
                self.set_state(CodeUiState::PinError);
                return;
            };

            let status = sim.status();
            let (code, state) = match status {
                SimStatus::PinRequired => (SecurityCode::Pin, CodeUiState::Pin),
                SimStatus::PukRequired => (SecurityCode::Puk, CodeUiState::SimUnlock),
                SimStatus::Puk2Required => (SecurityCode::Puk2, CodeUiState::SimUnlock),
                SimStatus::Ok => {
                    self.set_state(CodeUiState::Ok);
                    return;
                }
                other => {
                    self.last_status = SimStatus::Unknown;
                    self.status_changed(other);
                    return;
                }
            };
            self.set_state(state);

            let result = match code {
                SecurityCode::Pin | SecurityCode::Pin2 => {
                    let entered = match self.cached_code.take() {
                        Some(cached) => {
                            debug!(modem = %path, "Retrying cached code");
                            cached
                        }
                        None => {
                            let attempts = sim.retries_left(&code.pin_type());
                            let Some(entered) = self
                                .prompt(CodeKind::Unlock(code), attempts, message.take())
                                .await
                            else {
                                return;
                            };
                            entered
                        }
                    };

                    self.ctx
                        .enter_pin(path, code, &entered)
                        .await
                        .map(|()| entered)
                }
                SecurityCode::Puk | SecurityCode::Puk2 => {
                    let attempts = sim.retries_left(&code.pin_type());
                    let Some(puk) = self
                        .prompt(CodeKind::Unlock(code), attempts, message.take())
                        .await
                    else {
                        return;
                    };
                    let Some(new_pin) = self.new_code().await else {
                        return;
                    };
                    self.set_state(state);

                    self.ctx
                        .reset_pin(path, code, &puk, &new_pin)
                        .await
                        .map(|()| new_pin)
                }
            };

            match result {
                Ok(pin) => {
                    self.cached_code = Some(pin);
                    self.run_correct_command().await;
                    self.set_state(CodeUiState::Ok);
                    self.ui.notify(Notice::CodeAccepted);
                    return;
                }
                Err(err) => message = Some(self.rejected(path, code, &err).await),
            }
        }
    }

    #[instrument(skip(self))]
    async fn change_code(&mut self) -> Result<(), CellularError> {
        let path = self
            .modem
            .clone()
            .or_else(|| self.ctx.default_modem())
            .ok_or_else(|| CellularError::operation("change PIN", "no modem available"))?;
        let mut message = None;

        loop {
            self.set_state(CodeUiState::Pin);
            let attempts = self
                .ctx
                .sim_state(&path)
                .and_then(|sim| sim.retries_left(&SecurityCode::Pin.pin_type()));
            let current = self
                .prompt(CodeKind::CurrentPin, attempts, message.take())
                .await
                .ok_or(CellularError::Canceled)?;
            let new_pin = self.new_code().await.ok_or(CellularError::Canceled)?;
            self.set_state(CodeUiState::Pin);

            match self
                .ctx
                .change_pin(&path, SecurityCode::Pin, &current, &new_pin)
                .await
            {
                Ok(()) => {
                    self.cached_code = Some(new_pin);
                    self.set_state(CodeUiState::Ok);
                    self.ui.notify(Notice::CodeChanged);
                    return Ok(());
                }
                Err(err) => {
                    message = Some(self.rejected(&path, SecurityCode::Pin, &err).await);
                    let blocked = self
                        .ctx
                        .sim_state(&path)
                        .is_some_and(|sim| sim.status().needs_code());
                    if blocked {
                        self.unlock(&path).await;
                        return Err(err);
                    }
                }
            }
        }
    }

    async fn run_correct_command(&self) {
        let Some(command) = &self.correct_command else {
            return;
        };

        match Command::new("sh").arg("-c").arg(command).status().await {
            Ok(status) if status.success() => debug!(%command, "Ran code-accepted command"),
            Ok(status) => warn!(%command, %status, "Code-accepted command failed"),
            Err(err) => warn!(%command, error = %err, "Cannot run code-accepted command"),
        }
    }
}
