//! Security-code orchestration on top of the SIM tracker.
//!
//! A [`CodeUi`] session watches one modem's SIM and drives PIN entry, PUK
//! unblocking and PIN changes through a [`CodeEntryUi`] implementation.
//! Only one session may exist per [`CellularContext`].

mod session;
mod types;

pub use types::{
    CodeEntryUi, CodeKind, CodeMessage, CodeRequest, CodeResponse, CodeUiState, Notice,
};

use std::sync::{Arc, atomic::Ordering};

use futures::Stream;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

use self::session::{Session, SessionEvent, Shared};
use crate::{
    config::PinConfig,
    services::ofono::{CellularContext, CellularError, ModemPath, SimStatus, Subscription},
};

/// A running security-code session.
///
/// Dropping the handle stops prompting; call [`destroy`](Self::destroy) to
/// also release the context.
pub struct CodeUi {
    ctx: CellularContext,
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<SessionEvent>,
    task: JoinHandle<()>,
    subscriptions: Vec<Subscription>,
    modem: Option<ModemPath>,
    emergency_numbers: Vec<String>,
    released: bool,
}

impl CodeUi {
    /// Start a session on `ctx`.
    ///
    /// With `startup` set, missing or locked SIMs are not reported while the
    /// device is still coming up.
    ///
    /// # Errors
    /// Returns [`CellularError::SessionActive`] when another session runs on
    /// `ctx`, or the error that kept the context from starting.
    #[instrument(skip(ctx, ui, config))]
    pub async fn init(
        ctx: &CellularContext,
        ui: Arc<dyn CodeEntryUi>,
        config: &PinConfig,
        startup: bool,
    ) -> Result<Self, CellularError> {
        ctx.begin_session()?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let subscriptions = match Self::subscribe(ctx, &events_tx).await {
            Ok(subscriptions) => subscriptions,
            Err(err) => {
                ctx.end_session().await;
                return Err(err);
            }
        };

        let modem = config
            .modem
            .as_deref()
            .map(ModemPath::from)
            .or_else(|| ctx.default_modem());

        let initial = if startup {
            CodeUiState::Startup
        } else {
            CodeUiState::None
        };
        let shared = Arc::new(Shared::new(initial));

        if let Some(path) = &modem
            && let Some(sim) = ctx.sim_state(path)
        {
            let status = sim.status();
            let _ = events_tx.send(SessionEvent::Status(path.clone(), status));
            if status.needs_code() {
                let _ = events_tx.send(SessionEvent::CodeQuery(path.clone(), status));
            }
        }

        let session = Session {
            ctx: ctx.clone(),
            ui,
            shared: Arc::clone(&shared),
            correct_command: config.correct_command.clone(),
            modem: modem.clone(),
            last_status: SimStatus::Unknown,
            cached_code: None,
        };
        let task = tokio::spawn(session.run(events_rx));

        info!(modem = ?modem, %initial, "Security code session started");

        Ok(Self {
            ctx: ctx.clone(),
            shared,
            events: events_tx,
            task,
            subscriptions,
            modem,
            emergency_numbers: config.emergency_numbers.clone(),
            released: false,
        })
    }

    async fn subscribe(
        ctx: &CellularContext,
        events: &mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<Vec<Subscription>, CellularError> {
        let status_tx = events.clone();
        let status = ctx
            .register_sim_observer(move |path, sim| {
                let _ = status_tx.send(SessionEvent::Status(path.clone(), sim.status()));
            })
            .await?;

        let query_tx = events.clone();
        let query = match ctx
            .register_code_query_observer(move |path, status| {
                let _ = query_tx.send(SessionEvent::CodeQuery(path.clone(), status));
            })
            .await
        {
            Ok(query) => query,
            Err(err) => {
                let _ = ctx.close(status).await;
                return Err(err);
            }
        };

        Ok(vec![status, query])
    }

    /// Current state.
    pub fn state(&self) -> CodeUiState {
        self.shared.state.get()
    }

    /// Stream of states, starting with the current one.
    pub fn watch_state(&self) -> impl Stream<Item = CodeUiState> + Send {
        self.shared.state.watch()
    }

    /// Wait until the session is done asking and return where it ended.
    pub async fn wait(&self) -> CodeUiState {
        self.shared.state.wait_for(|state| state.is_settled()).await
    }

    /// Number of codes rejected during this session.
    pub fn retries(&self) -> u32 {
        self.shared.retries.load(Ordering::SeqCst)
    }

    /// Run the change-PIN flow.
    ///
    /// # Errors
    /// Returns [`CellularError::Canceled`] when the user dismisses a dialog,
    /// or the SIM's error when the change is refused.
    pub async fn change_code(&self) -> Result<(), CellularError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.events
            .send(SessionEvent::ChangeCode(done_tx))
            .map_err(|_| CellularError::Canceled)?;
        done_rx.await.map_err(|_| CellularError::Canceled)?
    }

    /// Suspend or resume prompting.
    ///
    /// Code requests arriving while inactive are dropped; on reactivation a
    /// SIM still waiting for a code is prompted again.
    pub fn set_active(&self, active: bool) {
        let previous = self.shared.active.swap(active, Ordering::SeqCst);
        debug!(active, "Security code prompting");

        if active && !previous && self.events.send(SessionEvent::Activated).is_err() {
            warn!("Session task is gone");
        }
    }

    /// Whether `digits` dial an emergency number, updating the emergency flag.
    ///
    /// Uses the modem's advertised numbers, or the configured ones when it
    /// advertises none.
    pub fn check_emergency(&self, digits: &str) -> bool {
        let advertised = self
            .modem
            .clone()
            .or_else(|| self.ctx.default_modem())
            .and_then(|path| self.ctx.modem(&path))
            .map(|modem| modem.emergency_numbers)
            .unwrap_or_default();

        let numbers = if advertised.is_empty() {
            &self.emergency_numbers
        } else {
            &advertised
        };

        let emergency = numbers.iter().any(|number| number == digits);
        self.shared.emergency.set(emergency);
        emergency
    }

    /// Whether the last checked digits were an emergency number.
    pub fn is_emergency(&self) -> bool {
        self.shared.emergency.get()
    }

    /// Stop the session and release the context.
    pub async fn destroy(mut self) {
        self.task.abort();
        self.release();

        self.ctx.destroy().await;
        info!("Security code session stopped");
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.ctx.release_session(std::mem::take(&mut self.subscriptions));
    }
}

impl Drop for CodeUi {
    fn drop(&mut self) {
        self.task.abort();
        if !self.released {
            debug!("Security code session dropped without destroy");
            self.release();
        }
    }
}
