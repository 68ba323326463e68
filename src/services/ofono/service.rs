use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use futures::Stream;
use tokio::{
    sync::{Mutex as AsyncMutex, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, instrument};

use super::{
    CallId, Cancellation, CellularError, ConnMgrState, ModemPath, ModemState, NetRegState,
    ObserverKind, SimState, SimStatus, Subscription,
    monitoring::{CellularMonitoring, Control},
    registry::{Delivery, Effect, Observers, Outcome, Registry},
    transport::{BusEvent, ModemBus, OfonoBus},
};
use crate::{
    config::OfonoConfig,
    services::common::{ObserverId, Property},
};

#[derive(Default)]
enum Lifecycle {
    #[default]
    Stopped,
    Running {
        task: JoinHandle<()>,
        control: mpsc::UnboundedSender<Control>,
    },
}

pub(crate) struct Inner {
    pub(crate) bus: Arc<dyn ModemBus>,
    registry: Mutex<Registry>,
    lifecycle: AsyncMutex<Lifecycle>,
    modems: Property<Vec<ModemPath>>,
}

impl Inner {
    pub(crate) fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a bus event and carry out what it asks for.
    pub(crate) async fn process(self: &Arc<Self>, event: BusEvent) {
        let outcome = self.registry().apply(event);
        self.execute(outcome).await;
    }

    /// Run deliveries, then effects in order, including the effects that
    /// loading newly watched interfaces produces.
    pub(crate) async fn execute(self: &Arc<Self>, outcome: Outcome) {
        Self::deliver(outcome.deliveries);
        let mut effects = VecDeque::from(outcome.effects);

        while let Some(effect) = effects.pop_front() {
            match effect {
                Effect::Watch(path, interface) => {
                    let result = match self.bus.watch(&path, interface).await {
                        Ok(()) => self.bus.properties(&path, interface).await,
                        Err(err) => Err(err),
                    };

                    let outcome = self.registry().loaded(&path, interface, result);
                    Self::deliver(outcome.deliveries);
                    effects.extend(outcome.effects);
                }
                Effect::Unwatch(path, interface) => self.bus.unwatch(&path, interface).await,
                Effect::Replay(path, epoch) => {
                    let inner = Arc::clone(self);
                    tokio::spawn(async move { inner.replay(path, epoch).await });
                }
                Effect::Fail(path, calls) => {
                    for call in calls {
                        debug!(modem = %path, call_id = %call.id, "Failing queued request of removed modem");
                        (call.reply)(Err(CellularError::ModemNotFound(path.clone())));
                    }
                }
            }
        }
    }

    /// Fan out every pending notification.
    pub(crate) fn flush(&self) {
        let (deliveries, paths) = {
            let mut registry = self.registry();
            (registry.flush(), registry.paths())
        };

        Self::deliver(deliveries);
        self.modems.set(paths);
    }

    fn deliver(deliveries: Vec<Delivery>) {
        deliveries.into_iter().for_each(Delivery::deliver);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Lifecycle::Running { task, .. } = self.lifecycle.get_mut() {
            task.abort();
        }
    }
}

/// Application-owned view of the cellular modems.
///
/// Cheap to clone; every clone shares the same bus subscription, modem table
/// and observer lists. The context starts lazily on [`get`](Self::get) and
/// is torn down by [`destroy`](Self::destroy) once nothing uses it anymore.
#[derive(Clone)]
pub struct CellularContext {
    pub(crate) inner: Arc<Inner>,
}

impl CellularContext {
    /// Create a stopped context over `bus`.
    pub fn new(bus: Arc<dyn ModemBus>) -> Self {
        Self {
            inner: Arc::new(Inner {
                bus,
                registry: Mutex::new(Registry::default()),
                lifecycle: AsyncMutex::new(Lifecycle::Stopped),
                modems: Property::new(Vec::new()),
            }),
        }
    }

    /// Create a stopped context talking to oFono over D-Bus.
    ///
    /// # Errors
    /// Returns [`CellularError::InitializationFailed`] when the bus is unreachable.
    pub async fn ofono(config: &OfonoConfig) -> Result<Self, CellularError> {
        let bus = OfonoBus::new(config).await?;
        Ok(Self::new(Arc::new(bus)))
    }

    /// Start the context if it is not running.
    ///
    /// Enumerates existing modems and loads the properties of every
    /// advertised interface before returning.
    ///
    /// # Errors
    /// Returns an error when the bus cannot be reached; the context stays stopped.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<(), CellularError> {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        if matches!(*lifecycle, Lifecycle::Running { .. }) {
            return Ok(());
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let modems = self.inner.bus.connect(events_tx).await?;
        info!(count = modems.len(), "Connected to modem daemon");

        for (path, properties) in modems {
            self.inner
                .process(BusEvent::ModemAdded { path, properties })
                .await;
        }
        self.inner.flush();

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let task = CellularMonitoring::spawn(Arc::downgrade(&self.inner), events_rx, control_rx);
        *lifecycle = Lifecycle::Running {
            task,
            control: control_tx,
        };

        Ok(())
    }

    /// Tear the context down if no observer, call or session still needs it.
    ///
    /// Returns whether the context was stopped by this call.
    #[instrument(skip(self))]
    pub async fn destroy(&self) -> bool {
        let mut lifecycle = self.inner.lifecycle.lock().await;
        if !self.inner.registry().is_idle() {
            debug!("Context still in use");
            return false;
        }

        let Lifecycle::Running { task, .. } = std::mem::take(&mut *lifecycle) else {
            return false;
        };

        task.abort();
        let outcome = self.inner.registry().clear();
        self.inner.execute(outcome).await;
        self.inner.bus.disconnect().await;
        self.inner.modems.set(Vec::new());

        info!("Cellular context stopped");
        true
    }

    /// Whether [`get`](Self::get) has started the context.
    pub async fn is_running(&self) -> bool {
        matches!(
            *self.inner.lifecycle.lock().await,
            Lifecycle::Running { .. }
        )
    }

    /// Wait until every bus event received so far has been applied and flushed.
    ///
    /// Returns immediately when the context is stopped.
    pub async fn settle(&self) {
        let control = match &*self.inner.lifecycle.lock().await {
            Lifecycle::Running { control, .. } => control.clone(),
            Lifecycle::Stopped => return,
        };

        let (done_tx, done_rx) = oneshot::channel();
        if control.send(Control::Settle(done_tx)).is_ok() && done_rx.await.is_err() {
            debug!("Monitoring stopped before settling");
        }
    }

    /// Paths of the known modems.
    pub fn modems(&self) -> Vec<ModemPath> {
        self.inner.registry().paths()
    }

    /// Stream of the modem list, starting with the current one.
    pub fn watch_modems(&self) -> impl Stream<Item = Vec<ModemPath>> + Send {
        self.inner.modems.watch()
    }

    /// First known modem.
    pub fn default_modem(&self) -> Option<ModemPath> {
        self.inner.registry().paths().into_iter().next()
    }

    /// Latest modem state.
    pub fn modem(&self, path: &ModemPath) -> Option<ModemState> {
        self.inner.registry().modem(path)
    }

    /// Latest SIM state, `None` while the SIM manager is not attached.
    pub fn sim_state(&self, path: &ModemPath) -> Option<SimState> {
        self.inner.registry().sim(path)
    }

    /// Latest network registration state.
    pub fn net_state(&self, path: &ModemPath) -> Option<NetRegState> {
        self.inner.registry().netreg(path)
    }

    /// Latest connection manager state.
    pub fn connmgr_state(&self, path: &ModemPath) -> Option<ConnMgrState> {
        self.inner.registry().connmgr(path)
    }

    /// Observe modem state changes and removals.
    ///
    /// # Errors
    /// Returns an error when the context cannot be started.
    pub async fn register_modem_observer<F>(&self, observer: F) -> Result<Subscription, CellularError>
    where
        F: Fn(&ModemPath, &ModemState) + Send + Sync + 'static,
    {
        self.subscribe(ObserverKind::Modem, |observers| {
            observers.modem.add(Arc::new(observer))
        })
        .await
    }

    /// Observe SIM state changes.
    ///
    /// # Errors
    /// Returns an error when the context cannot be started.
    pub async fn register_sim_observer<F>(&self, observer: F) -> Result<Subscription, CellularError>
    where
        F: Fn(&ModemPath, &SimState) + Send + Sync + 'static,
    {
        self.subscribe(ObserverKind::Sim, |observers| {
            observers.sim.add(Arc::new(observer))
        })
        .await
    }

    /// Observe network registration changes.
    ///
    /// # Errors
    /// Returns an error when the context cannot be started.
    pub async fn register_net_observer<F>(&self, observer: F) -> Result<Subscription, CellularError>
    where
        F: Fn(&ModemPath, &NetRegState) + Send + Sync + 'static,
    {
        self.subscribe(ObserverKind::NetReg, |observers| {
            observers.netreg.add(Arc::new(observer))
        })
        .await
    }

    /// Observe connection manager changes.
    ///
    /// # Errors
    /// Returns an error when the context cannot be started.
    pub async fn register_connmgr_observer<F>(
        &self,
        observer: F,
    ) -> Result<Subscription, CellularError>
    where
        F: Fn(&ModemPath, &ConnMgrState) + Send + Sync + 'static,
    {
        self.subscribe(ObserverKind::ConnMgr, |observers| {
            observers.connmgr.add(Arc::new(observer))
        })
        .await
    }

    /// Be told when a SIM starts waiting for a security code.
    ///
    /// # Errors
    /// Returns an error when the context cannot be started.
    pub async fn register_code_query_observer<F>(
        &self,
        observer: F,
    ) -> Result<Subscription, CellularError>
    where
        F: Fn(&ModemPath, SimStatus) + Send + Sync + 'static,
    {
        self.subscribe(ObserverKind::CodeQuery, |observers| {
            observers.code_query.add(Arc::new(observer))
        })
        .await
    }

    /// Remove a registration and stop the context if it was the last user.
    ///
    /// # Errors
    /// Returns [`CellularError::ObserverNotFound`] for an unknown or closed token.
    pub async fn close(&self, subscription: Subscription) -> Result<(), CellularError> {
        if !self.inner.registry().observers.remove(subscription) {
            return Err(CellularError::ObserverNotFound);
        }

        self.destroy().await;
        Ok(())
    }

    /// Cancel an outstanding call.
    ///
    /// A dispatched call completes once with [`CellularError::Canceled`];
    /// a queued call is dropped without its callback ever running.
    pub fn cancel_call(&self, id: CallId) -> Cancellation {
        let cancellation = self.inner.registry().calls.cancel(id);
        debug!(call_id = %id, ?cancellation, "Cancel requested");
        cancellation
    }

    /// Mark a security-code session as running; only one may exist at a time.
    ///
    /// # Errors
    /// Returns [`CellularError::SessionActive`] when a session is already running.
    pub fn begin_session(&self) -> Result<(), CellularError> {
        let mut registry = self.inner.registry();
        if registry.session_active {
            return Err(CellularError::SessionActive);
        }
        registry.session_active = true;
        Ok(())
    }

    /// Close the session's observers and mark the session as ended without
    /// stopping the context; usable where nothing can be awaited.
    pub(crate) fn release_session(&self, subscriptions: Vec<Subscription>) {
        let mut registry = self.inner.registry();
        for subscription in subscriptions {
            if !registry.observers.remove(subscription) {
                debug!(?subscription, "Session observer already closed");
            }
        }
        registry.session_active = false;
    }

    /// End the security-code session and stop the context if nothing else uses it.
    pub async fn end_session(&self) {
        self.inner.registry().session_active = false;
        self.destroy().await;
    }

    async fn subscribe(
        &self,
        kind: ObserverKind,
        add: impl FnOnce(&mut Observers) -> ObserverId,
    ) -> Result<Subscription, CellularError> {
        self.get().await?;
        let id = add(&mut self.inner.registry().observers);
        debug!(?kind, %id, "Observer registered");
        Ok(Observers::subscription(kind, id))
    }
}
