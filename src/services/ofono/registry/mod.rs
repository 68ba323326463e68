//! Path-keyed modem table, per-interface trackers and coalesced fan-out.
//!
//! Everything here is synchronous and runs under the context's registry
//! lock. Work that needs the bus comes back as [`Effect`]s and observer
//! invocations as [`Delivery`]s, both executed by the caller after the lock
//! is released.

mod observers;
mod tracker;

pub use observers::{
    CodeQueryObserver, ConnMgrObserver, ModemObserver, NetRegObserver, ObserverKind, SimObserver,
    Subscription,
};
pub(crate) use observers::{Delivery, Observers};

use std::collections::{BTreeMap, VecDeque};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use self::tracker::{
    SimTracker, Tracker, apply_connmgr, apply_modem, apply_netreg, apply_sim, apply_voicecall,
};
use super::{
    CallId, CallRegistry, CellularError, ConnMgrState, Interface, Interfaces, ModemPath,
    ModemProperty, ModemState, NetRegState, PropertyChange, SimState, SsReply,
    transport::BusEvent,
};

/// Completion callback of a supplementary-service request.
pub(crate) type SsCallback = Box<dyn FnOnce(Result<SsReply, CellularError>) + Send>;

/// A supplementary-service request waiting for the interface to attach.
pub(crate) struct QueuedCall {
    pub(crate) id: CallId,
    pub(crate) command: String,
    pub(crate) reply: SsCallback,
}

/// Supplementary-services handle.
pub(crate) enum SupsHandle {
    /// Not attached yet; requests queue in submission order.
    Pending(VecDeque<QueuedCall>),
    /// Attached while earlier requests are still being replayed; new
    /// requests join the back of the queue.
    Draining {
        queue: VecDeque<QueuedCall>,
        epoch: u64,
    },
    /// Attached; requests go straight to the bus.
    Attached,
}

/// Bus work requested by a registry change.
pub(crate) enum Effect {
    /// Subscribe to `interface` and load its properties.
    Watch(ModemPath, Interface),
    /// Drop the subscription to `interface`.
    Unwatch(ModemPath, Interface),
    /// Drain the queue of the given attach epoch, one request at a time.
    Replay(ModemPath, u64),
    /// Complete queued requests of a removed modem with an error.
    Fail(ModemPath, Vec<QueuedCall>),
}

/// What a registry change asks the caller to do once the lock is released.
#[derive(Default)]
pub(crate) struct Outcome {
    pub(crate) effects: Vec<Effect>,
    pub(crate) deliveries: Vec<Delivery>,
}

/// How a new supplementary-service request proceeds.
pub(crate) enum Submitted {
    /// Queued until the interface attaches.
    Queued(CallId),
    /// Ready to be sent now.
    Dispatch {
        id: CallId,
        token: CancellationToken,
        command: String,
        reply: SsCallback,
    },
}

struct ModemEntry {
    modem: Tracker<ModemState>,
    sim: Option<SimTracker>,
    netreg: Option<Tracker<NetRegState>>,
    connmgr: Option<Tracker<ConnMgrState>>,
    sups: SupsHandle,
    voicecall: bool,
}

impl ModemEntry {
    fn new() -> Self {
        Self {
            modem: Tracker::new(ModemState {
                tracked: true,
                ..ModemState::default()
            }),
            sim: None,
            netreg: None,
            connmgr: None,
            sups: SupsHandle::Pending(VecDeque::new()),
            voicecall: false,
        }
    }

    fn attached(&self, interface: Interface) -> bool {
        match interface {
            Interface::Modem => true,
            Interface::SimManager => self.sim.is_some(),
            Interface::NetworkRegistration => self.netreg.is_some(),
            Interface::ConnectionManager => self.connmgr.is_some(),
            Interface::SupplementaryServices => !matches!(self.sups, SupsHandle::Pending(_)),
            Interface::VoiceCallManager => self.voicecall,
        }
    }
}

/// The modem table and everything hanging off it.
#[derive(Default)]
pub(crate) struct Registry {
    modems: BTreeMap<ModemPath, ModemEntry>,
    pub(crate) observers: Observers,
    pub(crate) calls: CallRegistry<ModemPath>,
    pub(crate) session_active: bool,
    sups_epoch: u64,
}

impl Registry {
    /// Apply one bus event.
    pub(crate) fn apply(&mut self, event: BusEvent) -> Outcome {
        let mut outcome = Outcome::default();

        match event {
            BusEvent::ModemAdded { path, properties } => {
                self.add_modem(path, properties, &mut outcome);
            }
            BusEvent::ModemRemoved { path } => self.remove_modem(&path, &mut outcome),
            BusEvent::PropertyChanged { path, change } => {
                self.change(&path, change, &mut outcome);
            }
        }

        outcome
    }

    /// Apply the result of watching and fetching `interface`.
    ///
    /// A failed fetch leaves the interface without a tracker.
    pub(crate) fn loaded(
        &mut self,
        path: &ModemPath,
        interface: Interface,
        result: Result<Vec<PropertyChange>, CellularError>,
    ) -> Outcome {
        let mut outcome = Outcome::default();

        let Some(entry) = self.modems.get_mut(path) else {
            debug!(modem = %path, %interface, "Loaded interface of unknown modem");
            return outcome;
        };

        if interface != Interface::Modem && !entry.modem.state.interfaces.has(interface) {
            debug!(modem = %path, %interface, "Interface went away while loading");
            outcome.effects.push(Effect::Unwatch(path.clone(), interface));
            return outcome;
        }

        let properties = match result {
            Ok(properties) => properties,
            Err(err) => {
                warn!(modem = %path, %interface, error = %err, "Failed to attach interface");
                if interface != Interface::Modem {
                    outcome.effects.push(Effect::Unwatch(path.clone(), interface));
                }
                return outcome;
            }
        };

        match interface {
            Interface::Modem => {}
            Interface::SimManager => {
                entry.sim.get_or_insert_with(SimTracker::new);
            }
            Interface::NetworkRegistration => {
                entry.netreg.get_or_insert_with(|| {
                    Tracker::new(NetRegState {
                        tracked: true,
                        ..NetRegState::default()
                    })
                });
            }
            Interface::ConnectionManager => {
                entry.connmgr.get_or_insert_with(|| {
                    Tracker::new(ConnMgrState {
                        tracked: true,
                        ..ConnMgrState::default()
                    })
                });
            }
            Interface::VoiceCallManager => entry.voicecall = true,
            Interface::SupplementaryServices => {
                if let SupsHandle::Pending(queue) = &mut entry.sups {
                    let queue = std::mem::take(queue);
                    if queue.is_empty() {
                        entry.sups = SupsHandle::Attached;
                    } else {
                        self.sups_epoch = self.sups_epoch.wrapping_add(1);
                        let epoch = self.sups_epoch;
                        debug!(
                            modem = %path,
                            count = queue.len(),
                            epoch,
                            "Replaying queued service requests"
                        );
                        entry.sups = SupsHandle::Draining { queue, epoch };
                        outcome.effects.push(Effect::Replay(path.clone(), epoch));
                    }
                }
            }
        }

        info!(modem = %path, %interface, "Interface attached");

        for change in properties {
            self.change(path, change, &mut outcome);
        }
        self.schedule(path, interface);

        outcome
    }

    /// Collect the fan-outs of every tracker with a pending notification.
    pub(crate) fn flush(&mut self) -> Vec<Delivery> {
        let mut deliveries = Vec::new();

        for (path, entry) in &mut self.modems {
            if entry.modem.notifier.take() {
                deliveries.push(Delivery::Modem(
                    path.clone(),
                    entry.modem.state.clone(),
                    self.observers.modem.snapshot(),
                ));
            }

            if let Some(sim) = &mut entry.sim
                && sim.inner.notifier.take()
            {
                deliveries.push(Delivery::Sim(
                    path.clone(),
                    sim.inner.state.clone(),
                    self.observers.sim.snapshot(),
                ));

                if let Some(status) = sim.code_query() {
                    deliveries.push(Delivery::CodeQuery(
                        path.clone(),
                        status,
                        self.observers.code_query.snapshot(),
                    ));
                }
            }

            if let Some(netreg) = &mut entry.netreg
                && netreg.notifier.take()
            {
                deliveries.push(Delivery::NetReg(
                    path.clone(),
                    netreg.state.clone(),
                    self.observers.netreg.snapshot(),
                ));
            }

            if let Some(connmgr) = &mut entry.connmgr
                && connmgr.notifier.take()
            {
                deliveries.push(Delivery::ConnMgr(
                    path.clone(),
                    connmgr.state.clone(),
                    self.observers.connmgr.snapshot(),
                ));
            }
        }

        deliveries
    }

    /// Drop every modem, e.g. when the context shuts down.
    pub(crate) fn clear(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        let paths: Vec<ModemPath> = self.modems.keys().cloned().collect();
        for path in paths {
            self.remove_modem(&path, &mut outcome);
        }
        outcome
    }

    /// Whether nothing keeps the context alive.
    pub(crate) fn is_idle(&self) -> bool {
        self.observers.is_empty() && self.calls.is_empty() && !self.session_active
    }

    pub(crate) fn paths(&self) -> Vec<ModemPath> {
        self.modems.keys().cloned().collect()
    }

    pub(crate) fn modem(&self, path: &ModemPath) -> Option<ModemState> {
        self.modems.get(path).map(|entry| entry.modem.state.clone())
    }

    pub(crate) fn sim(&self, path: &ModemPath) -> Option<SimState> {
        self.modems
            .get(path)?
            .sim
            .as_ref()
            .map(|sim| sim.inner.state.clone())
    }

    pub(crate) fn netreg(&self, path: &ModemPath) -> Option<NetRegState> {
        self.modems
            .get(path)?
            .netreg
            .as_ref()
            .map(|netreg| netreg.state.clone())
    }

    pub(crate) fn connmgr(&self, path: &ModemPath) -> Option<ConnMgrState> {
        self.modems
            .get(path)?
            .connmgr
            .as_ref()
            .map(|connmgr| connmgr.state.clone())
    }

    /// Fail unless `interface` is attached on `path`.
    pub(crate) fn require(
        &self,
        path: &ModemPath,
        interface: Interface,
    ) -> Result<(), CellularError> {
        let entry = self
            .modems
            .get(path)
            .ok_or_else(|| CellularError::ModemNotFound(path.clone()))?;

        if entry.attached(interface) {
            Ok(())
        } else {
            Err(CellularError::CapabilityUnavailable {
                modem: path.clone(),
                interface,
            })
        }
    }

    /// Register a cancellable call against `path`.
    pub(crate) fn begin_call(&mut self, path: &ModemPath) -> (CallId, CancellationToken) {
        let id = self.calls.next_id();
        let token = CancellationToken::new();
        self.calls.add(id, path.clone(), Some(token.clone()));
        (id, token)
    }

    /// Register a supplementary-service request, queueing it until attach.
    pub(crate) fn submit_ss(
        &mut self,
        path: &ModemPath,
        command: String,
        reply: SsCallback,
    ) -> Result<Submitted, CellularError> {
        let entry = self
            .modems
            .get_mut(path)
            .ok_or_else(|| CellularError::ModemNotFound(path.clone()))?;

        let id = self.calls.next_id();
        match &mut entry.sups {
            SupsHandle::Pending(queue) | SupsHandle::Draining { queue, .. } => {
                debug!(modem = %path, call_id = %id, %command, "Queueing service request");
                self.calls.add(id, path.clone(), None);
                queue.push_back(QueuedCall { id, command, reply });
                Ok(Submitted::Queued(id))
            }
            SupsHandle::Attached => {
                let token = CancellationToken::new();
                self.calls.add(id, path.clone(), Some(token.clone()));
                Ok(Submitted::Dispatch {
                    id,
                    token,
                    command,
                    reply,
                })
            }
        }
    }

    fn add_modem(
        &mut self,
        path: ModemPath,
        properties: Vec<PropertyChange>,
        outcome: &mut Outcome,
    ) {
        if !self.modems.contains_key(&path) {
            info!(modem = %path, "Modem added");
            self.modems.insert(path.clone(), ModemEntry::new());
            outcome
                .effects
                .push(Effect::Watch(path.clone(), Interface::Modem));
        }

        for change in properties {
            self.change(&path, change, outcome);
        }
        self.schedule(&path, Interface::Modem);
    }

    /// Next request to replay for the drain started at `epoch`.
    ///
    /// Returns `None` once the queue is empty, which also switches the handle
    /// to direct dispatch, or when the interface went away or re-attached.
    pub(crate) fn next_queued(&mut self, path: &ModemPath, epoch: u64) -> Option<QueuedCall> {
        let entry = self.modems.get_mut(path)?;
        let SupsHandle::Draining {
            queue,
            epoch: current,
        } = &mut entry.sups
        else {
            return None;
        };
        if *current != epoch {
            return None;
        }

        let next = queue.pop_front();
        if next.is_none() {
            debug!(modem = %path, "Service request queue drained");
            entry.sups = SupsHandle::Attached;
        }
        next
    }

    fn remove_modem(&mut self, path: &ModemPath, outcome: &mut Outcome) {
        let Some(mut entry) = self.modems.remove(path) else {
            debug!(modem = %path, "Removal of unknown modem");
            return;
        };

        info!(modem = %path, "Modem removed");

        for interface in Interface::TRACKED {
            self.detach(path, &mut entry, interface, outcome);
        }

        if let SupsHandle::Pending(queue) | SupsHandle::Draining { queue, .. } =
            std::mem::replace(&mut entry.sups, SupsHandle::Attached)
        {
            let failed: Vec<QueuedCall> = queue
                .into_iter()
                .filter(|call| self.calls.take(call.id).is_some())
                .collect();
            if !failed.is_empty() {
                outcome.effects.push(Effect::Fail(path.clone(), failed));
            }
        }

        entry.modem.notifier.cancel();
        outcome.effects.push(Effect::Unwatch(path.clone(), Interface::Modem));
        outcome.deliveries.push(Delivery::Modem(
            path.clone(),
            ModemState::removed(),
            self.observers.modem.snapshot(),
        ));
    }

    /// Tear down the tracker of `interface`, flushing the sentinel state.
    fn detach(
        &mut self,
        path: &ModemPath,
        entry: &mut ModemEntry,
        interface: Interface,
        outcome: &mut Outcome,
    ) {
        if !entry.attached(interface) {
            return;
        }

        match interface {
            Interface::Modem => return,
            Interface::SimManager => {
                if let Some(mut sim) = entry.sim.take() {
                    sim.inner.notifier.cancel();
                    outcome.deliveries.push(Delivery::Sim(
                        path.clone(),
                        SimState::default(),
                        self.observers.sim.snapshot(),
                    ));
                }
            }
            Interface::NetworkRegistration => {
                if let Some(mut netreg) = entry.netreg.take() {
                    netreg.notifier.cancel();
                    outcome.deliveries.push(Delivery::NetReg(
                        path.clone(),
                        NetRegState::default(),
                        self.observers.netreg.snapshot(),
                    ));
                }
            }
            Interface::ConnectionManager => {
                if let Some(mut connmgr) = entry.connmgr.take() {
                    connmgr.notifier.cancel();
                    outcome.deliveries.push(Delivery::ConnMgr(
                        path.clone(),
                        ConnMgrState::default(),
                        self.observers.connmgr.snapshot(),
                    ));
                }
            }
            Interface::SupplementaryServices => {
                let queue = match std::mem::replace(&mut entry.sups, SupsHandle::Attached) {
                    SupsHandle::Pending(queue) | SupsHandle::Draining { queue, .. } => queue,
                    SupsHandle::Attached => VecDeque::new(),
                };
                entry.sups = SupsHandle::Pending(queue);
            }
            Interface::VoiceCallManager => {
                entry.voicecall = false;
                entry.modem.state.emergency_numbers.clear();
                entry.modem.notifier.schedule();
            }
        }

        info!(modem = %path, %interface, "Interface detached");
        outcome
            .effects
            .push(Effect::Unwatch(path.clone(), interface));
    }

    fn change(&mut self, path: &ModemPath, change: PropertyChange, outcome: &mut Outcome) {
        let Some(entry) = self.modems.get_mut(path) else {
            debug!(modem = %path, "Property change for unknown modem");
            return;
        };

        match change {
            PropertyChange::Modem(ModemProperty::Interfaces(interfaces)) => {
                let previous = std::mem::replace(&mut entry.modem.state.interfaces, interfaces);
                entry.modem.notifier.schedule();
                if previous != interfaces {
                    self.reconcile(path, previous, interfaces, outcome);
                }
            }
            PropertyChange::Modem(property) => {
                apply_modem(&mut entry.modem.state, property);
                entry.modem.notifier.schedule();
            }
            PropertyChange::VoiceCall(property) => {
                if entry.voicecall {
                    apply_voicecall(&mut entry.modem.state, property);
                    entry.modem.notifier.schedule();
                }
            }
            PropertyChange::Sim(property) => {
                if let Some(sim) = &mut entry.sim {
                    apply_sim(&mut sim.inner.state, property);
                    sim.inner.notifier.schedule();
                }
            }
            PropertyChange::NetReg(property) => {
                if let Some(netreg) = &mut entry.netreg
                    && apply_netreg(&mut netreg.state, property)
                {
                    netreg.notifier.schedule();
                }
            }
            PropertyChange::ConnMgr(property) => {
                if let Some(connmgr) = &mut entry.connmgr {
                    apply_connmgr(&mut connmgr.state, property);
                    connmgr.notifier.schedule();
                }
            }
        }
    }

    fn reconcile(
        &mut self,
        path: &ModemPath,
        previous: Interfaces,
        current: Interfaces,
        outcome: &mut Outcome,
    ) {
        let Some(mut entry) = self.modems.remove(path) else {
            return;
        };

        for interface in previous.tracked() {
            if !current.has(interface) {
                self.detach(path, &mut entry, interface, outcome);
            }
        }

        for interface in current.tracked() {
            if !previous.has(interface) {
                outcome
                    .effects
                    .push(Effect::Watch(path.clone(), interface));
            }
        }

        self.modems.insert(path.clone(), entry);
    }

    fn schedule(&mut self, path: &ModemPath, interface: Interface) {
        let Some(entry) = self.modems.get_mut(path) else {
            return;
        };

        match interface {
            Interface::Modem | Interface::VoiceCallManager => {
                entry.modem.notifier.schedule();
            }
            Interface::SimManager => {
                if let Some(sim) = &mut entry.sim {
                    sim.inner.notifier.schedule();
                }
            }
            Interface::NetworkRegistration => {
                if let Some(netreg) = &mut entry.netreg {
                    netreg.notifier.schedule();
                }
            }
            Interface::ConnectionManager => {
                if let Some(connmgr) = &mut entry.connmgr {
                    connmgr.notifier.schedule();
                }
            }
            Interface::SupplementaryServices => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> ModemPath {
        ModemPath::from("/modem0")
    }

    fn registry_with(interfaces: &[Interface]) -> Registry {
        let mut registry = Registry::default();
        let flags = interfaces
            .iter()
            .fold(Interfaces::empty(), |flags, interface| flags | interface.flag());
        registry.apply(BusEvent::ModemAdded {
            path: path(),
            properties: vec![PropertyChange::Modem(ModemProperty::Interfaces(flags))],
        });
        registry.loaded(&path(), Interface::Modem, Ok(Vec::new()));
        registry
    }

    fn submit(registry: &mut Registry, command: &str) -> Submitted {
        registry
            .submit_ss(&path(), command.to_owned(), Box::new(|_| {}))
            .unwrap_or_else(|err| panic!("submit failed: {err}"))
    }

    fn queued_id(submitted: Submitted) -> CallId {
        match submitted {
            Submitted::Queued(id) => id,
            Submitted::Dispatch { .. } => panic!("request was not queued"),
        }
    }

    #[test]
    fn requests_during_replay_join_the_queue() {
        let mut registry = registry_with(&[Interface::SupplementaryServices]);
        let first = queued_id(submit(&mut registry, "*43#"));

        let outcome = registry.loaded(&path(), Interface::SupplementaryServices, Ok(Vec::new()));
        let epoch = match outcome.effects.as_slice() {
            [Effect::Replay(replayed, epoch)] if *replayed == path() => *epoch,
            _ => panic!("expected a single replay"),
        };
        let second = queued_id(submit(&mut registry, "#43#"));

        let order: Vec<CallId> = std::iter::from_fn(|| registry.next_queued(&path(), epoch))
            .map(|call| call.id)
            .collect();
        assert_eq!(order, vec![first, second]);
        assert!(matches!(
            submit(&mut registry, "*#43#"),
            Submitted::Dispatch { .. }
        ));
    }

    #[test]
    fn detaching_mid_replay_keeps_the_rest_queued() {
        let mut registry = registry_with(&[Interface::SupplementaryServices]);
        queued_id(submit(&mut registry, "*43#"));
        let kept = queued_id(submit(&mut registry, "#43#"));
        let outcome = registry.loaded(&path(), Interface::SupplementaryServices, Ok(Vec::new()));
        let Some(Effect::Replay(_, epoch)) = outcome.effects.into_iter().next() else {
            panic!("expected a replay");
        };
        assert!(registry.next_queued(&path(), epoch).is_some());

        registry.apply(BusEvent::PropertyChanged {
            path: path(),
            change: PropertyChange::Modem(ModemProperty::Interfaces(Interfaces::empty())),
        });
        assert!(registry.next_queued(&path(), epoch).is_none());

        registry.apply(BusEvent::PropertyChanged {
            path: path(),
            change: PropertyChange::Modem(ModemProperty::Interfaces(
                Interface::SupplementaryServices.flag(),
            )),
        });
        let outcome = registry.loaded(&path(), Interface::SupplementaryServices, Ok(Vec::new()));
        let Some(Effect::Replay(_, next_epoch)) = outcome.effects.into_iter().next() else {
            panic!("expected a second replay");
        };
        assert_ne!(next_epoch, epoch);
        assert!(registry.next_queued(&path(), epoch).is_none());
        assert_eq!(
            registry.next_queued(&path(), next_epoch).map(|call| call.id),
            Some(kept)
        );
    }

    #[test]
    fn clear_unwatches_every_attached_interface() {
        let mut registry = registry_with(&[Interface::SimManager]);
        registry.loaded(&path(), Interface::SimManager, Ok(Vec::new()));

        let outcome = registry.clear();

        let unwatched: Vec<Interface> = outcome
            .effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Unwatch(_, interface) => Some(*interface),
                _ => None,
            })
            .collect();
        assert_eq!(unwatched, vec![Interface::SimManager, Interface::Modem]);
        assert!(registry.paths().is_empty());
    }
}
