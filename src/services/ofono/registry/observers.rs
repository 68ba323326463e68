use std::sync::Arc;

use tracing::trace;

use crate::services::{
    common::{ObserverId, ObserverList},
    ofono::{ConnMgrState, ModemPath, ModemState, NetRegState, SimState, SimStatus},
};

/// Called with the latest modem state; untracked state means the modem is gone.
pub type ModemObserver = dyn Fn(&ModemPath, &ModemState) + Send + Sync;
/// Called with the latest SIM state.
pub type SimObserver = dyn Fn(&ModemPath, &SimState) + Send + Sync;
/// Called with the latest network registration state.
pub type NetRegObserver = dyn Fn(&ModemPath, &NetRegState) + Send + Sync;
/// Called with the latest connection manager state.
pub type ConnMgrObserver = dyn Fn(&ModemPath, &ConnMgrState) + Send + Sync;
/// Called once each time a SIM starts waiting for a security code.
pub type CodeQueryObserver = dyn Fn(&ModemPath, SimStatus) + Send + Sync;

/// Observer list a [`Subscription`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    /// Modem state observers.
    Modem,
    /// SIM state observers.
    Sim,
    /// Network registration observers.
    NetReg,
    /// Connection manager observers.
    ConnMgr,
    /// Security-code query observers.
    CodeQuery,
}

/// Token returned by a register call; pass it back to close the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    kind: ObserverKind,
    id: ObserverId,
}

impl Subscription {
    /// List the registration belongs to.
    pub fn kind(&self) -> ObserverKind {
        self.kind
    }
}

/// One observer list per capability type, shared by all modems.
#[derive(Default, Debug)]
pub(crate) struct Observers {
    pub(crate) modem: ObserverList<ModemObserver>,
    pub(crate) sim: ObserverList<SimObserver>,
    pub(crate) netreg: ObserverList<NetRegObserver>,
    pub(crate) connmgr: ObserverList<ConnMgrObserver>,
    pub(crate) code_query: ObserverList<CodeQueryObserver>,
}

impl Observers {
    pub(crate) fn subscription(kind: ObserverKind, id: ObserverId) -> Subscription {
        Subscription { kind, id }
    }

    pub(crate) fn remove(&mut self, subscription: Subscription) -> bool {
        let Subscription { kind, id } = subscription;
        match kind {
            ObserverKind::Modem => self.modem.remove(id),
            ObserverKind::Sim => self.sim.remove(id),
            ObserverKind::NetReg => self.netreg.remove(id),
            ObserverKind::ConnMgr => self.connmgr.remove(id),
            ObserverKind::CodeQuery => self.code_query.remove(id),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.modem.is_empty()
            && self.sim.is_empty()
            && self.netreg.is_empty()
            && self.connmgr.is_empty()
            && self.code_query.is_empty()
    }
}

/// A fan-out captured under the registry lock and run after releasing it.
pub(crate) enum Delivery {
    Modem(ModemPath, ModemState, Vec<Arc<ModemObserver>>),
    Sim(ModemPath, SimState, Vec<Arc<SimObserver>>),
    NetReg(ModemPath, NetRegState, Vec<Arc<NetRegObserver>>),
    ConnMgr(ModemPath, ConnMgrState, Vec<Arc<ConnMgrObserver>>),
    CodeQuery(ModemPath, SimStatus, Vec<Arc<CodeQueryObserver>>),
}

impl Delivery {
    /// Invoke every captured observer in registration order.
    pub(crate) fn deliver(self) {
        match self {
            Self::Modem(path, state, observers) => {
                trace!(modem = %path, count = observers.len(), "Notifying modem observers");
                observers.iter().for_each(|observer| observer(&path, &state));
            }
            Self::Sim(path, state, observers) => {
                trace!(modem = %path, count = observers.len(), "Notifying SIM observers");
                observers.iter().for_each(|observer| observer(&path, &state));
            }
            Self::NetReg(path, state, observers) => {
                trace!(modem = %path, count = observers.len(), "Notifying network observers");
                observers.iter().for_each(|observer| observer(&path, &state));
            }
            Self::ConnMgr(path, state, observers) => {
                trace!(modem = %path, count = observers.len(), "Notifying data observers");
                observers.iter().for_each(|observer| observer(&path, &state));
            }
            Self::CodeQuery(path, status, observers) => {
                trace!(modem = %path, %status, "Requesting security code");
                observers.iter().for_each(|observer| observer(&path, status));
            }
        }
    }
}
