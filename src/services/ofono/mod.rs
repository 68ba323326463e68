//! Cellular modem state tracking over oFono.
//!
//! [`CellularContext`] keeps a table of modems and, per modem, trackers for
//! the SIM, network registration, packet data and supplementary services.
//! Observers registered on the context are told about changes once the bus
//! goes quiet, with the latest state only.

mod controls;
mod error;
mod monitoring;
mod proxy;
mod registry;
mod service;
mod sups;
mod transport;
mod types;

pub use controls::is_valid_code;
pub use error::CellularError;
pub use registry::{
    CodeQueryObserver, ConnMgrObserver, ModemObserver, NetRegObserver, ObserverKind, SimObserver,
    Subscription,
};
pub use service::CellularContext;
pub use transport::{BusEvent, MemoryBus, ModemBus, ModemSnapshot, OfonoBus};
pub use types::*;

pub use crate::services::common::{CallId, CallRegistry, Cancellation};
