//! Transport seam between the modem registry and the oFono daemon.

mod dbus;
mod memory;

pub use dbus::OfonoBus;
pub use memory::MemoryBus;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use super::{
    CellularError, Interface, ModemPath, NetworkOperator, PropertyChange, SecurityCode,
    SettableProperty, SsReply,
};

/// Something the daemon reported on its own.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// A modem appeared, with its `org.ofono.Modem` properties.
    ModemAdded {
        /// Modem path.
        path: ModemPath,
        /// Decoded modem properties.
        properties: Vec<PropertyChange>,
    },
    /// A modem went away.
    ModemRemoved {
        /// Modem path.
        path: ModemPath,
    },
    /// A watched interface changed one property.
    PropertyChanged {
        /// Modem path.
        path: ModemPath,
        /// Decoded change.
        change: PropertyChange,
    },
}

/// A modem found while enumerating.
pub type ModemSnapshot = (ModemPath, Vec<PropertyChange>);

/// Asynchronous access to an oFono-style modem daemon.
///
/// Implementations push [`BusEvent`]s into the sender given to
/// [`connect`](ModemBus::connect) and answer requests made by the context.
#[async_trait]
pub trait ModemBus: Send + Sync + 'static {
    /// Subscribe to modem add/remove events and enumerate existing modems.
    ///
    /// # Errors
    /// Returns an error when the daemon cannot be reached.
    async fn connect(
        &self,
        events: UnboundedSender<BusEvent>,
    ) -> Result<Vec<ModemSnapshot>, CellularError>;

    /// Drop every subscription made since [`connect`](ModemBus::connect).
    async fn disconnect(&self);

    /// Start forwarding property changes of `interface` on `modem`.
    ///
    /// # Errors
    /// Returns an error when the signal subscription fails.
    async fn watch(&self, modem: &ModemPath, interface: Interface) -> Result<(), CellularError>;

    /// Stop forwarding property changes of `interface` on `modem`.
    async fn unwatch(&self, modem: &ModemPath, interface: Interface);

    /// Fetch every property of `interface` on `modem`.
    ///
    /// # Errors
    /// Returns an error when the remote call fails.
    async fn properties(
        &self,
        modem: &ModemPath,
        interface: Interface,
    ) -> Result<Vec<PropertyChange>, CellularError>;

    /// Write a property.
    ///
    /// # Errors
    /// Returns an error when the daemon rejects the value.
    async fn set_property(
        &self,
        modem: &ModemPath,
        property: SettableProperty,
    ) -> Result<(), CellularError>;

    /// Enter the code the SIM currently asks for.
    ///
    /// # Errors
    /// Returns an error when the code is wrong or the call fails.
    async fn enter_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError>;

    /// Unblock with a PUK and set a new PIN.
    ///
    /// # Errors
    /// Returns an error when the PUK is wrong or the call fails.
    async fn reset_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        puk: &str,
        new_pin: &str,
    ) -> Result<(), CellularError>;

    /// Change a code.
    ///
    /// # Errors
    /// Returns an error when the old code is wrong or the call fails.
    async fn change_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        old_pin: &str,
        new_pin: &str,
    ) -> Result<(), CellularError>;

    /// Enable a code lock.
    ///
    /// # Errors
    /// Returns an error when the code is wrong or the call fails.
    async fn lock_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError>;

    /// Disable a code lock.
    ///
    /// # Errors
    /// Returns an error when the code is wrong or the call fails.
    async fn unlock_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError>;

    /// Execute a supplementary-service string.
    ///
    /// # Errors
    /// Returns an error when the network rejects the request.
    async fn initiate(&self, modem: &ModemPath, command: &str) -> Result<SsReply, CellularError>;

    /// List operators, running a full scan when `scan` is set.
    ///
    /// # Errors
    /// Returns an error when the scan fails.
    async fn operators(
        &self,
        modem: &ModemPath,
        scan: bool,
    ) -> Result<Vec<NetworkOperator>, CellularError>;

    /// Manually register on the operator at `operator`.
    ///
    /// # Errors
    /// Returns an error when registration fails.
    async fn register_operator(&self, operator: &str) -> Result<(), CellularError>;

    /// Return `modem` to automatic operator selection.
    ///
    /// # Errors
    /// Returns an error when registration fails.
    async fn register_auto(&self, modem: &ModemPath) -> Result<(), CellularError>;
}
