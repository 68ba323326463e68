//! oFono SimManager interface.

use zbus::{
    proxy,
    zvariant::{OwnedValue, Value},
};

use super::Properties;

/// SIM card state and security codes.
#[proxy(default_service = "org.ofono", interface = "org.ofono.SimManager")]
pub trait SimManager {
    /// Current SIM properties.
    fn get_properties(&self) -> zbus::Result<Properties>;

    /// Change a writable property.
    fn set_property(&self, name: &str, value: &Value<'_>) -> zbus::Result<()>;

    /// Change the code of lock `pin_type`.
    fn change_pin(&self, pin_type: &str, old_pin: &str, new_pin: &str) -> zbus::Result<()>;

    /// Unlock with the code the SIM currently asks for.
    fn enter_pin(&self, pin_type: &str, pin: &str) -> zbus::Result<()>;

    /// Unblock with a PUK and set a new PIN.
    fn reset_pin(&self, puk_type: &str, puk: &str, new_pin: &str) -> zbus::Result<()>;

    /// Enable the lock `pin_type`.
    fn lock_pin(&self, pin_type: &str, pin: &str) -> zbus::Result<()>;

    /// Disable the lock `pin_type`.
    fn unlock_pin(&self, pin_type: &str, pin: &str) -> zbus::Result<()>;

    /// A property changed.
    #[zbus(signal)]
    fn property_changed(&self, name: String, value: OwnedValue) -> zbus::Result<()>;
}
