//! oFono ConnectionManager interface.

use zbus::{
    proxy,
    zvariant::{OwnedValue, Value},
};

use super::Properties;

/// Packet data attach state.
#[proxy(
    default_service = "org.ofono",
    interface = "org.ofono.ConnectionManager"
)]
pub trait ConnectionManager {
    /// Current packet data properties.
    fn get_properties(&self) -> zbus::Result<Properties>;

    /// Change `Powered` or `RoamingAllowed`.
    fn set_property(&self, name: &str, value: &Value<'_>) -> zbus::Result<()>;

    /// A property changed.
    #[zbus(signal)]
    fn property_changed(&self, name: String, value: OwnedValue) -> zbus::Result<()>;
}
