//! oFono SupplementaryServices interface.

use zbus::{proxy, zvariant::OwnedValue};

use super::Properties;

/// USSD and GSM service string execution.
#[proxy(
    default_service = "org.ofono",
    interface = "org.ofono.SupplementaryServices"
)]
pub trait SupplementaryServices {
    /// Current properties.
    fn get_properties(&self) -> zbus::Result<Properties>;

    /// Execute a service string; returns the result name and its value.
    fn initiate(&self, command: &str) -> zbus::Result<(String, OwnedValue)>;

    /// A property changed.
    #[zbus(signal)]
    fn property_changed(&self, name: String, value: OwnedValue) -> zbus::Result<()>;
}
