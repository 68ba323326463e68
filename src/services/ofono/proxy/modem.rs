//! oFono Modem interface.

use zbus::{
    proxy,
    zvariant::{OwnedValue, Value},
};

use super::Properties;

/// A modem object.
#[proxy(default_service = "org.ofono", interface = "org.ofono.Modem")]
pub trait Modem {
    /// Current modem properties.
    fn get_properties(&self) -> zbus::Result<Properties>;

    /// Change a writable property such as `Powered` or `Online`.
    fn set_property(&self, name: &str, value: &Value<'_>) -> zbus::Result<()>;

    /// A property changed.
    #[zbus(signal)]
    fn property_changed(&self, name: String, value: OwnedValue) -> zbus::Result<()>;
}
