//! oFono NetworkRegistration interface.

use zbus::{proxy, zvariant::OwnedValue};

use super::{ObjectEntry, Properties};

/// Registration state and operator selection.
#[proxy(
    default_service = "org.ofono",
    interface = "org.ofono.NetworkRegistration"
)]
pub trait NetworkRegistration {
    /// Current registration properties.
    fn get_properties(&self) -> zbus::Result<Properties>;

    /// Return to automatic operator selection.
    fn register(&self) -> zbus::Result<()>;

    /// Operators known from the last scan.
    fn get_operators(&self) -> zbus::Result<Vec<ObjectEntry>>;

    /// Scan for operators; takes tens of seconds.
    fn scan(&self) -> zbus::Result<Vec<ObjectEntry>>;

    /// A property changed.
    #[zbus(signal)]
    fn property_changed(&self, name: String, value: OwnedValue) -> zbus::Result<()>;
}
