//! oFono Manager interface.

use zbus::{proxy, zvariant::OwnedObjectPath};

use super::{ObjectEntry, Properties};

/// Root object enumerating the available modems.
#[proxy(
    default_service = "org.ofono",
    default_path = "/",
    interface = "org.ofono.Manager"
)]
pub trait Manager {
    /// Every modem with its `org.ofono.Modem` properties.
    fn get_modems(&self) -> zbus::Result<Vec<ObjectEntry>>;

    /// A modem appeared.
    #[zbus(signal)]
    fn modem_added(&self, path: OwnedObjectPath, properties: Properties) -> zbus::Result<()>;

    /// A modem went away.
    #[zbus(signal)]
    fn modem_removed(&self, path: OwnedObjectPath) -> zbus::Result<()>;
}
