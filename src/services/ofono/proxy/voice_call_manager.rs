//! oFono VoiceCallManager interface.

use zbus::{proxy, zvariant::OwnedValue};

use super::Properties;

/// Voice call manager; only its emergency numbers are used here.
#[proxy(
    default_service = "org.ofono",
    interface = "org.ofono.VoiceCallManager"
)]
pub trait VoiceCallManager {
    /// Current properties.
    fn get_properties(&self) -> zbus::Result<Properties>;

    /// A property changed.
    #[zbus(signal)]
    fn property_changed(&self, name: String, value: OwnedValue) -> zbus::Result<()>;
}
