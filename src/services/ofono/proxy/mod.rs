//! oFono D-Bus proxy definitions.
//!
//! One module per interface; each generates its own `PropertyChanged` signal
//! types, so they are addressed through their module rather than re-exported
//! wholesale.

#![allow(missing_docs)]
pub mod connection_manager;
pub mod manager;
pub mod modem;
pub mod network_operator;
pub mod network_registration;
pub mod sim_manager;
pub mod supplementary_services;
pub mod voice_call_manager;

pub use connection_manager::ConnectionManagerProxy;
pub use manager::ManagerProxy;
pub use modem::ModemProxy;
pub use network_operator::NetworkOperatorProxy;
pub use network_registration::NetworkRegistrationProxy;
pub use sim_manager::SimManagerProxy;
pub use supplementary_services::SupplementaryServicesProxy;
pub use voice_call_manager::VoiceCallManagerProxy;

use std::collections::HashMap;

use zbus::zvariant::{OwnedObjectPath, OwnedValue};

/// Property dictionary returned by `GetProperties`.
pub type Properties = HashMap<String, OwnedValue>;

/// Object path plus its properties, as returned by `GetModems` and `GetOperators`.
pub type ObjectEntry = (OwnedObjectPath, Properties);
