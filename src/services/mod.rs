/// Shared building blocks: reactive properties, observer lists, call bookkeeping
pub mod common;
/// Cellular modem state tracking over oFono
pub mod ofono;
/// Security-code sessions on top of the SIM tracker
pub mod pin;

pub use ofono::{CellularContext, CellularError, MemoryBus, ModemBus, ModemPath, OfonoBus};
pub use pin::{CodeEntryUi, CodeUi, CodeUiState};
