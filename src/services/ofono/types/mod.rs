mod change;
mod connman;
mod modem;
mod netreg;
mod sim;
mod sups;
pub(crate) mod value;

pub use change::PropertyChange;
pub use connman::{Bearer, ConnMgrProperty, ConnMgrState, SettableProperty};
pub use modem::{
    Interface, Interfaces, ModemPath, ModemProperty, ModemState, VoiceCallProperty,
};
pub use netreg::{
    NetRegProperty, NetRegState, NetworkOperator, OperatorStatus, Rat, RegistrationStatus,
    SelectionMode,
};
pub use sim::{PinType, SecurityCode, SimProperty, SimState, SimStatus};
pub use sups::{
    CallForwarding, ForwardingCondition, ForwardingKind, SsReply, SsSetting,
    call_waiting_from_reply,
};
