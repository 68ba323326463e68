use crate::services::ofono::{
    ConnMgrProperty, ConnMgrState, ModemProperty, ModemState, NetRegProperty, NetRegState, Rat,
    SimProperty, SimState, SimStatus, VoiceCallProperty,
};

/// At most one pending fan-out per tracked object.
///
/// Changes call [`schedule`](IdleNotifier::schedule); the event loop drains
/// every queued bus event before calling [`take`](IdleNotifier::take), so a
/// burst of changes collapses into one notification with the latest state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IdleNotifier {
    scheduled: bool,
}

impl IdleNotifier {
    /// Request a notification; returns `true` if none was pending.
    pub(crate) fn schedule(&mut self) -> bool {
        !std::mem::replace(&mut self.scheduled, true)
    }

    /// Consume the pending request, if any.
    pub(crate) fn take(&mut self) -> bool {
        std::mem::take(&mut self.scheduled)
    }

    /// Drop the pending request without notifying.
    pub(crate) fn cancel(&mut self) {
        self.scheduled = false;
    }
}

/// Cached state of one interface plus its notifier.
#[derive(Debug)]
pub(crate) struct Tracker<S> {
    pub(crate) state: S,
    pub(crate) notifier: IdleNotifier,
}

impl<S> Tracker<S> {
    pub(crate) fn new(state: S) -> Self {
        Self {
            state,
            notifier: IdleNotifier::default(),
        }
    }
}

/// SIM tracker with the status last seen by observers.
#[derive(Debug)]
pub(crate) struct SimTracker {
    pub(crate) inner: Tracker<SimState>,
    pub(crate) last_status: SimStatus,
}

impl SimTracker {
    pub(crate) fn new() -> Self {
        Self {
            inner: Tracker::new(SimState {
                tracked: true,
                ..SimState::default()
            }),
            last_status: SimStatus::Unknown,
        }
    }

    /// Status transition to report at flush time.
    ///
    /// Returns the status when it newly entered a code-entry state.
    pub(crate) fn code_query(&mut self) -> Option<SimStatus> {
        let status = self.inner.state.status();
        let previous = std::mem::replace(&mut self.last_status, status);
        (status.needs_code() && status != previous).then_some(status)
    }
}

pub(crate) fn apply_modem(state: &mut ModemState, property: ModemProperty) {
    match property {
        ModemProperty::Powered(powered) => state.powered = powered,
        ModemProperty::Online(online) => state.online = online,
        ModemProperty::Manufacturer(manufacturer) => state.manufacturer = manufacturer,
        ModemProperty::Model(model) => state.model = model,
        ModemProperty::Revision(revision) => state.revision = revision,
        ModemProperty::Serial(serial) => state.serial = serial,
        ModemProperty::Interfaces(interfaces) => state.interfaces = interfaces,
    }
}

pub(crate) fn apply_voicecall(state: &mut ModemState, property: VoiceCallProperty) {
    match property {
        VoiceCallProperty::EmergencyNumbers(numbers) => state.emergency_numbers = numbers,
    }
}

pub(crate) fn apply_sim(state: &mut SimState, property: SimProperty) {
    match property {
        SimProperty::Present(present) => state.present = Some(present),
        SimProperty::MobileCountryCode(mcc) => state.mcc = mcc,
        SimProperty::MobileNetworkCode(mnc) => state.mnc = mnc,
        SimProperty::SubscriberIdentity(imsi) => state.imsi = imsi,
        SimProperty::ServiceProviderName(spn) => state.spn = spn,
        SimProperty::PinRequired(pin) => state.pin_required = Some(pin),
        SimProperty::Retries(retries) => state.retries = retries,
        SimProperty::LockedPins(locked) => state.locked_pins = locked,
    }
}

/// Apply a registration change; returns whether observers should hear about it.
pub(crate) fn apply_netreg(state: &mut NetRegState, property: NetRegProperty) -> bool {
    match property {
        NetRegProperty::Status(status) => state.status = status,
        NetRegProperty::LocationAreaCode(lac) => state.lac = lac,
        NetRegProperty::CellId(cell_id) => state.cell_id = cell_id,
        NetRegProperty::MobileCountryCode(mcc) => state.mcc = mcc,
        NetRegProperty::MobileNetworkCode(mnc) => state.mnc = mnc,
        NetRegProperty::Name(name) => state.name = name,
        NetRegProperty::Strength(strength) => {
            state.strength = strength;
            return state.rat() != Rat::Unknown;
        }
        NetRegProperty::Technology(technology) => state.technology = Some(technology),
        NetRegProperty::Mode(mode) => state.mode = mode,
    }
    true
}

pub(crate) fn apply_connmgr(state: &mut ConnMgrState, property: ConnMgrProperty) {
    match property {
        ConnMgrProperty::Attached(attached) => state.attached = attached,
        ConnMgrProperty::Powered(powered) => state.powered = powered,
        ConnMgrProperty::Suspended(suspended) => state.suspended = suspended,
        ConnMgrProperty::RoamingAllowed(allowed) => state.roaming_allowed = allowed,
        ConnMgrProperty::Bearer(bearer) => state.bearer = bearer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ofono::PinType;

    #[test]
    fn notifier_collapses_repeated_schedules() {
        let mut notifier = IdleNotifier::default();

        assert!(notifier.schedule());
        assert!(!notifier.schedule());
        assert!(notifier.take());
        assert!(!notifier.take());
    }

    #[test]
    fn cancelled_notifier_does_not_fire() {
        let mut notifier = IdleNotifier::default();
        notifier.schedule();
        notifier.cancel();

        assert!(!notifier.take());
    }

    #[test]
    fn code_query_fires_once_per_state_entry() {
        let mut sim = SimTracker::new();
        apply_sim(&mut sim.inner.state, SimProperty::Present(true));
        apply_sim(&mut sim.inner.state, SimProperty::PinRequired(PinType::Pin));

        assert_eq!(sim.code_query(), Some(SimStatus::PinRequired));
        assert_eq!(sim.code_query(), None);

        apply_sim(&mut sim.inner.state, SimProperty::PinRequired(PinType::Puk));
        assert_eq!(sim.code_query(), Some(SimStatus::PukRequired));

        apply_sim(&mut sim.inner.state, SimProperty::PinRequired(PinType::None));
        assert_eq!(sim.code_query(), None);
        apply_sim(&mut sim.inner.state, SimProperty::PinRequired(PinType::Pin));
        assert_eq!(sim.code_query(), Some(SimStatus::PinRequired));
    }

    #[test]
    fn strength_is_silent_until_technology_is_known() {
        let mut state = NetRegState::default();

        assert!(!apply_netreg(&mut state, NetRegProperty::Strength(40)));
        assert_eq!(state.strength, 40);
        assert!(apply_netreg(
            &mut state,
            NetRegProperty::Technology("gsm".to_owned())
        ));
        assert!(apply_netreg(&mut state, NetRegProperty::Strength(60)));
    }
}
