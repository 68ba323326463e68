use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use tokio::sync::{mpsc::UnboundedSender, watch};
use tracing::debug;
use zbus::zvariant::Value;

use super::{BusEvent, ModemBus, ModemSnapshot};
use crate::services::ofono::{
    CellularError, Interface, ModemPath, NetworkOperator, PropertyChange, SecurityCode,
    SettableProperty, SsReply, SsSetting,
};

const DEFAULT_RETRIES: u8 = 3;

type Properties = HashMap<String, Value<'static>>;

struct SimulatedModem {
    interfaces: Vec<Interface>,
    properties: HashMap<Interface, Properties>,
    pin: String,
    puk: String,
    waiting: bool,
    forwards: BTreeMap<u8, String>,
}

impl SimulatedModem {
    fn new(interfaces: &[Interface]) -> Self {
        let mut modem = Self {
            interfaces: interfaces.to_vec(),
            properties: HashMap::new(),
            pin: "1234".to_owned(),
            puk: "12345678".to_owned(),
            waiting: false,
            forwards: BTreeMap::new(),
        };

        modem.store(Interface::Modem, "Powered", Value::from(true));
        modem.store(Interface::Modem, "Online", Value::from(true));
        modem.store(Interface::Modem, "Manufacturer", Value::from("phonesim"));
        modem.store(Interface::Modem, "Model", Value::from("Simulated Modem"));
        modem.store(Interface::Modem, "Revision", Value::from("1.0"));
        modem.store(Interface::Modem, "Serial", Value::from("356938035643809"));
        modem.store(Interface::Modem, "Interfaces", interface_names(interfaces));

        for interface in interfaces {
            for (name, value) in default_properties(*interface) {
                modem.store(*interface, name, value);
            }
        }

        modem
    }

    fn store(&mut self, interface: Interface, name: &str, value: Value<'static>) {
        self.properties
            .entry(interface)
            .or_default()
            .insert(name.to_owned(), value);
    }

    fn decoded(&self, interface: Interface) -> Vec<PropertyChange> {
        self.properties
            .get(&interface)
            .map(|properties| {
                properties
                    .iter()
                    .filter_map(|(name, value)| PropertyChange::decode(interface, name, value))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn retries(&self, code: &str) -> u8 {
        self.properties
            .get(&Interface::SimManager)
            .and_then(|sim| sim.get("Retries"))
            .and_then(|value| value.try_clone().ok())
            .and_then(|value| HashMap::<String, u8>::try_from(value).ok())
            .and_then(|retries| retries.get(code).copied())
            .unwrap_or(DEFAULT_RETRIES)
    }
}

fn interface_names(interfaces: &[Interface]) -> Value<'static> {
    Value::from(
        interfaces
            .iter()
            .map(|interface| interface.dbus_name().to_owned())
            .collect::<Vec<String>>(),
    )
}

fn retries_value(retries: &[(&str, u8)]) -> Value<'static> {
    Value::from(
        retries
            .iter()
            .map(|(code, left)| ((*code).to_owned(), *left))
            .collect::<HashMap<String, u8>>(),
    )
}

fn default_properties(interface: Interface) -> Vec<(&'static str, Value<'static>)> {
    match interface {
        Interface::Modem => Vec::new(),
        Interface::SimManager => vec![
            ("Present", Value::from(true)),
            ("PinRequired", Value::from("none")),
            ("MobileCountryCode", Value::from("244")),
            ("MobileNetworkCode", Value::from("05")),
            ("SubscriberIdentity", Value::from("244050000000001")),
            ("ServiceProviderName", Value::from("Simulated")),
            ("Retries", retries_value(&[])),
            ("LockedPins", Value::from(Vec::<String>::new())),
        ],
        Interface::NetworkRegistration => vec![
            ("Status", Value::from("registered")),
            ("LocationAreaCode", Value::from(1234u16)),
            ("CellId", Value::from(56789u32)),
            ("MobileCountryCode", Value::from("244")),
            ("MobileNetworkCode", Value::from("05")),
            ("Name", Value::from("Phonesim")),
            ("Strength", Value::from(72u8)),
            ("Technology", Value::from("umts")),
            ("Mode", Value::from("auto")),
        ],
        Interface::ConnectionManager => vec![
            ("Attached", Value::from(true)),
            ("Powered", Value::from(true)),
            ("Suspended", Value::from(false)),
            ("RoamingAllowed", Value::from(false)),
            ("Bearer", Value::from("umts")),
        ],
        Interface::SupplementaryServices => vec![("State", Value::from("idle"))],
        Interface::VoiceCallManager => vec![(
            "EmergencyNumbers",
            Value::from(vec!["112".to_owned(), "911".to_owned()]),
        )],
    }
}

#[derive(Default)]
struct State {
    events: Option<UnboundedSender<BusEvent>>,
    modems: BTreeMap<ModemPath, SimulatedModem>,
    watched: HashSet<(ModemPath, Interface)>,
    initiated: Vec<(ModemPath, String)>,
    operators: Vec<NetworkOperator>,
    registered: Vec<String>,
    failing: HashSet<Interface>,
}

impl State {
    fn modem(&mut self, path: &ModemPath) -> Result<&mut SimulatedModem, CellularError> {
        self.modems
            .get_mut(path)
            .ok_or_else(|| CellularError::ModemNotFound(path.clone()))
    }

    fn send(&self, event: BusEvent) {
        if let Some(events) = &self.events
            && events.send(event).is_err()
        {
            debug!("Event receiver is gone");
        }
    }

    /// Store a property and forward the change when the interface is watched.
    fn update(
        &mut self,
        path: &ModemPath,
        interface: Interface,
        name: &str,
        value: Value<'static>,
    ) -> Result<(), CellularError> {
        let change = PropertyChange::decode(interface, name, &value);
        self.modem(path)?.store(interface, name, value);

        if let Some(change) = change
            && self.watched.contains(&(path.clone(), interface))
        {
            self.send(BusEvent::PropertyChanged {
                path: path.clone(),
                change,
            });
        }

        Ok(())
    }

    fn set_retries(
        &mut self,
        path: &ModemPath,
        retries: &[(&str, u8)],
    ) -> Result<(), CellularError> {
        self.update(path, Interface::SimManager, "Retries", retries_value(retries))
    }

    fn require(&self, path: &ModemPath, interface: Interface) -> Result<(), CellularError> {
        let modem = self
            .modems
            .get(path)
            .ok_or_else(|| CellularError::ModemNotFound(path.clone()))?;

        if modem.interfaces.contains(&interface) || interface == Interface::Modem {
            Ok(())
        } else {
            Err(CellularError::CapabilityUnavailable {
                modem: path.clone(),
                interface,
            })
        }
    }
}

/// In-process stand-in for an oFono daemon.
///
/// Modems and their properties are scripted through the inherent methods;
/// changes reach the context exactly like D-Bus signals would, decoded by
/// [`PropertyChange::decode`]. SIM codes default to PIN `1234` and
/// PUK `12345678`.
pub struct MemoryBus {
    state: Mutex<State>,
    gate: watch::Sender<bool>,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    /// An empty simulated daemon.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Mutex::new(State::default()),
            gate,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a modem advertising `interfaces`, populated with plausible defaults.
    pub fn add_modem(&self, path: impl Into<ModemPath>, interfaces: &[Interface]) {
        let path = path.into();
        let modem = SimulatedModem::new(interfaces);
        let properties = modem.decoded(Interface::Modem);

        let mut state = self.state();
        state.modems.insert(path.clone(), modem);
        state.send(BusEvent::ModemAdded { path, properties });
    }

    /// Remove a modem.
    pub fn remove_modem(&self, path: impl Into<ModemPath>) {
        let path = path.into();
        let mut state = self.state();
        if state.modems.remove(&path).is_some() {
            state.watched.retain(|(modem, _)| *modem != path);
            state.send(BusEvent::ModemRemoved { path });
        }
    }

    /// Change the advertised interfaces; newly added ones get default properties.
    ///
    /// # Errors
    /// Returns [`CellularError::ModemNotFound`] for an unknown modem.
    pub fn set_interfaces(
        &self,
        path: impl Into<ModemPath>,
        interfaces: &[Interface],
    ) -> Result<(), CellularError> {
        let path = path.into();
        let mut state = self.state();

        let modem = state.modem(&path)?;
        for interface in interfaces {
            if !modem.interfaces.contains(interface) {
                for (name, value) in default_properties(*interface) {
                    modem.store(*interface, name, value);
                }
            }
        }
        modem.interfaces = interfaces.to_vec();

        state.update(
            &path,
            Interface::Modem,
            "Interfaces",
            interface_names(interfaces),
        )
    }

    /// Set a property and emit `PropertyChanged` if the interface is watched.
    ///
    /// # Errors
    /// Returns [`CellularError::ModemNotFound`] for an unknown modem.
    pub fn update(
        &self,
        path: impl Into<ModemPath>,
        interface: Interface,
        name: &str,
        value: impl Into<Value<'static>>,
    ) -> Result<(), CellularError> {
        self.state()
            .update(&path.into(), interface, name, value.into())
    }

    /// Lock the SIM behind `pin` with `retries` attempts left.
    ///
    /// # Errors
    /// Returns [`CellularError::ModemNotFound`] for an unknown modem.
    pub fn lock_sim(
        &self,
        path: impl Into<ModemPath>,
        pin: &str,
        retries: u8,
    ) -> Result<(), CellularError> {
        let path = path.into();
        let mut state = self.state();
        state.modem(&path)?.pin = pin.to_owned();
        state.set_retries(&path, &[("pin", retries)])?;
        state.update(
            &path,
            Interface::SimManager,
            "PinRequired",
            Value::from("pin"),
        )
    }

    /// Replace the operator list returned by listing and scanning.
    pub fn set_operators(&self, operators: Vec<NetworkOperator>) {
        self.state().operators = operators;
    }

    /// Make watching `interface` fail on every modem.
    pub fn fail_interface(&self, interface: Interface) {
        self.state().failing.insert(interface);
    }

    /// Hold supplementary-service and operator requests until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    /// Release held requests.
    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    /// Service strings initiated so far, in order.
    pub fn initiated(&self) -> Vec<(ModemPath, String)> {
        self.state().initiated.clone()
    }

    /// Operator paths manually registered on, in order.
    pub fn registered(&self) -> Vec<String> {
        self.state().registered.clone()
    }

    /// Whether `interface` on `path` is currently watched.
    pub fn is_watched(&self, path: impl Into<ModemPath>, interface: Interface) -> bool {
        self.state().watched.contains(&(path.into(), interface))
    }

    async fn gate(&self) {
        let mut open = self.gate.subscribe();
        if open.wait_for(|open| *open).await.is_err() {
            debug!("Request gate closed");
        }
    }

    fn simulate_ss(modem: &mut SimulatedModem, command: &str) -> Result<SsReply, CellularError> {
        let waiting = |modem: &SimulatedModem, operation: &str| {
            let state = if modem.waiting { "enabled" } else { "disabled" };
            SsReply::new("CallWaiting", operation)
                .with("VoiceCallWaiting", SsSetting::Text(state.to_owned()))
        };

        match command {
            "*#43#" => return Ok(waiting(&*modem, "interrogation")),
            "*43#" => {
                modem.waiting = true;
                return Ok(waiting(&*modem, "activation"));
            }
            "#43#" => {
                modem.waiting = false;
                return Ok(waiting(&*modem, "deactivation"));
            }
            _ => {}
        }

        let forwarding = |modem: &SimulatedModem, operation: &str| {
            let number = |code: u8| modem.forwards.get(&code).cloned().unwrap_or_default();
            SsReply::new("CallForwarding", operation)
                .with("VoiceBusy", SsSetting::Text(number(67)))
                .with("VoiceNoReply", SsSetting::Text(number(61)))
                .with("VoiceNotReachable", SsSetting::Text(number(62)))
                .with("VoiceNoReplyTimeout", SsSetting::Number(20))
        };

        if command == "*#004**11#" {
            return Ok(forwarding(&*modem, "interrogation"));
        }

        let body = command.strip_suffix("**11#");
        if let Some(rest) = body.and_then(|body| body.strip_prefix("**"))
            && let Some((code, number)) = rest.split_once('*')
            && let Ok(code) = code.parse::<u8>()
        {
            modem.forwards.insert(code, number.to_owned());
            return Ok(forwarding(&*modem, "registration"));
        }

        if let Some(code) = body
            .and_then(|body| body.strip_prefix("##"))
            .and_then(|code| code.parse::<u8>().ok())
        {
            modem.forwards.remove(&code);
            return Ok(forwarding(&*modem, "erasure"));
        }

        Err(CellularError::operation(
            "initiate service request",
            format!("unsupported service string {command}"),
        ))
    }
}

#[async_trait]
impl ModemBus for MemoryBus {
    async fn connect(
        &self,
        events: UnboundedSender<BusEvent>,
    ) -> Result<Vec<ModemSnapshot>, CellularError> {
        let mut state = self.state();
        state.events = Some(events);
        state.watched.clear();

        Ok(state
            .modems
            .iter()
            .map(|(path, modem)| (path.clone(), modem.decoded(Interface::Modem)))
            .collect())
    }

    async fn disconnect(&self) {
        let mut state = self.state();
        state.events = None;
        state.watched.clear();
    }

    async fn watch(&self, modem: &ModemPath, interface: Interface) -> Result<(), CellularError> {
        let mut state = self.state();
        state.require(modem, interface)?;

        if state.failing.contains(&interface) {
            return Err(CellularError::operation(
                "watch",
                format!("{interface} unavailable"),
            ));
        }

        state.watched.insert((modem.clone(), interface));
        Ok(())
    }

    async fn unwatch(&self, modem: &ModemPath, interface: Interface) {
        self.state().watched.remove(&(modem.clone(), interface));
    }

    async fn properties(
        &self,
        modem: &ModemPath,
        interface: Interface,
    ) -> Result<Vec<PropertyChange>, CellularError> {
        let mut state = self.state();
        state.require(modem, interface)?;
        Ok(state.modem(modem)?.decoded(interface))
    }

    async fn set_property(
        &self,
        modem: &ModemPath,
        property: SettableProperty,
    ) -> Result<(), CellularError> {
        let mut state = self.state();
        state.require(modem, property.interface())?;
        state.update(
            modem,
            property.interface(),
            property.name(),
            Value::from(property.value()),
        )
    }

    async fn enter_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError> {
        let mut state = self.state();
        state.require(modem, Interface::SimManager)?;

        let simulated = state.modem(modem)?;
        let accepted = code == SecurityCode::Pin && simulated.pin == pin;
        let left = simulated.retries("pin").saturating_sub(1);

        if !accepted {
            state.set_retries(modem, &[("pin", left)])?;
            if left == 0 {
                state.set_retries(modem, &[("pin", 0), ("puk", 10)])?;
                state.update(
                    modem,
                    Interface::SimManager,
                    "PinRequired",
                    Value::from("puk"),
                )?;
            }
            return Err(CellularError::operation("enter PIN", "wrong code"));
        }

        state.set_retries(modem, &[("pin", DEFAULT_RETRIES)])?;
        state.update(
            modem,
            Interface::SimManager,
            "PinRequired",
            Value::from("none"),
        )
    }

    async fn reset_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        puk: &str,
        new_pin: &str,
    ) -> Result<(), CellularError> {
        let mut state = self.state();
        state.require(modem, Interface::SimManager)?;

        let simulated = state.modem(modem)?;
        if code != SecurityCode::Puk || simulated.puk != puk {
            let left = simulated.retries("puk").saturating_sub(1);
            state.set_retries(modem, &[("pin", 0), ("puk", left)])?;
            return Err(CellularError::operation("reset PIN", "wrong code"));
        }

        state.modem(modem)?.pin = new_pin.to_owned();
        state.set_retries(modem, &[("pin", DEFAULT_RETRIES)])?;
        state.update(
            modem,
            Interface::SimManager,
            "PinRequired",
            Value::from("none"),
        )
    }

    async fn change_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        old_pin: &str,
        new_pin: &str,
    ) -> Result<(), CellularError> {
        let mut state = self.state();
        state.require(modem, Interface::SimManager)?;

        let simulated = state.modem(modem)?;
        if code != SecurityCode::Pin || simulated.pin != old_pin {
            return Err(CellularError::operation("change PIN", "wrong code"));
        }

        simulated.pin = new_pin.to_owned();
        Ok(())
    }

    async fn lock_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError> {
        self.toggle_lock(modem, code, pin, true)
    }

    async fn unlock_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError> {
        self.toggle_lock(modem, code, pin, false)
    }

    async fn initiate(&self, modem: &ModemPath, command: &str) -> Result<SsReply, CellularError> {
        {
            let mut state = self.state();
            state.require(modem, Interface::SupplementaryServices)?;
            state.initiated.push((modem.clone(), command.to_owned()));
        }

        self.gate().await;

        let mut state = self.state();
        Self::simulate_ss(state.modem(modem)?, command)
    }

    async fn operators(
        &self,
        modem: &ModemPath,
        _scan: bool,
    ) -> Result<Vec<NetworkOperator>, CellularError> {
        self.state().require(modem, Interface::NetworkRegistration)?;
        self.gate().await;
        Ok(self.state().operators.clone())
    }

    async fn register_operator(&self, operator: &str) -> Result<(), CellularError> {
        let mut state = self.state();
        if !state
            .operators
            .iter()
            .any(|candidate| candidate.path == operator)
        {
            return Err(CellularError::operation(
                "register on operator",
                format!("unknown operator {operator}"),
            ));
        }

        state.registered.push(operator.to_owned());
        Ok(())
    }

    async fn register_auto(&self, modem: &ModemPath) -> Result<(), CellularError> {
        let mut state = self.state();
        state.require(modem, Interface::NetworkRegistration)?;
        state.update(
            modem,
            Interface::NetworkRegistration,
            "Mode",
            Value::from("auto"),
        )
    }
}

impl MemoryBus {
    fn toggle_lock(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        pin: &str,
        lock: bool,
    ) -> Result<(), CellularError> {
        let mut state = self.state();
        state.require(modem, Interface::SimManager)?;

        if state.modem(modem)?.pin != pin {
            return Err(CellularError::operation("toggle PIN lock", "wrong code"));
        }

        let locked: Vec<String> = if lock {
            vec![code.as_str().to_owned()]
        } else {
            Vec::new()
        };
        state.update(
            modem,
            Interface::SimManager,
            "LockedPins",
            Value::from(locked),
        )
    }
}
