use std::collections::HashMap;

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, mpsc::UnboundedSender},
    task::JoinHandle,
};
use tokio_stream::StreamExt;
use tracing::{debug, instrument, warn};
use zbus::{
    Connection,
    proxy::CacheProperties,
    zvariant::{OwnedObjectPath, Value},
};

use super::{BusEvent, ModemBus, ModemSnapshot};
use crate::{
    config::{BusKind, OfonoConfig},
    services::ofono::{
        CellularError, Interface, ModemPath, NetworkOperator, OperatorStatus, PropertyChange,
        SecurityCode, SettableProperty, SsReply,
        proxy::{
            ConnectionManagerProxy, ManagerProxy, ModemProxy, NetworkOperatorProxy,
            NetworkRegistrationProxy, Properties, SimManagerProxy, SupplementaryServicesProxy,
            VoiceCallManagerProxy,
        },
        types::value,
    },
};

/// Build an uncached proxy for `$path` on the configured service.
macro_rules! ofono_proxy {
    ($bus:expr, $proxy:ident, $path:expr) => {
        $proxy::builder(&$bus.connection)
            .destination($bus.service.clone())?
            .path(String::from($path))?
            .cache_properties(CacheProperties::No)
            .build()
            .await?
    };
}

/// Spawn a task forwarding `PropertyChanged` signals of `$proxy` as bus events.
macro_rules! forward_property_changes {
    ($proxy:expr, $modem:expr, $interface:expr, $events:expr) => {{
        let proxy = $proxy;
        let mut changes = proxy.receive_property_changed().await?;
        let modem: ModemPath = $modem.clone();
        let interface: Interface = $interface;
        let events: UnboundedSender<BusEvent> = $events;

        tokio::spawn(async move {
            let _proxy = proxy;
            while let Some(signal) = changes.next().await {
                let Ok(args) = signal.args() else {
                    continue;
                };

                let Some(change) = PropertyChange::decode(interface, &args.name, &args.value)
                else {
                    continue;
                };

                let event = BusEvent::PropertyChanged {
                    path: modem.clone(),
                    change,
                };
                if events.send(event).is_err() {
                    break;
                }
            }

            debug!(modem = %modem, interface = %interface, "Property change stream ended");
        })
    }};
}

#[derive(Default)]
struct Subscriptions {
    events: Option<UnboundedSender<BusEvent>>,
    manager: Option<JoinHandle<()>>,
    watchers: HashMap<(ModemPath, Interface), JoinHandle<()>>,
}

impl Subscriptions {
    fn clear(&mut self) {
        if let Some(manager) = self.manager.take() {
            manager.abort();
        }
        for (_, watcher) in self.watchers.drain() {
            watcher.abort();
        }
        self.events = None;
    }
}

/// [`ModemBus`] backed by an oFono daemon on D-Bus.
pub struct OfonoBus {
    connection: Connection,
    service: String,
    subscriptions: Mutex<Subscriptions>,
}

impl OfonoBus {
    /// Connect to the bus named in `config`.
    ///
    /// # Errors
    /// Returns [`CellularError::InitializationFailed`] when the bus is unreachable.
    #[instrument(skip(config), fields(service = %config.service))]
    pub async fn new(config: &OfonoConfig) -> Result<Self, CellularError> {
        let connection = match config.bus {
            BusKind::System => Connection::system().await,
            BusKind::Session => Connection::session().await,
        }
        .map_err(|err| {
            CellularError::InitializationFailed(format!("D-Bus connection failed: {err}"))
        })?;

        Ok(Self::with_connection(connection, config.service.clone()))
    }

    /// Use an existing connection.
    pub fn with_connection(connection: Connection, service: String) -> Self {
        Self {
            connection,
            service,
            subscriptions: Mutex::new(Subscriptions::default()),
        }
    }

    async fn sender(&self) -> Result<UnboundedSender<BusEvent>, CellularError> {
        self.subscriptions
            .lock()
            .await
            .events
            .clone()
            .ok_or_else(|| CellularError::InitializationFailed("bus not connected".to_owned()))
    }

    async fn spawn_watcher(
        &self,
        modem: &ModemPath,
        interface: Interface,
        events: UnboundedSender<BusEvent>,
    ) -> Result<JoinHandle<()>, CellularError> {
        let handle = match interface {
            Interface::Modem => forward_property_changes!(
                ofono_proxy!(self, ModemProxy, modem.as_str()),
                modem,
                interface,
                events
            ),
            Interface::SimManager => forward_property_changes!(
                ofono_proxy!(self, SimManagerProxy, modem.as_str()),
                modem,
                interface,
                events
            ),
            Interface::NetworkRegistration => forward_property_changes!(
                ofono_proxy!(self, NetworkRegistrationProxy, modem.as_str()),
                modem,
                interface,
                events
            ),
            Interface::ConnectionManager => forward_property_changes!(
                ofono_proxy!(self, ConnectionManagerProxy, modem.as_str()),
                modem,
                interface,
                events
            ),
            Interface::SupplementaryServices => forward_property_changes!(
                ofono_proxy!(self, SupplementaryServicesProxy, modem.as_str()),
                modem,
                interface,
                events
            ),
            Interface::VoiceCallManager => forward_property_changes!(
                ofono_proxy!(self, VoiceCallManagerProxy, modem.as_str()),
                modem,
                interface,
                events
            ),
        };

        Ok(handle)
    }

    async fn raw_properties(
        &self,
        modem: &ModemPath,
        interface: Interface,
    ) -> Result<Properties, CellularError> {
        let properties = match interface {
            Interface::Modem => {
                ofono_proxy!(self, ModemProxy, modem.as_str())
                    .get_properties()
                    .await?
            }
            Interface::SimManager => {
                ofono_proxy!(self, SimManagerProxy, modem.as_str())
                    .get_properties()
                    .await?
            }
            Interface::NetworkRegistration => {
                ofono_proxy!(self, NetworkRegistrationProxy, modem.as_str())
                    .get_properties()
                    .await?
            }
            Interface::ConnectionManager => {
                ofono_proxy!(self, ConnectionManagerProxy, modem.as_str())
                    .get_properties()
                    .await?
            }
            Interface::SupplementaryServices => {
                ofono_proxy!(self, SupplementaryServicesProxy, modem.as_str())
                    .get_properties()
                    .await?
            }
            Interface::VoiceCallManager => {
                ofono_proxy!(self, VoiceCallManagerProxy, modem.as_str())
                    .get_properties()
                    .await?
            }
        };

        Ok(properties)
    }

    async fn sim(&self, modem: &ModemPath) -> Result<SimManagerProxy<'static>, CellularError> {
        Ok(ofono_proxy!(self, SimManagerProxy, modem.as_str()))
    }
}

fn operator_from(path: OwnedObjectPath, properties: &Properties) -> NetworkOperator {
    let text = |key: &str| {
        properties
            .get(key)
            .and_then(|value| value::string(value))
            .unwrap_or_default()
    };

    NetworkOperator {
        path: path.as_str().to_owned(),
        name: text("Name"),
        status: OperatorStatus::parse(&text("Status")),
        mcc: text("MobileCountryCode"),
        mnc: text("MobileNetworkCode"),
        technologies: properties
            .get("Technologies")
            .and_then(|value| value::strings(value))
            .unwrap_or_default(),
    }
}

fn remote(operation: &'static str) -> impl FnOnce(zbus::Error) -> CellularError {
    move |err| CellularError::operation(operation, err)
}

#[async_trait]
impl ModemBus for OfonoBus {
    #[instrument(skip(self, events), fields(service = %self.service))]
    async fn connect(
        &self,
        events: UnboundedSender<BusEvent>,
    ) -> Result<Vec<ModemSnapshot>, CellularError> {
        let manager = ofono_proxy!(self, ManagerProxy, "/");
        let mut added = manager.receive_modem_added().await?;
        let mut removed = manager.receive_modem_removed().await?;

        let forward = events.clone();
        let manager_task = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    Some(signal) = added.next() => {
                        let Ok(args) = signal.args() else { continue };
                        BusEvent::ModemAdded {
                            path: ModemPath::new(args.path.as_str()),
                            properties: PropertyChange::decode_all(Interface::Modem, &args.properties),
                        }
                    }
                    Some(signal) = removed.next() => {
                        let Ok(args) = signal.args() else { continue };
                        BusEvent::ModemRemoved {
                            path: ModemPath::new(args.path.as_str()),
                        }
                    }
                    else => break,
                };

                if forward.send(event).is_err() {
                    break;
                }
            }

            debug!("Modem manager stream ended");
        });

        let modems = manager
            .get_modems()
            .await
            .map_err(|err| CellularError::InitializationFailed(format!("GetModems: {err}")))?;

        let mut subscriptions = self.subscriptions.lock().await;
        subscriptions.clear();
        subscriptions.events = Some(events);
        subscriptions.manager = Some(manager_task);

        Ok(modems
            .into_iter()
            .map(|(path, properties)| {
                (
                    ModemPath::new(path.as_str()),
                    PropertyChange::decode_all(Interface::Modem, &properties),
                )
            })
            .collect())
    }

    async fn disconnect(&self) {
        self.subscriptions.lock().await.clear();
        debug!("Dropped oFono subscriptions");
    }

    #[instrument(skip(self), fields(modem = %modem, interface = %interface))]
    async fn watch(&self, modem: &ModemPath, interface: Interface) -> Result<(), CellularError> {
        let events = self.sender().await?;
        let handle = self.spawn_watcher(modem, interface, events).await?;

        if let Some(previous) = self
            .subscriptions
            .lock()
            .await
            .watchers
            .insert((modem.clone(), interface), handle)
        {
            previous.abort();
        }

        Ok(())
    }

    async fn unwatch(&self, modem: &ModemPath, interface: Interface) {
        let removed = self
            .subscriptions
            .lock()
            .await
            .watchers
            .remove(&(modem.clone(), interface));

        match removed {
            Some(handle) => handle.abort(),
            None => warn!(modem = %modem, interface = %interface, "No watcher to remove"),
        }
    }

    async fn properties(
        &self,
        modem: &ModemPath,
        interface: Interface,
    ) -> Result<Vec<PropertyChange>, CellularError> {
        let properties = self.raw_properties(modem, interface).await?;
        Ok(PropertyChange::decode_all(interface, &properties))
    }

    #[instrument(skip(self), fields(modem = %modem), err)]
    async fn set_property(
        &self,
        modem: &ModemPath,
        property: SettableProperty,
    ) -> Result<(), CellularError> {
        let value = Value::Bool(property.value());

        match property.interface() {
            Interface::Modem => ofono_proxy!(self, ModemProxy, modem.as_str())
                .set_property(property.name(), &value)
                .await
                .map_err(remote("set modem property")),
            Interface::ConnectionManager => {
                ofono_proxy!(self, ConnectionManagerProxy, modem.as_str())
                    .set_property(property.name(), &value)
                    .await
                    .map_err(remote("set connection manager property"))
            }
            interface => Err(CellularError::CapabilityUnavailable {
                modem: modem.clone(),
                interface,
            }),
        }
    }

    #[instrument(skip(self, pin), fields(modem = %modem), err)]
    async fn enter_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError> {
        self.sim(modem)
            .await?
            .enter_pin(code.as_str(), pin)
            .await
            .map_err(remote("enter PIN"))
    }

    #[instrument(skip(self, puk, new_pin), fields(modem = %modem), err)]
    async fn reset_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        puk: &str,
        new_pin: &str,
    ) -> Result<(), CellularError> {
        self.sim(modem)
            .await?
            .reset_pin(code.as_str(), puk, new_pin)
            .await
            .map_err(remote("reset PIN"))
    }

    #[instrument(skip(self, old_pin, new_pin), fields(modem = %modem), err)]
    async fn change_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        old_pin: &str,
        new_pin: &str,
    ) -> Result<(), CellularError> {
        self.sim(modem)
            .await?
            .change_pin(code.as_str(), old_pin, new_pin)
            .await
            .map_err(remote("change PIN"))
    }

    #[instrument(skip(self, pin), fields(modem = %modem), err)]
    async fn lock_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError> {
        self.sim(modem)
            .await?
            .lock_pin(code.as_str(), pin)
            .await
            .map_err(remote("lock PIN"))
    }

    #[instrument(skip(self, pin), fields(modem = %modem), err)]
    async fn unlock_pin(
        &self,
        modem: &ModemPath,
        code: SecurityCode,
        pin: &str,
    ) -> Result<(), CellularError> {
        self.sim(modem)
            .await?
            .unlock_pin(code.as_str(), pin)
            .await
            .map_err(remote("unlock PIN"))
    }

    #[instrument(skip(self), fields(modem = %modem), err)]
    async fn initiate(&self, modem: &ModemPath, command: &str) -> Result<SsReply, CellularError> {
        let (kind, reply) = ofono_proxy!(self, SupplementaryServicesProxy, modem.as_str())
            .initiate(command)
            .await
            .map_err(remote("initiate service request"))?;

        SsReply::decode(&kind, &reply).ok_or_else(|| CellularError::NotRecognized(kind))
    }

    #[instrument(skip(self), fields(modem = %modem), err)]
    async fn operators(
        &self,
        modem: &ModemPath,
        scan: bool,
    ) -> Result<Vec<NetworkOperator>, CellularError> {
        let proxy = ofono_proxy!(self, NetworkRegistrationProxy, modem.as_str());
        let entries = if scan {
            proxy.scan().await.map_err(remote("scan operators"))?
        } else {
            proxy
                .get_operators()
                .await
                .map_err(remote("list operators"))?
        };

        Ok(entries
            .into_iter()
            .map(|(path, properties)| operator_from(path, &properties))
            .collect())
    }

    #[instrument(skip(self), err)]
    async fn register_operator(&self, operator: &str) -> Result<(), CellularError> {
        ofono_proxy!(self, NetworkOperatorProxy, operator)
            .register()
            .await
            .map_err(remote("register on operator"))
    }

    #[instrument(skip(self), fields(modem = %modem), err)]
    async fn register_auto(&self, modem: &ModemPath) -> Result<(), CellularError> {
        ofono_proxy!(self, NetworkRegistrationProxy, modem.as_str())
            .register()
            .await
            .map_err(remote("automatic registration"))
    }
}
