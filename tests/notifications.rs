//! Integration tests for modem tracking and observer fan-out.

#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::sync::{Arc, Mutex};

use connui_cellular::services::ofono::{
    CellularContext, CellularError, Interface, MemoryBus, ModemPath, NetRegState, Rat, SimState,
    SimStatus,
};

const MODEM: &str = "/phonesim";

fn full_modem(bus: &MemoryBus) {
    bus.add_modem(
        MODEM,
        &[
            Interface::SimManager,
            Interface::NetworkRegistration,
            Interface::ConnectionManager,
            Interface::SupplementaryServices,
            Interface::VoiceCallManager,
        ],
    );
}

fn setup() -> (Arc<MemoryBus>, CellularContext) {
    let bus = Arc::new(MemoryBus::new());
    full_modem(&bus);
    let ctx = CellularContext::new(bus.clone());
    (bus, ctx)
}

fn path() -> ModemPath {
    ModemPath::from(MODEM)
}

/// Collects every value an observer was called with.
#[derive(Clone, Default)]
struct Recorder<T>(Arc<Mutex<Vec<T>>>);

impl<T: Clone> Recorder<T> {
    fn push(&self, value: T) {
        self.0.lock().unwrap().push(value);
    }

    fn all(&self) -> Vec<T> {
        self.0.lock().unwrap().clone()
    }

    fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn get_loads_every_advertised_interface() {
        let (bus, ctx) = setup();

        ctx.get().await.unwrap();

        assert_eq!(ctx.modems(), vec![path()]);
        assert_eq!(ctx.default_modem(), Some(path()));
        assert_eq!(ctx.modem(&path()).unwrap().manufacturer, "phonesim");
        assert_eq!(ctx.sim_state(&path()).unwrap().status(), SimStatus::Ok);
        assert_eq!(ctx.net_state(&path()).unwrap().name, "Phonesim");
        assert!(ctx.connmgr_state(&path()).unwrap().attached);
        assert_eq!(
            ctx.modem(&path()).unwrap().emergency_numbers,
            vec!["112", "911"]
        );
        assert!(bus.is_watched(MODEM, Interface::NetworkRegistration));
    }

    #[tokio::test]
    async fn destroy_waits_for_the_last_observer() {
        let (bus, ctx) = setup();

        let subscription = ctx.register_net_observer(|_, _| {}).await.unwrap();
        assert!(!ctx.destroy().await);
        assert!(ctx.is_running().await);

        ctx.close(subscription).await.unwrap();

        assert!(!ctx.is_running().await);
        assert!(ctx.modems().is_empty());
        assert!(!bus.is_watched(MODEM, Interface::NetworkRegistration));
    }

    #[tokio::test]
    async fn closing_twice_reports_unknown_observer() {
        let (_bus, ctx) = setup();

        let subscription = ctx.register_sim_observer(|_, _| {}).await.unwrap();
        ctx.close(subscription).await.unwrap();

        assert!(matches!(
            ctx.close(subscription).await,
            Err(CellularError::ObserverNotFound)
        ));
    }

    #[tokio::test]
    async fn failed_interface_never_attaches() {
        let bus = Arc::new(MemoryBus::new());
        bus.fail_interface(Interface::NetworkRegistration);
        full_modem(&bus);
        let ctx = CellularContext::new(bus.clone());

        ctx.get().await.unwrap();

        assert!(ctx.net_state(&path()).is_none());
        assert!(ctx.sim_state(&path()).is_some());
        assert!(!bus.is_watched(MODEM, Interface::NetworkRegistration));
        assert!(matches!(
            ctx.register_auto(&path()).await,
            Err(CellularError::CapabilityUnavailable { .. })
        ));
    }
}

mod coalescing {
    use super::*;

    #[tokio::test]
    async fn burst_of_changes_notifies_once_with_latest_state() {
        let (bus, ctx) = setup();
        let seen = Recorder::<NetRegState>::default();

        let recorder = seen.clone();
        let _subscription = ctx
            .register_net_observer(move |_, net| recorder.push(net.clone()))
            .await
            .unwrap();

        for strength in [10u8, 40, 95] {
            bus.update(MODEM, Interface::NetworkRegistration, "Strength", strength)
                .unwrap();
        }
        bus.update(MODEM, Interface::NetworkRegistration, "Name", "Elisa")
            .unwrap();
        ctx.settle().await;

        let seen = seen.all();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].strength, 95);
        assert_eq!(seen[0].name, "Elisa");
        assert_eq!(seen[0].signal_bars(), 5);
    }

    #[tokio::test]
    async fn closed_observer_is_never_called() {
        let (bus, ctx) = setup();
        let kept = Recorder::<u8>::default();
        let closed = Recorder::<u8>::default();

        let recorder = kept.clone();
        let _keep = ctx
            .register_net_observer(move |_, net| recorder.push(net.strength))
            .await
            .unwrap();
        let recorder = closed.clone();
        let dropped = ctx
            .register_net_observer(move |_, net| recorder.push(net.strength))
            .await
            .unwrap();
        ctx.close(dropped).await.unwrap();

        bus.update(MODEM, Interface::NetworkRegistration, "Strength", 33u8)
            .unwrap();
        ctx.settle().await;

        assert_eq!(kept.all(), vec![33]);
        assert_eq!(closed.len(), 0);
    }

    #[tokio::test]
    async fn hspa_counts_as_umts_with_hsdpa() {
        let (bus, ctx) = setup();
        let seen = Recorder::<NetRegState>::default();

        let recorder = seen.clone();
        let _subscription = ctx
            .register_net_observer(move |_, net| recorder.push(net.clone()))
            .await
            .unwrap();

        bus.update(MODEM, Interface::NetworkRegistration, "Technology", "hspa")
            .unwrap();
        ctx.settle().await;

        let net = seen.all().pop().unwrap();
        assert_eq!(net.rat(), Rat::Umts);
        assert!(net.hsdpa_allocated());

        bus.update(MODEM, Interface::NetworkRegistration, "Technology", "umts")
            .unwrap();
        ctx.settle().await;

        let net = seen.all().pop().unwrap();
        assert_eq!(net.rat(), Rat::Umts);
        assert!(!net.hsdpa_allocated());
    }
}

mod sim {
    use super::*;

    #[tokio::test]
    async fn code_query_fires_once_per_lock() {
        let (bus, ctx) = setup();
        let statuses = Recorder::<SimStatus>::default();
        let queries = Recorder::<SimStatus>::default();

        let recorder = statuses.clone();
        let _sim = ctx
            .register_sim_observer(move |_, sim| recorder.push(sim.status()))
            .await
            .unwrap();
        let recorder = queries.clone();
        let _query = ctx
            .register_code_query_observer(move |_, status| recorder.push(status))
            .await
            .unwrap();

        bus.lock_sim(MODEM, "1234", 3).unwrap();
        ctx.settle().await;
        bus.update(MODEM, Interface::SimManager, "ServiceProviderName", "Other")
            .unwrap();
        ctx.settle().await;

        assert_eq!(
            statuses.all(),
            vec![SimStatus::PinRequired, SimStatus::PinRequired]
        );
        assert_eq!(queries.all(), vec![SimStatus::PinRequired]);
    }

    #[tokio::test]
    async fn inserted_locked_sim_queries_once() {
        let (bus, ctx) = setup();
        let statuses = Recorder::<SimStatus>::default();
        let queries = Recorder::<SimStatus>::default();

        let recorder = statuses.clone();
        let _sim = ctx
            .register_sim_observer(move |_, sim| recorder.push(sim.status()))
            .await
            .unwrap();
        let recorder = queries.clone();
        let _query = ctx
            .register_code_query_observer(move |_, status| recorder.push(status))
            .await
            .unwrap();

        bus.update(MODEM, Interface::SimManager, "Present", false)
            .unwrap();
        ctx.settle().await;
        bus.update(MODEM, Interface::SimManager, "Present", true)
            .unwrap();
        bus.update(MODEM, Interface::SimManager, "PinRequired", "pin")
            .unwrap();
        ctx.settle().await;

        let statuses = statuses.all();
        assert!(statuses.contains(&SimStatus::NoSim));
        assert_eq!(statuses.last(), Some(&SimStatus::PinRequired));
        assert_eq!(queries.all(), vec![SimStatus::PinRequired]);
    }

    #[tokio::test]
    async fn exhausted_puk_reads_as_rejected() {
        let (bus, ctx) = setup();
        ctx.get().await.unwrap();
        let _subscription = ctx.register_sim_observer(|_, _| {}).await.unwrap();

        bus.update(MODEM, Interface::SimManager, "PinRequired", "puk")
            .unwrap();
        ctx.settle().await;
        assert_eq!(
            ctx.sim_state(&path()).unwrap().status(),
            SimStatus::PukRequired
        );

        let retries: std::collections::HashMap<String, u8> =
            [("puk".to_string(), 0u8)].into_iter().collect();
        bus.update(MODEM, Interface::SimManager, "Retries", retries)
            .unwrap();
        ctx.settle().await;

        assert_eq!(ctx.sim_state(&path()).unwrap().status(), SimStatus::Rejected);
    }
}

mod removal {
    use super::*;

    #[tokio::test]
    async fn removed_modem_delivers_untracked_sentinels() {
        let (bus, ctx) = setup();
        let modems = Recorder::<bool>::default();
        let sims = Recorder::<SimState>::default();

        let recorder = modems.clone();
        let _modem = ctx
            .register_modem_observer(move |_, modem| recorder.push(modem.tracked))
            .await
            .unwrap();
        let recorder = sims.clone();
        let _sim = ctx
            .register_sim_observer(move |_, sim| recorder.push(sim.clone()))
            .await
            .unwrap();

        bus.remove_modem(MODEM);
        ctx.settle().await;

        assert_eq!(modems.all(), vec![false]);
        let sim = sims.all().pop().unwrap();
        assert!(!sim.tracked);
        assert_eq!(sim.status(), SimStatus::Unknown);
        assert!(ctx.modems().is_empty());
        assert!(ctx.modem(&path()).is_none());
    }

    #[tokio::test]
    async fn dropped_interface_sends_sentinel_and_stops_tracking() {
        let (bus, ctx) = setup();
        let nets = Recorder::<bool>::default();

        let recorder = nets.clone();
        let _subscription = ctx
            .register_net_observer(move |_, net| recorder.push(net.tracked))
            .await
            .unwrap();

        bus.set_interfaces(MODEM, &[Interface::SimManager]).unwrap();
        ctx.settle().await;

        assert_eq!(nets.all(), vec![false]);
        assert!(ctx.net_state(&path()).is_none());
        assert!(ctx.sim_state(&path()).is_some());
        assert!(!bus.is_watched(MODEM, Interface::NetworkRegistration));
    }

    #[tokio::test]
    async fn modem_list_follows_hotplug() {
        let (bus, ctx) = setup();
        ctx.get().await.unwrap();
        let _subscription = ctx.register_modem_observer(|_, _| {}).await.unwrap();

        bus.add_modem("/ril_0", &[Interface::SimManager]);
        ctx.settle().await;
        assert_eq!(ctx.modems(), vec![path(), ModemPath::from("/ril_0")]);

        bus.remove_modem(MODEM);
        ctx.settle().await;
        assert_eq!(ctx.modems(), vec![ModemPath::from("/ril_0")]);
        assert_eq!(ctx.default_modem(), Some(ModemPath::from("/ril_0")));
    }
}
