//! Integration tests for supplementary-service requests and call bookkeeping.

#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::{sync::Arc, time::Duration};

use connui_cellular::services::ofono::{
    CallId, Cancellation, CellularContext, CellularError, ForwardingKind, Interface, MemoryBus,
    ModemPath, NetworkOperator, OperatorStatus, SsReply,
};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    time::timeout,
};

const MODEM: &str = "/phonesim";
const WAIT: Duration = Duration::from_secs(5);

type Replies = (
    UnboundedSender<(u32, Result<SsReply, CellularError>)>,
    UnboundedReceiver<(u32, Result<SsReply, CellularError>)>,
);

fn path() -> ModemPath {
    ModemPath::from(MODEM)
}

async fn started(interfaces: &[Interface]) -> (Arc<MemoryBus>, CellularContext) {
    let bus = Arc::new(MemoryBus::new());
    bus.add_modem(MODEM, interfaces);
    let ctx = CellularContext::new(bus.clone());
    ctx.get().await.unwrap();
    (bus, ctx)
}

fn initiate(
    ctx: &CellularContext,
    tx: &UnboundedSender<(u32, Result<SsReply, CellularError>)>,
    tag: u32,
    command: &str,
) -> CallId {
    let tx = tx.clone();
    ctx.initiate_with(&path(), command, move |result| {
        tx.send((tag, result)).unwrap();
    })
    .unwrap()
}

async fn next_reply(
    rx: &mut UnboundedReceiver<(u32, Result<SsReply, CellularError>)>,
) -> (u32, Result<SsReply, CellularError>) {
    timeout(WAIT, rx.recv()).await.unwrap().unwrap()
}

mod call_ids {
    use super::*;

    #[tokio::test]
    async fn ids_grow_while_outstanding_and_restart_once_drained() {
        let (bus, ctx) = started(&[Interface::SupplementaryServices]).await;
        let (tx, mut rx): Replies = mpsc::unbounded_channel();
        bus.pause();

        let ids: Vec<u32> = (0..3)
            .map(|tag| initiate(&ctx, &tx, tag, "*#43#").get())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        bus.resume();
        for _ in 0..3 {
            assert!(next_reply(&mut rx).await.1.is_ok());
        }

        assert_eq!(initiate(&ctx, &tx, 9, "*#43#"), CallId::BASE);
        next_reply(&mut rx).await;
    }

    #[tokio::test]
    async fn cancelling_an_unknown_id_changes_nothing() {
        let (_bus, ctx) = started(&[Interface::SupplementaryServices]).await;

        assert_eq!(ctx.cancel_call(CallId::BASE), Cancellation::Unknown);
        assert!(ctx.destroy().await);
    }

    #[tokio::test]
    async fn unknown_modem_fails_synchronously() {
        let (_bus, ctx) = started(&[Interface::SupplementaryServices]).await;

        let result = ctx.initiate_with(&ModemPath::from("/nope"), "*#43#", |_| {});

        assert!(matches!(result, Err(CellularError::ModemNotFound(_))));
    }
}

mod queueing {
    use super::*;

    #[tokio::test]
    async fn queued_requests_replay_in_order_exactly_once() {
        let (bus, ctx) = started(&[Interface::SimManager]).await;
        let (tx, mut rx): Replies = mpsc::unbounded_channel();

        let commands = ["*43#", "*#43#", "#43#"];
        for (tag, command) in commands.iter().enumerate() {
            initiate(&ctx, &tx, tag as u32, command);
        }
        ctx.settle().await;
        assert!(bus.initiated().is_empty());

        bus.set_interfaces(
            MODEM,
            &[Interface::SimManager, Interface::SupplementaryServices],
        )
        .unwrap();
        ctx.settle().await;

        let mut tags = Vec::new();
        for _ in 0..3 {
            let (tag, result) = next_reply(&mut rx).await;
            assert!(result.is_ok());
            tags.push(tag);
        }
        assert_eq!(tags, vec![0, 1, 2]);

        let sent: Vec<String> = bus.initiated().into_iter().map(|(_, c)| c).collect();
        assert_eq!(sent, commands);

        drop(tx);
        assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn requests_made_during_replay_wait_their_turn() {
        let (bus, ctx) = started(&[Interface::SimManager]).await;
        let (tx, mut rx): Replies = mpsc::unbounded_channel();

        initiate(&ctx, &tx, 0, "*43#");
        initiate(&ctx, &tx, 1, "*#43#");
        bus.pause();
        bus.set_interfaces(
            MODEM,
            &[Interface::SimManager, Interface::SupplementaryServices],
        )
        .unwrap();
        ctx.settle().await;

        initiate(&ctx, &tx, 2, "#43#");
        bus.resume();

        let mut tags = Vec::new();
        for _ in 0..3 {
            let (tag, result) = next_reply(&mut rx).await;
            assert!(result.is_ok());
            tags.push(tag);
        }
        assert_eq!(tags, vec![0, 1, 2]);

        let sent: Vec<String> = bus.initiated().into_iter().map(|(_, c)| c).collect();
        assert_eq!(sent, ["*43#", "*#43#", "#43#"]);
        assert!(!ctx.call_waiting(&path()).await.unwrap());
    }

    #[tokio::test]
    async fn cancelled_queued_request_is_never_sent() {
        let (bus, ctx) = started(&[Interface::SimManager]).await;
        let (tx, mut rx): Replies = mpsc::unbounded_channel();

        let cancelled = initiate(&ctx, &tx, 0, "*43#");
        initiate(&ctx, &tx, 1, "*#43#");
        assert_eq!(ctx.cancel_call(cancelled), Cancellation::Destroyed);

        bus.set_interfaces(
            MODEM,
            &[Interface::SimManager, Interface::SupplementaryServices],
        )
        .unwrap();
        ctx.settle().await;

        let (tag, result) = next_reply(&mut rx).await;
        assert_eq!(tag, 1);
        assert!(result.is_ok());
        assert_eq!(bus.initiated(), vec![(path(), "*#43#".to_string())]);

        drop(tx);
        assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn removal_fails_queued_requests() {
        let (bus, ctx) = started(&[Interface::SimManager]).await;
        let (tx, mut rx): Replies = mpsc::unbounded_channel();

        initiate(&ctx, &tx, 0, "*#43#");
        bus.remove_modem(MODEM);
        ctx.settle().await;

        let (_, result) = next_reply(&mut rx).await;
        assert!(matches!(result, Err(CellularError::ModemNotFound(_))));
        assert!(ctx.destroy().await);
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn dispatched_request_completes_once_with_canceled() {
        let (bus, ctx) = started(&[Interface::SupplementaryServices]).await;
        let (tx, mut rx): Replies = mpsc::unbounded_channel();
        bus.pause();

        let id = initiate(&ctx, &tx, 0, "*#43#");
        tokio::task::yield_now().await;
        assert_eq!(ctx.cancel_call(id), Cancellation::Signalled);

        let (_, result) = next_reply(&mut rx).await;
        assert!(matches!(result, Err(CellularError::Canceled)));

        bus.resume();
        drop(tx);
        assert!(timeout(WAIT, rx.recv()).await.unwrap().is_none());
        assert_eq!(ctx.cancel_call(id), Cancellation::Unknown);
    }

    #[tokio::test]
    async fn operator_scan_can_be_cancelled() {
        let (bus, ctx) = started(&[Interface::NetworkRegistration]).await;
        bus.pause();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let id = ctx
            .scan_operators_with(&path(), true, move |result| {
                tx.send(result).unwrap();
            })
            .unwrap();
        assert_eq!(ctx.cancel_call(id), Cancellation::Signalled);

        let result = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert!(matches!(result, Err(CellularError::Canceled)));
        bus.resume();
    }
}

mod services {
    use super::*;

    #[tokio::test]
    async fn call_waiting_round_trip() {
        let (_bus, ctx) = started(&[Interface::SupplementaryServices]).await;

        assert!(!ctx.call_waiting(&path()).await.unwrap());
        assert!(ctx.set_call_waiting(&path(), true).await.unwrap());
        assert!(ctx.call_waiting(&path()).await.unwrap());
    }

    #[tokio::test]
    async fn forwarding_register_and_erase() {
        let (bus, ctx) = started(&[Interface::SupplementaryServices]).await;

        let forwarding = ctx
            .set_call_forwarding(&path(), ForwardingKind::Busy, Some("+358401234567"))
            .await
            .unwrap();
        assert!(forwarding.busy.enabled);
        assert_eq!(forwarding.busy.number, "+358401234567");
        assert!(!forwarding.no_reply.enabled);

        let forwarding = ctx
            .set_call_forwarding(&path(), ForwardingKind::Busy, None)
            .await
            .unwrap();
        assert!(!forwarding.busy.enabled);

        let sent: Vec<String> = bus.initiated().into_iter().map(|(_, c)| c).collect();
        assert_eq!(sent, vec!["**67*+358401234567**11#", "##67**11#"]);
    }

    #[tokio::test]
    async fn malformed_forwarding_number_is_rejected_before_sending() {
        let (bus, ctx) = started(&[Interface::SupplementaryServices]).await;

        let result = ctx
            .set_call_forwarding(&path(), ForwardingKind::Unreachable, Some("12#"))
            .await;

        assert!(matches!(result, Err(CellularError::InvalidInput { .. })));
        assert!(bus.initiated().is_empty());
    }

    #[tokio::test]
    async fn manual_operator_selection() {
        let (bus, ctx) = started(&[Interface::NetworkRegistration]).await;
        bus.set_operators(vec![NetworkOperator {
            path: "/phonesim/operator/24405".to_string(),
            name: "Elisa".to_string(),
            status: OperatorStatus::Available,
            mcc: "244".to_string(),
            mnc: "05".to_string(),
            technologies: vec!["gsm".to_string(), "lte".to_string()],
        }]);

        let operators = ctx.operators(&path(), false).await.unwrap();
        assert_eq!(operators.len(), 1);

        ctx.select_operator(&path(), &operators[0]).await.unwrap();
        assert_eq!(bus.registered(), vec!["/phonesim/operator/24405"]);
    }
}
