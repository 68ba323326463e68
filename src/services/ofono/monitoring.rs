use std::sync::{Arc, Weak};

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, trace};

use super::{service::Inner, transport::BusEvent};

/// Requests the event loop answers between bus events.
pub(crate) enum Control {
    /// Reply once every queued bus event has been applied and flushed.
    Settle(oneshot::Sender<()>),
}

/// Event loop feeding bus events into the registry.
///
/// Each wake-up drains every queued event before flushing, so a burst of
/// property changes reaches observers as a single notification per tracker.
pub(crate) struct CellularMonitoring;

impl CellularMonitoring {
    pub(crate) fn spawn(
        inner: Weak<Inner>,
        mut events: mpsc::UnboundedReceiver<BusEvent>,
        mut control: mpsc::UnboundedReceiver<Control>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    Some(event) = events.recv() => {
                        let Some(inner) = inner.upgrade() else {
                            break;
                        };
                        inner.process(event).await;
                        Self::drain(&inner, &mut events).await;
                        inner.flush();
                    }

                    Some(request) = control.recv() => {
                        let Some(inner) = inner.upgrade() else {
                            break;
                        };
                        Self::drain(&inner, &mut events).await;
                        inner.flush();

                        match request {
                            Control::Settle(done) => {
                                if done.send(()).is_err() {
                                    trace!("Settle requester went away");
                                }
                            }
                        }
                    }

                    else => break,
                }
            }

            debug!("Cellular monitoring stopped");
        })
    }

    async fn drain(inner: &Arc<Inner>, events: &mut mpsc::UnboundedReceiver<BusEvent>) {
        while let Ok(event) = events.try_recv() {
            inner.process(event).await;
        }
    }
}
