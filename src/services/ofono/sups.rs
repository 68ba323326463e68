use std::sync::{Arc, LazyLock};

use regex::Regex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::{
    CallForwarding, CallId, CellularContext, CellularError, ForwardingKind, ModemPath, SsReply,
    call_waiting_from_reply,
    registry::{QueuedCall, SsCallback, Submitted},
    service::Inner,
};

/// Query voice call waiting.
const WAITING_QUERY: &str = "*#43#";
/// Activate voice call waiting.
const WAITING_ACTIVATE: &str = "*43#";
/// Deactivate voice call waiting.
const WAITING_DEACTIVATE: &str = "#43#";
/// Query all conditional forwardings for voice.
const FORWARDING_QUERY: &str = "*#004**11#";

static FORWARD_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{1,20}$").ok());

fn forwarding_register(kind: ForwardingKind, number: &str) -> Result<String, CellularError> {
    let valid = FORWARD_NUMBER
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(number));
    if !valid {
        return Err(CellularError::InvalidInput {
            field: "forwarding number",
            reason: format!("'{number}' is not a dialable number"),
        });
    }

    Ok(format!("**{}*{number}**11#", kind.service_code()))
}

fn forwarding_erase(kind: ForwardingKind) -> String {
    format!("##{}**11#", kind.service_code())
}

impl Inner {
    /// Dispatch queued requests one after another, skipping cancelled ones.
    ///
    /// Requests submitted while the drain runs join the same queue, so the
    /// bus sees every request in submission order.
    pub(crate) async fn replay(self: Arc<Self>, path: ModemPath, epoch: u64) {
        loop {
            let Some(QueuedCall { id, command, reply }) =
                self.registry().next_queued(&path, epoch)
            else {
                break;
            };

            let token = CancellationToken::new();
            let armed = self.registry().calls.arm(id, token.clone());
            if !armed {
                debug!(modem = %path, call_id = %id, "Skipping cancelled request");
                continue;
            }

            self.dispatch(&path, id, &command, token, reply).await;
        }
    }

    /// Send one request and complete its callback exactly once.
    pub(crate) async fn dispatch(
        &self,
        path: &ModemPath,
        id: CallId,
        command: &str,
        token: CancellationToken,
        reply: SsCallback,
    ) {
        let result = tokio::select! {
            biased;
            () = token.cancelled() => Err(CellularError::Canceled),
            result = self.bus.initiate(path, command) => result,
        };

        if self.registry().calls.take(id).is_none() {
            debug!(modem = %path, call_id = %id, "Request finished after it was dropped");
        }

        debug!(modem = %path, call_id = %id, ok = result.is_ok(), "Service request finished");
        reply(result);
    }
}

impl CellularContext {
    /// Queue or send a raw supplementary-service string.
    ///
    /// Requests made before the interface is available are held and sent in
    /// submission order once it attaches. Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// Returns [`CellularError::ModemNotFound`] for an unknown modem.
    #[instrument(skip(self, reply))]
    pub fn initiate_with<F>(
        &self,
        path: &ModemPath,
        command: &str,
        reply: F,
    ) -> Result<CallId, CellularError>
    where
        F: FnOnce(Result<SsReply, CellularError>) + Send + 'static,
    {
        let submitted =
            self.inner
                .registry()
                .submit_ss(path, command.to_owned(), Box::new(reply))?;

        match submitted {
            Submitted::Queued(id) => Ok(id),
            Submitted::Dispatch {
                id,
                token,
                command,
                reply,
            } => {
                let inner = Arc::clone(&self.inner);
                let path = path.clone();
                tokio::spawn(async move {
                    inner.dispatch(&path, id, &command, token, reply).await;
                });
                Ok(id)
            }
        }
    }

    /// Query call waiting; `reply` receives whether it is enabled.
    ///
    /// # Errors
    /// Returns [`CellularError::ModemNotFound`] for an unknown modem.
    pub fn query_call_waiting_with<F>(&self, path: &ModemPath, reply: F) -> Result<CallId, CellularError>
    where
        F: FnOnce(Result<bool, CellularError>) + Send + 'static,
    {
        self.initiate_with(path, WAITING_QUERY, move |result| {
            reply(result.and_then(|reply| call_waiting_from_reply(&reply)));
        })
    }

    /// Enable or disable call waiting; `reply` receives the resulting flag.
    ///
    /// # Errors
    /// Returns [`CellularError::ModemNotFound`] for an unknown modem.
    pub fn set_call_waiting_with<F>(
        &self,
        path: &ModemPath,
        enabled: bool,
        reply: F,
    ) -> Result<CallId, CellularError>
    where
        F: FnOnce(Result<bool, CellularError>) + Send + 'static,
    {
        let command = if enabled {
            WAITING_ACTIVATE
        } else {
            WAITING_DEACTIVATE
        };

        self.initiate_with(path, command, move |result| {
            reply(result.and_then(|reply| call_waiting_from_reply(&reply)));
        })
    }

    /// Query every forwarding condition.
    ///
    /// # Errors
    /// Returns [`CellularError::ModemNotFound`] for an unknown modem.
    pub fn query_call_forwarding_with<F>(
        &self,
        path: &ModemPath,
        reply: F,
    ) -> Result<CallId, CellularError>
    where
        F: FnOnce(Result<CallForwarding, CellularError>) + Send + 'static,
    {
        self.initiate_with(path, FORWARDING_QUERY, move |result| {
            reply(result.and_then(|reply| CallForwarding::from_reply(&reply)));
        })
    }

    /// Forward `kind` calls to `number`, or erase the forwarding when `number` is `None`.
    ///
    /// # Errors
    /// Returns [`CellularError::InvalidInput`] for a malformed number and
    /// [`CellularError::ModemNotFound`] for an unknown modem.
    pub fn set_call_forwarding_with<F>(
        &self,
        path: &ModemPath,
        kind: ForwardingKind,
        number: Option<&str>,
        reply: F,
    ) -> Result<CallId, CellularError>
    where
        F: FnOnce(Result<CallForwarding, CellularError>) + Send + 'static,
    {
        let command = match number {
            Some(number) => forwarding_register(kind, number)?,
            None => forwarding_erase(kind),
        };

        self.initiate_with(path, &command, move |result| {
            reply(result.and_then(|reply| CallForwarding::from_reply(&reply)));
        })
    }

    /// Whether call waiting is enabled.
    ///
    /// # Errors
    /// Returns an error when the modem is unknown or the network rejects the query.
    pub async fn call_waiting(&self, path: &ModemPath) -> Result<bool, CellularError> {
        let (tx, rx) = oneshot::channel();
        self.query_call_waiting_with(path, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| CellularError::Canceled)?
    }

    /// Enable or disable call waiting.
    ///
    /// # Errors
    /// Returns an error when the modem is unknown or the network rejects the change.
    pub async fn set_call_waiting(
        &self,
        path: &ModemPath,
        enabled: bool,
    ) -> Result<bool, CellularError> {
        let (tx, rx) = oneshot::channel();
        self.set_call_waiting_with(path, enabled, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| CellularError::Canceled)?
    }

    /// Current forwarding conditions.
    ///
    /// # Errors
    /// Returns an error when the modem is unknown or the network rejects the query.
    pub async fn call_forwarding(&self, path: &ModemPath) -> Result<CallForwarding, CellularError> {
        let (tx, rx) = oneshot::channel();
        self.query_call_forwarding_with(path, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| CellularError::Canceled)?
    }

    /// Register or erase one forwarding condition.
    ///
    /// # Errors
    /// Returns an error for a malformed number, an unknown modem or a rejected change.
    pub async fn set_call_forwarding(
        &self,
        path: &ModemPath,
        kind: ForwardingKind,
        number: Option<&str>,
    ) -> Result<CallForwarding, CellularError> {
        let (tx, rx) = oneshot::channel();
        self.set_call_forwarding_with(path, kind, number, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| CellularError::Canceled)?
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn forwarding_strings_carry_service_codes() {
        assert_eq!(
            forwarding_register(ForwardingKind::Busy, "+3581234").unwrap(),
            "**67*+3581234**11#"
        );
        assert_eq!(forwarding_erase(ForwardingKind::NoReply), "##61**11#");
    }

    #[test]
    fn forwarding_number_must_be_dialable() {
        assert!(matches!(
            forwarding_register(ForwardingKind::Unreachable, "12*34#"),
            Err(CellularError::InvalidInput { .. })
        ));
        assert!(forwarding_register(ForwardingKind::Unreachable, "").is_err());
    }
}
