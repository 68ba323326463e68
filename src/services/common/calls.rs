use std::collections::HashMap;
use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Identifier of an in-flight remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(u32);

impl CallId {
    /// First id handed out, and the value ids fall back to once no call is outstanding.
    pub const BASE: CallId = CallId(1);

    /// Raw numeric value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An outstanding call and what is needed to cancel it.
#[derive(Debug)]
pub struct PendingCall<O> {
    /// Object the call was issued against.
    pub origin: O,
    /// Transport-level cancellation token, absent while the call is still queued.
    pub token: Option<CancellationToken>,
}

/// What [`CallRegistry::cancel`] did with the call.
#[derive(Debug, PartialEq, Eq)]
pub enum Cancellation {
    /// The call was dispatched; its token was signalled and its task reports the outcome.
    Signalled,
    /// The call never reached the transport and has been dropped.
    Destroyed,
    /// No such call is outstanding.
    Unknown,
}

/// Table of outstanding remote calls keyed by [`CallId`].
#[derive(Debug)]
pub struct CallRegistry<O> {
    calls: HashMap<CallId, PendingCall<O>>,
    next: u32,
}

impl<O> Default for CallRegistry<O> {
    fn default() -> Self {
        Self {
            calls: HashMap::new(),
            next: CallId::BASE.0,
        }
    }
}

impl<O> CallRegistry<O> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next call id.
    ///
    /// Ids grow strictly while any call is outstanding and restart at
    /// [`CallId::BASE`] after the table has drained.
    pub fn next_id(&mut self) -> CallId {
        let id = CallId(self.next);
        self.next = self.next.wrapping_add(1).max(CallId::BASE.0);
        id
    }

    /// Register a call under `id`.
    pub fn add(&mut self, id: CallId, origin: O, token: Option<CancellationToken>) {
        if self
            .calls
            .insert(id, PendingCall { origin, token })
            .is_some()
        {
            warn!(call_id = %id, "Replaced an outstanding call with the same id");
        }
    }

    /// Attach a transport token to a queued call that is about to be dispatched.
    ///
    /// Returns `false` when the call has been cancelled in the meantime.
    pub fn arm(&mut self, id: CallId, token: CancellationToken) -> bool {
        match self.calls.get_mut(&id) {
            Some(call) => {
                call.token = Some(token);
                true
            }
            None => false,
        }
    }

    /// Remove and return the call registered under `id`.
    pub fn take(&mut self, id: CallId) -> Option<PendingCall<O>> {
        let call = self.calls.remove(&id);
        if call.is_none() {
            debug!(call_id = %id, "No outstanding call to take");
        }
        self.reset_if_drained();
        call
    }

    /// Cancel the call registered under `id`.
    ///
    /// Dispatched calls keep their entry so the task can still deliver its
    /// single terminal result; queued calls are removed on the spot.
    pub fn cancel(&mut self, id: CallId) -> Cancellation {
        let Some(token) = self.calls.get(&id).map(|call| call.token.clone()) else {
            warn!(call_id = %id, "Cannot cancel unknown call");
            return Cancellation::Unknown;
        };

        match token {
            Some(token) => {
                token.cancel();
                Cancellation::Signalled
            }
            None => {
                self.calls.remove(&id);
                self.reset_if_drained();
                Cancellation::Destroyed
            }
        }
    }

    /// Whether `id` is outstanding.
    pub fn contains(&self, id: CallId) -> bool {
        self.calls.contains_key(&id)
    }

    /// Number of outstanding calls.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether no call is outstanding.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    fn reset_if_drained(&mut self) {
        if self.calls.is_empty() {
            self.next = CallId::BASE.0;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn issue(registry: &mut CallRegistry<&'static str>, token: bool) -> CallId {
        let id = registry.next_id();
        registry.add(id, "/modem0", token.then(CancellationToken::new));
        id
    }

    #[test]
    fn ids_restart_once_every_call_completed() {
        let mut registry = CallRegistry::new();
        let ids: Vec<u32> = (0..3).map(|_| issue(&mut registry, true).get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        for id in [1, 2, 3] {
            assert!(registry.take(CallId(id)).is_some());
        }

        assert_eq!(issue(&mut registry, true), CallId::BASE);
    }

    #[test]
    fn ids_keep_growing_while_calls_are_outstanding() {
        let mut registry = CallRegistry::new();
        let first = issue(&mut registry, true);
        let second = issue(&mut registry, true);
        registry.take(first);

        let third = issue(&mut registry, true);
        assert!(third > second);
        assert_ne!(third, second);
    }

    #[test]
    fn cancelling_unknown_call_leaves_others_alone() {
        let mut registry = CallRegistry::new();
        let id = issue(&mut registry, true);

        assert_eq!(registry.cancel(CallId(42)), Cancellation::Unknown);
        assert!(registry.contains(id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn cancel_signals_dispatched_and_destroys_queued() {
        let mut registry = CallRegistry::new();
        let dispatched = registry.next_id();
        let token = CancellationToken::new();
        registry.add(dispatched, "/modem0", Some(token.clone()));
        let queued = issue(&mut registry, false);

        assert_eq!(registry.cancel(dispatched), Cancellation::Signalled);
        assert!(token.is_cancelled());
        assert!(registry.contains(dispatched));

        assert_eq!(registry.cancel(queued), Cancellation::Destroyed);
        assert!(!registry.contains(queued));
    }

    #[test]
    fn arm_fails_after_queued_call_was_cancelled() {
        let mut registry = CallRegistry::new();
        let queued = issue(&mut registry, false);
        registry.cancel(queued);

        assert!(!registry.arm(queued, CancellationToken::new()));
    }
}
