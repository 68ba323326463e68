use std::fmt;
use std::sync::Arc;

/// Identifies one registration in an [`ObserverList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer#{}", self.0)
    }
}

/// Insertion-ordered list of observer callbacks.
///
/// Every registration gets its own [`ObserverId`], so registering the same
/// callback twice yields two independent entries that are removed one token
/// at a time.
pub struct ObserverList<F: ?Sized> {
    entries: Vec<(ObserverId, Arc<F>)>,
    next_id: u64,
}

impl<F: ?Sized> Default for ObserverList<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<F: ?Sized> ObserverList<F> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback and return the token that owns the entry.
    pub fn add(&mut self, callback: Arc<F>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    /// Remove the entry owned by `id`.
    ///
    /// Returns `false` when the token does not belong to this list.
    pub fn remove(&mut self, id: ObserverId) -> bool {
        match self.entries.iter().position(|(entry, _)| *entry == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Copy of the current callbacks, in insertion order.
    ///
    /// Fan-out iterates the snapshot, so callbacks may add or remove
    /// entries on the live list while they run.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }

    /// Invoke every registered callback in insertion order.
    pub fn notify(&self, mut invoke: impl FnMut(&F)) {
        for callback in self.snapshot() {
            invoke(&callback);
        }
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F: ?Sized> fmt::Debug for ObserverList<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use super::*;

    type Callback = dyn Fn(u32) + Send + Sync;

    fn recorder() -> (Arc<Mutex<Vec<(u8, u32)>>>, impl Fn(u8) -> Arc<Callback>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let make = move |tag: u8| -> Arc<Callback> {
            let sink = Arc::clone(&sink);
            Arc::new(move |value: u32| sink.lock().unwrap().push((tag, value)))
        };
        (seen, make)
    }

    #[test]
    fn notifies_in_insertion_order() {
        let (seen, make) = recorder();
        let mut list = ObserverList::<Callback>::new();
        list.add(make(1));
        list.add(make(2));
        list.add(make(3));

        list.notify(|callback| callback(7));

        assert_eq!(*seen.lock().unwrap(), vec![(1, 7), (2, 7), (3, 7)]);
    }

    #[test]
    fn duplicate_callbacks_are_removed_one_token_at_a_time() {
        let (seen, make) = recorder();
        let shared = make(9);
        let mut list = ObserverList::<Callback>::new();
        let first = list.add(Arc::clone(&shared));
        let second = list.add(shared);

        assert!(list.remove(first));
        list.notify(|callback| callback(1));
        assert_eq!(seen.lock().unwrap().len(), 1);

        assert!(list.remove(second));
        assert!(!list.remove(second));
        assert!(list.is_empty());
    }

    #[test]
    fn snapshot_survives_removal_during_fan_out() {
        let (seen, make) = recorder();
        let list = Arc::new(Mutex::new(ObserverList::<Callback>::new()));
        let first = list.lock().unwrap().add(make(1));
        list.lock().unwrap().add(make(2));

        let snapshot = list.lock().unwrap().snapshot();
        for callback in snapshot {
            list.lock().unwrap().remove(first);
            callback(5);
        }

        assert_eq!(*seen.lock().unwrap(), vec![(1, 5), (2, 5)]);
        assert_eq!(list.lock().unwrap().len(), 1);
    }
}
