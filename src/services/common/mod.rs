//! Common utilities and abstractions for services

/// Reactive property system for fine-grained state updates
pub mod property;

/// Token-based observer lists with snapshot fan-out
pub mod observer;

/// Bookkeeping for cancellable in-flight remote calls
pub mod calls;

pub use calls::{CallId, CallRegistry, Cancellation, PendingCall};
pub use observer::{ObserverId, ObserverList};
pub use property::Property;
