//! Host integration - the event object a store is constructed with
//!
//! The host only observes store activity; it is never part of the state model.

use crate::models::StateChange;

/// Lifecycle hooks a host event loop can attach to a store
pub trait Host: Send {
    /// Called once per notifying write, with the change at the exact path
    fn state_changed(&self, _change: &StateChange) {}

    /// Called when a listener panics during notification
    fn listener_failed(&self, _path: &str, _message: &str) {}
}

/// Host that ignores every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHost;

impl Host for NoopHost {}
