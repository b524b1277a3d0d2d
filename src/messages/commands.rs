//! State commands - messages from handles to the state actor

use anyhow::Result;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::models::{StateChange, SubscriptionId};

/// Commands processed one at a time by the state actor
#[derive(Debug)]
pub enum StateCommand {
    /// Read a deep copy of a value
    Get {
        path: String,
        reply: oneshot::Sender<Option<Value>>,
    },
    /// Write a value, notifying only on change
    Set {
        path: String,
        value: Value,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Write a value and notify unconditionally
    Dispatch {
        path: String,
        value: Value,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Forward changes at `path` (and below) to `events`
    Subscribe {
        path: String,
        events: mpsc::UnboundedSender<StateChange>,
        reply: oneshot::Sender<Result<SubscriptionId>>,
    },
    /// Remove a subscription
    Unsubscribe {
        id: SubscriptionId,
        reply: oneshot::Sender<bool>,
    },
    /// Copy of the whole tree
    Snapshot {
        reply: oneshot::Sender<Value>,
    },
    /// Stop the actor
    Shutdown,
}

impl StateCommand {
    /// True for commands that may notify listeners
    pub fn is_write(&self) -> bool {
        matches!(self, StateCommand::Set { .. } | StateCommand::Dispatch { .. })
    }
}
