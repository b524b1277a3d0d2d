//! State handle - clonable async front-end over the state actor channel

use anyhow::{anyhow, Result};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::app::actor::StateActor;
use crate::app::state::AppState;
use crate::messages::StateCommand;
use crate::models::{StateChange, SubscriptionId};

/// Cheap, clonable access to a store owned by a `StateActor`
#[derive(Clone, Debug)]
pub struct StateHandle {
    cmd_tx: mpsc::UnboundedSender<StateCommand>,
}

impl StateHandle {
    pub fn new(cmd_tx: mpsc::UnboundedSender<StateCommand>) -> Self {
        StateHandle { cmd_tx }
    }

    /// Spawn an actor owning `state` on the current Tokio runtime
    pub fn spawn(state: AppState) -> (Self, tokio::task::JoinHandle<AppState>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(StateActor::new(state).run(cmd_rx));
        (StateHandle::new(cmd_tx), task)
    }

    pub async fn get(&self, path: &str) -> Result<Option<Value>> {
        let (reply, rx) = oneshot::channel();
        self.send(StateCommand::Get {
            path: path.to_string(),
            reply,
        })?;
        Ok(rx.await?)
    }

    pub async fn set(&self, path: &str, value: impl Into<Value>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(StateCommand::Set {
            path: path.to_string(),
            value: value.into(),
            reply,
        })?;
        rx.await?
    }

    pub async fn dispatch(&self, path: &str, value: impl Into<Value>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(StateCommand::Dispatch {
            path: path.to_string(),
            value: value.into(),
            reply,
        })?;
        rx.await?
    }

    /// Subscribe to `path`; changes arrive on the returned receiver in write order
    pub async fn subscribe(
        &self,
        path: &str,
    ) -> Result<(SubscriptionId, mpsc::UnboundedReceiver<StateChange>)> {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (reply, rx) = oneshot::channel();
        self.send(StateCommand::Subscribe {
            path: path.to_string(),
            events,
            reply,
        })?;
        let id = rx.await??;
        Ok((id, events_rx))
    }

    pub async fn unsubscribe(&self, id: SubscriptionId) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(StateCommand::Unsubscribe { id, reply })?;
        Ok(rx.await?)
    }

    pub async fn snapshot(&self) -> Result<Value> {
        let (reply, rx) = oneshot::channel();
        self.send(StateCommand::Snapshot { reply })?;
        Ok(rx.await?)
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(StateCommand::Shutdown);
    }

    fn send(&self, cmd: StateCommand) -> Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow!("State actor has stopped"))
    }
}
