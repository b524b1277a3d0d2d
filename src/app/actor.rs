//! State actor - owns the store and serializes every access to it

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::app::state::AppState;
use crate::messages::StateCommand;
use crate::models::{StateChange, SubscriptionId};

/// Actor that owns an `AppState` and processes commands in arrival order
pub struct StateActor {
    state: AppState,
    subscribers: HashMap<SubscriptionId, mpsc::UnboundedSender<StateChange>>,
}

impl StateActor {
    pub fn new(state: AppState) -> Self {
        StateActor {
            state,
            subscribers: HashMap::new(),
        }
    }

    /// Run the actor message loop, returning the store once stopped
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<StateCommand>) -> AppState {
        tracing::info!("State actor started");

        while let Some(cmd) = cmd_rx.recv().await {
            let is_write = cmd.is_write();
            if self.handle_command(cmd) {
                break;
            }
            if is_write {
                self.prune_closed();
            }
        }

        tracing::info!(subscribers = self.subscribers.len(), "State actor stopped");
        self.state
    }

    /// Handle one command, returns true if shutdown was requested
    fn handle_command(&mut self, cmd: StateCommand) -> bool {
        match cmd {
            StateCommand::Get { path, reply } => {
                let _ = reply.send(self.state.get(&path));
            }
            StateCommand::Set { path, value, reply } => {
                let result = self.state.set(&path, value);
                if let Err(e) = &result {
                    tracing::warn!(path, error = %e, "Rejected set");
                }
                let _ = reply.send(result);
            }
            StateCommand::Dispatch { path, value, reply } => {
                let result = self.state.dispatch(&path, value);
                if let Err(e) = &result {
                    tracing::warn!(path, error = %e, "Rejected dispatch");
                }
                let _ = reply.send(result);
            }
            StateCommand::Subscribe { path, events, reply } => {
                let sink = events.clone();
                let result = self.state.on(&path, move |change| {
                    let _ = sink.send(change.clone());
                });
                if let Ok(id) = &result {
                    tracing::info!(%id, path, "Subscribed");
                    self.subscribers.insert(*id, events);
                }
                let _ = reply.send(result);
            }
            StateCommand::Unsubscribe { id, reply } => {
                self.subscribers.remove(&id);
                let _ = reply.send(self.state.off(id));
            }
            StateCommand::Snapshot { reply } => {
                let _ = reply.send(self.state.snapshot());
            }
            StateCommand::Shutdown => return true,
        }

        false
    }

    /// Drop subscriptions whose receiver has gone away
    fn prune_closed(&mut self) {
        let closed: Vec<SubscriptionId> = self
            .subscribers
            .iter()
            .filter(|(_, tx)| tx.is_closed())
            .map(|(id, _)| *id)
            .collect();

        for id in closed {
            self.subscribers.remove(&id);
            self.state.off(id);
            tracing::debug!(%id, "Pruned closed subscription");
        }
    }
}
