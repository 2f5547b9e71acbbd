use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::app_core::{Action, ActionFamily, Store};
use crate::domain::RootState;
use crate::effects::{Completion, EffectRunner};
use crate::ports::ApiGateway;

/// What happened to a completion pulled off the effect channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied(ActionFamily),
    /// A newer request of the same family (or a reset) superseded it.
    Discarded(ActionFamily),
}

/// Dispatch loop: reducers run synchronously, effects report back through
/// a channel drained by [`AppKernel::tick`] or [`AppKernel::process_next`].
pub struct AppKernel {
    store: Store,
    effects: EffectRunner,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl AppKernel {
    pub fn new(store: Store, gateway: Arc<dyn ApiGateway>, handle: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            store,
            effects: EffectRunner::new(gateway, handle, tx),
            rx,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn state(&self) -> RootState {
        self.store.state()
    }

    /// Runs every reducer, then hands the action to the effect runner.
    pub fn dispatch(&mut self, action: Action) {
        debug!("dispatch {}", action.action_type());
        self.store.apply(&action);
        self.effects.observe(&action);
    }

    fn deliver(&mut self, completion: Completion) -> Delivery {
        let family = completion.family;
        if self.effects.accept(&completion) {
            self.dispatch(completion.action);
            Delivery::Applied(family)
        } else {
            warn!(
                "discarding stale {} from request {}",
                completion.action.action_type(),
                completion.request_id
            );
            Delivery::Discarded(family)
        }
    }

    /// Applies every completion that has already arrived. Never blocks.
    pub fn tick(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            if let Delivery::Applied(_) = self.deliver(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next completion and delivers it.
    pub async fn process_next(&mut self) -> Option<Delivery> {
        let completion = self.rx.recv().await?;
        Some(self.deliver(completion))
    }

    /// Waits until `family` has no request in flight.
    pub async fn settle_family(&mut self, family: ActionFamily) {
        while self.effects.is_in_flight(family) {
            if self.process_next().await.is_none() {
                break;
            }
        }
    }

    /// Waits until no family has a request in flight.
    pub async fn settle(&mut self) {
        while self.effects.in_flight() > 0 {
            if self.process_next().await.is_none() {
                break;
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.effects.in_flight()
    }

    pub fn is_in_flight(&self, family: ActionFamily) -> bool {
        self.effects.is_in_flight(family)
    }

    /// Drops every running effect task.
    pub fn shutdown(&mut self) {
        self.effects.shutdown();
    }
}
