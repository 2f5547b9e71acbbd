//! Bridges request actions to the gateway.
//!
//! Every request family has one task kind. Each dispatched request gets a
//! fresh [`RequestId`] that becomes the family's latest; a completion whose id
//! is no longer the latest is dropped by [`EffectRunner::accept`]. Superseded
//! calls are not aborted, their results simply never reach the store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::app_core::{Action, ActionFamily, SessionAction, SlicePhase};
use crate::auth::{OtpDispatched, SendOtpRequest, VerifyOtpRequest};
use crate::ports::ApiGateway;
use crate::resources::{ResourceKey, ResourceRequest};

pub type RequestId = Uuid;

/// Outcome of one gateway call, tagged with the dispatch that started it.
#[derive(Debug)]
pub struct Completion {
    pub family: ActionFamily,
    pub request_id: RequestId,
    pub action: Action,
}

enum EffectTask {
    SendOtp(SendOtpRequest),
    VerifyOtp(VerifyOtpRequest),
    Resource(ResourceKey, ResourceRequest),
}

impl EffectTask {
    fn for_action(action: &Action) -> Option<Self> {
        match action {
            Action::SendOtp(SlicePhase::Request(req)) => Some(EffectTask::SendOtp(req.clone())),
            Action::VerifyOtp(SlicePhase::Request(req)) => {
                Some(EffectTask::VerifyOtp(req.clone()))
            }
            Action::Resource(key, SlicePhase::Request(req)) => {
                Some(EffectTask::Resource(*key, req.clone()))
            }
            _ => None,
        }
    }

    /// Runs the call and maps it to exactly one success or failure action.
    async fn run(self, gateway: &dyn ApiGateway) -> Action {
        match self {
            EffectTask::SendOtp(req) => {
                let phase = match gateway.call(req.to_api_request()).await {
                    Ok(_) => SlicePhase::Success(OtpDispatched {
                        phone: req.phone,
                        tenant: req.tenant,
                    }),
                    Err(e) => SlicePhase::Failure(e.to_string()),
                };
                Action::SendOtp(phase)
            }
            EffectTask::VerifyOtp(req) => {
                let outcome = gateway
                    .call(req.to_api_request())
                    .await
                    .map_err(|e| e.to_string())
                    .and_then(|data| req.decode(data));
                Action::VerifyOtp(match outcome {
                    Ok(login) => SlicePhase::Success(login),
                    Err(message) => SlicePhase::Failure(message),
                })
            }
            EffectTask::Resource(key, req) => {
                let outcome = match req.to_api_request(key) {
                    Ok(call) => gateway.call(call).await.map_err(|e| e.to_string()),
                    Err(message) => Err(message),
                };
                Action::Resource(
                    key,
                    match outcome {
                        Ok(data) => SlicePhase::Success(data),
                        Err(message) => SlicePhase::Failure(message),
                    },
                )
            }
        }
    }
}

pub struct EffectRunner {
    gateway: Arc<dyn ApiGateway>,
    handle: Handle,
    tx: mpsc::UnboundedSender<Completion>,
    latest: HashMap<ActionFamily, RequestId>,
    shutdown: CancellationToken,
}

impl EffectRunner {
    pub fn new(
        gateway: Arc<dyn ApiGateway>,
        handle: Handle,
        tx: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            gateway,
            handle,
            tx,
            latest: HashMap::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Called for every dispatched action after the reducers ran.
    pub fn observe(&mut self, action: &Action) {
        if let Action::Session(SessionAction::LoggedOut) = action {
            if !self.latest.is_empty() {
                debug!("logout forgets {} in-flight request(s)", self.latest.len());
            }
            self.latest.clear();
            return;
        }

        let Some(family) = action.family() else {
            return;
        };
        if action.is_reset() {
            if self.latest.remove(&family).is_some() {
                debug!("{family} reset while in flight; result will be dropped");
            }
        } else if let Some(task) = EffectTask::for_action(action) {
            self.start(family, task);
        }
    }

    fn start(&mut self, family: ActionFamily, task: EffectTask) {
        let request_id: RequestId = Uuid::new_v4();
        if let Some(previous) = self.latest.insert(family, request_id) {
            debug!("{family}: request {request_id} supersedes {previous}");
        }

        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        let shutdown = self.shutdown.clone();
        self.handle.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    trace!("{family}: request {request_id} dropped on shutdown");
                }
                action = task.run(gateway.as_ref()) => {
                    // Receiver gone means the kernel was dropped.
                    let _ = tx.send(Completion { family, request_id, action });
                }
            }
        });
    }

    /// Whether `completion` belongs to the latest request of its family. An
    /// accepted completion settles the family.
    pub fn accept(&mut self, completion: &Completion) -> bool {
        match self.latest.get(&completion.family) {
            Some(id) if *id == completion.request_id => {
                self.latest.remove(&completion.family);
                true
            }
            _ => false,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.latest.len()
    }

    pub fn is_in_flight(&self, family: ActionFamily) -> bool {
        self.latest.contains_key(&family)
    }

    /// Cancels every running task. Nothing is in flight afterwards.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        self.latest.clear();
    }
}
