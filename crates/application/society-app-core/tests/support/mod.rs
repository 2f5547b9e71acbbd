#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use society_app_core::ApiGateway;
use society_infra::{ApiRequest, GatewayError};
use tokio::sync::{mpsc, oneshot};

/// A gateway call held open until the test answers it.
pub struct PendingCall {
    pub request: ApiRequest,
    pub token: Option<String>,
    reply: oneshot::Sender<Result<Value, GatewayError>>,
}

impl PendingCall {
    pub fn resolve(self, data: Value) {
        let _ = self.reply.send(Ok(data));
    }

    pub fn reject(self, message: &str) {
        let _ = self.reply.send(Err(GatewayError::Rejected {
            status: 400,
            message: message.to_string(),
        }));
    }
}

/// In-memory gateway: every call shows up on the receiver returned by `new`
/// and resolves in whatever order the test chooses.
pub struct ScriptedGateway {
    calls: mpsc::UnboundedSender<PendingCall>,
    token: Mutex<Option<String>>,
}

impl ScriptedGateway {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PendingCall>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gateway = Arc::new(Self {
            calls: tx,
            token: Mutex::new(None),
        });
        (gateway, rx)
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiGateway for ScriptedGateway {
    async fn call(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        let (reply, rx) = oneshot::channel();
        let token = self.token();
        self.calls
            .send(PendingCall {
                request,
                token,
                reply,
            })
            .expect("test dropped the call receiver");
        rx.await
            .unwrap_or_else(|_| Err(GatewayError::Transport("call abandoned".into())))
    }

    fn set_access_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }
}
