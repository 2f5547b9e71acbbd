use async_trait::async_trait;
use serde_json::Value;
use society_infra::{ApiRequest, GatewayError, HttpGateway};

/// Backend transport used by effect tasks and the session manager.
#[async_trait]
pub trait ApiGateway: Send + Sync + 'static {
    async fn call(&self, request: ApiRequest) -> Result<Value, GatewayError>;

    /// Token attached to every later call; `None` sends calls anonymously.
    fn set_access_token(&self, token: Option<String>);
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn call(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        self.execute(&request).await
    }

    fn set_access_token(&self, token: Option<String>) {
        HttpGateway::set_access_token(self, token)
    }
}
