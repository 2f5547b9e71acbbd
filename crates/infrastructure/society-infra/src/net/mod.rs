use std::fmt;
use std::sync::{Arc, RwLock};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Characters left as-is inside a single path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn encode_segment(raw: &str) -> String {
    utf8_percent_encode(raw, SEGMENT).to_string()
}

pub fn default_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("society-admin/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One backend call. `url` is relative to the gateway's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub data: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            data: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>, data: Value) -> Self {
        Self::new(Method::Post, url).with_data(data)
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

/// Response body shape shared by every backend endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: Option<String>,
}

/// Normalized request failure. `Display` yields the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// reqwest-backed transport with bearer-token injection.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl HttpGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .write()
            .expect("access token lock poisoned") = token;
    }

    fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .expect("access token lock poisoned")
            .clone()
    }

    fn absolute(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    /// Sends the request and unwraps the `{ success, data, message }`
    /// envelope. Non-2xx statuses and `success: false` are both errors.
    pub async fn execute(&self, req: &ApiRequest) -> Result<Value, GatewayError> {
        let url = self.absolute(&req.url);
        debug!("{} {}", req.method, url);

        let mut builder = self.client.request(req.method.into(), &url);
        if !req.params.is_empty() {
            builder = builder.query(&req.params);
        }
        if let Some(data) = &req.data {
            builder = builder.json(data);
        }
        if let Some(token) = self.access_token() {
            builder = builder.bearer_auth(token);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(transport_message(&e)))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| GatewayError::Transport(transport_message(&e)))?;
        let envelope = serde_json::from_str::<Envelope>(&body);

        if !status.is_success() {
            let message = envelope
                .ok()
                .and_then(|env| env.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                });
            warn!("{} {} rejected with {}: {}", req.method, url, status, message);
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let envelope = envelope.map_err(|e| GatewayError::Decode(e.to_string()))?;
        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "Request failed".to_string());
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(envelope.data)
    }
}

fn transport_message(e: &reqwest::Error) -> String {
    if e.is_connect() {
        "Unable to reach the server. Check your connection.".to_string()
    } else {
        format!("Network error: {e}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_escape_path_characters() {
        assert_eq!(encode_segment("B-1_x.y~"), "B-1_x.y~");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
    }

    #[test]
    fn absolute_urls_join_base_once() {
        let gw = HttpGateway::new(Client::new(), "http://host/api/");
        assert_eq!(gw.absolute("/units"), "http://host/api/units");
        assert_eq!(gw.absolute("units"), "http://host/api/units");
        assert_eq!(gw.absolute("https://other/x"), "https://other/x");
    }

    #[test]
    fn envelope_tolerates_missing_data() {
        let env: Envelope = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(env.success);
        assert!(env.data.is_null());
    }
}
