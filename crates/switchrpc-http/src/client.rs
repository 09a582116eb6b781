//! HTTP JSON-RPC endpoint transport.
//!
//! Classification at the boundary:
//! - network failure                → `Connect` / `Timeout`
//! - non-success HTTP status        → `Http { status, body }`
//! - undecodable body               → `Malformed`
//! - decoded response with an error → `Application`, annotated with the
//!   original request
//!
//! Everything except `Application` is infrastructure and therefore eligible
//! for failover upstream.

use std::time::Duration;

use async_trait::async_trait;

use switchrpc_core::error::RpcError;
use switchrpc_core::request::{JsonRpcRequest, JsonRpcResponse};
use switchrpc_core::transport::RpcTransport;

/// Configuration for [`HttpEndpoint`].
#[derive(Debug, Clone)]
pub struct HttpEndpointConfig {
    /// Transport-level timeout per request.
    pub request_timeout: Duration,
}

impl Default for HttpEndpointConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// One HTTP(S) JSON-RPC endpoint.
pub struct HttpEndpoint {
    url: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpEndpoint {
    /// Create a transport for the given JSON-RPC endpoint URL.
    pub fn new(url: impl Into<String>, config: HttpEndpointConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("failed to build reqwest client");

        Self {
            url: url.into(),
            http,
            request_timeout: config.request_timeout,
        }
    }

    /// Create with default configuration.
    pub fn default_for(url: impl Into<String>) -> Self {
        Self::new(url, HttpEndpointConfig::default())
    }

    fn classify_send_error(&self, e: reqwest::Error) -> RpcError {
        if e.is_timeout() {
            RpcError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }
        } else {
            RpcError::Connect(e.to_string())
        }
    }
}

#[async_trait]
impl RpcTransport for HttpEndpoint {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, RpcError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: JsonRpcResponse = resp
            .json()
            .await
            .map_err(|e| RpcError::Malformed(e.to_string()))?;

        // A reachable node rejecting the call semantically. Tagged here so
        // the policy never has to look inside.
        if let Some(error) = parsed.error {
            return Err(RpcError::Application { error, request: req });
        }

        Ok(parsed)
    }

    fn url(&self) -> &str {
        &self.url
    }
}
