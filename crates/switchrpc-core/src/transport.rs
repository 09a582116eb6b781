//! The `RpcTransport` trait — the seam between the failover policy and the wire.
//!
//! A transport owns one endpoint and is responsible for classification: every
//! failure it returns must already be tagged as an [`RpcError`] variant. The
//! policy only ever dispatches on [`RpcError::is_infrastructure`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::RpcError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// The central async trait every RPC transport must implement.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` for use across Tokio tasks.
///
/// # Object Safety
/// The trait is object-safe and can be stored as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Send a single JSON-RPC request and return the response.
    ///
    /// A response carrying a well-formed JSON-RPC error object must surface
    /// as [`RpcError::Application`], not as an `Ok` with an error inside.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, RpcError>;

    /// Return the transport's endpoint URL.
    fn url(&self) -> &str;

    /// Convenience: call a method and deserialize the result.
    async fn call<T: DeserializeOwned>(
        &self,
        id: u64,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcError>
    where
        Self: Sized,
    {
        let req = JsonRpcRequest::new(id, method, params);
        let resp = self.send(req.clone()).await?;
        let result = resp
            .into_result()
            .map_err(|error| RpcError::Application { error, request: req })?;
        serde_json::from_value(result).map_err(|e| RpcError::Malformed(e.to_string()))
    }
}
