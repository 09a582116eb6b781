//! The closed error tag set dispatched on by the failover policy.
//!
//! Classification happens once, at the transport boundary: a transport maps
//! each failure mode to exactly one variant. The policy then asks
//! [`RpcError::is_infrastructure`] and never inspects error payloads, so a
//! transport failure that happens to look like a node rejection cannot be
//! misclassified.

use thiserror::Error;

use crate::request::{JsonRpcError, JsonRpcRequest};

/// Errors surfaced by the failover client.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// Invalid client configuration. Raised at construction, before any I/O.
    #[error("configuration error: {0}")]
    Config(String),

    /// The node was reachable and rejected the call semantically.
    ///
    /// Never retried. Carries the original request for diagnostics.
    #[error("{error}; original request: {}", .request.summary())]
    Application {
        error: JsonRpcError,
        request: JsonRpcRequest,
    },

    /// Non-success HTTP status from the endpoint.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The endpoint could not be reached (DNS, refused, reset, ...).
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request timed out at the transport level.
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The endpoint answered with a body that is not a JSON-RPC response.
    #[error("malformed RPC response: {0}")]
    Malformed(String),

    /// Synthetic watchdog failure: every configured endpoint is unreachable.
    #[error("all RPC endpoints unreachable")]
    Unreachable,
}

impl RpcError {
    /// Returns `true` for transport-level failures eligible for failover.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Connect(_) | Self::Timeout { .. } | Self::Malformed(_)
        )
    }

    /// Returns `true` for a semantic rejection from a reachable node.
    pub fn is_application(&self) -> bool {
        matches!(self, Self::Application { .. })
    }
}
