//! Ordered endpoint pool with a single shared "current" pointer.
//!
//! Failover rotates the pointer through the configured endpoints, wrapping
//! modulo pool size. Rotation is guarded: [`EndpointPool::advance`] only
//! rotates if the caller's snapshot of the pointer is still current, so
//! several requests failing against the same endpoint produce exactly one
//! rotation between them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::RpcError;
use crate::request::JsonRpcResponse;
use crate::transport::RpcTransport;

/// One configured remote JSON-RPC node. Identity is its index in the pool.
pub struct Endpoint {
    url: String,
    transport: Arc<dyn RpcTransport>,
}

impl Endpoint {
    pub fn new(url: impl Into<String>, transport: Arc<dyn RpcTransport>) -> Self {
        Self { url: url.into(), transport }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn transport(&self) -> &Arc<dyn RpcTransport> {
        &self.transport
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint").field("url", &self.url).finish()
    }
}

/// A performed rotation: the endpoint switched away from and the one now
/// current. URLs are captured atomically with the pointer move.
#[derive(Debug, Clone)]
pub struct Rotation {
    pub from: String,
    pub to: String,
}

/// Emitted to the change observer after each rotation.
#[derive(Debug, Clone)]
pub struct SwitchEvent {
    pub from: String,
    pub to: String,
    pub error: Option<RpcError>,
    pub response: Option<JsonRpcResponse>,
}

/// Fixed, ordered set of endpoints plus the shared current pointer.
pub struct EndpointPool {
    endpoints: Vec<Endpoint>,
    current: AtomicUsize,
}

impl EndpointPool {
    /// Build a pool from an ordered, non-empty endpoint list.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, RpcError> {
        if endpoints.is_empty() {
            return Err(RpcError::Config("endpoint list must not be empty".into()));
        }
        Ok(Self {
            endpoints,
            current: AtomicUsize::new(0),
        })
    }

    /// Number of endpoints in the pool.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Configured endpoint URLs, in failover order.
    pub fn urls(&self) -> Vec<String> {
        self.endpoints.iter().map(|e| e.url.clone()).collect()
    }

    /// The active endpoint and its index (the caller's rotation snapshot).
    pub fn current(&self) -> (usize, &Endpoint) {
        let idx = self.current.load(Ordering::Acquire);
        (idx, &self.endpoints[idx])
    }

    /// Compare-and-rotate: advance to the next endpoint only if the pointer
    /// still equals `expected`.
    ///
    /// Returns the performed [`Rotation`], or `None` if a concurrent failure
    /// already rotated away from `expected` — the caller must not emit a
    /// duplicate switch event. A single-endpoint pool rotates onto itself.
    pub fn advance(&self, expected: usize) -> Option<Rotation> {
        let next = (expected + 1) % self.endpoints.len();
        match self
            .current
            .compare_exchange(expected, next, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Some(Rotation {
                from: self.endpoints[expected].url.clone(),
                to: self.endpoints[next].url.clone(),
            }),
            Err(_) => None,
        }
    }
}

impl std::fmt::Debug for EndpointPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointPool")
            .field("urls", &self.urls())
            .field("current", &self.current.load(Ordering::Relaxed))
            .finish()
    }
}
