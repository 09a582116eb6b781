//! The consumed pipeline contract.
//!
//! The request pipeline itself belongs to the embedding application; this
//! module defines the handler seam it drives and a minimal ordered chain.
//! Upstream handlers may answer a request locally or pass it on; the
//! balancer sits at the tail, terminates the chain, and never calls `next`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::RpcError;
use crate::policy::FailoverPolicy;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// One ordered middleware stage.
#[async_trait]
pub trait RpcHandler: Send + Sync + 'static {
    /// Handle `req`, either answering it or delegating to `next`.
    async fn handle(&self, req: JsonRpcRequest, next: Next)
        -> Result<JsonRpcResponse, RpcError>;
}

/// The remainder of the chain after the current handler.
pub struct Next {
    rest: Vec<Arc<dyn RpcHandler>>,
}

impl Next {
    /// Pass the request to the next handler in order.
    pub fn run(self, req: JsonRpcRequest) -> BoxFuture<'static, Result<JsonRpcResponse, RpcError>> {
        Box::pin(async move {
            match self.rest.split_first() {
                Some((head, rest)) => {
                    let head = head.clone();
                    let next = Next { rest: rest.to_vec() };
                    head.handle(req, next).await
                }
                None => Err(RpcError::Config("request fell off the end of the pipeline".into())),
            }
        })
    }
}

/// Ordered handler chain whose tail is the failover balancer.
pub struct Pipeline {
    handlers: Vec<Arc<dyn RpcHandler>>,
}

impl Pipeline {
    /// A pipeline consisting only of the balancer tail.
    pub fn new(tail: Arc<dyn RpcHandler>) -> Self {
        Self { handlers: vec![tail] }
    }

    /// Insert `handler` upstream of the tail. Handlers run in insertion
    /// order; the tail always runs last.
    pub fn with_handler(mut self, handler: Arc<dyn RpcHandler>) -> Self {
        let tail_at = self.handlers.len() - 1;
        self.handlers.insert(tail_at, handler);
        self
    }

    /// Run `req` through the chain.
    pub async fn dispatch(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, RpcError> {
        Next { rest: self.handlers.clone() }.run(req).await
    }
}

/// The balancer occupies the tail of the pipeline: it resolves every request
/// against the endpoint pool and never delegates further.
#[async_trait]
impl RpcHandler for FailoverPolicy {
    async fn handle(
        &self,
        req: JsonRpcRequest,
        _next: Next,
    ) -> Result<JsonRpcResponse, RpcError> {
        self.dispatch(req).await
    }
}
