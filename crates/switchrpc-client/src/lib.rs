//! switchrpc-client — the assembled failover client.
//!
//! Turns plain configuration (an ordered endpoint URL list plus retry knobs)
//! into a ready client: one HTTP transport per URL, the shared endpoint
//! pool, the failover policy at the tail of a middleware pipeline, and the
//! watchdog wrapped around every public call.
//!
//! # Quick start
//! ```rust,no_run
//! use switchrpc_client::{ClientConfig, SwitchRpcClient};
//!
//! # async fn run() -> Result<(), switchrpc_core::RpcError> {
//! let client = SwitchRpcClient::new(ClientConfig::new(vec![
//!     "https://rpc-a.example.com".into(),
//!     "https://rpc-b.example.com".into(),
//! ]))?;
//!
//! let block: String = client.call("eth_blockNumber", vec![]).await?;
//! println!("head: {block}");
//! # Ok(())
//! # }
//! ```

pub mod config;

pub use config::ClientConfig;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use switchrpc_core::error::RpcError;
use switchrpc_core::middleware::{Pipeline, RpcHandler};
use switchrpc_core::policy::{FailoverConfig, FailoverPolicy};
use switchrpc_core::pool::{Endpoint, EndpointPool};
use switchrpc_core::request::{JsonRpcRequest, JsonRpcResponse};
use switchrpc_core::transport::RpcTransport;
use switchrpc_core::watchdog::{HealthFlag, WatchdogGuard};
use switchrpc_http::{HttpEndpoint, HttpEndpointConfig};

/// Failover JSON-RPC client for a fixed set of endpoints.
pub struct SwitchRpcClient {
    pipeline: Arc<Pipeline>,
    pool: Arc<EndpointPool>,
    watchdog: WatchdogGuard,
    health: HealthFlag,
    next_id: AtomicU64,
}

impl std::fmt::Debug for SwitchRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchRpcClient")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl SwitchRpcClient {
    /// Build a client from `config`. Fails with [`RpcError::Config`] before
    /// any network activity if the endpoint list is empty.
    pub fn new(config: ClientConfig) -> Result<Self, RpcError> {
        Self::with_handlers(config, vec![])
    }

    /// Build a client with upstream pipeline handlers ahead of the balancer.
    pub fn with_handlers(
        config: ClientConfig,
        upstream: Vec<Arc<dyn RpcHandler>>,
    ) -> Result<Self, RpcError> {
        let endpoints = config
            .rpc_apis
            .iter()
            .map(|url| {
                let transport = HttpEndpoint::new(
                    url.clone(),
                    HttpEndpointConfig {
                        request_timeout: config.request_timeout,
                    },
                );
                Endpoint::new(url.clone(), Arc::new(transport) as Arc<dyn RpcTransport>)
            })
            .collect();
        let pool = Arc::new(EndpointPool::new(endpoints)?);

        let health = HealthFlag::new();
        let mut policy = FailoverPolicy::new(
            pool.clone(),
            FailoverConfig {
                retries_per_endpoint: config.rpc_retries,
                retry_backoff: config.rpc_retry_timeout,
            },
            health.clone(),
        );
        if let Some(notifier) = config.on_endpoint_change {
            policy = policy.with_notifier(notifier);
        }

        let mut pipeline = Pipeline::new(Arc::new(policy) as Arc<dyn RpcHandler>);
        for handler in upstream {
            pipeline = pipeline.with_handler(handler);
        }

        Ok(Self {
            pipeline: Arc::new(pipeline),
            pool,
            watchdog: WatchdogGuard::new(health.clone(), config.watchdog_period),
            health,
            next_id: AtomicU64::new(1),
        })
    }

    /// Configured endpoint URLs, in failover order.
    pub fn urls(&self) -> Vec<String> {
        self.pool.urls()
    }

    /// URL of the currently active endpoint.
    pub fn current_url(&self) -> String {
        self.pool.current().1.url().to_string()
    }

    /// Whether the last liveness probe exhausted its budget.
    pub fn is_unreachable(&self) -> bool {
        self.health.is_unreachable()
    }

    /// Send one request through the pipeline with failover and the watchdog
    /// applied. One terminal outcome per call.
    pub async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, RpcError> {
        let pipeline = self.pipeline.clone();
        self.watchdog
            .guard(async move { pipeline.dispatch(req).await })
            .await
    }

    /// Callback variant of [`send`](Self::send): the completion fires
    /// exactly once, with either the real outcome or the watchdog's
    /// synthetic failure.
    pub fn send_with_callback<F>(&self, req: JsonRpcRequest, callback: F)
    where
        F: FnOnce(Result<JsonRpcResponse, RpcError>) + Send + 'static,
    {
        let pipeline = self.pipeline.clone();
        let watchdog = self.watchdog.clone();
        tokio::spawn(async move {
            let outcome = watchdog
                .guard(async move { pipeline.dispatch(req).await })
                .await;
            callback(outcome);
        });
    }

    /// Call `method` and deserialize the result, with failover applied.
    /// Request ids are assigned sequentially per client.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);
        let resp = self.send(req.clone()).await?;
        let result = resp
            .into_result()
            .map_err(|error| RpcError::Application { error, request: req })?;
        serde_json::from_value(result).map_err(|e| RpcError::Malformed(e.to_string()))
    }

    /// Forward `req` directly to the current endpoint, bypassing failover
    /// and the watchdog entirely. Discouraged; kept for callers that need
    /// the raw single-endpoint behavior.
    pub async fn send_direct(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, RpcError> {
        let (_, endpoint) = self.pool.current();
        tracing::warn!(
            endpoint = endpoint.url(),
            method = %req.method,
            "send_direct bypasses failover; prefer send()"
        );
        endpoint.transport().send(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local server answering every connection with the same canned HTTP
    /// response. Returns its address and a hit counter.
    async fn canned_server(status_line: &'static str, body: &'static str) -> (SocketAddr, Arc<AtomicU32>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else { break };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let resp = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(resp.as_bytes()).await;
            }
        });
        (addr, hits)
    }

    fn config(urls: Vec<String>) -> ClientConfig {
        let mut cfg = ClientConfig::new(urls);
        cfg.rpc_retry_timeout = Duration::from_millis(1);
        cfg
    }

    #[tokio::test]
    async fn empty_endpoint_list_fails_before_any_io() {
        let err = SwitchRpcClient::new(ClientConfig::new(vec![])).unwrap_err();
        assert!(matches!(err, RpcError::Config(_)));
    }

    #[tokio::test]
    async fn fails_over_from_bad_gateway_to_healthy_endpoint() {
        let (bad, bad_hits) = canned_server("HTTP/1.1 502 Bad Gateway", "Duck.").await;
        let (good, good_hits) = canned_server(
            "HTTP/1.1 200 OK",
            r#"{"jsonrpc":"2.0","id":1,"result":"0x188a4"}"#,
        )
        .await;

        let client = SwitchRpcClient::new(config(vec![
            format!("http://{bad}"),
            format!("http://{good}"),
        ]))
        .unwrap();

        let block: String = client.call("eth_blockNumber", vec![]).await.unwrap();
        assert_eq!(block, "0x188a4");
        assert_eq!(bad_hits.load(Ordering::SeqCst), 1);
        assert_eq!(good_hits.load(Ordering::SeqCst), 1);
        assert_eq!(client.current_url(), format!("http://{good}"));
    }

    #[tokio::test]
    async fn change_callback_sees_the_switch() {
        let (bad, _) = canned_server("HTTP/1.1 502 Bad Gateway", "Duck.").await;
        let (good, _) = canned_server(
            "HTTP/1.1 200 OK",
            r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#,
        )
        .await;

        let seen: Arc<std::sync::Mutex<Vec<(String, String)>>> = Arc::default();
        let sink = seen.clone();
        let mut cfg = config(vec![format!("http://{bad}"), format!("http://{good}")]);
        cfg.on_endpoint_change = Some(Arc::new(move |ev| {
            sink.lock().unwrap().push((ev.from.clone(), ev.to.clone()));
        }));

        let client = SwitchRpcClient::new(cfg).unwrap();
        let _: String = client.call("eth_blockNumber", vec![]).await.unwrap();

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, format!("http://{bad}"));
        assert_eq!(events[0].1, format!("http://{good}"));
    }

    #[tokio::test]
    async fn callback_surface_fires_exactly_once() {
        let (good, _) = canned_server(
            "HTTP/1.1 200 OK",
            r#"{"jsonrpc":"2.0","id":1,"result":"0x2"}"#,
        )
        .await;
        let client = SwitchRpcClient::new(config(vec![format!("http://{good}")])).unwrap();

        let fired = Arc::new(AtomicU32::new(0));
        let counter = fired.clone();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let mut tx = Some(tx);
        client.send_with_callback(JsonRpcRequest::new(1, "eth_blockNumber", vec![]), move |out| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(tx) = tx.take() {
                let _ = tx.send(out);
            }
        });

        let out = rx.await.unwrap();
        assert!(out.unwrap().is_ok());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn direct_send_contacts_only_the_current_endpoint() {
        // Current endpoint is down; the bypass must surface its failure
        // without touching the healthy fallback.
        let (bad, bad_hits) = canned_server("HTTP/1.1 502 Bad Gateway", "Duck.").await;
        let (good, good_hits) = canned_server(
            "HTTP/1.1 200 OK",
            r#"{"jsonrpc":"2.0","id":1,"result":"0x3"}"#,
        )
        .await;
        let client = SwitchRpcClient::new(config(vec![
            format!("http://{bad}"),
            format!("http://{good}"),
        ]))
        .unwrap();

        let err = client
            .send_direct(JsonRpcRequest::new(1, "eth_blockNumber", vec![]))
            .await
            .unwrap_err();
        assert!(err.is_infrastructure());
        assert_eq!(bad_hits.load(Ordering::SeqCst), 1);
        assert_eq!(good_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn probe_exhaustion_marks_the_client_unreachable() {
        let (bad, _) = canned_server("HTTP/1.1 502 Bad Gateway", "Duck.").await;
        let mut cfg = config(vec![format!("http://{bad}")]);
        cfg.rpc_retries = 1;
        let client = SwitchRpcClient::new(cfg).unwrap();

        assert!(!client.is_unreachable());
        let err = client.call::<String>("eth_blockNumber", vec![]).await.unwrap_err();
        assert!(err.is_infrastructure());
        assert!(client.is_unreachable());
    }
}
