//! The failover dispatch loop: bounded retries across the endpoint pool.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use crate::error::RpcError;
use crate::pool::{EndpointPool, SwitchEvent};
use crate::request::{JsonRpcRequest, JsonRpcResponse};
use crate::watchdog::HealthFlag;

/// Observer invoked synchronously after each rotation, before the retry
/// continues.
pub type ChangeNotifier = Arc<dyn Fn(&SwitchEvent) + Send + Sync>;

/// Configuration for the failover policy.
#[derive(Debug, Clone)]
pub struct FailoverConfig {
    /// Retries per endpoint before giving up; the total budget for one
    /// logical request is `retries_per_endpoint × pool size`.
    pub retries_per_endpoint: u32,
    /// Fixed delay between attempts.
    pub retry_backoff: Duration,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            retries_per_endpoint: 3,
            retry_backoff: Duration::from_millis(25),
        }
    }
}

/// Dispatches requests against the pool, rotating on infrastructure
/// failures until success, an application error, or budget exhaustion.
///
/// Each logical request tracks its own attempt count; rotation itself is
/// de-duplicated across concurrent requests by the pool's
/// compare-and-rotate guard.
pub struct FailoverPolicy {
    pool: Arc<EndpointPool>,
    config: FailoverConfig,
    notifier: Option<ChangeNotifier>,
    health: HealthFlag,
}

impl FailoverPolicy {
    pub fn new(pool: Arc<EndpointPool>, config: FailoverConfig, health: HealthFlag) -> Self {
        Self {
            pool,
            config,
            notifier: None,
            health,
        }
    }

    /// Attach a change observer.
    pub fn with_notifier(mut self, notifier: ChangeNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    /// Total attempts allowed for one logical request.
    pub fn budget(&self) -> u32 {
        self.config.retries_per_endpoint * self.pool.len() as u32
    }

    /// Send `req`, failing over across the pool. One terminal outcome:
    /// the response, an application error, or the last infrastructure error
    /// once the budget is spent.
    pub async fn dispatch(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, RpcError> {
        let probe = req.is_liveness_probe();
        let mut attempts: u32 = 1;

        loop {
            let (snapshot, endpoint) = self.pool.current();
            tracing::debug!(
                attempt = attempts,
                endpoint = endpoint.url(),
                method = %req.method,
                "dispatching request"
            );

            let err = match endpoint.transport().send(req.clone()).await {
                Ok(resp) => {
                    if probe {
                        self.health.mark_reachable();
                    }
                    return Ok(resp);
                }
                Err(err) if err.is_infrastructure() => err,
                // Application error, or another terminal variant: the node
                // answered, failover would not help.
                Err(err) => return Err(err),
            };

            // Only the first request observing this pool state rotates;
            // losers still consume their own budget and retry.
            if let Some(rotation) = self.pool.advance(snapshot) {
                tracing::warn!(
                    from = %rotation.from,
                    to = %rotation.to,
                    error = %err,
                    "switching RPC endpoint"
                );
                self.notify(SwitchEvent {
                    from: rotation.from,
                    to: rotation.to,
                    error: Some(err.clone()),
                    response: None,
                });
            }

            attempts += 1;
            if attempts > self.budget() {
                tracing::error!(
                    attempts = attempts - 1,
                    method = %req.method,
                    error = %err,
                    "retry budget exhausted"
                );
                if probe {
                    self.health.mark_unreachable();
                }
                return Err(err);
            }

            tokio::time::sleep(self.config.retry_backoff).await;
        }
    }

    fn notify(&self, event: SwitchEvent) {
        if let Some(notifier) = &self.notifier {
            // A misbehaving observer must not take the retry loop down.
            if catch_unwind(AssertUnwindSafe(|| notifier(&event))).is_err() {
                tracing::warn!(from = %event.from, to = %event.to, "change observer panicked");
            }
        }
    }
}
