//! Watchdog backstop for calls that would otherwise never complete.
//!
//! The embedding pipeline's own chain-head polling resubmits liveness probes
//! forever when every endpoint is down, so a caller awaiting a response
//! through it would hang. The watchdog wraps every completion in a one-shot
//! guard and races it against a timer that polls [`HealthFlag`]: the first
//! tick observing the flag down resolves the call with
//! [`RpcError::Unreachable`]. First writer wins; the loser's outcome is
//! dropped.
//!
//! The flag is advisory: it reflects the most recent probe's fate, not the
//! fate of the specific pending call. A false-positive synthetic failure is
//! accepted in exchange for guaranteed forward progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::RpcError;
use crate::request::JsonRpcResponse;

/// Default watchdog poll period.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(100);

/// Shared reachability flag, scoped to one client instance.
///
/// Set by a liveness probe exhausting its retry budget, cleared by any
/// liveness probe succeeding, read by the watchdog timer. Intentionally racy.
#[derive(Clone, Debug, Default)]
pub struct HealthFlag(Arc<AtomicBool>);

impl HealthFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// A liveness probe ran out of budget: every endpoint looks down.
    pub fn mark_unreachable(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// A liveness probe succeeded: the endpoint set is reachable again.
    pub fn mark_reachable(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_unreachable(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One-shot completion: resolved exactly once, by whichever side gets there
/// first. Later resolutions are discarded.
pub struct Completion<T> {
    tx: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Completion<T> {
    /// Create a completion and the receiver that observes its resolution.
    pub fn channel() -> (Arc<Self>, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (Arc::new(Self { tx: Mutex::new(Some(tx)) }), rx)
    }

    /// Resolve with `value`. Returns `true` if this call won the race,
    /// `false` if the completion was already resolved and `value` was dropped.
    pub fn resolve(&self, value: T) -> bool {
        let tx = self.tx.lock().expect("completion lock poisoned").take();
        match tx {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.lock().expect("completion lock poisoned").is_none()
    }
}

/// Wraps request futures so they terminate even if the transport never
/// answers and the flag says the endpoint set is down.
#[derive(Clone)]
pub struct WatchdogGuard {
    flag: HealthFlag,
    period: Duration,
}

impl WatchdogGuard {
    pub fn new(flag: HealthFlag, period: Duration) -> Self {
        Self { flag, period }
    }

    pub fn with_default_period(flag: HealthFlag) -> Self {
        Self::new(flag, DEFAULT_POLL_PERIOD)
    }

    /// Run `work` under the watchdog.
    ///
    /// Spawns `work` and a poll timer; whichever resolves the shared
    /// completion first determines the outcome. The timer stops on the first
    /// tick after the real outcome lands, and a real outcome landing after a
    /// synthetic failure is discarded.
    pub async fn guard<F>(&self, work: F) -> Result<JsonRpcResponse, RpcError>
    where
        F: std::future::Future<Output = Result<JsonRpcResponse, RpcError>> + Send + 'static,
    {
        let (completion, rx) = Completion::channel();

        let real = completion.clone();
        tokio::spawn(async move {
            let outcome = work.await;
            real.resolve(outcome);
        });

        let synthetic = completion.clone();
        let flag = self.flag.clone();
        let period = self.period;
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.tick().await; // the immediate first tick
            loop {
                ticks.tick().await;
                if synthetic.is_resolved() {
                    return;
                }
                if flag.is_unreachable() {
                    if synthetic.resolve(Err(RpcError::Unreachable)) {
                        tracing::warn!(
                            period_ms = period.as_millis() as u64,
                            "watchdog fired: all RPC endpoints flagged unreachable"
                        );
                    }
                    return;
                }
            }
        });

        match rx.await {
            Ok(outcome) => outcome,
            // Both tasks gone without resolving; only possible if the worker
            // panicked. Surface it as the synthetic failure.
            Err(_) => Err(RpcError::Unreachable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn guard_with(flag: &HealthFlag, period_ms: u64) -> WatchdogGuard {
        WatchdogGuard::new(flag.clone(), Duration::from_millis(period_ms))
    }

    #[tokio::test]
    async fn real_completion_wins_when_healthy() {
        let flag = HealthFlag::new();
        let out = guard_with(&flag, 20)
            .guard(async {
                Ok(JsonRpcResponse::ok(
                    crate::request::RpcId::Number(1),
                    "0x1".into(),
                ))
            })
            .await;
        assert!(out.is_ok());
    }

    #[tokio::test]
    async fn fires_within_one_tick_of_the_flag_dropping() {
        let flag = HealthFlag::new();
        let dog = guard_with(&flag, 100);

        let setter = flag.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            setter.mark_unreachable();
        });

        let started = Instant::now();
        let out = dog.guard(std::future::pending()).await;
        assert!(matches!(out, Err(RpcError::Unreachable)));
        assert!(
            started.elapsed() < Duration::from_millis(250),
            "watchdog took {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn slow_real_outcome_is_discarded_after_synthetic_failure() {
        let flag = HealthFlag::new();
        flag.mark_unreachable();

        let out = guard_with(&flag, 10)
            .guard(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(JsonRpcResponse::ok(crate::request::RpcId::Number(1), "0x1".into()))
            })
            .await;
        assert!(matches!(out, Err(RpcError::Unreachable)));
    }

    #[tokio::test]
    async fn flag_set_but_real_outcome_first_still_succeeds() {
        // Large poll period: the real (fast) outcome must win the race even
        // with the flag already down.
        let flag = HealthFlag::new();
        flag.mark_unreachable();

        let out = guard_with(&flag, 60_000)
            .guard(async {
                Ok(JsonRpcResponse::ok(crate::request::RpcId::Number(1), "0x2".into()))
            })
            .await;
        assert!(out.is_ok());
    }

    #[test]
    fn completion_resolves_exactly_once() {
        let (completion, mut rx) = Completion::channel();
        assert!(!completion.is_resolved());
        assert!(completion.resolve(1u32));
        assert!(completion.is_resolved());
        assert!(!completion.resolve(2));
        assert_eq!(rx.try_recv().unwrap(), 1);
    }
}
