//! Client configuration.

use std::time::Duration;

use switchrpc_core::policy::ChangeNotifier;
use switchrpc_core::watchdog::DEFAULT_POLL_PERIOD;

/// Recognized options for [`SwitchRpcClient`](crate::SwitchRpcClient).
#[derive(Clone)]
pub struct ClientConfig {
    /// Ordered, non-empty list of endpoint URLs. Required.
    pub rpc_apis: Vec<String>,
    /// Retries per endpoint before giving up.
    pub rpc_retries: u32,
    /// Fixed backoff between attempts.
    pub rpc_retry_timeout: Duration,
    /// Transport-level timeout per HTTP request.
    pub request_timeout: Duration,
    /// Watchdog poll period.
    pub watchdog_period: Duration,
    /// Observer invoked on each endpoint rotation.
    pub on_endpoint_change: Option<ChangeNotifier>,
}

impl ClientConfig {
    /// Config for `rpc_apis` with every knob at its default.
    pub fn new(rpc_apis: Vec<String>) -> Self {
        Self {
            rpc_apis,
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_apis: vec![],
            rpc_retries: 3,
            rpc_retry_timeout: Duration::from_millis(25),
            request_timeout: Duration::from_secs(30),
            watchdog_period: DEFAULT_POLL_PERIOD,
            on_endpoint_change: None,
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("rpc_apis", &self.rpc_apis)
            .field("rpc_retries", &self.rpc_retries)
            .field("rpc_retry_timeout", &self.rpc_retry_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("watchdog_period", &self.watchdog_period)
            .field("on_endpoint_change", &self.on_endpoint_change.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_knobs() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.rpc_retries, 3);
        assert_eq!(cfg.rpc_retry_timeout, Duration::from_millis(25));
        assert_eq!(cfg.watchdog_period, Duration::from_millis(100));
        assert!(cfg.rpc_apis.is_empty());
        assert!(cfg.on_endpoint_change.is_none());
    }
}
