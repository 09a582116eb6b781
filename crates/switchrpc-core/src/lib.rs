//! switchrpc-core — foundation types for the switchrpc failover client.
//!
//! # Overview
//!
//! switchrpc provides transparent failover across multiple blockchain node
//! endpoints for a JSON-RPC consumer. The core crate defines:
//!
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`] — wire types
//! - [`RpcError`] — the closed error tag set the policy dispatches on
//! - [`RpcTransport`] — the trait every endpoint transport implements
//! - [`pool`] module — ordered endpoint pool with compare-and-rotate failover
//! - [`policy`] module — the retry/rotate/terminate dispatch loop
//! - [`watchdog`] module — health flag + poll timer forcing terminal failure
//!   when every endpoint is flagged unreachable
//! - [`middleware`] module — the pipeline seam the balancer plugs into

pub mod error;
pub mod middleware;
pub mod policy;
pub mod pool;
pub mod request;
pub mod transport;
pub mod watchdog;

pub use error::RpcError;
pub use middleware::{Next, Pipeline, RpcHandler};
pub use policy::{ChangeNotifier, FailoverConfig, FailoverPolicy};
pub use pool::{Endpoint, EndpointPool, Rotation, SwitchEvent};
pub use request::{is_liveness_probe, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use transport::RpcTransport;
pub use watchdog::{Completion, HealthFlag, WatchdogGuard, DEFAULT_POLL_PERIOD};
