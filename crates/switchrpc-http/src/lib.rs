//! switchrpc-http — HTTP JSON-RPC transport backed by `reqwest`.
//!
//! This is where error classification happens: every failure mode of an HTTP
//! exchange maps onto exactly one [`switchrpc_core::RpcError`] variant, so
//! the failover policy upstream dispatches on tags alone.

pub mod client;

pub use client::{HttpEndpoint, HttpEndpointConfig};
