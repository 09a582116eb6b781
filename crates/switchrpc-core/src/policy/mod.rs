//! Failover policy — decides retry / rotate / terminate per request outcome.
//!
//! The decision stack for each attempt:
//! ```text
//! Request → [current endpoint] → classify → {terminal | rotate + backoff + retry}
//! ```

pub mod failover;

pub use failover::{ChangeNotifier, FailoverConfig, FailoverPolicy};
