//! Inbound message port: what the transport adapter hands every message to.

use std::future::Future;

/// Consumes one inbound transport message.
///
/// Handling never fails from the caller's point of view: implementations
/// log their own errors so one bad message cannot stop the receive loop.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, topic: &str, payload: &[u8]) -> impl Future<Output = ()> + Send;
}
