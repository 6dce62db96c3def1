//! Publisher port: outbound messages to devices.

use std::future::Future;

use homelink_domain::error::HomeLinkError;

/// Publishes a payload on a transport topic.
///
/// Returns once the transport has accepted the message.
pub trait MessagePublisher {
    fn publish(
        &self,
        topic: String,
        payload: String,
    ) -> impl Future<Output = Result<(), HomeLinkError>> + Send;
}

impl<T: MessagePublisher + Send + Sync> MessagePublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        topic: String,
        payload: String,
    ) -> impl Future<Output = Result<(), HomeLinkError>> + Send {
        (**self).publish(topic, payload)
    }
}
