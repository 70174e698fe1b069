//! Transport port — outbound side of the messaging channel.

use std::future::Future;

use ibtester_domain::error::TesterError;

/// Sends one already-formatted payload to the state topic.
///
/// Delivery guarantees are whatever the adapter's configured QoS gives;
/// callers never retry.
pub trait Transport: Send + Sync {
    fn publish(&self, payload: String) -> impl Future<Output = Result<(), TesterError>> + Send;
}

impl<T: Transport> Transport for std::sync::Arc<T> {
    fn publish(&self, payload: String) -> impl Future<Output = Result<(), TesterError>> + Send {
        (**self).publish(payload)
    }
}
