//! Device source port — raw listing of the one-wire bus.

use std::future::Future;

use ibtester_domain::error::EnumerationError;

/// Lists every raw entry currently visible on the bus.
///
/// Implementations return names unfiltered (hidden entries and bus masters
/// included); filtering is the registry's job. Each call is a fresh snapshot.
pub trait DeviceSource: Send + Sync {
    fn list(&self) -> impl Future<Output = Result<Vec<String>, EnumerationError>> + Send;
}

impl<T: DeviceSource> DeviceSource for std::sync::Arc<T> {
    fn list(&self) -> impl Future<Output = Result<Vec<String>, EnumerationError>> + Send {
        (**self).list()
    }
}
