//! Device registry — filtered, point-in-time view of the bus.

use ibtester_domain::device::DeviceSet;
use ibtester_domain::error::EnumerationError;
use ibtester_domain::filter::FilterConfig;

use crate::ports::DeviceSource;

/// Reads the bus through a [`DeviceSource`] and applies the configured filters.
///
/// Stateless: every call to [`enumerate`](Self::enumerate) is a fresh read.
pub struct DeviceRegistry<S> {
    source: S,
    filter: FilterConfig,
}

impl<S: DeviceSource> DeviceRegistry<S> {
    pub fn new(source: S, filter: FilterConfig) -> Self {
        Self { source, filter }
    }

    /// List the devices currently present, minus hidden entries, excluded
    /// identifiers and families outside the allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`EnumerationError`] when the underlying source cannot be listed.
    pub async fn enumerate(&self) -> Result<DeviceSet, EnumerationError> {
        let names = self.source.list().await?;
        let devices = self.filter.apply(names);
        tracing::debug!(count = devices.len(), "w1 scan complete");
        Ok(devices)
    }
}
