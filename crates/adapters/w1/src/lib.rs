//! # ibtester-adapter-w1
//!
//! Linux one-wire adapter — lists bus devices from the kernel's w1 sysfs
//! directory (`/sys/bus/w1/devices` by default).
//!
//! ## How it works
//!
//! The `w1` kernel driver creates one directory entry per slave it finds on
//! the bus, named `<family>-<serial>` (e.g. `01-00001a2b3c4d` for a DS1990A
//! iButton), plus one `w1_bus_masterN` entry per master. The kernel keeps
//! the directory in sync with the bus, so listing it is a live scan.
//!
//! Entries are returned raw; hidden entries, exclusions and family filters
//! are applied by the application's device registry.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `ibtester-app` and `ibtester-domain`.

mod config;

pub use config::W1Config;

use std::path::PathBuf;

use ibtester_app::ports::DeviceSource;
use ibtester_domain::error::EnumerationError;

/// [`DeviceSource`] backed by a sysfs-style directory listing.
#[derive(Debug, Clone)]
pub struct SysfsDeviceSource {
    devices_dir: PathBuf,
}

impl SysfsDeviceSource {
    #[must_use]
    pub fn new(devices_dir: impl Into<PathBuf>) -> Self {
        Self {
            devices_dir: devices_dir.into(),
        }
    }

    async fn read_names(&self) -> std::io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.devices_dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => tracing::debug!(?raw, "skipping non UTF-8 w1 entry"),
            }
        }
        Ok(names)
    }
}

impl DeviceSource for SysfsDeviceSource {
    async fn list(&self) -> Result<Vec<String>, EnumerationError> {
        self.read_names()
            .await
            .map_err(|err| EnumerationError::new(&self.devices_dir, err))
    }
}
