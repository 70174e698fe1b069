//! One-wire bus configuration.

use std::path::PathBuf;

use serde::Deserialize;

use ibtester_domain::filter::FilterConfig;

/// Configuration for the sysfs device source and its filters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct W1Config {
    /// Directory the kernel populates with one entry per bus device.
    pub devices_dir: PathBuf,
    /// Entries that are never reported (bus masters, soldered-on parts).
    pub exclude: Vec<String>,
    /// Two-character family prefixes to report; empty means all.
    pub family_filter: Vec<String>,
}

impl Default for W1Config {
    fn default() -> Self {
        Self {
            devices_dir: PathBuf::from("/sys/bus/w1/devices"),
            exclude: Vec::new(),
            family_filter: Vec::new(),
        }
    }
}

impl W1Config {
    /// Build the filter applied to every enumeration.
    #[must_use]
    pub fn filter(&self) -> FilterConfig {
        FilterConfig {
            exclude: self.exclude.clone(),
            families: self.family_filter.clone(),
        }
    }
}
