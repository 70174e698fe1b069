//! Filters applied to raw bus directory entries.

use serde::Deserialize;

use crate::device::{DeviceId, DeviceSet, family_prefix};

/// Entries starting with this marker are hidden/system entries, never devices.
pub const HIDDEN_MARKER: char = '.';

/// Exclude-list and family allow-list applied to every enumeration.
///
/// Supplied once at startup and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Literal identifiers that are always ignored (e.g. the bus master).
    pub exclude: Vec<String>,
    /// Family prefixes to keep. Empty means every family passes.
    #[serde(rename = "family_filter")]
    pub families: Vec<String>,
}

impl FilterConfig {
    /// Whether a raw entry name is a device this tester should report.
    #[must_use]
    pub fn admits(&self, name: &str) -> bool {
        if name.starts_with(HIDDEN_MARKER) {
            return false;
        }
        if self.exclude.iter().any(|excluded| excluded == name) {
            return false;
        }
        if self.families.is_empty() {
            return true;
        }
        let Some(family) = family_prefix(name) else {
            return false;
        };
        self.families.iter().any(|allowed| allowed == family)
    }

    /// Keep only the admitted entries and collect them into a snapshot.
    pub fn apply<I, S>(&self, names: I) -> DeviceSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter(|name| self.admits(name.as_ref()))
            .map(|name| DeviceId::new(name.as_ref()))
            .collect()
    }
}
