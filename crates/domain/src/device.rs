//! Bus devices — identifiers and point-in-time snapshots of what is attached.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one device on the one-wire bus, e.g. `01-00001a2b3c4d`.
///
/// The first two characters name the device family.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character family prefix, or `None` when the identifier is shorter.
    #[must_use]
    pub fn family(&self) -> Option<&str> {
        family_prefix(&self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// First two characters of a bus entry name, counted as `char`s.
#[must_use]
pub fn family_prefix(name: &str) -> Option<&str> {
    let (start, second) = name.char_indices().nth(1)?;
    Some(&name[..start + second.len_utf8()])
}

/// Snapshot of the identifiers present on the bus at one instant.
///
/// Each enumeration yields a fresh set; snapshots are compared, never
/// patched. Iteration order is sorted, which keeps candidate selection
/// deterministic when several devices show up in the same poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceSet(BTreeSet<DeviceId>);

impl DeviceSet {
    #[must_use]
    pub fn contains(&self, id: &DeviceId) -> bool {
        self.0.contains(id)
    }

    /// Identifiers in `self` that are absent from `baseline`.
    pub fn newcomers<'a>(&'a self, baseline: &'a DeviceSet) -> impl Iterator<Item = &'a DeviceId> {
        self.0.difference(&baseline.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceId> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<DeviceId> for DeviceSet {
    fn from_iter<I: IntoIterator<Item = DeviceId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a DeviceSet {
    type Item = &'a DeviceId;
    type IntoIter = std::collections::btree_set::Iter<'a, DeviceId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
