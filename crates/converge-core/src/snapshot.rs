//! StateSnapshot: a point-in-time view of a host's block devices.

use serde::{Deserialize, Serialize};

use crate::disk::Disk;

/// An ordered, immutable list of block devices.
///
/// Order is significant: it mirrors the order in which probe targets were
/// given, and comparison is positional. Once built, a snapshot cannot be
/// changed; a new observation is a new snapshot.
///
/// Serializes to the same shape lsblk emits with `-J`:
/// `{"blockdevices": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(rename = "blockdevices")]
    devices: Vec<Disk>,
}

impl StateSnapshot {
    /// Create a snapshot from devices in probe order.
    pub fn new(devices: Vec<Disk>) -> Self {
        Self { devices }
    }

    /// The devices, in order.
    pub fn devices(&self) -> &[Disk] {
        &self.devices
    }

    /// Number of devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the snapshot has no devices.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Iterate over devices in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Disk> {
        self.devices.iter()
    }

    /// Device names in order.
    pub fn device_names(&self) -> Vec<&str> {
        self.devices.iter().map(|d| d.name.as_str()).collect()
    }

    /// Render as lsblk-shaped JSON.
    pub fn to_lsblk_json(&self) -> String {
        // Serializing plain strings into a map cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl FromIterator<Disk> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = Disk>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a StateSnapshot {
    type Item = &'a Disk;
    type IntoIter = std::slice::Iter<'a, Disk>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.iter()
    }
}
