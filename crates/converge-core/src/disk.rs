//! Disk: one observed or expected block device.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::decode::RawDisk;

/// A single block device as reported by `lsblk -f`.
///
/// Every attribute is a plain string. An empty string is the sentinel for
/// "not applicable": no filesystem, no label, or not mounted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawDisk")]
pub struct Disk {
    /// Device node name, e.g. `xvdf1`.
    pub name: String,
    /// Filesystem type, e.g. `xfs`. Empty when unformatted.
    #[serde(serialize_with = "empty_as_null")]
    pub fstype: String,
    /// Filesystem label. Empty when no label is set.
    #[serde(serialize_with = "empty_as_null")]
    pub label: String,
    /// Absolute mount path. Empty when not mounted.
    #[serde(serialize_with = "empty_as_null")]
    pub mountpoint: String,
}

impl Disk {
    /// Create a disk with all four attributes.
    pub fn new(
        name: impl Into<String>,
        fstype: impl Into<String>,
        label: impl Into<String>,
        mountpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            fstype: fstype.into(),
            label: label.into(),
            mountpoint: mountpoint.into(),
        }
    }

    /// A raw device with no filesystem, label, or mount.
    pub fn unformatted(name: impl Into<String>) -> Self {
        Self::new(name, "", "", "")
    }

    /// Whether a filesystem is present.
    pub fn is_formatted(&self) -> bool {
        !self.fstype.is_empty()
    }

    /// Whether the device is mounted.
    pub fn is_mounted(&self) -> bool {
        !self.mountpoint.is_empty()
    }
}

impl fmt::Display for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fstype={:?} label={:?} mountpoint={:?}",
            self.name, self.fstype, self.label, self.mountpoint
        )
    }
}

/// lsblk writes absent values as `null`; mirror that on the way out.
fn empty_as_null<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_empty() {
        serializer.serialize_none()
    } else {
        serializer.serialize_str(value)
    }
}
