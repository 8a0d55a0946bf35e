//! Snapshot decoding from lsblk JSON output.
//!
//! Expected input is what `lsblk -J -f` prints:
//!
//! ```text
//! {
//!   "blockdevices": [
//!     {"name": "xvdf1", "fstype": "xfs", "label": null, "uuid": "...",
//!      "mountpoint": "/app/xvdf", "children": [ ... ]}
//!   ]
//! }
//! ```
//!
//! Rules:
//! 1. `null` or absent attributes decode to `""`
//! 2. Unknown attributes (`uuid`, `children`, ...) are ignored
//! 3. If `mountpoint` is absent, the first non-null `mountpoints` entry is
//!    used (util-linux 2.37 and later)
//! 4. Anything that is not an object with a `blockdevices` array is a
//!    [`DecodeError`]

use serde::Deserialize;

use crate::disk::Disk;
use crate::error::DecodeError;
use crate::snapshot::StateSnapshot;

/// Wire form of one lsblk device record.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawDisk {
    name: Option<String>,
    fstype: Option<String>,
    label: Option<String>,
    mountpoint: Option<String>,
    mountpoints: Option<Vec<Option<String>>>,
}

impl From<RawDisk> for Disk {
    fn from(raw: RawDisk) -> Self {
        let mountpoint = match raw.mountpoint {
            Some(mp) => mp,
            None => raw
                .mountpoints
                .into_iter()
                .flatten()
                .flatten()
                .next()
                .unwrap_or_default(),
        };

        Disk {
            name: raw.name.unwrap_or_default(),
            fstype: raw.fstype.unwrap_or_default(),
            label: raw.label.unwrap_or_default(),
            mountpoint,
        }
    }
}

/// Decode lsblk JSON output into a snapshot.
pub fn decode_lsblk(raw: &str) -> Result<StateSnapshot, DecodeError> {
    if raw.trim().is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(serde_json::from_str(raw)?)
}

/// Converts raw probe output into a [`StateSnapshot`].
///
/// Any `Fn(&str) -> Result<StateSnapshot, DecodeError>` is a decoder, so
/// callers with a different probe format can pass a closure.
pub trait SnapshotDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<StateSnapshot, DecodeError>;
}

/// The default decoder for `lsblk -J` output.
#[derive(Debug, Clone, Copy, Default)]
pub struct LsblkJsonDecoder;

impl SnapshotDecoder for LsblkJsonDecoder {
    fn decode(&self, raw: &str) -> Result<StateSnapshot, DecodeError> {
        decode_lsblk(raw)
    }
}

impl<F> SnapshotDecoder for F
where
    F: Fn(&str) -> Result<StateSnapshot, DecodeError> + Send + Sync,
{
    fn decode(&self, raw: &str) -> Result<StateSnapshot, DecodeError> {
        self(raw)
    }
}
