//! # Converge Core
//!
//! Pure primitives for disk convergence checks: the block-device snapshot
//! model, the lsblk JSON decoder, and the snapshot comparator.
//!
//! This crate contains no I/O, no timers, no networking. It is pure
//! computation over observed and expected device state.
//!
//! ## Key Types
//!
//! - [`Disk`] - One block device (name, filesystem, label, mountpoint)
//! - [`StateSnapshot`] - An ordered, immutable set of devices
//! - [`SnapshotDecoder`] - Turns raw probe output into a snapshot
//! - [`Convergence`] - Result of checking an observation against expectation
//!
//! ## Sentinels
//!
//! lsblk reports "not applicable" as `null`. The model keeps plain strings
//! and uses `""` for absent values, so a snapshot is always a plain value:
//!
//! ```rust
//! use converge_core::{decode_lsblk, Disk};
//!
//! let raw = r#"{"blockdevices":[{"name":"xvdh","fstype":null,"label":null,"mountpoint":null}]}"#;
//! let snapshot = decode_lsblk(raw).unwrap();
//! assert_eq!(snapshot.devices(), &[Disk::unformatted("xvdh")]);
//! ```

pub mod compare;
pub mod decode;
pub mod disk;
pub mod error;
pub mod snapshot;

pub use compare::{check, compare, diff, Convergence, Difference, DiskField};
pub use decode::{decode_lsblk, LsblkJsonDecoder, SnapshotDecoder};
pub use disk::Disk;
pub use error::DecodeError;
pub use snapshot::StateSnapshot;
