//! # Converge Testkit
//!
//! Testing utilities for converge.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Real lsblk payloads with the snapshots they must decode to
//! - **Generators**: Proptest strategies for disks and snapshots
//! - **Fixtures**: The reference three-volume layout and payload builders for it
//!
//! ## Golden Vectors
//!
//! ```rust
//! use converge_testkit::vectors::{all_vectors, verify_vector};
//!
//! for vector in all_vectors() {
//!     verify_vector(&vector).unwrap();
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use converge_testkit::generators::snapshot;
//!
//! proptest! {
//!     #[test]
//!     fn snapshot_equals_itself(s in snapshot(4)) {
//!         prop_assert!(converge_core::compare(&s, &s));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use converge_testkit::fixtures::{expected_volumes, lsblk_payload, scripted};
//!
//! let expected = expected_volumes();
//! let executor = scripted([Ok(lsblk_payload(&expected))]);
//! assert_eq!(executor.call_count(), 0);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{expected_volumes, lsblk_payload, scripted, test_endpoint};
pub use generators::{disk, snapshot};
pub use vectors::{all_vectors, verify_all_vectors, verify_vector, GoldenVector};
