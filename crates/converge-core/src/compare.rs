//! Convergence comparison between observed and expected snapshots.
//!
//! Equality is structural and exact: same number of devices, same order,
//! and every attribute equal byte-for-byte. Nothing is trimmed or
//! case-folded. [`diff`] explains a failed comparison but never relaxes it.

use std::fmt;

use crate::disk::Disk;
use crate::snapshot::StateSnapshot;

/// Returns true iff `observed` exactly matches `expected`.
pub fn compare(observed: &StateSnapshot, expected: &StateSnapshot) -> bool {
    observed == expected
}

/// An attribute of a [`Disk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiskField {
    Name,
    Fstype,
    Label,
    Mountpoint,
}

impl DiskField {
    pub const ALL: [DiskField; 4] = [
        DiskField::Name,
        DiskField::Fstype,
        DiskField::Label,
        DiskField::Mountpoint,
    ];

    /// Read this attribute from a disk.
    pub fn get(self, disk: &Disk) -> &str {
        match self {
            DiskField::Name => &disk.name,
            DiskField::Fstype => &disk.fstype,
            DiskField::Label => &disk.label,
            DiskField::Mountpoint => &disk.mountpoint,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiskField::Name => "name",
            DiskField::Fstype => "fstype",
            DiskField::Label => "label",
            DiskField::Mountpoint => "mountpoint",
        }
    }
}

impl fmt::Display for DiskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One discrepancy between an observed and an expected snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Difference {
    /// An attribute differs at a position present in both snapshots.
    Field {
        index: usize,
        device: String,
        field: DiskField,
        observed: String,
        expected: String,
    },
    /// The expected device at `index` was not observed at all.
    Missing { index: usize, expected: Disk },
    /// An observed device at `index` has no expected counterpart.
    Unexpected { index: usize, observed: Disk },
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difference::Field {
                index,
                device,
                field,
                observed,
                expected,
            } => write!(
                f,
                "device #{index} ({device}): {field} expected {expected:?}, got {observed:?}"
            ),
            Difference::Missing { index, expected } => {
                write!(f, "device #{index} missing: expected {expected}")
            }
            Difference::Unexpected { index, observed } => {
                write!(f, "device #{index} unexpected: {observed}")
            }
        }
    }
}

/// List every discrepancy between `observed` and `expected`.
///
/// Empty exactly when [`compare`] returns true.
pub fn diff(observed: &StateSnapshot, expected: &StateSnapshot) -> Vec<Difference> {
    let mut differences = Vec::new();

    for (index, (got, want)) in observed.iter().zip(expected.iter()).enumerate() {
        for field in DiskField::ALL {
            let (g, w) = (field.get(got), field.get(want));
            if g != w {
                differences.push(Difference::Field {
                    index,
                    device: want.name.clone(),
                    field,
                    observed: g.to_string(),
                    expected: w.to_string(),
                });
            }
        }
    }

    let shared = observed.len().min(expected.len());
    for (index, want) in expected.iter().enumerate().skip(shared) {
        differences.push(Difference::Missing {
            index,
            expected: want.clone(),
        });
    }
    for (index, got) in observed.iter().enumerate().skip(shared) {
        differences.push(Difference::Unexpected {
            index,
            observed: got.clone(),
        });
    }

    differences
}

/// Result of checking an observation against expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Convergence {
    /// Observed state exactly equals expected state.
    Converged,
    /// Observed state differs; the differences explain how.
    Diverged { differences: Vec<Difference> },
}

impl Convergence {
    /// Check if the snapshots converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged)
    }

    /// The differences, empty when converged.
    pub fn differences(&self) -> &[Difference] {
        match self {
            Convergence::Converged => &[],
            Convergence::Diverged { differences } => differences,
        }
    }
}

/// Compare and, on mismatch, explain.
pub fn check(observed: &StateSnapshot, expected: &StateSnapshot) -> Convergence {
    if compare(observed, expected) {
        Convergence::Converged
    } else {
        Convergence::Diverged {
            differences: diff(observed, expected),
        }
    }
}
