//! Proptest generators for property-based testing.

use proptest::prelude::*;

use converge_core::{Disk, StateSnapshot};

/// A Xen-style device name: `xvdf`, `xvdg1`, ...
pub fn device_name() -> impl Strategy<Value = String> {
    "xvd[a-z][1-9]?".prop_map(String::from)
}

/// A field value that is empty about a third of the time.
pub fn field_value() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        2 => "[A-Za-z0-9_-]{1,12}".prop_map(String::from),
    ]
}

/// A filesystem type as lsblk reports it, or empty for raw devices.
pub fn fstype() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("xfs".to_string()),
        Just("ext4".to_string()),
        Just("swap".to_string()),
    ]
}

/// A mountpoint, or empty when unmounted.
pub fn mountpoint() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        2 => "(/[a-z]{1,8}){1,3}".prop_map(String::from),
    ]
}

/// Generate a Disk.
pub fn disk() -> impl Strategy<Value = Disk> {
    (device_name(), fstype(), field_value(), mountpoint())
        .prop_map(|(name, fstype, label, mountpoint)| Disk::new(name, fstype, label, mountpoint))
}

/// Generate a snapshot with up to `max_len` devices.
pub fn snapshot(max_len: usize) -> impl Strategy<Value = StateSnapshot> {
    prop::collection::vec(disk(), 0..=max_len).prop_map(StateSnapshot::new)
}

/// A snapshot together with a copy that differs in exactly one field.
pub fn snapshot_with_one_change(max_len: usize) -> impl Strategy<Value = (StateSnapshot, StateSnapshot)> {
    prop::collection::vec(disk(), 1..=max_len.max(1))
        .prop_flat_map(|disks| {
            let len = disks.len();
            (Just(disks), 0..len, 0..4usize)
        })
        .prop_map(|(disks, index, field)| {
            let mut changed = disks.clone();
            let target = &mut changed[index];
            let slot = match field {
                0 => &mut target.name,
                1 => &mut target.fstype,
                2 => &mut target.label,
                _ => &mut target.mountpoint,
            };
            slot.push('~');
            (StateSnapshot::new(disks), StateSnapshot::new(changed))
        })
}
