//! Test fixtures and helpers.
//!
//! The reference layout is three volumes attached to one instance: two xfs
//! partitions mounted under `/app` and one raw, unformatted device.

use converge_core::{Disk, StateSnapshot};
use converge_probe::{Endpoint, ProbeError, ScriptedExecutor};
use serde_json::{json, Value};

/// The reference expected layout.
pub fn expected_volumes() -> StateSnapshot {
    StateSnapshot::new(vec![
        Disk::new("xvdf1", "xfs", "XVDF", "/app/xvdf"),
        Disk::new("xvdg1", "xfs", "", "/app/xvdg"),
        Disk::unformatted("xvdh"),
    ])
}

/// The reference layout before the third volume shows up.
pub fn partial_volumes() -> StateSnapshot {
    expected_volumes().iter().take(2).cloned().collect()
}

/// The reference layout with `xvdf1` formatted ext4 instead of xfs.
pub fn ext4_volumes() -> StateSnapshot {
    expected_volumes()
        .iter()
        .map(|disk| match disk.name.as_str() {
            "xvdf1" => Disk {
                fstype: "ext4".into(),
                ..disk.clone()
            },
            _ => disk.clone(),
        })
        .collect()
}

/// The host every fixture probes.
pub fn test_endpoint() -> Endpoint {
    Endpoint::new("10.0.0.7", "ec2-user")
}

/// Render `snapshot` the way `lsblk -J -fs` prints it.
///
/// Empty fields become `null`; each partition gets a `uuid` and a
/// `children` entry for its parent disk, which decoding must ignore.
pub fn lsblk_payload(snapshot: &StateSnapshot) -> String {
    let devices: Vec<Value> = snapshot
        .iter()
        .enumerate()
        .map(|(i, disk)| {
            let uuid = if disk.is_formatted() {
                json!(fake_uuid(i))
            } else {
                Value::Null
            };
            let mut device = json!({
                "name": disk.name,
                "fstype": nullable(&disk.fstype),
                "label": nullable(&disk.label),
                "uuid": uuid,
                "mountpoint": nullable(&disk.mountpoint),
            });
            if let Some(parent) = parent_disk(&disk.name) {
                device["children"] = json!([{
                    "name": parent,
                    "fstype": null,
                    "label": null,
                    "uuid": null,
                    "mountpoint": null,
                }]);
            }
            device
        })
        .collect();

    serde_json::to_string_pretty(&json!({ "blockdevices": devices })).unwrap_or_default()
}

/// An executor whose default script replays `steps`, then repeats the last one.
pub fn scripted<I>(steps: I) -> ScriptedExecutor
where
    I: IntoIterator<Item = Result<String, ProbeError>>,
{
    let executor = ScriptedExecutor::new();
    for step in steps {
        match step {
            Ok(output) => executor.push_output(output),
            Err(error) => executor.push_error(error),
        }
    }
    executor
}

/// A transport failure as seen when the host is not reachable yet.
pub fn connection_refused() -> ProbeError {
    ProbeError::Connection {
        endpoint: test_endpoint().to_string(),
        message: "connection refused".into(),
    }
}

fn nullable(value: &str) -> Value {
    if value.is_empty() {
        Value::Null
    } else {
        json!(value)
    }
}

/// `xvdf1` -> `xvdf`; whole disks have no parent.
fn parent_disk(name: &str) -> Option<&str> {
    let parent = name.trim_end_matches(|c: char| c.is_ascii_digit());
    (parent.len() < name.len() && !parent.is_empty()).then_some(parent)
}

fn fake_uuid(index: usize) -> String {
    format!("00000000-0000-4000-8000-{index:012x}")
}
