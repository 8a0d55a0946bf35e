//! Golden lsblk payloads.
//!
//! Each vector is output captured from a real `lsblk -J -fs` run (or a
//! faithful variant of one) paired with the snapshot it must decode to.
//! Decoding changes that break one of these break real hosts.

use converge_core::{decode_lsblk, Disk, StateSnapshot};

/// A golden decode vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Raw probe output.
    pub payload: &'static str,
    /// Expected devices as `[name, fstype, label, mountpoint]`.
    pub expected: &'static [[&'static str; 4]],
}

impl GoldenVector {
    /// The snapshot this payload must decode to.
    pub fn expected_snapshot(&self) -> StateSnapshot {
        self.expected
            .iter()
            .map(|[name, fstype, label, mountpoint]| Disk::new(*name, *fstype, *label, *mountpoint))
            .collect()
    }
}

/// Three freshly attached EBS volumes, util-linux 2.30. Labels unset.
const THREE_VOLUMES: &str = r#"{
  "blockdevices": [
    {
      "name": "xvdf1",
      "fstype": "xfs",
      "label": null,
      "uuid": "ad01e85c-0ae5-4d46-9eca-1991941e6ac4",
      "mountpoint": "/app/xvdf",
      "children": [
        {"name": "xvdf", "fstype": null, "label": null, "uuid": null, "mountpoint": null}
      ]
    },
    {
      "name": "xvdg1",
      "fstype": "xfs",
      "label": null,
      "uuid": "fd658217-0b0b-4c73-a929-52e2b7410496",
      "mountpoint": "/app/xvdg",
      "children": [
        {"name": "xvdg", "fstype": null, "label": null, "uuid": null, "mountpoint": null}
      ]
    },
    {
      "name": "xvdh",
      "fstype": null,
      "label": null,
      "uuid": null,
      "mountpoint": null
    }
  ]
}"#;

/// Same layout after labelling the first volume.
const LABELLED: &str = r#"{
  "blockdevices": [
    {"name": "xvdf1", "fstype": "xfs", "label": "XVDF", "uuid": "ad01e85c-0ae5-4d46-9eca-1991941e6ac4", "mountpoint": "/app/xvdf",
     "children": [{"name": "xvdf", "fstype": null, "label": null, "uuid": null, "mountpoint": null}]},
    {"name": "xvdg1", "fstype": "xfs", "label": null, "uuid": "fd658217-0b0b-4c73-a929-52e2b7410496", "mountpoint": "/app/xvdg",
     "children": [{"name": "xvdg", "fstype": null, "label": null, "uuid": null, "mountpoint": null}]},
    {"name": "xvdh", "fstype": null, "label": null, "uuid": null, "mountpoint": null}
  ]
}"#;

/// util-linux 2.37+ prints a `mountpoints` array and extra version columns.
const MOUNTPOINTS_ARRAY: &str = r#"{
   "blockdevices": [
      {
         "name": "nvme1n1p1",
         "fstype": "ext4",
         "fsver": "1.0",
         "label": "data",
         "uuid": "0c3e5ab4-6d1b-4f5e-8d7a-2b6c1f9e4a10",
         "fsavail": "9.1G",
         "fsuse%": "2%",
         "mountpoints": [
             "/data"
         ],
         "children": [
            {"name": "nvme1n1", "fstype": null, "fsver": null, "label": null, "uuid": null, "fsavail": null, "fsuse%": null, "mountpoints": [null]}
         ]
      },
      {
         "name": "nvme2n1",
         "fstype": null,
         "fsver": null,
         "label": null,
         "uuid": null,
         "fsavail": null,
         "fsuse%": null,
         "mountpoints": [
             null
         ]
      }
   ]
}"#;

/// Older lsblk builds omit null columns entirely.
const SPARSE_FIELDS: &str = r#"{"blockdevices": [{"name": "sdb"}, {"name": "sdb1", "fstype": "vfat", "mountpoint": "/boot/efi"}]}"#;

/// Every named device missing: lsblk still prints the wrapper.
const NO_DEVICES: &str = r#"{"blockdevices": []}"#;

/// Get all golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "three volumes, labels unset",
            payload: THREE_VOLUMES,
            expected: &[
                ["xvdf1", "xfs", "", "/app/xvdf"],
                ["xvdg1", "xfs", "", "/app/xvdg"],
                ["xvdh", "", "", ""],
            ],
        },
        GoldenVector {
            name: "three volumes, first labelled",
            payload: LABELLED,
            expected: &[
                ["xvdf1", "xfs", "XVDF", "/app/xvdf"],
                ["xvdg1", "xfs", "", "/app/xvdg"],
                ["xvdh", "", "", ""],
            ],
        },
        GoldenVector {
            name: "mountpoints array",
            payload: MOUNTPOINTS_ARRAY,
            expected: &[
                ["nvme1n1p1", "ext4", "data", "/data"],
                ["nvme2n1", "", "", ""],
            ],
        },
        GoldenVector {
            name: "sparse fields",
            payload: SPARSE_FIELDS,
            expected: &[["sdb", "", "", ""], ["sdb1", "vfat", "", "/boot/efi"]],
        },
        GoldenVector {
            name: "no devices",
            payload: NO_DEVICES,
            expected: &[],
        },
    ]
}

/// Decode `vector` and check it against its expected snapshot.
pub fn verify_vector(vector: &GoldenVector) -> Result<(), String> {
    let decoded = decode_lsblk(vector.payload)
        .map_err(|e| format!("{}: decode failed: {e}", vector.name))?;
    let expected = vector.expected_snapshot();
    if decoded == expected {
        Ok(())
    } else {
        Err(format!(
            "{}: decoded {} but expected {}",
            vector.name,
            decoded.to_lsblk_json(),
            expected.to_lsblk_json()
        ))
    }
}

/// Verify all golden vectors, returning the failures.
pub fn verify_all_vectors() -> Vec<String> {
    all_vectors()
        .iter()
        .filter_map(|v| verify_vector(v).err())
        .collect()
}
