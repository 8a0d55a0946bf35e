//! Probe commands.

use serde::{Deserialize, Serialize};
use std::fmt;

use converge_core::StateSnapshot;

/// A read-only command to run on the remote host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ProbeCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `lsblk -J -fs <devices>`: JSON output, filesystem columns, inverse
    /// tree so each named partition is a top-level record.
    ///
    /// Bare names are resolved under `/dev/`; absolute paths pass through.
    /// lsblk reports devices in the order given.
    pub fn lsblk<I, S>(devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = vec!["-J".to_string(), "-fs".to_string()];
        args.extend(devices.into_iter().map(|d| device_path(d.as_ref())));
        Self {
            program: "lsblk".into(),
            args,
        }
    }

    /// The lsblk probe whose targets are the expected snapshot's devices.
    pub fn lsblk_for(expected: &StateSnapshot) -> Self {
        Self::lsblk(expected.device_names())
    }
}

fn device_path(device: &str) -> String {
    if device.starts_with('/') {
        device.to_string()
    } else {
        format!("/dev/{device}")
    }
}

impl fmt::Display for ProbeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge_core::Disk;

    #[test]
    fn test_lsblk_command_line() {
        let cmd = ProbeCommand::lsblk(["xvdf1", "xvdg1", "/dev/xvdh"]);
        assert_eq!(cmd.to_string(), "lsblk -J -fs /dev/xvdf1 /dev/xvdg1 /dev/xvdh");
    }

    #[test]
    fn test_lsblk_for_expected_keeps_order() {
        let expected = StateSnapshot::new(vec![
            Disk::unformatted("xvdh"),
            Disk::new("xvdf1", "xfs", "XVDF", "/app/xvdf"),
        ]);
        let cmd = ProbeCommand::lsblk_for(&expected);
        assert_eq!(cmd.args, vec!["-J", "-fs", "/dev/xvdh", "/dev/xvdf1"]);
    }

    #[test]
    fn test_display_quotes_whitespace() {
        let cmd = ProbeCommand::new("sh", ["-c", "lsblk -J"]);
        assert_eq!(cmd.to_string(), "sh -c 'lsblk -J'");
    }
}
