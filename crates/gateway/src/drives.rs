//! Mounted drive enumeration

use serde::Serialize;
use std::path::PathBuf;
use sysinfo::Disks;

/// One mounted volume with its storage figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriveInfo {
    pub name: String,
    pub mount_point: PathBuf,
    pub total_space: u64,
    pub available_space: u64,
    pub used_space: u64,
    pub usage_percent: f64,
    pub file_system: String,
    pub is_removable: bool,
}

impl DriveInfo {
    /// Build from raw figures; used space and percentage are derived.
    pub fn new(
        name: impl Into<String>,
        mount_point: impl Into<PathBuf>,
        total_space: u64,
        available_space: u64,
        file_system: impl Into<String>,
        is_removable: bool,
    ) -> Self {
        let used_space = total_space.saturating_sub(available_space);
        let usage_percent = if total_space > 0 {
            (used_space as f64 / total_space as f64) * 100.0
        } else {
            0.0
        };

        Self {
            name: name.into(),
            mount_point: mount_point.into(),
            total_space,
            available_space,
            used_space,
            usage_percent,
            file_system: file_system.into(),
            is_removable,
        }
    }
}

/// Source of the drive list; swapped out in tests.
pub trait DriveSource: Send + Sync {
    fn drives(&self) -> Vec<DriveInfo>;
}

/// Drives as reported by the OS
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDrives;

impl DriveSource for SystemDrives {
    fn drives(&self) -> Vec<DriveInfo> {
        let disks = Disks::new_with_refreshed_list();

        disks
            .iter()
            .map(|disk| {
                DriveInfo::new(
                    disk.name().to_string_lossy(),
                    disk.mount_point(),
                    disk.total_space(),
                    disk.available_space(),
                    disk.file_system().to_string_lossy(),
                    disk.is_removable(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_figures() {
        let drive = DriveInfo::new("disk0", "/", 1000, 250, "apfs", false);
        assert_eq!(drive.used_space, 750);
        assert!((drive.usage_percent - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_sized_drive() {
        let drive = DriveInfo::new("empty", "/mnt/empty", 0, 0, "tmpfs", true);
        assert_eq!(drive.used_space, 0);
        assert_eq!(drive.usage_percent, 0.0);
    }

    #[test]
    fn test_available_exceeding_total_saturates() {
        let drive = DriveInfo::new("odd", "/mnt/odd", 100, 150, "nfs", false);
        assert_eq!(drive.used_space, 0);
    }
}
