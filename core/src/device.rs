use crate::RawDiskError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sector size assumed when the platform cannot tell us better.
pub const DEFAULT_SECTOR_SIZE: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub sector_size: usize,
    pub device_type: DeviceType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceType {
    BlockDevice,
    ImageFile,
    Unknown,
}

impl Device {
    /// Describe the disk or image at `path` without reading its contents.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Device, RawDiskError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                RawDiskError::DeviceNotFound(path.display().to_string())
            }
            _ => RawDiskError::Io(e),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        #[allow(unused_mut)]
        let mut device = Device {
            id: path.display().to_string(),
            name,
            size: metadata.len(),
            sector_size: DEFAULT_SECTOR_SIZE,
            device_type: if metadata.is_file() {
                DeviceType::ImageFile
            } else {
                DeviceType::Unknown
            },
        };

        #[cfg(target_os = "linux")]
        {
            use std::os::unix::fs::FileTypeExt;
            if metadata.file_type().is_block_device() {
                device.device_type = DeviceType::BlockDevice;
                Self::fill_from_sysfs(&mut device);
            }
        }

        log::debug!(
            "Probed {}: {:?}, {} bytes, {}-byte sectors",
            device.id,
            device.device_type,
            device.size,
            device.sector_size
        );

        Ok(device)
    }

    /// Number of whole sectors on the device.
    pub fn sector_count(&self) -> u64 {
        self.size / self.sector_size as u64
    }

    #[cfg(target_os = "linux")]
    fn fill_from_sysfs(device: &mut Device) {
        let sysfs = format!("/sys/class/block/{}", device.name);

        let block_size_path = format!("{}/queue/logical_block_size", sysfs);
        if let Some(sector_size) = read_sysfs_number(&block_size_path) {
            if sector_size >= DEFAULT_SECTOR_SIZE as u64 {
                device.sector_size = sector_size as usize;
            }
        }

        // /sys reports size in 512-byte units regardless of the logical block size
        if let Some(sectors) = read_sysfs_number(&format!("{}/size", sysfs)) {
            device.size = sectors * 512;
        }
    }
}

#[cfg(target_os = "linux")]
fn read_sysfs_number(path: &str) -> Option<u64> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}
