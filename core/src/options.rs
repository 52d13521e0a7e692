use crate::RawDiskError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default cap on the partition entry array: 4 MiB, far above the 16 KiB
/// that a standard 128 x 128-byte array needs.
pub const DEFAULT_MAX_PARTITION_ARRAY_BYTES: usize = 4 * 1024 * 1024;

/// Knobs for a single decode call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Overrides the sector size reported by the sector source.
    pub sector_size: Option<usize>,
    /// Upper bound on `number_of_partitions * partition_entry_length`.
    pub max_partition_array_bytes: usize,
    /// Record whether sector 0 carries the 0x55AA boot signature.
    pub check_boot_signature: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            sector_size: None,
            max_partition_array_bytes: DEFAULT_MAX_PARTITION_ARRAY_BYTES,
            check_boot_signature: false,
        }
    }
}

impl DecodeOptions {
    pub fn with_sector_size(mut self, sector_size: usize) -> Self {
        self.sector_size = Some(sector_size);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, RawDiskError> {
        let options: DecodeOptions = serde_json::from_str(json)
            .map_err(|e| RawDiskError::Configuration(format!("Invalid decode options: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, RawDiskError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RawDiskError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        log::debug!("Loaded decode options from {}", path.display());
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), RawDiskError> {
        if let Some(size) = self.sector_size {
            if size < 512 || !size.is_power_of_two() {
                return Err(RawDiskError::Configuration(format!(
                    "Sector size must be a power of two of at least 512 bytes, got {}",
                    size
                )));
            }
        }

        if self.max_partition_array_bytes == 0 {
            return Err(RawDiskError::Configuration(
                "max_partition_array_bytes must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}
