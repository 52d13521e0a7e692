use thiserror::Error;

/// Errors produced by a single raw partition-table decode.
///
/// Every variant is terminal for the decode call that produced it. No partial
/// result is ever returned alongside one.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Truncated {what}: need {needed} bytes, have {available}")]
    Truncated {
        what: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("Invalid GPT signature: 0x{found:016X}")]
    InvalidSignature { found: u64 },

    #[error("GPT header CRC mismatch: stored 0x{stored:08X}, computed 0x{computed:08X}")]
    HeaderCrcMismatch { stored: u32, computed: u32 },

    #[error("GPT partition array CRC mismatch: stored 0x{stored:08X}, computed 0x{computed:08X}")]
    PartitionArrayCrcMismatch { stored: u32, computed: u32 },

    #[error("Invalid GPT header field {field}: {value}")]
    InvalidHeader { field: &'static str, value: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DecodeError {
    pub fn truncated(what: &'static str, needed: usize, available: usize) -> Self {
        DecodeError::Truncated { what, needed, available }
    }

    /// True when the disk simply does not carry a GPT (as opposed to a damaged one).
    pub fn is_not_gpt(&self) -> bool {
        matches!(self, DecodeError::InvalidSignature { .. })
    }

    /// True for checksum failures on an otherwise recognizable GPT.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            DecodeError::HeaderCrcMismatch { .. } | DecodeError::PartitionArrayCrcMismatch { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum RawDiskError {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
