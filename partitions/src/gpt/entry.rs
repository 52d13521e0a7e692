// GPT partition entries and their attribute flags
use byteorder::{ByteOrder, LittleEndian};
use rawdisk_core::PartitionTypeRegistry;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::header::read_guid;

/// Smallest entry size the UEFI spec allows; also the size of the fields we read.
pub const GPT_ENTRY_MIN_SIZE: usize = 128;
pub const GPT_NAME_UNITS: usize = 36;

const NAME_OFFSET: usize = 56;

/// Partition attribute bits. Unknown bits are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct GptAttributes(pub u64);

impl GptAttributes {
    pub const REQUIRED_PARTITION: u64 = 1 << 0;
    pub const NO_BLOCK_IO_PROTOCOL: u64 = 1 << 1;
    pub const LEGACY_BIOS_BOOTABLE: u64 = 1 << 2;
    /// Bits 3..=47, reserved by UEFI
    pub const UEFI_RESERVED_MASK: u64 = 0x0000_FFFF_FFFF_FFF8;
    /// Bits 48..=63, defined per partition type
    pub const PLATFORM_RESERVED_MASK: u64 = 0xFFFF_0000_0000_0000;

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn contains(&self, flag: u64) -> bool {
        self.0 & flag == flag
    }

    pub fn is_required(&self) -> bool {
        self.contains(Self::REQUIRED_PARTITION)
    }

    pub fn no_block_io(&self) -> bool {
        self.contains(Self::NO_BLOCK_IO_PROTOCOL)
    }

    pub fn is_legacy_bios_bootable(&self) -> bool {
        self.contains(Self::LEGACY_BIOS_BOOTABLE)
    }

    /// The type-specific high 16 bits, shifted down.
    pub fn platform_bits(&self) -> u16 {
        ((self.0 & Self::PLATFORM_RESERVED_MASK) >> 48) as u16
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GptPartitionEntry {
    pub partition_type_guid: Uuid,
    pub unique_partition_guid: Uuid,
    pub starting_lba: u64,
    pub ending_lba: u64,
    pub attributes: GptAttributes,
    pub name: String,
}

impl GptPartitionEntry {
    /// Parse one entry. Caller guarantees at least `GPT_ENTRY_MIN_SIZE` bytes.
    pub(crate) fn parse(bytes: &[u8]) -> GptPartitionEntry {
        GptPartitionEntry {
            partition_type_guid: read_guid(&bytes[0..16]),
            unique_partition_guid: read_guid(&bytes[16..32]),
            starting_lba: LittleEndian::read_u64(&bytes[32..40]),
            ending_lba: LittleEndian::read_u64(&bytes[40..48]),
            attributes: GptAttributes(LittleEndian::read_u64(&bytes[48..56])),
            name: decode_name(&bytes[NAME_OFFSET..NAME_OFFSET + GPT_NAME_UNITS * 2]),
        }
    }

    /// An all-zero type GUID marks the end of the in-use entries.
    pub(crate) fn is_terminator(bytes: &[u8]) -> bool {
        bytes[0..16].iter().all(|&b| b == 0)
    }

    /// Sectors covered, inclusive of both ends. Saturates at `u64::MAX` for
    /// the full `0..=u64::MAX` range; an inverted range covers nothing.
    pub fn sector_count(&self) -> u64 {
        if self.ending_lba < self.starting_lba {
            return 0;
        }
        (self.ending_lba - self.starting_lba).saturating_add(1)
    }

    /// Bytes covered at the given sector size, saturating on overflow.
    pub fn size_bytes(&self, sector_size: usize) -> u64 {
        self.sector_count().saturating_mul(sector_size as u64)
    }

    pub fn type_name(&self) -> Option<&'static str> {
        PartitionTypeRegistry::global().gpt_name(&self.partition_type_guid)
    }
}

impl fmt::Display for GptPartitionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            write!(f, "{}", self.name)
        } else if let Some(type_name) = self.type_name() {
            write!(f, "{}", type_name)
        } else {
            write!(f, "{{{}}}", self.unique_partition_guid)
        }
    }
}

/// UTF-16LE, 36 code units, NUL padding trimmed from both ends.
fn decode_name(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .collect();

    String::from_utf16_lossy(&units).trim_matches('\0').to_string()
}
