// Legacy MBR partition entries in boot sector 0
use byteorder::{ByteOrder, LittleEndian};
use rawdisk_core::{DecodeError, PartitionTypeRegistry};
use serde::Serialize;

pub const MBR_SECTOR_SIZE: usize = 512;
pub const MBR_TABLE_OFFSET: usize = 0x1BE;
pub const MBR_ENTRY_SIZE: usize = 16;
pub const MBR_ENTRY_COUNT: usize = 4;
pub const BOOT_SIGNATURE_OFFSET: usize = 0x1FE;
pub const PROTECTIVE_MBR_TYPE: u8 = 0xEE;

/// A raw 3-byte cylinder/head/sector address as stored in an MBR entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Chs(pub [u8; 3]);

impl Chs {
    pub fn bytes(&self) -> [u8; 3] {
        self.0
    }

    /// The three bytes packed little-endian into a u32 with a zero high byte.
    pub fn packed(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], 0])
    }

    pub fn head(&self) -> u8 {
        self.0[0]
    }

    /// Sector number (1-based, low 6 bits of the second byte)
    pub fn sector(&self) -> u8 {
        self.0[1] & 0x3F
    }

    /// 10-bit cylinder: high 2 bits come from the top of the sector byte
    pub fn cylinder(&self) -> u16 {
        (((self.0[1] & 0xC0) as u16) << 2) | self.0[2] as u16
    }
}

/// One 16-byte legacy partition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MbrEntry {
    pub boot_indicator: u8,
    pub starting_chs: Chs,
    pub partition_type: u8,
    pub ending_chs: Chs,
    pub starting_lba: u32,
    pub size_in_lba: u32,
}

impl MbrEntry {
    fn parse(entry: &[u8]) -> MbrEntry {
        MbrEntry {
            boot_indicator: entry[0],
            starting_chs: Chs([entry[1], entry[2], entry[3]]),
            partition_type: entry[4],
            ending_chs: Chs([entry[5], entry[6], entry[7]]),
            starting_lba: LittleEndian::read_u32(&entry[8..12]),
            size_in_lba: LittleEndian::read_u32(&entry[12..16]),
        }
    }

    pub fn starting_chs_packed(&self) -> u32 {
        self.starting_chs.packed()
    }

    pub fn ending_chs_packed(&self) -> u32 {
        self.ending_chs.packed()
    }

    pub fn is_bootable(&self) -> bool {
        self.boot_indicator == 0x80
    }

    pub fn is_protective(&self) -> bool {
        self.partition_type == PROTECTIVE_MBR_TYPE
    }

    pub fn is_empty(&self) -> bool {
        self.partition_type == 0
    }

    pub fn type_name(&self) -> Option<&'static str> {
        PartitionTypeRegistry::global().mbr_name(self.partition_type)
    }
}

/// What the legacy boot sector says about the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LegacyLayout {
    /// A classic four-entry partition table.
    Mbr([MbrEntry; MBR_ENTRY_COUNT]),
    /// A protective MBR: the real layout lives in the GPT.
    Protective(MbrEntry),
}

impl LegacyLayout {
    pub fn from_sector0(sector0: &[u8]) -> Result<LegacyLayout, DecodeError> {
        let entries = MbrDecoder::decode_table(sector0)?;
        if entries[0].is_protective() {
            Ok(LegacyLayout::Protective(entries[0]))
        } else {
            Ok(LegacyLayout::Mbr(entries))
        }
    }

    pub fn is_protective(&self) -> bool {
        matches!(self, LegacyLayout::Protective(_))
    }

    /// Non-empty entries, in table order.
    pub fn entries(&self) -> Vec<MbrEntry> {
        match self {
            LegacyLayout::Protective(entry) => vec![*entry],
            LegacyLayout::Mbr(entries) => {
                entries.iter().filter(|e| !e.is_empty()).copied().collect()
            }
        }
    }
}

pub struct MbrDecoder;

impl MbrDecoder {
    /// Decode the first legacy partition entry (offset 0x1BE) of sector 0.
    ///
    /// No validation is done; the boot signature is not checked here.
    pub fn decode(sector0: &[u8]) -> Result<MbrEntry, DecodeError> {
        Self::require_sector(sector0)?;
        Ok(MbrEntry::parse(&sector0[MBR_TABLE_OFFSET..MBR_TABLE_OFFSET + MBR_ENTRY_SIZE]))
    }

    /// Decode all four legacy partition entries.
    pub fn decode_table(sector0: &[u8]) -> Result<[MbrEntry; MBR_ENTRY_COUNT], DecodeError> {
        Self::require_sector(sector0)?;

        let mut entries = [MbrEntry::default(); MBR_ENTRY_COUNT];
        for (i, entry) in entries.iter_mut().enumerate() {
            let offset = MBR_TABLE_OFFSET + i * MBR_ENTRY_SIZE;
            *entry = MbrEntry::parse(&sector0[offset..offset + MBR_ENTRY_SIZE]);
        }
        Ok(entries)
    }

    /// True if bytes 510..512 hold 0x55 0xAA.
    pub fn has_boot_signature(sector0: &[u8]) -> bool {
        sector0.len() >= MBR_SECTOR_SIZE
            && sector0[BOOT_SIGNATURE_OFFSET] == 0x55
            && sector0[BOOT_SIGNATURE_OFFSET + 1] == 0xAA
    }

    fn require_sector(sector0: &[u8]) -> Result<(), DecodeError> {
        if sector0.len() < MBR_SECTOR_SIZE {
            return Err(DecodeError::truncated("MBR sector", MBR_SECTOR_SIZE, sector0.len()));
        }
        Ok(())
    }
}
