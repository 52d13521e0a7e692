// GPT header (LBA 1) parsing and validation
use byteorder::{ByteOrder, LittleEndian};
use log::{trace, warn};
use rawdisk_core::DecodeError;
use serde::Serialize;
use uuid::Uuid;

use crate::crc::crc32;

/// "EFI PART" read as a little-endian u64
pub const GPT_SIGNATURE: u64 = 0x5452_4150_2049_4645;
pub const GPT_HEADER_SIZE: usize = 92;
pub const GPT_REVISION_1_0: u32 = 0x0001_0000;

const HEADER_CRC_OFFSET: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GptHeader {
    pub signature: u64,
    pub revision: u32,
    pub header_size: u32,
    pub header_crc32: u32,
    pub reserved: u32,
    pub my_lba: u64,
    pub alternate_lba: u64,
    pub first_usable_lba: u64,
    pub max_usable_lba: u64,
    pub disk_guid: Uuid,
    pub partition_entry_lba: u64,
    pub number_of_partitions: u32,
    pub partition_entry_length: u32,
    pub partition_array_crc32: u32,
}

impl GptHeader {
    /// Parse the fixed 92-byte layout. Caller guarantees the length.
    fn parse(bytes: &[u8]) -> GptHeader {
        GptHeader {
            signature: LittleEndian::read_u64(&bytes[0..8]),
            revision: LittleEndian::read_u32(&bytes[8..12]),
            header_size: LittleEndian::read_u32(&bytes[12..16]),
            header_crc32: LittleEndian::read_u32(&bytes[16..20]),
            reserved: LittleEndian::read_u32(&bytes[20..24]),
            my_lba: LittleEndian::read_u64(&bytes[24..32]),
            alternate_lba: LittleEndian::read_u64(&bytes[32..40]),
            first_usable_lba: LittleEndian::read_u64(&bytes[40..48]),
            max_usable_lba: LittleEndian::read_u64(&bytes[48..56]),
            disk_guid: read_guid(&bytes[56..72]),
            partition_entry_lba: LittleEndian::read_u64(&bytes[72..80]),
            number_of_partitions: LittleEndian::read_u32(&bytes[80..84]),
            partition_entry_length: LittleEndian::read_u32(&bytes[84..88]),
            partition_array_crc32: LittleEndian::read_u32(&bytes[88..92]),
        }
    }

    /// Size in bytes of the partition entry array this header describes.
    pub fn partition_array_len(&self) -> u64 {
        self.number_of_partitions as u64 * self.partition_entry_length as u64
    }

    /// Revision as "major.minor", e.g. "1.0".
    pub fn revision_string(&self) -> String {
        format!("{}.{}", self.revision >> 16, self.revision & 0xFFFF)
    }

    /// Number of sectors between the first and last usable LBA, inclusive.
    pub fn usable_sectors(&self) -> u64 {
        if self.max_usable_lba < self.first_usable_lba {
            return 0;
        }
        (self.max_usable_lba - self.first_usable_lba).saturating_add(1)
    }
}

/// GUIDs are stored mixed-endian: the first three groups little-endian.
pub(crate) fn read_guid(bytes: &[u8]) -> Uuid {
    let mut raw = [0u8; 16];
    raw.copy_from_slice(&bytes[..16]);
    Uuid::from_bytes_le(raw)
}

pub struct GptHeaderDecoder;

impl GptHeaderDecoder {
    /// Parse and validate a GPT header sector.
    ///
    /// A wrong signature is reported as `InvalidSignature` even if the checksum
    /// happens to match, so "not GPT" and "damaged GPT" stay distinguishable.
    pub fn decode(sector: &[u8], sector_size: usize) -> Result<GptHeader, DecodeError> {
        if sector_size < GPT_HEADER_SIZE {
            return Err(DecodeError::truncated("GPT header sector", GPT_HEADER_SIZE, sector_size));
        }
        if sector.len() < sector_size {
            return Err(DecodeError::truncated("GPT header sector", sector_size, sector.len()));
        }

        let header = GptHeader::parse(sector);
        trace!(
            "GPT header: revision {}, {} bytes, {} entries of {} bytes at LBA {}",
            header.revision_string(),
            header.header_size,
            header.number_of_partitions,
            header.partition_entry_length,
            header.partition_entry_lba
        );

        if header.signature != GPT_SIGNATURE {
            return Err(DecodeError::InvalidSignature { found: header.signature });
        }

        let computed = Self::compute_crc(sector, header.header_size as usize, sector_size);
        if computed != header.header_crc32 {
            warn!(
                "GPT header CRC mismatch: stored 0x{:08X}, computed 0x{:08X}",
                header.header_crc32, computed
            );
            return Err(DecodeError::HeaderCrcMismatch {
                stored: header.header_crc32,
                computed,
            });
        }

        // Only reachable when the stored CRC was written over the folded input
        let header_size = header.header_size as usize;
        if !(GPT_HEADER_SIZE..=sector_size).contains(&header_size) {
            return Err(DecodeError::InvalidHeader {
                field: "header_size",
                value: header.header_size as u64,
            });
        }

        Ok(header)
    }

    /// CRC of the first `header_size` bytes with the CRC field zeroed.
    ///
    /// Works on an owned copy; `sector` is never modified. A declared size
    /// outside `92..=sector_size` is clamped into that range, which can never
    /// reproduce the stored checksum of a well-formed header.
    pub fn compute_crc(sector: &[u8], header_size: usize, sector_size: usize) -> u32 {
        let limit = sector_size.min(sector.len());
        let len = header_size.clamp(GPT_HEADER_SIZE.min(limit), limit);

        let mut copy = sector[..len].to_vec();
        if header_size != len {
            // Fold the bogus size into the checksum input so it cannot collide
            copy.extend_from_slice(&(header_size as u64).to_le_bytes());
        }
        if copy.len() >= HEADER_CRC_OFFSET + 4 {
            copy[HEADER_CRC_OFFSET..HEADER_CRC_OFFSET + 4].fill(0);
        }
        crc32(&copy)
    }
}
