// Helpers for building synthetic MBR + GPT images in unit tests

use rawdisk_core::DecodeError;
use uuid::Uuid;

use crate::crc::crc32;
use crate::gpt::header::{GPT_REVISION_1_0, GPT_SIGNATURE};
use crate::source::SectorSource;

pub const BASIC_DATA_GUID: &str = "EBD0A0A2-B9E5-4433-87C0-68B6B72699C7";

/// Field-by-field GPT header writer; `build` fills in a correct header CRC.
pub struct HeaderBuilder {
    pub signature: u64,
    pub revision: u32,
    pub header_size: u32,
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

impl HeaderBuilder {
    pub fn new() -> Self {
        Self {
            signature: GPT_SIGNATURE,
            revision: GPT_REVISION_1_0,
            header_size: 92,
            my_lba: 1,
            alternate_lba: 0x3F_FFFF,
            first_usable_lba: 34,
            max_usable_lba: 0x3F_FFDE,
            disk_guid: Uuid::parse_str("11223344-5566-7788-99AA-BBCCDDEEFF00").unwrap(),
            partition_entry_lba: 2,
            number_of_partitions: 128,
            partition_entry_length: 128,
            partition_array_crc32: 0xDEAD_BEEF,
        }
    }

    pub fn build(&self, sector_size: usize) -> Vec<u8> {
        let mut sector = vec![0u8; sector_size];
        sector[0..8].copy_from_slice(&self.signature.to_le_bytes());
        sector[8..12].copy_from_slice(&self.revision.to_le_bytes());
        sector[12..16].copy_from_slice(&self.header_size.to_le_bytes());
        sector[24..32].copy_from_slice(&self.my_lba.to_le_bytes());
        sector[32..40].copy_from_slice(&self.alternate_lba.to_le_bytes());
        sector[40..48].copy_from_slice(&self.first_usable_lba.to_le_bytes());
        sector[48..56].copy_from_slice(&self.max_usable_lba.to_le_bytes());
        sector[56..72].copy_from_slice(&self.disk_guid.to_bytes_le());
        sector[72..80].copy_from_slice(&self.partition_entry_lba.to_le_bytes());
        sector[80..84].copy_from_slice(&self.number_of_partitions.to_le_bytes());
        sector[84..88].copy_from_slice(&self.partition_entry_length.to_le_bytes());
        sector[88..92].copy_from_slice(&self.partition_array_crc32.to_le_bytes());

        // CRC field is still zero here
        let len = (self.header_size as usize).min(sector_size);
        let crc = crc32(&sector[..len]);
        sector[16..20].copy_from_slice(&crc.to_le_bytes());
        sector
    }
}

#[derive(Clone)]
pub struct EntryBuilder {
    pub type_guid: Uuid,
    pub unique_guid: Uuid,
    pub starting_lba: u64,
    pub ending_lba: u64,
    pub attributes: u64,
    pub name: String,
}

impl EntryBuilder {
    pub fn basic_data(name: &str) -> Self {
        Self {
            type_guid: Uuid::parse_str(BASIC_DATA_GUID).unwrap(),
            unique_guid: Uuid::parse_str("6F2C1C5E-8A7B-4B1D-9E3F-2A5B7C9D0E1F").unwrap(),
            starting_lba: 2048,
            ending_lba: 206_847,
            attributes: 0,
            name: name.to_string(),
        }
    }

    pub fn terminator() -> Self {
        Self {
            type_guid: Uuid::nil(),
            unique_guid: Uuid::nil(),
            starting_lba: 0,
            ending_lba: 0,
            attributes: 0,
            name: String::new(),
        }
    }

    pub fn build(&self, entry_len: usize) -> Vec<u8> {
        let mut entry = vec![0u8; entry_len];
        entry[0..16].copy_from_slice(&self.type_guid.to_bytes_le());
        entry[16..32].copy_from_slice(&self.unique_guid.to_bytes_le());
        entry[32..40].copy_from_slice(&self.starting_lba.to_le_bytes());
        entry[40..48].copy_from_slice(&self.ending_lba.to_le_bytes());
        entry[48..56].copy_from_slice(&self.attributes.to_le_bytes());
        for (i, unit) in self.name.encode_utf16().take(36).enumerate() {
            entry[56 + i * 2..58 + i * 2].copy_from_slice(&unit.to_le_bytes());
        }
        entry
    }
}

/// Protective MBR, GPT header at LBA 1, partition array at LBA 2 padded to whole sectors.
pub fn build_disk_image(
    entries: &[EntryBuilder],
    number_of_partitions: u32,
    entry_len: u32,
    sector_size: usize,
) -> Vec<u8> {
    let entry_len = entry_len as usize;
    let raw_len = number_of_partitions as usize * entry_len;

    let mut array = vec![0u8; raw_len];
    for (i, entry) in entries.iter().take(number_of_partitions as usize).enumerate() {
        array[i * entry_len..(i + 1) * entry_len].copy_from_slice(&entry.build(entry_len));
    }
    let array_crc = crc32(&array);
    array.resize(raw_len.div_ceil(sector_size) * sector_size, 0);

    let mut mbr = vec![0u8; sector_size];
    mbr[446 + 1..446 + 4].copy_from_slice(&[0x00, 0x02, 0x00]);
    mbr[446 + 4] = 0xEE;
    mbr[446 + 5..446 + 8].copy_from_slice(&[0xFE, 0xFF, 0xFF]);
    mbr[446 + 8..446 + 12].copy_from_slice(&1u32.to_le_bytes());
    mbr[446 + 12..446 + 16].copy_from_slice(&0x3F_FFFFu32.to_le_bytes());
    mbr[510] = 0x55;
    mbr[511] = 0xAA;

    let mut header = HeaderBuilder::new();
    header.number_of_partitions = number_of_partitions;
    header.partition_entry_length = entry_len as u32;
    header.partition_array_crc32 = array_crc;

    let mut image = mbr;
    image.extend_from_slice(&header.build(sector_size));
    image.extend_from_slice(&array);
    image
}

/// Wraps a source and records every `(lba, count)` request.
pub struct RecordingSource<S> {
    inner: S,
    pub requests: Vec<(u64, usize)>,
}

impl<S> RecordingSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, requests: Vec::new() }
    }
}

impl<S: SectorSource> SectorSource for RecordingSource<S> {
    fn sector_size(&self) -> usize {
        self.inner.sector_size()
    }

    fn read(&mut self, lba: u64, count: usize) -> Result<Vec<u8>, DecodeError> {
        self.requests.push((lba, count));
        self.inner.read(lba, count)
    }
}
