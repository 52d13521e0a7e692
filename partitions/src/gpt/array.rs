// GPT partition entry array: locate, read, checksum, walk
use log::{debug, trace, warn};
use rawdisk_core::{DecodeError, DecodeOptions};

use super::entry::{GptPartitionEntry, GPT_ENTRY_MIN_SIZE};
use super::header::GptHeader;
use crate::crc::crc32;
use crate::source::SectorSource;

pub struct GptPartitionArrayDecoder;

impl GptPartitionArrayDecoder {
    pub fn decode<S: SectorSource + ?Sized>(
        header: &GptHeader,
        source: &mut S,
    ) -> Result<Vec<GptPartitionEntry>, DecodeError> {
        Self::decode_with(header, source, &DecodeOptions::default())
    }

    /// Read the array in whole sectors, verify its CRC over the unpadded
    /// length, and return the entries up to the first all-zero type GUID.
    pub fn decode_with<S: SectorSource + ?Sized>(
        header: &GptHeader,
        source: &mut S,
        options: &DecodeOptions,
    ) -> Result<Vec<GptPartitionEntry>, DecodeError> {
        let entry_len = header.partition_entry_length as usize;
        if entry_len < GPT_ENTRY_MIN_SIZE {
            return Err(DecodeError::InvalidHeader {
                field: "partition_entry_length",
                value: header.partition_entry_length as u64,
            });
        }

        let raw_len = header.partition_array_len();
        if raw_len > options.max_partition_array_bytes as u64 {
            return Err(DecodeError::InvalidHeader {
                field: "partition_array_len",
                value: raw_len,
            });
        }
        let raw_len = raw_len as usize;

        let sector_size = source.sector_size();
        if sector_size == 0 {
            return Err(DecodeError::InvalidHeader { field: "sector_size", value: 0 });
        }

        let sectors = raw_len.div_ceil(sector_size);
        debug!(
            "Reading partition array: {} entries x {} bytes = {} bytes, {} sectors at LBA {}",
            header.number_of_partitions, entry_len, raw_len, sectors, header.partition_entry_lba
        );

        let buffer = if sectors == 0 {
            Vec::new()
        } else {
            source.read(header.partition_entry_lba, sectors)?
        };

        if buffer.len() < raw_len {
            return Err(DecodeError::truncated("GPT partition array", raw_len, buffer.len()));
        }

        let computed = crc32(&buffer[..raw_len]);
        if computed != header.partition_array_crc32 {
            warn!(
                "Partition array CRC mismatch: stored 0x{:08X}, computed 0x{:08X}",
                header.partition_array_crc32, computed
            );
            return Err(DecodeError::PartitionArrayCrcMismatch {
                stored: header.partition_array_crc32,
                computed,
            });
        }

        let mut partitions = Vec::new();
        for (index, raw) in buffer[..raw_len].chunks_exact(entry_len).enumerate() {
            if GptPartitionEntry::is_terminator(raw) {
                trace!("Terminator at entry {}", index);
                break;
            }

            let entry = GptPartitionEntry::parse(raw);
            trace!(
                "Entry {}: {} LBA {}..={} ({})",
                index,
                entry.partition_type_guid,
                entry.starting_lba,
                entry.ending_lba,
                entry
            );
            partitions.push(entry);
        }

        debug!(
            "{} of {} declared entries in use",
            partitions.len(),
            header.number_of_partitions
        );
        Ok(partitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpt::header::GptHeaderDecoder;
    use crate::source::MemorySource;
    use crate::test_support::{build_disk_image, EntryBuilder, RecordingSource};

    fn header_of(image: &[u8], sector_size: usize) -> GptHeader {
        GptHeaderDecoder::decode(&image[sector_size..2 * sector_size], sector_size).unwrap()
    }

    #[test]
    fn test_terminator_trims_declared_capacity() {
        let entries = vec![EntryBuilder::basic_data("Data")];
        let image = build_disk_image(&entries, 128, 128, 512);
        let header = header_of(&image, 512);
        assert_eq!(header.number_of_partitions, 128);

        let mut source = MemorySource::new(image, 512);
        let partitions = GptPartitionArrayDecoder::decode(&header, &mut source).unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].name, "Data");
    }

    #[test]
    fn test_entries_after_terminator_are_ignored() {
        let entries = vec![
            EntryBuilder::basic_data("First"),
            EntryBuilder::terminator(),
            EntryBuilder::basic_data("Hidden"),
        ];
        let image = build_disk_image(&entries, 128, 128, 512);
        let header = header_of(&image, 512);

        let mut source = MemorySource::new(image, 512);
        let partitions = GptPartitionArrayDecoder::decode(&header, &mut source).unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].name, "First");
    }

    #[test]
    fn test_full_array_without_terminator() {
        let entries: Vec<EntryBuilder> = (0..4)
            .map(|i| EntryBuilder::basic_data(&format!("Part {}", i)))
            .collect();
        let image = build_disk_image(&entries, 4, 128, 512);
        let header = header_of(&image, 512);

        let mut source = MemorySource::new(image, 512);
        let partitions = GptPartitionArrayDecoder::decode(&header, &mut source).unwrap();
        assert_eq!(partitions.len(), 4);
        assert_eq!(partitions[3].name, "Part 3");
    }

    #[test]
    fn test_first_entry_terminator_gives_empty_list() {
        let image = build_disk_image(&[], 128, 128, 512);
        let header = header_of(&image, 512);

        let mut source = MemorySource::new(image, 512);
        assert!(GptPartitionArrayDecoder::decode(&header, &mut source).unwrap().is_empty());
    }

    #[test]
    fn test_one_sector_read_for_512_byte_array() {
        let image = build_disk_image(&[EntryBuilder::basic_data("A")], 4, 128, 512);
        let header = header_of(&image, 512);

        let mut source = RecordingSource::new(MemorySource::new(image, 512));
        GptPartitionArrayDecoder::decode(&header, &mut source).unwrap();
        assert_eq!(source.requests, vec![(2, 1)]);
    }

    #[test]
    fn test_four_sector_read_for_16k_array_on_4k_disk() {
        let image = build_disk_image(&[EntryBuilder::basic_data("A")], 128, 128, 4096);
        let header = header_of(&image, 4096);

        let mut source = RecordingSource::new(MemorySource::new(image, 4096));
        GptPartitionArrayDecoder::decode(&header, &mut source).unwrap();
        assert_eq!(source.requests, vec![(2, 4)]);
    }

    #[test]
    fn test_crc_covers_unpadded_length_only() {
        // 3 x 128 = 384 bytes, read as one 512-byte sector
        let image = build_disk_image(&[EntryBuilder::basic_data("A")], 3, 128, 512);
        let header = header_of(&image, 512);

        let mut image = image;
        // Garbage in the sector padding after the declared array
        let pad_start = 2 * 512 + 384;
        image[pad_start..pad_start + 128].fill(0xCC);

        let mut source = RecordingSource::new(MemorySource::new(image, 512));
        let partitions = GptPartitionArrayDecoder::decode(&header, &mut source).unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(source.requests, vec![(2, 1)]);
    }

    #[test]
    fn test_larger_entry_stride() {
        let entries = vec![EntryBuilder::basic_data("Wide 0"), EntryBuilder::basic_data("Wide 1")];
        let image = build_disk_image(&entries, 8, 256, 512);
        let header = header_of(&image, 512);

        let mut source = MemorySource::new(image, 512);
        let partitions = GptPartitionArrayDecoder::decode(&header, &mut source).unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[1].name, "Wide 1");
    }

    #[test]
    fn test_corrupt_array() {
        let image = build_disk_image(&[EntryBuilder::basic_data("A")], 128, 128, 512);
        let header = header_of(&image, 512);

        let mut image = image;
        image[2 * 512 + 40] ^= 0x01;

        let mut source = MemorySource::new(image, 512);
        let err = GptPartitionArrayDecoder::decode(&header, &mut source).unwrap_err();
        assert!(matches!(err, DecodeError::PartitionArrayCrcMismatch { .. }));
    }

    #[test]
    fn test_short_read_is_truncated() {
        let image = build_disk_image(&[EntryBuilder::basic_data("A")], 128, 128, 512);
        let header = header_of(&image, 512);

        // Cut the image in the middle of the array
        let mut source = MemorySource::new(image[..2 * 512 + 4096].to_vec(), 512);
        let err = GptPartitionArrayDecoder::decode(&header, &mut source).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Truncated { needed: 16384, available: 4096, .. }
        ));
    }

    #[test]
    fn test_rejects_small_entry_length() {
        let image = build_disk_image(&[EntryBuilder::basic_data("A")], 4, 128, 512);
        let mut header = header_of(&image, 512);
        header.partition_entry_length = 64;

        let mut source = MemorySource::new(image, 512);
        assert!(matches!(
            GptPartitionArrayDecoder::decode(&header, &mut source),
            Err(DecodeError::InvalidHeader { field: "partition_entry_length", value: 64 })
        ));
    }

    #[test]
    fn test_rejects_oversized_array_without_reading() {
        let image = build_disk_image(&[EntryBuilder::basic_data("A")], 4, 128, 512);
        let mut header = header_of(&image, 512);
        header.number_of_partitions = u32::MAX;

        let mut source = RecordingSource::new(MemorySource::new(image, 512));
        let err = GptPartitionArrayDecoder::decode(&header, &mut source).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidHeader { field: "partition_array_len", .. }));
        assert!(source.requests.is_empty());
    }

    #[test]
    fn test_zero_entries() {
        let image = build_disk_image(&[], 0, 128, 512);
        let header = header_of(&image, 512);
        assert_eq!(header.partition_array_crc32, 0);

        let mut source = RecordingSource::new(MemorySource::new(image, 512));
        assert!(GptPartitionArrayDecoder::decode(&header, &mut source).unwrap().is_empty());
        assert!(source.requests.is_empty());
    }
}
