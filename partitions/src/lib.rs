// Raw MBR/GPT partition table decoding
// Reads the on-disk layout directly instead of asking the OS for it.

pub mod crc;
pub mod disk;
pub mod gpt;
pub mod mbr;
pub mod source;

#[cfg(test)]
pub mod test_support;

pub use crc::crc32;
pub use disk::{
    read_raw_gpt_disk, read_raw_gpt_disk_with, DecodeStage, GptDiskAssembler, RawGptDisk,
};
pub use gpt::{
    GptAttributes, GptHeader, GptHeaderDecoder, GptPartitionArrayDecoder, GptPartitionEntry,
};
pub use mbr::{Chs, LegacyLayout, MbrDecoder, MbrEntry};
pub use source::{ImageSource, MemorySource, SectorSource};

pub use rawdisk_core::{DecodeError, DecodeOptions};
