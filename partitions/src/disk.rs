// Raw GPT disk reader: MBR -> GPT header -> partition array
use log::{debug, info, warn};
use rawdisk_core::{DecodeError, DecodeOptions, RawDiskError};
use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::gpt::{GptHeader, GptHeaderDecoder, GptPartitionArrayDecoder, GptPartitionEntry};
use crate::mbr::{LegacyLayout, MbrDecoder};
use crate::source::{ImageSource, SectorSource};

/// A fully validated GPT layout read straight from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawGptDisk {
    pub header: GptHeader,
    /// In-use entries only; never longer than `header.number_of_partitions`.
    pub partitions: Vec<GptPartitionEntry>,
    /// Legacy view of sector 0, if it could be decoded.
    pub legacy: Option<LegacyLayout>,
    /// Whether sector 0 ends in 0x55AA; only filled in when requested.
    pub mbr_boot_signature: Option<bool>,
    pub sector_size: usize,
}

impl RawGptDisk {
    /// Total bytes covered by the in-use partitions.
    pub fn allocated_bytes(&self) -> u64 {
        self.partitions
            .iter()
            .map(|p| p.size_bytes(self.sector_size))
            .fold(0u64, u64::saturating_add)
    }
}

/// Pipeline position. Stages only move forward; any error moves straight to
/// `Failed`, and the error itself is what the decode call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    Start,
    MbrRead,
    HeaderValidated,
    ArrayValidated,
    Done,
    Failed,
}

impl DecodeStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecodeStage::Done | DecodeStage::Failed)
    }
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecodeStage::Start => "start",
            DecodeStage::MbrRead => "MBR read",
            DecodeStage::HeaderValidated => "header validated",
            DecodeStage::ArrayValidated => "array validated",
            DecodeStage::Done => "done",
            DecodeStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

pub struct GptDiskAssembler;

impl GptDiskAssembler {
    pub fn decode<S: SectorSource + ?Sized>(source: &mut S) -> Result<RawGptDisk, DecodeError> {
        Self::decode_with(source, &DecodeOptions::default())
    }

    /// Run the whole pipeline. The first failing stage's error is returned
    /// unchanged; no partial disk is ever built.
    pub fn decode_with<S: SectorSource + ?Sized>(
        source: &mut S,
        options: &DecodeOptions,
    ) -> Result<RawGptDisk, DecodeError> {
        let mut stage = DecodeStage::Start;
        Self::run(source, options, &mut stage)
    }

    /// Drive the pipeline, leaving the final stage in `stage`.
    pub(crate) fn run<S: SectorSource + ?Sized>(
        source: &mut S,
        options: &DecodeOptions,
        stage: &mut DecodeStage,
    ) -> Result<RawGptDisk, DecodeError> {
        match Self::run_stages(source, options, stage) {
            Ok(disk) => Ok(disk),
            Err(e) => {
                debug!("GPT decode {} after stage '{}': {}", DecodeStage::Failed, stage, e);
                *stage = DecodeStage::Failed;
                Err(e)
            }
        }
    }

    fn run_stages<S: SectorSource + ?Sized>(
        source: &mut S,
        options: &DecodeOptions,
        stage: &mut DecodeStage,
    ) -> Result<RawGptDisk, DecodeError> {
        let sector_size = source.sector_size();
        *stage = DecodeStage::Start;
        debug!("GPT decode: {} ({}-byte sectors)", stage, sector_size);

        let sector0 = source.read(0, 1)?;
        let legacy = match MbrDecoder::decode(&sector0) {
            Ok(first) => {
                debug!(
                    "MBR entry 0: type 0x{:02X}, start {}, {} sectors",
                    first.partition_type, first.starting_lba, first.size_in_lba
                );
                if !first.is_protective() {
                    warn!("Sector 0 is not a protective MBR (type 0x{:02X})", first.partition_type);
                }
                LegacyLayout::from_sector0(&sector0).ok()
            }
            Err(e) => {
                warn!("Ignoring unreadable MBR: {}", e);
                None
            }
        };
        let mbr_boot_signature = options
            .check_boot_signature
            .then(|| MbrDecoder::has_boot_signature(&sector0));
        *stage = DecodeStage::MbrRead;
        debug!("GPT decode: {}", stage);

        let sector1 = source.read(1, 1)?;
        let header = GptHeaderDecoder::decode(&sector1, sector_size)?;
        *stage = DecodeStage::HeaderValidated;
        debug!("GPT decode: {} (disk {})", stage, header.disk_guid);

        let partitions = GptPartitionArrayDecoder::decode_with(&header, source, options)?;
        *stage = DecodeStage::ArrayValidated;
        debug!("GPT decode: {}", stage);

        let disk = RawGptDisk {
            header,
            partitions,
            legacy,
            mbr_boot_signature,
            sector_size,
        };
        *stage = DecodeStage::Done;
        info!(
            "GPT decode {}: disk {}, {} partitions in use of {}",
            stage,
            disk.header.disk_guid,
            disk.partitions.len(),
            disk.header.number_of_partitions
        );

        Ok(disk)
    }
}

/// Open a disk or image by path and decode its GPT.
pub fn read_raw_gpt_disk<P: AsRef<Path>>(path: P) -> Result<RawGptDisk, RawDiskError> {
    read_raw_gpt_disk_with(path, &DecodeOptions::default())
}

pub fn read_raw_gpt_disk_with<P: AsRef<Path>>(
    path: P,
    options: &DecodeOptions,
) -> Result<RawGptDisk, RawDiskError> {
    let mut source = ImageSource::open_with(path, options)?;
    Ok(GptDiskAssembler::decode_with(&mut source, options)?)
}
