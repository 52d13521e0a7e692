// Sector-addressed access to a disk or disk image
// The decoders only ever see already-read byte buffers; all I/O happens here.

use log::{debug, trace};
use rawdisk_core::{DecodeError, DecodeOptions, Device, RawDiskError};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Supplies raw bytes for a range of logical blocks.
///
/// Implementations may block on device I/O. A read that runs past the end of
/// the backing store returns the bytes that do exist; callers decide whether a
/// short buffer is fatal.
pub trait SectorSource {
    /// Size of one logical block in bytes.
    fn sector_size(&self) -> usize;

    /// Read `count` sectors starting at `lba`.
    fn read(&mut self, lba: u64, count: usize) -> Result<Vec<u8>, DecodeError>;
}

impl<S: SectorSource + ?Sized> SectorSource for &mut S {
    fn sector_size(&self) -> usize {
        (**self).sector_size()
    }

    fn read(&mut self, lba: u64, count: usize) -> Result<Vec<u8>, DecodeError> {
        (**self).read(lba, count)
    }
}

impl<S: SectorSource + ?Sized> SectorSource for Box<S> {
    fn sector_size(&self) -> usize {
        (**self).sector_size()
    }

    fn read(&mut self, lba: u64, count: usize) -> Result<Vec<u8>, DecodeError> {
        (**self).read(lba, count)
    }
}

fn byte_range(lba: u64, count: usize, sector_size: usize) -> Result<(u64, usize), DecodeError> {
    let offset = lba
        .checked_mul(sector_size as u64)
        .ok_or(DecodeError::InvalidHeader { field: "lba", value: lba })?;
    let len = count
        .checked_mul(sector_size)
        .ok_or(DecodeError::InvalidHeader { field: "sector_count", value: count as u64 })?;
    Ok((offset, len))
}

/// Sector source over any seekable reader: a disk image, a raw device node, or
/// an in-memory cursor.
pub struct ImageSource<R> {
    reader: R,
    sector_size: usize,
}

impl<R: Read + Seek> ImageSource<R> {
    pub fn new(reader: R, sector_size: usize) -> Self {
        Self { reader, sector_size }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl ImageSource<File> {
    /// Open a disk or image, taking the sector size from the device itself.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RawDiskError> {
        Self::open_with(path, &DecodeOptions::default())
    }

    /// Open a disk or image; `options.sector_size` overrides the probed sector size.
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        options: &DecodeOptions,
    ) -> Result<Self, RawDiskError> {
        options.validate()?;

        let device = Device::probe(path.as_ref())?;
        let sector_size = options.sector_size.unwrap_or(device.sector_size);

        let file = File::open(path.as_ref())?;
        debug!(
            "Opened {} ({:?}, {} bytes) with {}-byte sectors",
            device.id, device.device_type, device.size, sector_size
        );

        Ok(Self::new(file, sector_size))
    }
}

impl<R: Read + Seek> SectorSource for ImageSource<R> {
    fn sector_size(&self) -> usize {
        self.sector_size
    }

    fn read(&mut self, lba: u64, count: usize) -> Result<Vec<u8>, DecodeError> {
        let (offset, len) = byte_range(lba, count, self.sector_size)?;
        trace!("Reading {} sectors at LBA {} (offset {:#x})", count, lba, offset);

        self.reader.seek(SeekFrom::Start(offset))?;

        let mut buffer = Vec::with_capacity(len);
        (&mut self.reader).take(len as u64).read_to_end(&mut buffer)?;

        if buffer.len() < len {
            trace!("  Short read: {} of {} bytes", buffer.len(), len);
        }

        Ok(buffer)
    }
}

/// Sector source over bytes that are already in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    sector_size: usize,
}

impl MemorySource {
    pub fn new(data: Vec<u8>, sector_size: usize) -> Self {
        Self { data, sector_size }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl SectorSource for MemorySource {
    fn sector_size(&self) -> usize {
        self.sector_size
    }

    fn read(&mut self, lba: u64, count: usize) -> Result<Vec<u8>, DecodeError> {
        let (offset, len) = byte_range(lba, count, self.sector_size)?;
        trace!("Reading {} sectors at LBA {} from memory", count, lba);

        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(self.data.len());
        let end = start.saturating_add(len).min(self.data.len());
        Ok(self.data[start..end].to_vec())
    }
}
