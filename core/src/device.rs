// Block store abstraction: fixed 512-byte sector reads from a backing image

use crate::FatError;
use log::{debug, trace};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Physical sector size used for all store addressing.
pub const SECTOR_SIZE: usize = 512;

/// A read-only store addressed in 512-byte sectors.
///
/// Reads take `&self` so a volume can be shared by several streams; stores
/// serialise access to their backing handle internally.
pub trait BlockStore {
    /// Read `count` sectors starting at absolute sector `first_sector`.
    /// Anything shorter than `count * SECTOR_SIZE` bytes is an error.
    fn read_sectors(&self, first_sector: u64, count: usize) -> Result<Vec<u8>, FatError>;

    /// Release the backing handle.
    fn close(self) -> Result<(), FatError>
    where
        Self: Sized,
    {
        Ok(())
    }
}

impl<T: BlockStore + ?Sized> BlockStore for &T {
    fn read_sectors(&self, first_sector: u64, count: usize) -> Result<Vec<u8>, FatError> {
        (**self).read_sectors(first_sector, count)
    }
}

/// Disk image stored in a regular file
pub struct ImageFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl ImageFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FatError> {
        let path = path.as_ref().to_path_buf();
        debug!("Opening disk image {}", path.display());
        let file = File::open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the backing file in bytes.
    pub fn len(&self) -> Result<u64, FatError> {
        let file = self.lock()?;
        Ok(file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, FatError> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, File>, FatError> {
        self.file.lock().map_err(|_| {
            FatError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "image file lock poisoned",
            ))
        })
    }
}

impl BlockStore for ImageFile {
    fn read_sectors(&self, first_sector: u64, count: usize) -> Result<Vec<u8>, FatError> {
        let (offset, wanted) = byte_span(first_sector, count)?;
        trace!("Reading {} sectors at sector {} (offset {:#x})", count, first_sector, offset);

        let mut file = self.lock()?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = vec![0u8; wanted];
        let mut filled = 0;
        while filled < wanted {
            match file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled != wanted {
            return Err(FatError::short_read(wanted, filled));
        }
        Ok(buffer)
    }

    fn close(self) -> Result<(), FatError> {
        debug!("Closing disk image {}", self.path.display());
        Ok(())
    }
}

/// Disk image held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Vec<u8>,
}

impl MemoryStore {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for MemoryStore {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl BlockStore for MemoryStore {
    fn read_sectors(&self, first_sector: u64, count: usize) -> Result<Vec<u8>, FatError> {
        let (offset, wanted) = byte_span(first_sector, count)?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        trace!("Reading {} sectors at sector {} from memory", count, first_sector);

        let available = self.data.len().saturating_sub(start);
        if start > self.data.len() || available < wanted {
            return Err(FatError::short_read(wanted, available));
        }
        Ok(self.data[start..start + wanted].to_vec())
    }
}

/// Byte offset and length of a sector run, or an error if either overflows.
fn byte_span(first_sector: u64, count: usize) -> Result<(u64, usize), FatError> {
    let offset = first_sector.checked_mul(SECTOR_SIZE as u64);
    let wanted = count.checked_mul(SECTOR_SIZE);
    match (offset, wanted) {
        (Some(offset), Some(wanted)) if offset.checked_add(wanted as u64).is_some() => Ok((offset, wanted)),
        _ => Err(FatError::IoError(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} sectors at sector {} overflow the byte range", count, first_sector),
        ))),
    }
}
