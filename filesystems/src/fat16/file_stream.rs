// Byte-addressable reads over a root directory file's cluster chain

use super::cluster_chain::ClusterChain;
use super::directory::find_entry;
use super::structures::RawDirEntry;
use super::volume::Volume;
use fatview_core::{BlockStore, FatError};
use log::{debug, trace};
use std::io::{self, SeekFrom};

/// An open file with its own read cursor
///
/// Borrows the volume, so it cannot outlive it. The resolved cluster chain
/// is cached on first read unless the volume was opened with
/// `cache_chains` off.
pub struct FileStream<'v, S: BlockStore> {
    volume: &'v Volume<S>,
    entry: RawDirEntry,
    name: String,
    position: u64,
    chain: Option<ClusterChain>,
}

impl<'v, S: BlockStore> FileStream<'v, S> {
    /// Open `name` from the root directory.
    ///
    /// Only the part of `name` before the first dot is compared against
    /// the stored 11-byte field, byte for byte.
    pub fn open(volume: &'v Volume<S>, name: &str) -> Result<Self, FatError> {
        let entry = find_entry(volume.root_entries(), name)
            .ok_or_else(|| FatError::NotFound(name.to_string()))?;
        Self::from_entry(volume, *entry)
    }

    /// Open a specific directory entry.
    pub fn from_entry(volume: &'v Volume<S>, entry: RawDirEntry) -> Result<Self, FatError> {
        let name = entry.display_name();
        if entry.is_directory() {
            return Err(FatError::IsDirectory(name));
        }

        debug!("Opened {} ({} bytes, first cluster {})", name, entry.size(), entry.first_cluster());
        Ok(Self {
            volume,
            entry,
            name,
            position: 0,
            chain: None,
        })
    }

    pub fn entry(&self) -> &RawDirEntry {
        &self.entry
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn volume(&self) -> &'v Volume<S> {
        self.volume
    }

    /// File size in bytes.
    pub fn len(&self) -> u64 {
        self.entry.size() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move the cursor. The target must land in `0..=len`; otherwise the
    /// cursor stays where it was.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, FatError> {
        let size = self.len() as i128;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.position as i128 + delta as i128,
            SeekFrom::End(delta) => size + delta as i128,
        };

        if target < 0 || target > size {
            return Err(FatError::InvalidOffset(format!(
                "{:?} lands at {} outside 0..={} in {}",
                pos, target, size, self.name
            )));
        }

        self.position = target as u64;
        Ok(self.position)
    }

    /// Copy bytes from the cursor into `buf`, never past the end of the
    /// file. Returns 0 at end of file. On error the cursor is unchanged.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, FatError> {
        let remaining = self.len().saturating_sub(self.position);
        let wanted = (buf.len() as u64).min(remaining) as usize;
        if wanted == 0 {
            return Ok(0);
        }

        let chain = match self.chain.take() {
            Some(chain) => chain,
            None => self.resolve_chain()?,
        };
        let result = self.copy_from_chain(&chain, &mut buf[..wanted]);
        if self.volume.options().cache_chains {
            self.chain = Some(chain);
        }

        let copied = result?;
        self.position += copied as u64;
        Ok(copied)
    }

    fn resolve_chain(&self) -> Result<ClusterChain, FatError> {
        self.volume.resolve_chain(self.entry.first_cluster())
    }

    /// Fill `out` starting at the cursor, one cluster segment at a time.
    fn copy_from_chain(&self, chain: &ClusterChain, out: &mut [u8]) -> Result<usize, FatError> {
        let cluster_size = self.volume.layout().cluster_size();
        let mut offset = self.position;
        let mut copied = 0;

        while copied < out.len() {
            let (cluster, within) = chain.locate(offset, cluster_size).ok_or_else(|| {
                FatError::CorruptChain(format!(
                    "{} claims {} bytes but its chain ends after {} clusters",
                    self.name,
                    self.len(),
                    chain.len()
                ))
            })?;

            let n = (cluster_size - within).min(out.len() - copied);
            trace!("{}: {} bytes from cluster {} at +{}", self.name, n, cluster, within);
            let data = self.volume.read_cluster_range(cluster, within, n)?;
            out[copied..copied + n].copy_from_slice(&data);

            copied += n;
            offset += n as u64;
        }

        Ok(copied)
    }
}

impl<S: BlockStore> io::Read for FileStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FileStream::read(self, buf).map_err(io::Error::from)
    }
}

impl<S: BlockStore> io::Seek for FileStream<'_, S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        FileStream::seek(self, pos).map_err(io::Error::from)
    }
}

impl<S: BlockStore> std::fmt::Debug for FileStream<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream")
            .field("name", &self.name)
            .field("size", &self.len())
            .field("position", &self.position)
            .field("chain_cached", &self.chain.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fat16::options::VolumeOptions;
    use crate::test_helpers::{pattern, ImageBuilder};
    use fatview_core::MemoryStore;

    fn volume(builder: ImageBuilder) -> Volume<MemoryStore> {
        Volume::open(MemoryStore::new(builder.build()), 0).unwrap()
    }

    #[test]
    fn test_open_not_found() {
        let vol = volume(ImageBuilder::new().file(b"README  TXT", b"hi"));
        assert!(matches!(FileStream::open(&vol, "MISSING.TXT"), Err(FatError::NotFound(_))));
    }

    #[test]
    fn test_open_directory_rejected() {
        let vol = volume(ImageBuilder::new().directory(b"DOCS       "));
        assert!(matches!(FileStream::open(&vol, "DOCS"), Err(FatError::IsDirectory(_))));
    }

    #[test]
    fn test_seek_bounds() {
        let data = pattern(1000);
        let vol = volume(ImageBuilder::new().file(b"DATA    BIN", &data));
        let mut file = vol.open_file("DATA.BIN").unwrap();

        assert_eq!(file.seek(SeekFrom::End(0)).unwrap(), 1000);
        assert!(matches!(file.seek(SeekFrom::End(1)), Err(FatError::InvalidOffset(_))));
        assert_eq!(file.position(), 1000);

        assert!(matches!(file.seek(SeekFrom::Start(1001)), Err(FatError::InvalidOffset(_))));
        assert_eq!(file.seek(SeekFrom::Start(1000)).unwrap(), 1000);

        assert_eq!(file.seek(SeekFrom::Start(10)).unwrap(), 10);
        assert!(matches!(file.seek(SeekFrom::Current(-11)), Err(FatError::InvalidOffset(_))));
        assert_eq!(file.position(), 10);
        assert_eq!(file.seek(SeekFrom::Current(-10)).unwrap(), 0);
        assert_eq!(file.seek(SeekFrom::End(-1000)).unwrap(), 0);
        assert!(matches!(file.seek(SeekFrom::End(-1001)), Err(FatError::InvalidOffset(_))));
    }

    #[test]
    fn test_high_cluster_word_ignored() {
        let data = pattern(600);
        let builder = ImageBuilder::new().file(b"DATA    BIN", &data);
        let mut image = builder.build();
        let slot = builder.root_dir_offset();
        image[slot + 20..slot + 22].copy_from_slice(&0x0001u16.to_le_bytes());

        let vol = Volume::open(MemoryStore::new(image), 0).unwrap();
        let mut file = vol.open_file("DATA.BIN").unwrap();
        assert_eq!(file.entry().first_cluster(), 2);

        let mut buf = vec![0u8; 1024];
        assert_eq!(file.read(&mut buf).unwrap(), 600);
        assert_eq!(&buf[..600], &data[..]);
    }

    #[test]
    fn test_read_truncates_at_end() {
        let data = pattern(700);
        let vol = volume(ImageBuilder::new().file(b"DATA    BIN", &data));
        let mut file = vol.open_file("DATA.BIN").unwrap();

        let mut buf = vec![0xAAu8; 4096];
        assert_eq!(file.read(&mut buf).unwrap(), 700);
        assert_eq!(&buf[..700], &data[..]);
        assert!(buf[700..].iter().all(|&b| b == 0xAA));
        assert_eq!(file.read(&mut buf).unwrap(), 0);
        assert_eq!(file.position(), 700);
    }

    #[test]
    fn test_read_across_cluster_boundaries_in_small_steps() {
        let data = pattern(5 * 512 + 17);
        let vol = volume(ImageBuilder::new().file(b"DATA    BIN", &data));
        let mut file = vol.open_file("DATA.BIN").unwrap();

        let mut out = Vec::new();
        let mut buf = [0u8; 333];
        loop {
            let n = file.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, data);
    }

    #[test]
    fn test_fragmented_chain_without_cache() {
        let data = pattern(3 * 1024);
        let builder = ImageBuilder::new()
            .sectors_per_cluster(2)
            .file_on_clusters(b"FRAG    BIN", &data, &[9, 4, 7]);
        let options = VolumeOptions {
            cache_chains: false,
            ..VolumeOptions::default()
        };
        let vol = Volume::open_with(MemoryStore::new(builder.build()), &options).unwrap();
        let mut file = vol.open_file("FRAG.BIN").unwrap();

        file.seek(SeekFrom::Start(1020)).unwrap();
        let mut buf = [0u8; 1030];
        assert_eq!(file.read(&mut buf).unwrap(), 1030);
        assert_eq!(&buf[..], &data[1020..2050]);
        assert!(file.chain.is_none());
    }

    #[test]
    fn test_chain_shorter_than_size() {
        let builder = ImageBuilder::new().file_with_size(b"SHORT   BIN", &pattern(512), 2000);
        let vol = volume(builder);
        let mut file = vol.open_file("SHORT.BIN").unwrap();

        let mut buf = [0u8; 100];
        file.seek(SeekFrom::Start(500)).unwrap();
        assert!(matches!(file.read(&mut buf), Err(FatError::CorruptChain(_))));
        assert_eq!(file.position(), 500);
    }

    #[test]
    fn test_short_store_read_leaves_cursor() {
        let builder = ImageBuilder::new().file(b"DATA    BIN", &pattern(2048));
        let mut image = builder.build();
        // Drop the last cluster from the image
        image.truncate(builder.cluster_offset(5));
        let vol = Volume::open(MemoryStore::new(image), 0).unwrap();
        let mut file = vol.open_file("DATA.BIN").unwrap();

        let mut buf = vec![0u8; 2048];
        assert!(matches!(file.read(&mut buf), Err(FatError::IoError(_))));
        assert_eq!(file.position(), 0);

        // Bytes before the missing cluster still read fine
        assert_eq!(file.read(&mut buf[..1536]).unwrap(), 1536);
    }

    #[test]
    fn test_empty_file() {
        let vol = volume(ImageBuilder::new().file(b"EMPTY      ", b""));
        let mut file = vol.open_file("EMPTY").unwrap();
        assert!(file.is_empty());
        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf).unwrap(), 0);
        assert_eq!(file.seek(SeekFrom::End(0)).unwrap(), 0);
    }

    #[test]
    fn test_io_traits() {
        use std::io::{Read, Seek};

        let data = pattern(1500);
        let vol = volume(ImageBuilder::new().file(b"DATA    BIN", &data));
        let mut file = vol.open_file("DATA.BIN").unwrap();

        Seek::seek(&mut file, SeekFrom::Start(100)).unwrap();
        let mut rest = Vec::new();
        file.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, &data[100..]);

        let err = Seek::seek(&mut file, SeekFrom::End(5)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
