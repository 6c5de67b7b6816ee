// FAT16 volume loader
//
// A Volume is an immutable snapshot of the boot sector, FAT and root
// directory. File streams and directory enumerators borrow it.

use super::cluster_chain::{self, ClusterChain, VolumeLayout};
use super::constants::*;
use super::directory::DirectoryEnumerator;
use super::fat_table::FatTable;
use super::file_stream::FileStream;
use super::options::VolumeOptions;
use super::structures::{BootSector, RawDirEntry};
use fatview_core::{BlockStore, FatError, SECTOR_SIZE};
use log::{debug, info, trace, warn};
use serde::Serialize;

/// Summary of a loaded volume
#[derive(Debug, Clone, Serialize)]
pub struct VolumeInfo {
    pub fs_type: String,
    pub oem_name: String,
    pub label: String,
    pub serial: u32,
    pub bytes_per_sector: u32,
    pub sectors_per_cluster: u32,
    pub cluster_size: usize,
    pub reserved_sectors: u32,
    pub sectors_per_fat: u32,
    pub root_entries: u32,
    pub total_sectors: u32,
    pub total_clusters: usize,
    pub free_clusters: usize,
    pub partition_start_sector: u64,
}

pub struct Volume<S: BlockStore> {
    store: S,
    boot_sector: BootSector,
    layout: VolumeLayout,
    fat: FatTable,
    root: Vec<RawDirEntry>,
    options: VolumeOptions,
}

impl<S: BlockStore> Volume<S> {
    /// Load the volume whose boot sector sits at `partition_start_sector`.
    pub fn open(store: S, partition_start_sector: u64) -> Result<Self, FatError> {
        Self::open_with(store, &VolumeOptions::at_sector(partition_start_sector))
    }

    /// Load a volume; nothing is returned unless every step succeeds.
    pub fn open_with(store: S, options: &VolumeOptions) -> Result<Self, FatError> {
        let start = options.partition_start_sector;
        info!("Opening FAT16 volume at sector {}", start);

        let boot_data = store.read_sectors(start, 1)?;
        let boot_sector = BootSector::parse(&boot_data)?;
        if let Err(e) = boot_sector.validate() {
            warn!("Rejecting volume at sector {}: {}", start, e);
            return Err(e);
        }

        let layout = VolumeLayout::new(&boot_sector, start);
        let fat_bytes = boot_sector.fat_bytes();

        debug!("Reading two FAT copies of {} bytes at logical sector {}", fat_bytes, layout.fat_start());
        let fat1 = read_logical(&store, &layout, layout.fat_start(), fat_bytes)?;
        let fat2 = read_logical(
            &store,
            &layout,
            layout.fat_start() + layout.sectors_per_fat as u64,
            fat_bytes,
        )?;

        if fat1 != fat2 {
            let first_diff = fat1.iter().zip(&fat2).position(|(a, b)| a != b).unwrap_or(0);
            warn!("FAT copies differ, first mismatch at byte {}", first_diff);
            return Err(FatError::InvalidFormat(format!(
                "FAT copies differ at byte {}",
                first_diff
            )));
        }
        let fat = FatTable::from_bytes(&fat1);

        let root_bytes = boot_sector.root_dir_bytes();
        debug!("Reading root directory: {} bytes at logical sector {}", root_bytes, layout.root_dir_start());
        let root_data = read_logical(&store, &layout, layout.root_dir_start(), root_bytes)?;
        let root = RawDirEntry::parse_all(&root_data)?;

        info!("FAT16 volume details:");
        info!("  Bytes per sector: {}", layout.bytes_per_sector);
        info!("  Sectors per cluster: {}", layout.sectors_per_cluster);
        info!("  Root entries: {}", layout.root_entries);
        info!("  FAT entries: {}", fat.len());
        info!("  First data sector: {}", layout.data_region_start());

        Ok(Self {
            store,
            boot_sector,
            layout,
            fat,
            root,
            options: options.clone(),
        })
    }

    /// Tear the volume down and close its store.
    pub fn close(self) -> Result<(), FatError> {
        debug!("Closing FAT16 volume");
        self.store.close()
    }

    pub fn boot_sector(&self) -> &BootSector {
        &self.boot_sector
    }

    pub fn layout(&self) -> &VolumeLayout {
        &self.layout
    }

    pub fn fat(&self) -> &FatTable {
        &self.fat
    }

    /// Every root directory slot, live or not, in on-disk order.
    pub fn root_entries(&self) -> &[RawDirEntry] {
        &self.root
    }

    pub fn options(&self) -> &VolumeOptions {
        &self.options
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn info(&self) -> VolumeInfo {
        let boot = &self.boot_sector;
        VolumeInfo {
            fs_type: boot.fs_type(),
            oem_name: boot.oem_name(),
            label: boot.volume_label(),
            serial: boot.volume_id,
            bytes_per_sector: self.layout.bytes_per_sector,
            sectors_per_cluster: self.layout.sectors_per_cluster,
            cluster_size: self.layout.cluster_size(),
            reserved_sectors: self.layout.reserved_sectors,
            sectors_per_fat: self.layout.sectors_per_fat,
            root_entries: self.layout.root_entries,
            total_sectors: boot.total_sectors(),
            total_clusters: self.data_clusters(),
            free_clusters: self.fat.free_clusters(self.data_clusters()),
            partition_start_sector: self.layout.partition_start,
        }
    }

    /// Clusters that fit in the data region, capped by the FAT's length.
    pub fn data_clusters(&self) -> usize {
        let total = self.boot_sector.total_sectors() as u64;
        let data_sectors = total.saturating_sub(self.layout.data_region_start());
        let clusters = (data_sectors / self.layout.sectors_per_cluster as u64) as usize;
        clusters.min(self.fat.len().saturating_sub(FAT16_FIRST_DATA_CLUSTER as usize))
    }

    /// Open a root directory file by name.
    pub fn open_file(&self, name: &str) -> Result<FileStream<'_, S>, FatError> {
        FileStream::open(self, name)
    }

    /// Enumerate a directory. Only the root is navigable.
    pub fn open_dir(&self, path: &str) -> Result<DirectoryEnumerator<'_, S>, FatError> {
        DirectoryEnumerator::open(self, path)
    }

    pub fn resolve_chain(&self, first_cluster: u16) -> Result<ClusterChain, FatError> {
        cluster_chain::resolve(&self.fat, first_cluster)
    }

    /// Read `len` bytes starting `offset` bytes into `cluster`.
    ///
    /// The store is addressed in whole 512-byte sectors; only the sectors
    /// covering the range are fetched.
    pub fn read_cluster_range(&self, cluster: u16, offset: usize, len: usize) -> Result<Vec<u8>, FatError> {
        if cluster < FAT16_FIRST_DATA_CLUSTER {
            return Err(FatError::InvalidChain(format!(
                "Cluster {} is below the first data cluster",
                cluster
            )));
        }
        let cluster_size = self.layout.cluster_size();
        if offset + len > cluster_size {
            return Err(FatError::InvalidOffset(format!(
                "Range {}..{} exceeds cluster size {}",
                offset,
                offset + len,
                cluster_size
            )));
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        let skip_sectors = offset / SECTOR_SIZE;
        let head = offset % SECTOR_SIZE;
        let count = (head + len).div_ceil(SECTOR_SIZE);
        let first = self.layout.cluster_to_physical(cluster) + skip_sectors as u64;

        trace!("Cluster {}: reading {} bytes at +{} (sectors {}..{})", cluster, len, offset, first, first + count as u64);
        let data = self.store.read_sectors(first, count)?;
        Ok(data[head..head + len].to_vec())
    }

    /// Read a whole cluster.
    pub fn read_cluster(&self, cluster: u16) -> Result<Vec<u8>, FatError> {
        self.read_cluster_range(cluster, 0, self.layout.cluster_size())
    }
}

/// Read `len` bytes from logical sector `logical` onward.
fn read_logical<S: BlockStore>(
    store: &S,
    layout: &VolumeLayout,
    logical: u64,
    len: usize,
) -> Result<Vec<u8>, FatError> {
    if len == 0 {
        return Ok(Vec::new());
    }
    let count = len.div_ceil(SECTOR_SIZE);
    let mut data = store.read_sectors(layout.physical_sector(logical), count)?;
    data.truncate(len);
    Ok(data)
}

impl<S: BlockStore> std::fmt::Debug for Volume<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Volume")
            .field("boot_sector", &self.boot_sector)
            .field("layout", &self.layout)
            .field("fat_entries", &self.fat.len())
            .field("root_slots", &self.root.len())
            .finish()
    }
}
