// Cluster chain resolution and cluster-to-sector address translation

use super::fat_table::{FatEntry, FatTable};
use super::structures::BootSector;
use fatview_core::{FatError, SECTOR_SIZE};
use log::{debug, warn};

/// Volume layout in logical sectors, plus the physical mapping onto the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeLayout {
    /// First physical (512-byte) sector of the partition
    pub partition_start: u64,
    pub bytes_per_sector: u32,
    pub sectors_per_cluster: u32,
    pub reserved_sectors: u32,
    pub sectors_per_fat: u32,
    pub root_entries: u32,
}

impl VolumeLayout {
    pub fn new(boot: &BootSector, partition_start: u64) -> Self {
        Self {
            partition_start,
            bytes_per_sector: boot.bytes_per_sector as u32,
            sectors_per_cluster: boot.sectors_per_cluster as u32,
            reserved_sectors: boot.reserved_sectors as u32,
            sectors_per_fat: boot.sectors_per_fat as u32,
            root_entries: boot.root_entries as u32,
        }
    }

    /// Logical sector of the first FAT copy.
    pub fn fat_start(&self) -> u64 {
        self.reserved_sectors as u64
    }

    /// Logical sector of the root directory, right after both FAT copies.
    pub fn root_dir_start(&self) -> u64 {
        self.fat_start() + 2 * self.sectors_per_fat as u64
    }

    pub fn root_dir_sectors(&self) -> u64 {
        (self.root_entries as u64 * 32).div_ceil(self.bytes_per_sector as u64)
    }

    /// Logical sector of cluster 2.
    pub fn data_region_start(&self) -> u64 {
        self.root_dir_start() + self.root_dir_sectors()
    }

    /// Logical sector where `cluster` begins. `cluster` must be 2 or above.
    pub fn cluster_to_sector(&self, cluster: u16) -> u64 {
        self.data_region_start() + (cluster as u64 - 2) * self.sectors_per_cluster as u64
    }

    pub fn cluster_size(&self) -> usize {
        self.bytes_per_sector as usize * self.sectors_per_cluster as usize
    }

    /// Physical 512-byte sectors per logical sector.
    pub fn physical_per_logical(&self) -> u64 {
        self.bytes_per_sector as u64 / SECTOR_SIZE as u64
    }

    /// Physical store sector for a volume-relative logical sector.
    pub fn physical_sector(&self, logical: u64) -> u64 {
        self.partition_start + logical * self.physical_per_logical()
    }

    /// Physical store sector where `cluster` begins.
    pub fn cluster_to_physical(&self, cluster: u16) -> u64 {
        self.physical_sector(self.cluster_to_sector(cluster))
    }

    /// Physical sectors spanned by one cluster.
    pub fn physical_sectors_per_cluster(&self) -> usize {
        self.cluster_size() / SECTOR_SIZE
    }
}

/// Ordered clusters holding one file's data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterChain {
    clusters: Box<[u16]>,
}

impl ClusterChain {
    pub fn clusters(&self) -> &[u16] {
        &self.clusters
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u16> {
        self.clusters.get(index).copied()
    }

    /// Cluster holding logical byte `offset` of the file, with the offset
    /// inside that cluster.
    pub fn locate(&self, offset: u64, cluster_size: usize) -> Option<(u16, usize)> {
        let index = usize::try_from(offset / cluster_size as u64).ok()?;
        let within = (offset % cluster_size as u64) as usize;
        self.get(index).map(|cluster| (cluster, within))
    }
}

/// Follow the FAT from `first_cluster` to the end-of-chain marker.
///
/// A chain can visit each data cluster at most once, so more steps than the
/// table has data slots means the links loop.
pub fn resolve(fat: &FatTable, first_cluster: u16) -> Result<ClusterChain, FatError> {
    if !fat.is_data_cluster(first_cluster) {
        warn!("Rejecting chain start {} (FAT has {} entries)", first_cluster, fat.len());
        return Err(FatError::InvalidChain(format!(
            "First cluster {} outside data clusters 2..{}",
            first_cluster,
            fat.len()
        )));
    }

    let max_len = fat.len() - 2;
    let mut clusters = Vec::new();
    let mut current = first_cluster;

    loop {
        if clusters.len() == max_len {
            warn!("Cluster chain from {} exceeds {} clusters", first_cluster, max_len);
            return Err(FatError::CorruptChain(format!(
                "Chain starting at cluster {} is longer than the FAT ({} clusters); links loop",
                first_cluster, max_len
            )));
        }
        clusters.push(current);

        match fat.entry(current) {
            Some(FatEntry::EndOfChain) => break,
            Some(FatEntry::Next(next)) if fat.is_data_cluster(next) => current = next,
            Some(FatEntry::Next(next)) => {
                return Err(FatError::InvalidChain(format!(
                    "Cluster {} links to {} beyond the FAT ({} entries)",
                    current,
                    next,
                    fat.len()
                )));
            }
            Some(FatEntry::Free) | Some(FatEntry::Reserved(_)) | None => {
                return Err(FatError::InvalidChain(format!(
                    "Cluster {} has no valid link (0x{:04X})",
                    current,
                    fat.get(current).unwrap_or(0)
                )));
            }
        }
    }

    debug!("Resolved chain from cluster {}: {} clusters", first_cluster, clusters.len());
    Ok(ClusterChain {
        clusters: clusters.into_boxed_slice(),
    })
}
