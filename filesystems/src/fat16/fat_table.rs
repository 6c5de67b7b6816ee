// In-memory FAT16 table

use super::constants::*;
use byteorder::{ByteOrder, LittleEndian};

/// What a single FAT16 slot says about its cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    /// 0x0000: cluster is unused
    Free,
    /// 0x0001 and 0xFFF0-0xFFF7: never a valid link
    Reserved(u16),
    /// 0x0002-0xFFEF: next cluster in the chain
    Next(u16),
    /// 0xFFF8 and above
    EndOfChain,
}

impl FatEntry {
    pub fn classify(value: u16) -> Self {
        match value {
            FAT16_FREE => FatEntry::Free,
            v if v >= FAT16_EOC => FatEntry::EndOfChain,
            v if (FAT16_FIRST_DATA_CLUSTER..=FAT16_MAX_POINTER).contains(&v) => FatEntry::Next(v),
            v => FatEntry::Reserved(v),
        }
    }
}

/// Decoded 16-bit cluster links, one per slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatTable {
    entries: Vec<u16>,
}

impl FatTable {
    /// Decode a raw FAT copy. A trailing odd byte is ignored.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut entries = vec![0u16; data.len() / 2];
        LittleEndian::read_u16_into(&data[..entries.len() * 2], &mut entries);
        Self { entries }
    }

    pub fn from_entries(entries: Vec<u16>) -> Self {
        Self { entries }
    }

    /// Number of slots, including the two reserved ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw value stored for `cluster`.
    pub fn get(&self, cluster: u16) -> Option<u16> {
        self.entries.get(cluster as usize).copied()
    }

    pub fn entry(&self, cluster: u16) -> Option<FatEntry> {
        self.get(cluster).map(FatEntry::classify)
    }

    /// Whether `cluster` may start or continue a chain in this table.
    pub fn is_data_cluster(&self, cluster: u16) -> bool {
        cluster >= FAT16_FIRST_DATA_CLUSTER && (cluster as usize) < self.entries.len()
    }

    /// Count of free slots among the first `data_clusters` data clusters.
    /// Slots past the data region are sector padding and never counted.
    pub fn free_clusters(&self, data_clusters: usize) -> usize {
        self.entries
            .iter()
            .skip(FAT16_FIRST_DATA_CLUSTER as usize)
            .take(data_clusters)
            .filter(|&&v| v == FAT16_FREE)
            .count()
    }

    pub fn entries(&self) -> &[u16] {
        &self.entries
    }
}
