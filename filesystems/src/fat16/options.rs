// Volume open options

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeOptions {
    /// Physical 512-byte sector holding the volume's boot sector.
    pub partition_start_sector: u64,
    /// Keep each file's resolved cluster chain between reads.
    pub cache_chains: bool,
}

impl Default for VolumeOptions {
    fn default() -> Self {
        Self {
            partition_start_sector: 0,
            cache_chains: true,
        }
    }
}

impl VolumeOptions {
    pub fn at_sector(partition_start_sector: u64) -> Self {
        Self {
            partition_start_sector,
            ..Self::default()
        }
    }
}
