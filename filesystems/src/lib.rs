// FAT16 image reader: volume loading, cluster chains, file streams and
// root directory enumeration over a block store.

pub mod fat16;
pub mod partition;

#[cfg(test)]
pub mod test_helpers;

pub use fat16::{
    DirEntry, DirectoryEnumerator, EntryInfo, FileStream, Volume, VolumeInfo, VolumeOptions,
};
pub use partition::{find_fat16_partition, read_partition_table, PartitionEntry};
