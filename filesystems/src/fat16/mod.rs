// FAT16 read-only volume access
//
// Volume -> FileStream / DirectoryEnumerator, both borrowing the volume.

pub mod cluster_chain;
pub mod constants;
pub mod directory;
pub mod fat_table;
pub mod file_stream;
pub mod options;
pub mod structures;
pub mod timestamps;
pub mod volume;


pub use cluster_chain::{resolve, ClusterChain, VolumeLayout};
pub use directory::{find_entry, DirEntry, DirectoryEnumerator, EntryInfo};
pub use fat_table::{FatEntry, FatTable};
pub use file_stream::FileStream;
pub use options::VolumeOptions;
pub use structures::{BootSector, FatAttributes, RawDirEntry};
pub use timestamps::FatTimestamp;
pub use volume::{Volume, VolumeInfo};
