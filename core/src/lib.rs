pub mod device;
pub mod error;

pub use device::{BlockStore, ImageFile, MemoryStore, SECTOR_SIZE};
pub use error::FatError;
