use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FatError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Is a directory: {0}")]
    IsDirectory(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),

    #[error("Invalid cluster chain: {0}")]
    InvalidChain(String),

    #[error("Corrupt cluster chain: {0}")]
    CorruptChain(String),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl FatError {
    /// Shorthand for the error every short store read turns into.
    pub fn short_read(wanted: usize, got: usize) -> Self {
        FatError::IoError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("short read: wanted {} bytes, got {}", wanted, got),
        ))
    }
}

impl From<FatError> for io::Error {
    fn from(err: FatError) -> Self {
        match err {
            FatError::IoError(e) => e,
            FatError::InvalidOffset(_) => io::Error::new(io::ErrorKind::InvalidInput, err),
            FatError::NotFound(_) => io::Error::new(io::ErrorKind::NotFound, err),
            FatError::NotSupported(_) => io::Error::new(io::ErrorKind::Unsupported, err),
            _ => io::Error::new(io::ErrorKind::InvalidData, err),
        }
    }
}
