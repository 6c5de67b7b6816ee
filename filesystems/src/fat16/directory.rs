// Root directory enumeration and name lookup

use super::constants::*;
use super::file_stream::FileStream;
use super::structures::{FatAttributes, RawDirEntry};
use super::volume::Volume;
use chrono::NaiveDateTime;
use fatview_core::{BlockStore, FatError};
use log::{debug, trace};
use serde::Serialize;

/// Paths accepted as the root directory
const ROOT_PATHS: [&str; 2] = ["\\", "/"];

/// Find a live root directory entry by name.
///
/// The caller's name is cut at its first dot and that prefix is compared
/// byte for byte, without case folding, against the start of the stored
/// 11-byte field. The extension is not compared. The search stops at the
/// end-of-directory slot and never matches deleted, long-filename or
/// volume-label slots.
pub fn find_entry<'a>(entries: &'a [RawDirEntry], name: &str) -> Option<&'a RawDirEntry> {
    let base = name.split('.').next().unwrap_or("").as_bytes();
    if base.is_empty() || base.len() > DIR_NAME_LEN {
        return None;
    }

    entries
        .iter()
        .take_while(|e| !e.is_end())
        .filter(|e| !e.is_deleted())
        .filter(|e| !e.attributes.is_lfn() && !e.attributes.is_volume_id())
        .find(|e| e.name[..base.len()] == *base)
}

/// One live root directory entry
pub struct DirEntry<'v, S: BlockStore> {
    pub name: String,
    pub size: u32,
    pub is_readonly: bool,
    pub is_hidden: bool,
    pub is_system: bool,
    pub is_directory: bool,
    pub is_archived: bool,
    raw: RawDirEntry,
    volume: &'v Volume<S>,
}

impl<'v, S: BlockStore> DirEntry<'v, S> {
    fn new(raw: RawDirEntry, volume: &'v Volume<S>) -> Self {
        let attributes = raw.attributes;
        Self {
            name: raw.display_name(),
            size: raw.size(),
            is_readonly: attributes.is_read_only(),
            is_hidden: attributes.is_hidden(),
            is_system: attributes.is_system(),
            is_directory: attributes.is_directory(),
            is_archived: attributes.is_archive(),
            raw,
            volume,
        }
    }

    /// The volume this entry was read from.
    pub fn volume(&self) -> &'v Volume<S> {
        self.volume
    }

    pub fn raw(&self) -> &RawDirEntry {
        &self.raw
    }

    pub fn attributes(&self) -> FatAttributes {
        self.raw.attributes
    }

    pub fn first_cluster(&self) -> u16 {
        self.raw.first_cluster()
    }

    pub fn created(&self) -> Option<NaiveDateTime> {
        self.raw.created().to_datetime()
    }

    pub fn modified(&self) -> Option<NaiveDateTime> {
        self.raw.modified().to_datetime()
    }

    /// Open this exact entry as a file.
    pub fn open(&self) -> Result<FileStream<'v, S>, FatError> {
        FileStream::from_entry(self.volume, self.raw)
    }

    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            name: self.name.clone(),
            size: self.size,
            is_readonly: self.is_readonly,
            is_hidden: self.is_hidden,
            is_system: self.is_system,
            is_directory: self.is_directory,
            is_archived: self.is_archived,
            first_cluster: self.first_cluster(),
            created: self.created(),
            modified: self.modified(),
        }
    }
}

impl<S: BlockStore> std::fmt::Debug for DirEntry<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirEntry")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("attributes", &self.attributes())
            .finish()
    }
}

/// Owned, serialisable copy of a directory entry's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub name: String,
    pub size: u32,
    pub is_readonly: bool,
    pub is_hidden: bool,
    pub is_system: bool,
    pub is_directory: bool,
    pub is_archived: bool,
    pub first_cluster: u16,
    pub created: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
}

/// Walks root directory slots in on-disk order
pub struct DirectoryEnumerator<'v, S: BlockStore> {
    volume: &'v Volume<S>,
    next_index: usize,
}

impl<'v, S: BlockStore> DirectoryEnumerator<'v, S> {
    pub fn open(volume: &'v Volume<S>, path: &str) -> Result<Self, FatError> {
        if !ROOT_PATHS.contains(&path) {
            return Err(FatError::NotSupported(format!(
                "Only the root directory can be listed, not {:?}",
                path
            )));
        }
        debug!("Enumerating root directory ({} slots)", volume.root_entries().len());
        Ok(Self {
            volume,
            next_index: 0,
        })
    }
}

impl<'v, S: BlockStore> Iterator for DirectoryEnumerator<'v, S> {
    type Item = DirEntry<'v, S>;

    fn next(&mut self) -> Option<Self::Item> {
        let slots = self.volume.root_entries();

        while let Some(raw) = slots.get(self.next_index) {
            if raw.is_end() {
                trace!("End of directory at slot {}", self.next_index);
                self.next_index = slots.len();
                return None;
            }
            self.next_index += 1;

            if raw.is_deleted() || raw.is_blank() {
                continue;
            }
            let attributes = raw.attributes;
            if attributes.is_lfn() || attributes.is_volume_id() {
                continue;
            }

            return Some(DirEntry::new(*raw, self.volume));
        }

        None
    }
}

impl<S: BlockStore> std::iter::FusedIterator for DirectoryEnumerator<'_, S> {}
