// Test helpers: hand-built FAT16 images

use crate::fat16::constants::*;
use crate::fat16::structures::FatAttributes;

enum Slot {
    File {
        name: [u8; 11],
        attributes: u8,
        data: Vec<u8>,
        size: Option<u32>,
        clusters: Option<Vec<u16>>,
    },
    Raw([u8; DIR_ENTRY_SIZE]),
}

/// Builds a small FAT16 image in memory, laid out like a formatter would
pub struct ImageBuilder {
    bytes_per_sector: u16,
    sectors_per_cluster: u8,
    reserved_sectors: u16,
    sectors_per_fat: u16,
    root_entries: u16,
    label: [u8; 11],
    slots: Vec<Slot>,
    fat_overrides: Vec<(u16, u16)>,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuilder {
    pub fn new() -> Self {
        Self {
            bytes_per_sector: 512,
            sectors_per_cluster: 1,
            reserved_sectors: 1,
            sectors_per_fat: 1,
            root_entries: 16,
            label: *b"NO NAME    ",
            slots: Vec::new(),
            fat_overrides: Vec::new(),
        }
    }

    pub fn bytes_per_sector(mut self, value: u16) -> Self {
        self.bytes_per_sector = value;
        self
    }

    pub fn sectors_per_cluster(mut self, value: u8) -> Self {
        self.sectors_per_cluster = value;
        self
    }

    pub fn reserved_sectors(mut self, value: u16) -> Self {
        self.reserved_sectors = value;
        self
    }

    pub fn sectors_per_fat(mut self, value: u16) -> Self {
        self.sectors_per_fat = value;
        self
    }

    pub fn root_entries(mut self, value: u16) -> Self {
        self.root_entries = value;
        self
    }

    pub fn label(mut self, label: &[u8; 11]) -> Self {
        self.label = *label;
        self
    }

    /// Archive-flagged file on consecutive free clusters.
    pub fn file(self, name: &[u8; 11], data: &[u8]) -> Self {
        self.entry(name, FatAttributes::ARCHIVE, data)
    }

    pub fn entry(mut self, name: &[u8; 11], attributes: u8, data: &[u8]) -> Self {
        self.slots.push(Slot::File {
            name: *name,
            attributes,
            data: data.to_vec(),
            size: None,
            clusters: None,
        });
        self
    }

    /// File stored on exactly the given clusters, in order.
    pub fn file_on_clusters(mut self, name: &[u8; 11], data: &[u8], clusters: &[u16]) -> Self {
        self.slots.push(Slot::File {
            name: *name,
            attributes: FatAttributes::ARCHIVE,
            data: data.to_vec(),
            size: None,
            clusters: Some(clusters.to_vec()),
        });
        self
    }

    /// File whose directory entry claims `size` bytes regardless of `data`.
    pub fn file_with_size(mut self, name: &[u8; 11], data: &[u8], size: u32) -> Self {
        self.slots.push(Slot::File {
            name: *name,
            attributes: FatAttributes::ARCHIVE,
            data: data.to_vec(),
            size: Some(size),
            clusters: None,
        });
        self
    }

    pub fn directory(self, name: &[u8; 11]) -> Self {
        self.entry(name, FatAttributes::DIRECTORY, &[])
    }

    /// A slot copied verbatim into the root directory.
    pub fn raw_slot(mut self, slot: [u8; DIR_ENTRY_SIZE]) -> Self {
        self.slots.push(Slot::Raw(slot));
        self
    }

    /// Overwrite one FAT link after allocation, in both copies.
    pub fn fat_link(mut self, cluster: u16, value: u16) -> Self {
        self.fat_overrides.push((cluster, value));
        self
    }

    pub fn fat_bytes(&self) -> usize {
        self.sectors_per_fat as usize * self.bytes_per_sector as usize
    }

    pub fn first_fat_offset(&self) -> usize {
        self.reserved_sectors as usize * self.bytes_per_sector as usize
    }

    pub fn second_fat_offset(&self) -> usize {
        self.first_fat_offset() + self.fat_bytes()
    }

    pub fn root_dir_offset(&self) -> usize {
        self.second_fat_offset() + self.fat_bytes()
    }

    fn root_dir_bytes(&self) -> usize {
        let raw = self.root_entries as usize * DIR_ENTRY_SIZE;
        raw.div_ceil(self.bytes_per_sector as usize) * self.bytes_per_sector as usize
    }

    pub fn cluster_size(&self) -> usize {
        self.bytes_per_sector as usize * self.sectors_per_cluster as usize
    }

    /// Byte offset of `cluster` in the built image.
    pub fn cluster_offset(&self, cluster: u16) -> usize {
        self.root_dir_offset() + self.root_dir_bytes() + (cluster as usize - 2) * self.cluster_size()
    }

    pub fn build(&self) -> Vec<u8> {
        let fat_entries = self.fat_bytes() / 2;
        let mut fat = vec![0u16; fat_entries];
        fat[0] = 0xFF00 | MEDIA_FIXED as u16;
        fat[1] = 0xFFFF;

        // Explicit placements first so sequential allocation avoids them
        let mut used = vec![false; fat_entries];
        for slot in &self.slots {
            if let Slot::File { clusters: Some(clusters), .. } = slot {
                for &c in clusters {
                    used[c as usize] = true;
                }
            }
        }

        let mut next_free = FAT16_FIRST_DATA_CLUSTER as usize;
        let mut placements: Vec<Vec<u16>> = Vec::new();
        for slot in &self.slots {
            let chain = match slot {
                Slot::File { clusters: Some(clusters), .. } => clusters.clone(),
                Slot::File { data, attributes, .. } => {
                    let needed = if *attributes & FatAttributes::DIRECTORY != 0 {
                        1
                    } else {
                        data.len().div_ceil(self.cluster_size())
                    };
                    let mut chain = Vec::with_capacity(needed);
                    while chain.len() < needed {
                        while used[next_free] {
                            next_free += 1;
                        }
                        used[next_free] = true;
                        chain.push(next_free as u16);
                    }
                    chain
                }
                Slot::Raw(_) => Vec::new(),
            };
            for pair in chain.windows(2) {
                fat[pair[0] as usize] = pair[1];
            }
            if let Some(&last) = chain.last() {
                fat[last as usize] = 0xFFFF;
            }
            placements.push(chain);
        }

        for &(cluster, value) in &self.fat_overrides {
            fat[cluster as usize] = value;
        }

        let highest = placements
            .iter()
            .flatten()
            .copied()
            .max()
            .unwrap_or(FAT16_FIRST_DATA_CLUSTER);
        let total_len = self.cluster_offset(highest) + self.cluster_size();
        let mut image = vec![0u8; total_len];

        self.write_boot_sector(&mut image, total_len);

        let mut fat_raw = Vec::with_capacity(self.fat_bytes());
        for value in &fat {
            fat_raw.extend_from_slice(&value.to_le_bytes());
        }
        let first = self.first_fat_offset();
        let second = self.second_fat_offset();
        image[first..first + fat_raw.len()].copy_from_slice(&fat_raw);
        image[second..second + fat_raw.len()].copy_from_slice(&fat_raw);

        let root = self.root_dir_offset();
        for (i, (slot, chain)) in self.slots.iter().zip(&placements).enumerate() {
            let at = root + i * DIR_ENTRY_SIZE;
            match slot {
                Slot::Raw(raw) => image[at..at + DIR_ENTRY_SIZE].copy_from_slice(raw),
                Slot::File { name, attributes, data, size, .. } => {
                    let first_cluster = chain.first().copied().unwrap_or(0);
                    let size = if *attributes & FatAttributes::DIRECTORY != 0 {
                        0
                    } else {
                        size.unwrap_or(data.len() as u32)
                    };
                    image[at..at + 11].copy_from_slice(name);
                    image[at + 11] = *attributes;
                    // 2024-02-29 12:30:10
                    let date: u16 = ((2024 - 1980) << 9) | (2 << 5) | 29;
                    let time: u16 = (12 << 11) | (30 << 5) | 5;
                    image[at + 14..at + 16].copy_from_slice(&time.to_le_bytes());
                    image[at + 16..at + 18].copy_from_slice(&date.to_le_bytes());
                    image[at + 22..at + 24].copy_from_slice(&time.to_le_bytes());
                    image[at + 24..at + 26].copy_from_slice(&date.to_le_bytes());
                    image[at + 26..at + 28].copy_from_slice(&first_cluster.to_le_bytes());
                    image[at + 28..at + 32].copy_from_slice(&size.to_le_bytes());

                    for (chunk, &cluster) in data.chunks(self.cluster_size()).zip(chain) {
                        let off = self.cluster_offset(cluster);
                        image[off..off + chunk.len()].copy_from_slice(chunk);
                    }
                }
            }
        }

        image
    }

    fn write_boot_sector(&self, image: &mut [u8], total_len: usize) {
        let total_sectors = (total_len / self.bytes_per_sector as usize) as u32;

        image[BS_JMP_BOOT..BS_JMP_BOOT + 3].copy_from_slice(&[0xEB, 0x3C, 0x90]);
        image[BS_OEM_NAME..BS_OEM_NAME + 8].copy_from_slice(b"FATVIEW ");
        image[BPB_BYTES_PER_SEC..BPB_BYTES_PER_SEC + 2].copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        image[BPB_SEC_PER_CLUS] = self.sectors_per_cluster;
        image[BPB_RSVD_SEC_CNT..BPB_RSVD_SEC_CNT + 2].copy_from_slice(&self.reserved_sectors.to_le_bytes());
        image[BPB_NUM_FATS] = FAT_COPIES;
        image[BPB_ROOT_ENT_CNT..BPB_ROOT_ENT_CNT + 2].copy_from_slice(&self.root_entries.to_le_bytes());
        if total_sectors < 65536 {
            image[BPB_TOT_SEC16..BPB_TOT_SEC16 + 2].copy_from_slice(&(total_sectors as u16).to_le_bytes());
        } else {
            image[BPB_TOT_SEC32..BPB_TOT_SEC32 + 4].copy_from_slice(&total_sectors.to_le_bytes());
        }
        image[BPB_MEDIA] = MEDIA_FIXED;
        image[BPB_FAT_SZ16..BPB_FAT_SZ16 + 2].copy_from_slice(&self.sectors_per_fat.to_le_bytes());
        image[BPB_SEC_PER_TRK..BPB_SEC_PER_TRK + 2].copy_from_slice(&63u16.to_le_bytes());
        image[BPB_NUM_HEADS..BPB_NUM_HEADS + 2].copy_from_slice(&255u16.to_le_bytes());
        image[BS16_DRV_NUM] = 0x80;
        image[BS16_BOOT_SIG] = 0x29;
        image[BS16_VOL_ID..BS16_VOL_ID + 4].copy_from_slice(&0x1234_5678u32.to_le_bytes());
        image[BS16_VOL_LAB..BS16_VOL_LAB + 11].copy_from_slice(&self.label);
        image[BS16_FIL_SYS_TYPE..BS16_FIL_SYS_TYPE + 8].copy_from_slice(b"FAT16   ");
        image[BOOT_SIGNATURE_OFFSET..BOOT_SIGNATURE_OFFSET + 2].copy_from_slice(&BOOT_SIGNATURE.to_le_bytes());
    }
}

/// A raw 32-byte slot carrying only a name.
pub fn named_slot(name: &[u8; 11]) -> [u8; DIR_ENTRY_SIZE] {
    let mut slot = [0u8; DIR_ENTRY_SIZE];
    slot[..11].copy_from_slice(name);
    slot
}

/// Deterministic, non-repeating-per-cluster test content.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7 + i / 251) % 256) as u8).collect()
}
