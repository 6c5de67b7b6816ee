// FAT16 on-disk structures: boot sector and 32-byte directory entries

use super::constants::*;
use super::timestamps::FatTimestamp;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use fatview_core::{FatError, SECTOR_SIZE};
use static_assertions::assert_eq_size;
use std::fmt;
use std::io::{Cursor, Read};

/// FAT16 boot sector, field-for-field as it sits in sector 0 of the volume
#[repr(C, packed(1))]
#[derive(Clone, Copy)]
pub struct BootSector {
    pub jump_boot: [u8; 3],        // 0x00: Jump instruction
    pub oem_name: [u8; 8],         // 0x03: OEM name
    pub bytes_per_sector: u16,     // 0x0B: Bytes per sector
    pub sectors_per_cluster: u8,   // 0x0D: Sectors per cluster
    pub reserved_sectors: u16,     // 0x0E: Reserved area size, in sectors
    pub num_fats: u8,              // 0x10: Number of FATs
    pub root_entries: u16,         // 0x11: Maximum root directory entries
    pub total_sectors_16: u16,     // 0x13: Total sectors if < 65536
    pub media_descriptor: u8,      // 0x15: Media descriptor
    pub sectors_per_fat: u16,      // 0x16: Sectors per FAT
    pub sectors_per_track: u16,    // 0x18: Sectors per track
    pub num_heads: u16,            // 0x1A: Number of heads
    pub hidden_sectors: u32,       // 0x1C: Sectors before the partition
    pub total_sectors_32: u32,     // 0x20: Total sectors if >= 65536
    pub drive_number: u8,          // 0x24: BIOS drive number
    pub reserved: u8,              // 0x25: Reserved
    pub ext_boot_signature: u8,    // 0x26: Extended boot signature (0x29)
    pub volume_id: u32,            // 0x27: Volume serial number
    pub volume_label: [u8; 11],    // 0x2B: Volume label
    pub fs_type: [u8; 8],          // 0x36: File system type "FAT16   "
    pub boot_code: [u8; 448],      // 0x3E: Boot code
    pub signature: u16,            // 0x1FE: 0xAA55
}

assert_eq_size!(BootSector, [u8; BOOT_SECTOR_SIZE]);

impl BootSector {
    /// Decode a boot sector from the first 512 bytes of `data`.
    ///
    /// Only the length is checked here; see [`BootSector::validate`].
    pub fn parse(data: &[u8]) -> Result<Self, FatError> {
        if data.len() < BOOT_SECTOR_SIZE {
            return Err(FatError::short_read(BOOT_SECTOR_SIZE, data.len()));
        }

        let mut jump_boot = [0u8; 3];
        jump_boot.copy_from_slice(&data[BS_JMP_BOOT..BS_JMP_BOOT + 3]);
        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&data[BS_OEM_NAME..BS_OEM_NAME + 8]);
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&data[BS16_VOL_LAB..BS16_VOL_LAB + 11]);
        let mut fs_type = [0u8; 8];
        fs_type.copy_from_slice(&data[BS16_FIL_SYS_TYPE..BS16_FIL_SYS_TYPE + 8]);
        let mut boot_code = [0u8; 448];
        boot_code.copy_from_slice(&data[BS16_FIL_SYS_TYPE + 8..BOOT_SIGNATURE_OFFSET]);

        Ok(Self {
            jump_boot,
            oem_name,
            bytes_per_sector: LittleEndian::read_u16(&data[BPB_BYTES_PER_SEC..]),
            sectors_per_cluster: data[BPB_SEC_PER_CLUS],
            reserved_sectors: LittleEndian::read_u16(&data[BPB_RSVD_SEC_CNT..]),
            num_fats: data[BPB_NUM_FATS],
            root_entries: LittleEndian::read_u16(&data[BPB_ROOT_ENT_CNT..]),
            total_sectors_16: LittleEndian::read_u16(&data[BPB_TOT_SEC16..]),
            media_descriptor: data[BPB_MEDIA],
            sectors_per_fat: LittleEndian::read_u16(&data[BPB_FAT_SZ16..]),
            sectors_per_track: LittleEndian::read_u16(&data[BPB_SEC_PER_TRK..]),
            num_heads: LittleEndian::read_u16(&data[BPB_NUM_HEADS..]),
            hidden_sectors: LittleEndian::read_u32(&data[BPB_HIDD_SEC..]),
            total_sectors_32: LittleEndian::read_u32(&data[BPB_TOT_SEC32..]),
            drive_number: data[BS16_DRV_NUM],
            reserved: data[BS16_DRV_NUM + 1],
            ext_boot_signature: data[BS16_BOOT_SIG],
            volume_id: LittleEndian::read_u32(&data[BS16_VOL_ID..]),
            volume_label,
            fs_type,
            boot_code,
            signature: LittleEndian::read_u16(&data[BOOT_SIGNATURE_OFFSET..]),
        })
    }

    /// Check the trailing signature and the geometry the reader depends on.
    pub fn validate(&self) -> Result<(), FatError> {
        // Copy values to avoid packed struct alignment issues
        let signature = self.signature;
        let bytes_per_sector = self.bytes_per_sector;
        let sectors_per_cluster = self.sectors_per_cluster;
        let sectors_per_fat = self.sectors_per_fat;
        let num_fats = self.num_fats;

        if signature != BOOT_SIGNATURE {
            return Err(FatError::InvalidFormat(format!(
                "Invalid boot sector signature: 0x{:04X} (expected 0x{:04X})",
                signature, BOOT_SIGNATURE
            )));
        }

        if bytes_per_sector == 0 || bytes_per_sector as usize % SECTOR_SIZE != 0 {
            return Err(FatError::InvalidFormat(format!(
                "Unsupported bytes per sector: {}",
                bytes_per_sector
            )));
        }

        if sectors_per_cluster == 0 {
            return Err(FatError::InvalidFormat("Sectors per cluster cannot be 0".to_string()));
        }

        if sectors_per_fat == 0 {
            return Err(FatError::InvalidFormat("FAT size cannot be 0".to_string()));
        }

        if num_fats != FAT_COPIES {
            return Err(FatError::InvalidFormat(format!(
                "Unsupported number of FATs: {} (expected {})",
                num_fats, FAT_COPIES
            )));
        }

        Ok(())
    }

    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }

    /// Size of one FAT copy in bytes.
    pub fn fat_bytes(&self) -> usize {
        self.bytes_per_sector as usize * self.sectors_per_fat as usize
    }

    /// Size of the root directory region in bytes.
    pub fn root_dir_bytes(&self) -> usize {
        self.root_entries as usize * DIR_ENTRY_SIZE
    }

    pub fn oem_name(&self) -> String {
        trim_padded(&self.oem_name)
    }

    pub fn volume_label(&self) -> String {
        trim_padded(&self.volume_label)
    }

    pub fn fs_type(&self) -> String {
        trim_padded(&self.fs_type)
    }
}

// Implement Debug manually to keep the boot code out of the output
impl fmt::Debug for BootSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes_per_sector = self.bytes_per_sector;
        let reserved_sectors = self.reserved_sectors;
        let root_entries = self.root_entries;
        let sectors_per_fat = self.sectors_per_fat;
        let signature = self.signature;

        f.debug_struct("BootSector")
            .field("oem_name", &self.oem_name())
            .field("bytes_per_sector", &bytes_per_sector)
            .field("sectors_per_cluster", &self.sectors_per_cluster)
            .field("reserved_sectors", &reserved_sectors)
            .field("num_fats", &self.num_fats)
            .field("root_entries", &root_entries)
            .field("sectors_per_fat", &sectors_per_fat)
            .field("total_sectors", &self.total_sectors())
            .field("volume_label", &self.volume_label())
            .field("signature", &format_args!("0x{:04X}", signature))
            .finish()
    }
}

fn trim_padded(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(|c: char| c == ' ' || c == '\0')
        .to_string()
}

/// FAT directory entry attribute byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatAttributes(pub u8);

impl FatAttributes {
    pub const READ_ONLY: u8 = 0x01;
    pub const HIDDEN: u8 = 0x02;
    pub const SYSTEM: u8 = 0x04;
    pub const VOLUME_ID: u8 = 0x08;
    pub const DIRECTORY: u8 = 0x10;
    pub const ARCHIVE: u8 = 0x20;
    pub const LFN: u8 = 0x0F; // Long filename slot

    pub fn is_read_only(&self) -> bool { self.0 & Self::READ_ONLY != 0 }
    pub fn is_hidden(&self) -> bool { self.0 & Self::HIDDEN != 0 }
    pub fn is_system(&self) -> bool { self.0 & Self::SYSTEM != 0 }
    pub fn is_volume_id(&self) -> bool { self.0 & Self::VOLUME_ID != 0 }
    pub fn is_directory(&self) -> bool { self.0 & Self::DIRECTORY != 0 }
    pub fn is_archive(&self) -> bool { self.0 & Self::ARCHIVE != 0 }
    pub fn is_lfn(&self) -> bool { self.0 == Self::LFN }
}

/// FAT directory entry (32 bytes)
#[repr(C, packed(1))]
#[derive(Debug, Clone, Copy)]
pub struct RawDirEntry {
    pub name: [u8; 11],            // 8.3 name, space padded
    pub attributes: FatAttributes, // Attribute bits
    pub nt_reserved: u8,           // Reserved for Windows NT
    pub creation_time_tenth: u8,   // Creation time, tenths of a second
    pub creation_time: u16,        // Creation time (packed)
    pub creation_date: u16,        // Creation date (packed)
    pub last_access_date: u16,     // Last access date (packed)
    pub first_cluster_high: u16,   // High half of first cluster
    pub write_time: u16,           // Last modification time (packed)
    pub write_date: u16,           // Last modification date (packed)
    pub first_cluster_low: u16,    // Low half of first cluster
    pub file_size: u32,            // Size in bytes
}

assert_eq_size!(RawDirEntry, [u8; DIR_ENTRY_SIZE]);

impl RawDirEntry {
    /// Decode one entry from a 32-byte slot.
    pub fn parse(data: &[u8]) -> Result<Self, FatError> {
        if data.len() < DIR_ENTRY_SIZE {
            return Err(FatError::short_read(DIR_ENTRY_SIZE, data.len()));
        }

        let mut rdr = Cursor::new(&data[..DIR_ENTRY_SIZE]);
        let mut name = [0u8; DIR_NAME_LEN];
        rdr.read_exact(&mut name)?;

        Ok(Self {
            name,
            attributes: FatAttributes(rdr.read_u8()?),
            nt_reserved: rdr.read_u8()?,
            creation_time_tenth: rdr.read_u8()?,
            creation_time: rdr.read_u16::<LittleEndian>()?,
            creation_date: rdr.read_u16::<LittleEndian>()?,
            last_access_date: rdr.read_u16::<LittleEndian>()?,
            first_cluster_high: rdr.read_u16::<LittleEndian>()?,
            write_time: rdr.read_u16::<LittleEndian>()?,
            write_date: rdr.read_u16::<LittleEndian>()?,
            first_cluster_low: rdr.read_u16::<LittleEndian>()?,
            file_size: rdr.read_u32::<LittleEndian>()?,
        })
    }

    /// Decode a whole directory region, one entry per 32-byte slot.
    pub fn parse_all(data: &[u8]) -> Result<Vec<Self>, FatError> {
        data.chunks_exact(DIR_ENTRY_SIZE).map(Self::parse).collect()
    }

    /// First cluster of the entry's data. FAT16 only uses the low half;
    /// the high word is a FAT32 field and is ignored here.
    pub fn first_cluster(&self) -> u16 {
        self.first_cluster_low
    }

    pub fn size(&self) -> u32 {
        self.file_size
    }

    pub fn is_end(&self) -> bool {
        self.name[0] == DIR_ENTRY_END
    }

    pub fn is_deleted(&self) -> bool {
        self.name[0] == DIR_ENTRY_DELETED
    }

    /// A slot with a blank name carries nothing to show.
    pub fn is_blank(&self) -> bool {
        self.name.iter().all(|&b| b == b' ' || b == 0)
    }

    pub fn is_directory(&self) -> bool {
        self.attributes.is_directory()
    }

    pub fn created(&self) -> FatTimestamp {
        FatTimestamp::new(self.creation_date, self.creation_time)
    }

    pub fn modified(&self) -> FatTimestamp {
        FatTimestamp::new(self.write_date, self.write_time)
    }

    /// Rebuild the display name from the fixed 11-byte field.
    ///
    /// The base stops at the first space within 8 bytes. A space in the
    /// first extension byte means no extension and no dot.
    pub fn display_name(&self) -> String {
        let name = self.name;
        let mut result = String::with_capacity(12);

        for (i, &b) in name[..DIR_BASE_LEN].iter().enumerate() {
            if b == b' ' {
                break;
            }
            if i == 0 && b == DIR_ENTRY_E5_ESCAPE {
                result.push(char::from(DIR_ENTRY_DELETED));
            } else {
                result.push(char::from(b));
            }
        }

        if name[DIR_BASE_LEN] == b' ' {
            return result;
        }

        result.push('.');
        for &b in &name[DIR_BASE_LEN..] {
            if b == b' ' {
                break;
            }
            result.push(char::from(b));
        }

        result
    }
}
