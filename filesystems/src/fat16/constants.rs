// FAT16 on-disk constants

// Boot sector offsets
pub const BS_JMP_BOOT: usize = 0x00;
pub const BS_OEM_NAME: usize = 0x03;
pub const BPB_BYTES_PER_SEC: usize = 0x0B;
pub const BPB_SEC_PER_CLUS: usize = 0x0D;
pub const BPB_RSVD_SEC_CNT: usize = 0x0E;
pub const BPB_NUM_FATS: usize = 0x10;
pub const BPB_ROOT_ENT_CNT: usize = 0x11;
pub const BPB_TOT_SEC16: usize = 0x13;
pub const BPB_MEDIA: usize = 0x15;
pub const BPB_FAT_SZ16: usize = 0x16;
pub const BPB_SEC_PER_TRK: usize = 0x18;
pub const BPB_NUM_HEADS: usize = 0x1A;
pub const BPB_HIDD_SEC: usize = 0x1C;
pub const BPB_TOT_SEC32: usize = 0x20;

// Extended BPB offsets
pub const BS16_DRV_NUM: usize = 0x24;
pub const BS16_BOOT_SIG: usize = 0x26;
pub const BS16_VOL_ID: usize = 0x27;
pub const BS16_VOL_LAB: usize = 0x2B;
pub const BS16_FIL_SYS_TYPE: usize = 0x36;

// Boot sector signature (0xAA55 read little-endian)
pub const BOOT_SIGNATURE: u16 = 0xAA55;
pub const BOOT_SIGNATURE_OFFSET: usize = 0x1FE;
pub const BOOT_SECTOR_SIZE: usize = 512;

// Directory entry layout
pub const DIR_ENTRY_SIZE: usize = 32;
pub const DIR_NAME_LEN: usize = 11;
pub const DIR_BASE_LEN: usize = 8;
pub const DIR_ENTRY_END: u8 = 0x00;
pub const DIR_ENTRY_DELETED: u8 = 0xE5;
pub const DIR_ENTRY_E5_ESCAPE: u8 = 0x05;

// FAT16 entry values
pub const FAT16_FREE: u16 = 0x0000;
pub const FAT16_FIRST_DATA_CLUSTER: u16 = 0x0002;
pub const FAT16_MAX_POINTER: u16 = 0xFFEF;
pub const FAT16_EOC: u16 = 0xFFF8; // anything at or above ends a chain

// The loader reads and compares exactly this many FAT copies
pub const FAT_COPIES: u8 = 2;

// MBR partition table
pub const MBR_PARTITION_TABLE_OFFSET: usize = 0x1BE;
pub const MBR_PARTITION_ENTRY_SIZE: usize = 16;
pub const MBR_PARTITION_COUNT: usize = 4;

// Partition type codes for FAT16
pub const PARTITION_TYPE_FAT16_SMALL: u8 = 0x04; // FAT16 < 32MB
pub const PARTITION_TYPE_FAT16: u8 = 0x06;
pub const PARTITION_TYPE_FAT16_LBA: u8 = 0x0E;

// Media descriptors
pub const MEDIA_FIXED: u8 = 0xF8; // Fixed disk
