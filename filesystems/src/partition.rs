// MBR partition table reader, used to find where a FAT16 volume starts

use crate::fat16::constants::*;
use byteorder::{ByteOrder, LittleEndian};
use fatview_core::{BlockStore, FatError};
use log::{debug, info};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionEntry {
    /// 1-based slot number in the MBR
    pub number: u8,
    pub bootable: bool,
    pub partition_type: u8,
    pub start_lba: u32,
    pub sector_count: u32,
}

impl PartitionEntry {
    pub fn is_fat16(&self) -> bool {
        matches!(
            self.partition_type,
            PARTITION_TYPE_FAT16_SMALL | PARTITION_TYPE_FAT16 | PARTITION_TYPE_FAT16_LBA
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self.partition_type {
            0x01 => "FAT12",
            PARTITION_TYPE_FAT16_SMALL => "FAT16 (<32MB)",
            0x05 | 0x0F => "Extended",
            PARTITION_TYPE_FAT16 => "FAT16",
            0x07 => "NTFS/exFAT",
            0x0B | 0x0C => "FAT32",
            PARTITION_TYPE_FAT16_LBA => "FAT16 (LBA)",
            0x83 => "Linux",
            0xEE => "GPT protective",
            _ => "Unknown",
        }
    }
}

/// Parse the four primary entries of an MBR sector. Empty slots are left out.
pub fn parse_partition_table(mbr: &[u8]) -> Result<Vec<PartitionEntry>, FatError> {
    if mbr.len() < BOOT_SECTOR_SIZE {
        return Err(FatError::short_read(BOOT_SECTOR_SIZE, mbr.len()));
    }

    let signature = LittleEndian::read_u16(&mbr[BOOT_SIGNATURE_OFFSET..]);
    if signature != BOOT_SIGNATURE {
        return Err(FatError::InvalidFormat(format!(
            "Invalid MBR signature: 0x{:04X}",
            signature
        )));
    }

    let mut partitions = Vec::new();
    for i in 0..MBR_PARTITION_COUNT {
        let offset = MBR_PARTITION_TABLE_OFFSET + i * MBR_PARTITION_ENTRY_SIZE;
        let entry = &mbr[offset..offset + MBR_PARTITION_ENTRY_SIZE];

        if entry[4] == 0 {
            continue;
        }

        let partition = PartitionEntry {
            number: i as u8 + 1,
            bootable: entry[0] == 0x80,
            partition_type: entry[4],
            start_lba: LittleEndian::read_u32(&entry[8..12]),
            sector_count: LittleEndian::read_u32(&entry[12..16]),
        };
        debug!(
            "Partition {}: type 0x{:02X} ({}), start {}, {} sectors",
            partition.number,
            partition.partition_type,
            partition.type_name(),
            partition.start_lba,
            partition.sector_count
        );
        partitions.push(partition);
    }

    Ok(partitions)
}

/// Read and parse the MBR in sector 0 of `store`.
pub fn read_partition_table<S: BlockStore + ?Sized>(store: &S) -> Result<Vec<PartitionEntry>, FatError> {
    let mbr = store.read_sectors(0, 1)?;
    parse_partition_table(&mbr)
}

/// First FAT16-typed primary partition, if any.
pub fn find_fat16_partition<S: BlockStore + ?Sized>(store: &S) -> Result<Option<PartitionEntry>, FatError> {
    let found = read_partition_table(store)?.into_iter().find(|p| p.is_fat16());
    if let Some(p) = &found {
        info!("Found FAT16 partition {} at sector {}", p.number, p.start_lba);
    }
    Ok(found)
}

/// Whether sector 0 already looks like a FAT16 boot sector rather than an MBR.
pub fn is_unpartitioned<S: BlockStore + ?Sized>(store: &S) -> Result<bool, FatError> {
    let sector = store.read_sectors(0, 1)?;
    Ok(&sector[BS16_FIL_SYS_TYPE..BS16_FIL_SYS_TYPE + 5] == b"FAT16"
        && matches!(sector[BS_JMP_BOOT], 0xEB | 0xE9))
}
