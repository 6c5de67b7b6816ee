use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use fatview_core::ImageFile;
use fatview_filesystems::partition::{is_unpartitioned, read_partition_table};
use fatview_filesystems::{find_fat16_partition, Volume, VolumeOptions};
use log::{debug, LevelFilter};
use std::io::{self, SeekFrom, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fatview")]
#[command(about = "Read-only inspector for FAT16 disk images", long_about = None)]
struct Cli {
    /// Verbose logging (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct VolumeArgs {
    /// Path to the disk image
    image: PathBuf,
    /// Physical sector where the FAT16 volume starts
    #[arg(long, conflicts_with = "partition")]
    start_sector: Option<u64>,
    /// MBR partition number (1-4) holding the volume
    #[arg(short, long)]
    partition: Option<u8>,
    /// Re-walk the FAT on every read instead of caching chains
    #[arg(long)]
    no_chain_cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show boot sector and FAT summary
    Info {
        #[command(flatten)]
        volume: VolumeArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the root directory
    Ls {
        #[command(flatten)]
        volume: VolumeArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a file's contents to stdout
    Cat {
        #[command(flatten)]
        volume: VolumeArgs,
        /// File name in the root directory
        name: String,
        /// Byte offset to start at
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Maximum number of bytes to print
        #[arg(long)]
        length: Option<u64>,
    },
    /// List MBR partitions
    Partitions {
        /// Path to the disk image
        image: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Info { volume, json } => {
            let image = open_image(&volume)?;
            let options = volume_options(&volume, &image)?;
            let vol = Volume::open_with(&image, &options).context("Failed to open FAT16 volume")?;
            let info = vol.info();

            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Filesystem: {}", info.fs_type);
                println!("  OEM name: {}", info.oem_name);
                println!("  Label: {}", info.label);
                println!("  Serial: {:08X}", info.serial);
                println!("  Bytes per sector: {}", info.bytes_per_sector);
                println!("  Sectors per cluster: {}", info.sectors_per_cluster);
                println!("  Cluster size: {} bytes", info.cluster_size);
                println!("  Reserved sectors: {}", info.reserved_sectors);
                println!("  Sectors per FAT: {}", info.sectors_per_fat);
                println!("  Root entries: {}", info.root_entries);
                println!("  Total sectors: {}", info.total_sectors);
                println!("  Clusters: {} ({} free)", info.total_clusters, info.free_clusters);
                println!("  Volume start sector: {}", info.partition_start_sector);
            }
            vol.close()?;
        }
        Commands::Ls { volume, json } => {
            let image = open_image(&volume)?;
            let options = volume_options(&volume, &image)?;
            let vol = Volume::open_with(&image, &options).context("Failed to open FAT16 volume")?;

            let entries: Vec<_> = vol.open_dir("\\")?.map(|e| e.info()).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for entry in &entries {
                    let flags: String = [
                        (entry.is_readonly, 'R'),
                        (entry.is_hidden, 'H'),
                        (entry.is_system, 'S'),
                        (entry.is_directory, 'D'),
                        (entry.is_archived, 'A'),
                    ]
                    .iter()
                    .map(|&(set, c)| if set { c } else { '-' })
                    .collect();
                    let modified = entry
                        .modified
                        .map(|m| m.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "-".to_string());
                    println!("{} {:>10} {:>19}  {}", flags, entry.size, modified, entry.name);
                }
            }
            vol.close()?;
        }
        Commands::Cat { volume, name, offset, length } => {
            let image = open_image(&volume)?;
            let options = volume_options(&volume, &image)?;
            let vol = Volume::open_with(&image, &options).context("Failed to open FAT16 volume")?;

            let mut file = vol
                .open_file(&name)
                .with_context(|| format!("Cannot open {}", name))?;
            file.seek(SeekFrom::Start(offset))?;

            let mut remaining = length.unwrap_or(u64::MAX);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let mut buf = vec![0u8; 64 * 1024];
            while remaining > 0 {
                let want = (buf.len() as u64).min(remaining) as usize;
                let n = file.read(&mut buf[..want])?;
                if n == 0 {
                    break;
                }
                out.write_all(&buf[..n])?;
                remaining -= n as u64;
            }
            out.flush()?;
            drop(file);
            vol.close()?;
        }
        Commands::Partitions { image } => {
            let image = ImageFile::open(&image)
                .with_context(|| format!("Cannot open image {}", image.display()))?;
            if is_unpartitioned(&image)? {
                println!("No partition table: sector 0 is a FAT16 boot sector.");
                return Ok(());
            }
            let partitions = read_partition_table(&image)?;
            if partitions.is_empty() {
                println!("No partitions found.");
            }
            for p in partitions {
                println!(
                    "{}: {:<16} type 0x{:02X} start {:>10} sectors {:>10}{}",
                    p.number,
                    p.type_name(),
                    p.partition_type,
                    p.start_lba,
                    p.sector_count,
                    if p.bootable { " (boot)" } else { "" }
                );
            }
        }
    }

    Ok(())
}

fn open_image(args: &VolumeArgs) -> anyhow::Result<ImageFile> {
    ImageFile::open(&args.image).with_context(|| format!("Cannot open image {}", args.image.display()))
}

/// Work out where the volume starts: explicit sector, explicit partition,
/// or auto-detect (bare volume first, then the first FAT16 partition).
fn volume_options(args: &VolumeArgs, image: &ImageFile) -> anyhow::Result<VolumeOptions> {
    let start = if let Some(sector) = args.start_sector {
        sector
    } else if let Some(number) = args.partition {
        let partitions = read_partition_table(image)?;
        match partitions.iter().find(|p| p.number == number) {
            Some(p) => p.start_lba as u64,
            None => bail!("Partition {} not found", number),
        }
    } else if is_unpartitioned(image)? {
        0
    } else {
        match find_fat16_partition(image) {
            Ok(Some(p)) => p.start_lba as u64,
            _ => 0,
        }
    };
    debug!("Using volume start sector {}", start);

    Ok(VolumeOptions {
        partition_start_sector: start,
        cache_chains: !args.no_chain_cache,
    })
}
