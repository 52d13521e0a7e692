use clap::{Parser, Subcommand};
use rawdisk_core::{DecodeError, DecodeOptions, PartitionTypeRegistry, RawDiskError};
use rawdisk_partitions::{read_raw_gpt_disk_with, LegacyLayout, RawGptDisk};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "rawdisk")]
#[command(about = "Read GPT/MBR partition tables straight from disk", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and print the partition table of one disk or image
    Inspect {
        /// Device node or image file
        path: PathBuf,
        /// Override the sector size reported by the device
        #[arg(short, long)]
        sector_size: Option<usize>,
        /// JSON file with decode options
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check several disks at once and print one line per disk
    Scan {
        /// Device nodes or image files
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Override the sector size reported by the devices
        #[arg(short, long)]
        sector_size: Option<usize>,
    },
    /// List known GPT partition types
    Types,
}

fn load_options(
    config: Option<&Path>,
    sector_size: Option<usize>,
) -> Result<DecodeOptions, RawDiskError> {
    let mut options = match config {
        Some(path) => DecodeOptions::from_json_file(path)?,
        None => DecodeOptions::default(),
    };
    if sector_size.is_some() {
        options.sector_size = sector_size;
    }
    options.validate()?;
    Ok(options)
}

fn print_disk(path: &Path, disk: &RawGptDisk) {
    let header = &disk.header;
    let registry = PartitionTypeRegistry::global();

    println!("Disk: {}", path.display());
    println!("  GUID: {}", header.disk_guid);
    println!("  Revision: {}", header.revision_string());
    println!("  Sector size: {} bytes", disk.sector_size);
    println!("  Header LBA: {} (backup at {})", header.my_lba, header.alternate_lba);
    println!("  Usable LBAs: {} - {}", header.first_usable_lba, header.max_usable_lba);
    println!(
        "  Partition array: LBA {}, {} x {} bytes",
        header.partition_entry_lba, header.number_of_partitions, header.partition_entry_length
    );

    match &disk.legacy {
        Some(LegacyLayout::Protective(_)) => println!("  Legacy MBR: protective"),
        Some(LegacyLayout::Mbr(_)) => {
            println!("  Legacy MBR: not protective (hybrid or stale MBR)");
            for entry in disk.legacy.iter().flat_map(|l| l.entries()) {
                println!(
                    "    type 0x{:02X} ({}) start {} size {}",
                    entry.partition_type,
                    registry.mbr_name(entry.partition_type).unwrap_or("unknown"),
                    entry.starting_lba,
                    entry.size_in_lba
                );
            }
        }
        None => println!("  Legacy MBR: unreadable"),
    }
    if let Some(signature) = disk.mbr_boot_signature {
        println!("  Boot signature: {}", if signature { "present" } else { "missing" });
    }

    println!();
    if disk.partitions.is_empty() {
        println!("No partitions in use.");
        return;
    }

    println!(
        "Partitions ({} of {} slots in use):\n",
        disk.partitions.len(),
        header.number_of_partitions
    );
    for (i, partition) in disk.partitions.iter().enumerate() {
        let bytes = partition.size_bytes(disk.sector_size);
        println!("#{}: {}", i + 1, partition);
        println!(
            "  Type: {} ({})",
            partition.partition_type_guid,
            partition.type_name().unwrap_or("unknown")
        );
        println!("  Unique GUID: {}", partition.unique_partition_guid);
        println!("  LBA: {} - {}", partition.starting_lba, partition.ending_lba);
        println!("  Size: {:.2} GB", bytes as f64 / 1_073_741_824.0);
        if partition.attributes.bits() != 0 {
            println!("  Attributes: 0x{:016X}", partition.attributes.bits());
        }
        println!();
    }
}

fn verdict(result: &Result<RawGptDisk, RawDiskError>) -> String {
    match result {
        Ok(disk) => format!(
            "GPT, {} partition(s), disk {}",
            disk.partitions.len(),
            disk.header.disk_guid
        ),
        Err(RawDiskError::Decode(e)) if e.is_not_gpt() => "not GPT".to_string(),
        Err(RawDiskError::Decode(e)) if e.is_corruption() => format!("corrupt GPT ({})", e),
        Err(RawDiskError::Decode(DecodeError::Truncated { .. })) => "truncated".to_string(),
        Err(e) => format!("error: {}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Inspect { path, sector_size, config, json } => {
            let options = load_options(config.as_deref(), sector_size)?;

            log::info!("Inspecting {}", path.display());

            let decode_path = path.clone();
            let disk = tokio::task::spawn_blocking(move || {
                read_raw_gpt_disk_with(&decode_path, &options)
            })
            .await?
            .map_err(|e| anyhow::anyhow!("Failed to read GPT from {}: {}", path.display(), e))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&disk)?);
            } else {
                print_disk(&path, &disk);
            }
        }
        Commands::Scan { paths, sector_size } => {
            let options = Arc::new(load_options(None, sector_size)?);

            let mut tasks = Vec::new();
            for path in paths {
                let options = Arc::clone(&options);
                tasks.push(tokio::task::spawn_blocking(move || {
                    let result = read_raw_gpt_disk_with(&path, &options);
                    (path, result)
                }));
            }

            for task in tasks {
                let (path, result) = task.await?;
                println!("{}: {}", path.display(), verdict(&result));
            }
        }
        Commands::Types => {
            println!("Known GPT partition types:\n");
            for (guid, name) in PartitionTypeRegistry::global().list_gpt() {
                println!("  {}  {}", guid.to_string().to_uppercase(), name);
            }
        }
    }

    Ok(())
}
