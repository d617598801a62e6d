#![allow(clippy::multiple_crate_versions)]
#![doc = include_str!("../../README.md")]

use std::{
    fs::File,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context as _};
use clap::{Args, Parser, Subcommand};
use layout::{DiskState, PartitionRequest};
use log::{debug, info};
use part::MemoryBackend;
use serde::Serialize;
use types::{ByteSize, PartPlanError};

mod config;

use crate::config::Config;

#[derive(Debug, Args)]
struct RequestArgs {
    #[arg(help = "Disk Name")]
    disk: String,

    #[arg(
        short,
        long,
        help = "Partition Size, in bytes or with a K, M, G or T suffix"
    )]
    size: ByteSize,

    #[arg(short, long, default_value = part::NO_FILESYSTEM, help = "Partition Filesystem")]
    fs: String,

    #[arg(short, long, help = "Partition Mount Point")]
    mnt: Option<PathBuf>,
}

impl RequestArgs {
    fn request(&self) -> Result<PartitionRequest, part::PlanError> {
        part::request_from_input(self.size.bytes(), &self.fs, self.mnt.as_deref())
    }
}

#[derive(Debug, Subcommand)]
enum CliSubcommand {
    #[command(about = "List the disks and their partitions")]
    List,

    #[command(about = "Show the partitions needed to fulfill a request")]
    Plan(RequestArgs),

    #[command(about = "Simulate adding a partition and show the resulting disk")]
    Add(RequestArgs),
}

#[derive(Parser)]
#[command(version, about = "Disk Partition Planning Utility")]
struct Cli {
    #[arg(short, long, help = "Disks Description File")]
    disks: Option<PathBuf>,

    #[clap(subcommand)]
    command: CliSubcommand,
}

fn load_disks(path: &Path) -> Result<MemoryBackend, PartPlanError> {
    debug!("Loading disks from {}", path.display());

    let file = File::open(path)?;

    Ok(serde_json::from_reader(io::BufReader::new(file))?)
}

fn print_json<T>(value: &T) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut stdout = io::stdout().lock();

    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;

    Ok(())
}

fn print_disk(out: &mut impl io::Write, name: &str, disk: &DiskState) -> io::Result<()> {
    writeln!(
        out,
        "{name}: {} partition table, {} free",
        disk.table,
        ByteSize(disk.free_bytes)
    )?;

    let mut partitions: Vec<_> = disk.partitions.iter().collect();
    partitions.sort_by_key(|p| p.number);

    for part in partitions {
        write!(out, "  {}: {}", part.number, ByteSize(part.size_bytes))?;

        if let Some(flag) = part.flag {
            write!(out, ", {flag}")?;
        }

        if let Some(fs) = part.fs {
            write!(out, ", {fs}")?;
        }

        if let Some(mnt) = &part.mnt {
            write!(out, " on {}", mnt.display())?;
        }

        writeln!(out)?;
    }

    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::init();

    let cli = Cli::parse();

    info!(
        "Running {} {}",
        env!("CARGO_CRATE_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let disks_path = if let Some(path) = cli.disks {
        path
    } else {
        let config = Config::load().context("Couldn't load the configuration")?;
        match config.disks {
            Some(path) => path,
            None => bail!("No disks file given, and none set in the configuration."),
        }
    };

    let mut backend = load_disks(&disks_path)
        .with_context(|| format!("Couldn't load disks file {}", disks_path.display()))?;

    match cli.command {
        CliSubcommand::List => {
            let mut stdout = io::stdout().lock();
            for (name, disk) in backend.disks() {
                print_disk(&mut stdout, name, disk)?;
            }

            Ok(())
        }
        CliSubcommand::Plan(args) => {
            let request = args.request()?;
            let state = part::disk_state(&backend, &args.disk)?;

            let plan = part::plan(&state, &request)
                .with_context(|| format!("Couldn't plan the partition on {}", args.disk))?;

            print_json(&plan)
        }
        CliSubcommand::Add(args) => {
            let request = args.request()?;

            let plan = part::add_partition(&mut backend, &args.disk, &request)
                .with_context(|| format!("Couldn't add the partition to {}", args.disk))?;

            info!(
                "Created {} partition(s) on {}, {} bytes total",
                plan.len(),
                args.disk,
                plan.total_bytes()
            );

            let disk = backend
                .disk(&args.disk)
                .with_context(|| format!("Disk {} vanished", args.disk))?;

            print_json(disk)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use layout::{DiskState, Filesystem, PartitionFlag, PartitionTableKind, PlanStep};
    use tempfile::TempDir;
    use test_log::test;
    use types::PartPlanError;

    use super::{load_disks, print_disk};

    #[test]
    fn load_disks_file() {
        let dir = TempDir::new().unwrap();

        let path = dir.path().join("disks.json");
        fs::write(
            &path,
            r#"{ "sda": { "table": "gpt", "free_bytes": 20000000000 } }"#,
        )
        .unwrap();

        let backend = load_disks(&path).unwrap();
        let disk = backend.disk("sda").unwrap();
        assert_eq!(disk.table, PartitionTableKind::Gpt);
        assert_eq!(disk.free_bytes, 20_000_000_000);
    }

    #[test]
    fn load_disks_missing() {
        let dir = TempDir::new().unwrap();

        assert!(matches!(
            load_disks(&dir.path().join("disks.json")).unwrap_err(),
            PartPlanError::Io(_)
        ));
    }

    #[test]
    fn load_disks_invalid() {
        let dir = TempDir::new().unwrap();

        let path = dir.path().join("disks.json");
        fs::write(
            &path,
            r#"{
                "sda": {
                    "table": "gpt",
                    "free_bytes": 0,
                    "partitions": [
                        { "number": 1, "size_bytes": 4096 },
                        { "number": 1, "size_bytes": 4096 }
                    ]
                }
            }"#,
        )
        .unwrap();

        assert!(matches!(load_disks(&path).unwrap_err(), PartPlanError::Json(_)));
    }

    #[test]
    fn print_disk_partitions() {
        let mut disk = DiskState::empty(PartitionTableKind::Gpt, (20 << 30) + (2 << 20));
        disk.record(&PlanStep {
            number: 2,
            size_bytes: 10 << 30,
            flag: None,
            fs: Some(Filesystem::Ext4),
            mnt: Some("/".into()),
        });
        disk.record(&PlanStep {
            number: 1,
            size_bytes: 2 << 20,
            flag: Some(PartitionFlag::BiosGrub),
            fs: None,
            mnt: None,
        });

        let mut out = Vec::new();
        print_disk(&mut out, "sda", &disk).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "sda: gpt partition table, 10 GiB free\n\
             \x20 1: 2 MiB, bios_grub\n\
             \x20 2: 10 GiB, ext4 on /\n"
        );
    }
}
