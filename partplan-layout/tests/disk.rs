#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use partplan_layout::{
    DiskState, Filesystem, Partition, PartitionFlag, PartitionTableKind, PlanStep,
};
use serde as _;
use thiserror as _;

#[test]
fn test_disk_empty() {
    let json = r#"
        {
            "table": "gpt",
            "free_bytes": 10000000000
        }
        "#;

    let disk: DiskState = serde_json::from_str(&json).unwrap();
    assert_eq!(disk.table, PartitionTableKind::Gpt);
    assert_eq!(disk.partitions.len(), 0);
    assert_eq!(disk.free_bytes, 10_000_000_000);
    assert_eq!(disk.next_partition_number(), Some(1));
    assert!(disk.mounts().is_empty());
}

#[test]
fn test_disk_full() {
    let json = r#"
        {
            "table": "gpt",
            "free_bytes": 4096,
            "partitions": [
                {
                    "number": 1,
                    "size_bytes": 2097152,
                    "flag": "bios_grub"
                },
                {
                    "number": 3,
                    "size_bytes": 1073741824,
                    "fs": "swap"
                },
                {
                    "number": 2,
                    "size_bytes": 8589934592,
                    "fs": "ext4",
                    "mnt": "/"
                }
            ]
        }
        "#;

    let disk: DiskState = serde_json::from_str(&json).unwrap();
    assert_eq!(disk.table, PartitionTableKind::Gpt);
    assert_eq!(disk.partitions.len(), 3);
    assert_eq!(disk.next_partition_number(), Some(4));

    let part = disk.partition(1).unwrap();
    assert_eq!(part.size_bytes, 2_097_152);
    assert_eq!(part.flag, Some(PartitionFlag::BiosGrub));
    assert_eq!(part.fs, None);
    assert_eq!(part.mnt, None);

    let part = disk.partition(3).unwrap();
    assert_eq!(part.fs, Some(Filesystem::Swap));
    assert_eq!(part.mnt, None);

    let mounts = disk.mounts();
    assert_eq!(mounts.len(), 1);
    assert_eq!(mounts[0].mnt, Path::new("/"));
    assert_eq!(mounts[0].number, 2);
    assert_eq!(mounts[0].fs, Some(Filesystem::Ext4));
}

#[test]
fn test_disk_unknown_field() {
    let json = r#"
        {
            "table": "mbr",
            "free_bytes": 0,
            "label": "foo"
        }
        "#;

    serde_json::from_str::<DiskState>(&json).unwrap_err();
}

#[test]
fn test_disk_unknown_table() {
    let json = r#"
        {
            "table": "apm",
            "free_bytes": 0
        }
        "#;

    serde_json::from_str::<DiskState>(&json).unwrap_err();
}

#[test]
fn test_disk_partition_number_zero() {
    let json = r#"
        {
            "table": "gpt",
            "free_bytes": 0,
            "partitions": [
                {
                    "number": 0,
                    "size_bytes": 2097152
                }
            ]
        }
        "#;

    let err = serde_json::from_str::<DiskState>(&json).unwrap_err();
    assert!(err.to_string().contains("Partition numbers start at 1"));
}

#[test]
fn test_disk_partition_number_duplicate() {
    let json = r#"
        {
            "table": "mbr",
            "free_bytes": 0,
            "partitions": [
                {
                    "number": 2,
                    "size_bytes": 2097152
                },
                {
                    "number": 2,
                    "size_bytes": 4096,
                    "fs": "swap"
                }
            ]
        }
        "#;

    let err = serde_json::from_str::<DiskState>(&json).unwrap_err();
    assert!(err.to_string().contains("Duplicate Partition Number 2"));
}

#[test]
fn test_disk_mounts_ordered_by_number() {
    let mut disk = DiskState::empty(PartitionTableKind::Mbr, 0);
    disk.partitions.push(Partition {
        number: 2,
        size_bytes: 10,
        flag: None,
        fs: Some(Filesystem::Xfs),
        mnt: Some(PathBuf::from("/home")),
    });
    disk.partitions.push(Partition {
        number: 1,
        size_bytes: 10,
        flag: None,
        fs: Some(Filesystem::Ext4),
        mnt: Some(PathBuf::from("/")),
    });

    let mounts: Vec<_> = disk.mounts().iter().map(|m| m.number).collect();
    assert_eq!(mounts, vec![1, 2]);
}

#[test]
fn test_disk_record() {
    let mut disk = DiskState::empty(PartitionTableKind::Gpt, 10_000);

    disk.record(&PlanStep {
        number: 1,
        size_bytes: 4_000,
        flag: None,
        fs: Some(Filesystem::Ext4),
        mnt: Some(PathBuf::from("/")),
    });

    assert_eq!(disk.free_bytes, 6_000);
    assert_eq!(disk.next_partition_number(), Some(2));

    let part = disk.partition(1).unwrap();
    assert_eq!(part.size_bytes, 4_000);
    assert_eq!(part.mnt, Some(PathBuf::from("/")));

    disk.record(&PlanStep {
        number: 2,
        size_bytes: 8_000,
        flag: None,
        fs: None,
        mnt: None,
    });

    assert_eq!(disk.free_bytes, 0);
}

#[test]
fn test_table_max_partitions() {
    assert_eq!(PartitionTableKind::Gpt.max_partitions(), Some(128));
    assert_eq!(PartitionTableKind::Mbr.max_partitions(), Some(4));
    assert_eq!(PartitionTableKind::None.max_partitions(), None);
}
