#![doc = include_str!("../README.md")]
#![allow(missing_docs)]

use core::{fmt, str::FromStr};
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

#[cfg(feature = "schema")]
use schemars::JsonSchema;

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub enum PartitionTableKind {
    #[serde(rename = "gpt")]
    Gpt,

    #[serde(rename = "mbr")]
    Mbr,

    #[serde(rename = "none")]
    None,
}

impl PartitionTableKind {
    /// Highest partition number the table can hold, if it has a limit
    #[must_use]
    pub fn max_partitions(self) -> Option<u32> {
        match self {
            Self::Gpt => Some(128),
            Self::Mbr => Some(4),
            Self::None => None,
        }
    }
}

impl fmt::Display for PartitionTableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpt => f.write_str("gpt"),
            Self::Mbr => f.write_str("mbr"),
            Self::None => f.write_str("none"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub enum PartitionFlag {
    #[serde(rename = "bios_grub")]
    BiosGrub,
}

impl fmt::Display for PartitionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BiosGrub => f.write_str("bios_grub"),
        }
    }
}

/// A filesystem name that isn't part of [`Filesystem`]
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[error("Unknown Filesystem: {0}")]
pub struct UnknownFilesystem(pub String);

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub enum Filesystem {
    #[serde(rename = "btrfs")]
    Btrfs,

    #[serde(rename = "ext4")]
    Ext4,

    #[serde(rename = "fat")]
    Fat32,

    #[serde(rename = "swap")]
    Swap,

    #[serde(rename = "xfs")]
    Xfs,
}

impl Filesystem {
    /// Whether a partition formatted with this filesystem gets mounted, and
    /// thus needs a mount point.
    #[must_use]
    pub fn is_mountable(self) -> bool {
        !matches!(self, Self::Swap)
    }
}

impl FromStr for Filesystem {
    type Err = UnknownFilesystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "btrfs" => Self::Btrfs,
            "ext4" => Self::Ext4,
            "fat" | "fat32" | "vfat" => Self::Fat32,
            "swap" => Self::Swap,
            "xfs" => Self::Xfs,
            _ => return Err(UnknownFilesystem(s.to_owned())),
        })
    }
}

impl fmt::Display for Filesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Btrfs => f.write_str("btrfs"),
            Self::Ext4 => f.write_str("ext4"),
            Self::Fat32 => f.write_str("fat"),
            Self::Swap => f.write_str("swap"),
            Self::Xfs => f.write_str("xfs"),
        }
    }
}

/// A partition already present on a disk
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct Partition {
    pub number: u32,
    pub size_bytes: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<PartitionFlag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<Filesystem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnt: Option<PathBuf>,
}

impl From<&PlanStep> for Partition {
    fn from(step: &PlanStep) -> Self {
        Self {
            number: step.number,
            size_bytes: step.size_bytes,
            flag: step.flag,
            fs: step.fs,
            mnt: step.mnt.clone(),
        }
    }
}

/// A mounted partition, as found in the disk filesystem table
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MountEntry<'a> {
    pub mnt: &'a Path,
    pub number: u32,
    pub fs: Option<Filesystem>,
}

/// Partition numbers start at 1 and are unique on a disk
fn deserialize_partitions<'de, D>(deserializer: D) -> Result<Vec<Partition>, D::Error>
where
    D: Deserializer<'de>,
{
    let partitions = Vec::<Partition>::deserialize(deserializer)?;

    let mut numbers = BTreeSet::new();
    for part in &partitions {
        if part.number == 0 {
            return Err(D::Error::custom("Partition numbers start at 1"));
        }

        if !numbers.insert(part.number) {
            return Err(D::Error::custom(format_args!(
                "Duplicate Partition Number {}",
                part.number
            )));
        }
    }

    Ok(partitions)
}

/// Snapshot of a disk, as reported by the partitioning backend
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct DiskState {
    pub table: PartitionTableKind,

    #[serde(default, deserialize_with = "deserialize_partitions")]
    #[cfg_attr(feature = "schema", schemars(with = "Vec<Partition>"))]
    pub partitions: Vec<Partition>,

    pub free_bytes: u64,
}

impl DiskState {
    /// Creates a snapshot of a disk without any partition
    #[must_use]
    pub fn empty(table: PartitionTableKind, free_bytes: u64) -> Self {
        Self {
            table,
            partitions: Vec::new(),
            free_bytes,
        }
    }

    /// Returns the number the next created partition will get, that is one
    /// past the highest existing partition number.
    ///
    /// Returns `None` if the highest partition number is already
    /// [`u32::MAX`].
    #[must_use]
    pub fn next_partition_number(&self) -> Option<u32> {
        match self.partitions.iter().map(|p| p.number).max() {
            Some(last) => last.checked_add(1),
            None => Some(1),
        }
    }

    #[must_use]
    pub fn partition(&self, number: u32) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.number == number)
    }

    /// Returns the filesystem table of the disk, ordered by partition number
    #[must_use]
    pub fn mounts(&self) -> Vec<MountEntry<'_>> {
        let mut mounts: Vec<_> = self
            .partitions
            .iter()
            .filter_map(|p| {
                p.mnt.as_deref().map(|mnt| MountEntry {
                    mnt,
                    number: p.number,
                    fs: p.fs,
                })
            })
            .collect();

        mounts.sort_by_key(|m| m.number);
        mounts
    }

    /// Records a partition created out of a [`PlanStep`]. The free space
    /// never goes below zero.
    pub fn record(&mut self, step: &PlanStep) {
        self.partitions.push(Partition::from(step));
        self.free_bytes = self.free_bytes.saturating_sub(step.size_bytes);
    }
}

/// A partition a user asked for
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct PartitionRequest {
    pub size_bytes: u64,

    #[serde(default)]
    pub fs: Option<Filesystem>,

    #[serde(default)]
    pub mnt: Option<PathBuf>,
}

/// One partition to create
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct PlanStep {
    pub number: u32,
    pub size_bytes: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<PartitionFlag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<Filesystem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnt: Option<PathBuf>,
}

impl PlanStep {
    #[must_use]
    pub fn is_bios_boot(&self) -> bool {
        self.flag == Some(PartitionFlag::BiosGrub)
    }
}

/// Ordered list of partitions to create for a single request
///
/// Steps must be applied in order: a BIOS boot partition, if any, comes first
/// and shifts the numbering of the partition that follows it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(deny_unknown_fields)]
pub struct Plan {
    steps: Vec<PlanStep>,
    request: PartitionRequest,
}

impl Plan {
    #[must_use]
    pub fn new(steps: Vec<PlanStep>, request: PartitionRequest) -> Self {
        Self { steps, request }
    }

    #[must_use]
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    /// The BIOS boot partition the plan synthesized, if any
    #[must_use]
    pub fn boot_step(&self) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.is_bios_boot())
    }

    /// The partition the user asked for
    #[must_use]
    pub fn data_step(&self) -> Option<&PlanStep> {
        self.steps.last()
    }

    /// The request, with its size adjusted for any synthesized partition
    #[must_use]
    pub fn adjusted_request(&self) -> &PartitionRequest {
        &self.request
    }

    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.steps.iter().map(|s| s.size_bytes).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
