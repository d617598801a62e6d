use std::collections::BTreeMap;

use layout::{DiskState, Partition, PartitionTableKind, PlanStep};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::PartitionBackend;

/// [`MemoryBackend`] Errors
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum MemoryBackendError {
    /// There's no disk with that name
    #[error("Unknown Disk {0}")]
    UnknownDisk(String),

    /// The partition number is already taken
    #[error("Partition {0} already exists")]
    NumberInUse(u32),

    /// The disk doesn't have enough free space left
    #[error("Not enough space: {requested} bytes requested, {available} bytes available")]
    NoSpace {
        /// Size Requested, in bytes
        requested: u64,

        /// Free Space, in bytes
        available: u64,
    },
}

/// A [`PartitionBackend`] keeping a set of disks in memory
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MemoryBackend {
    disks: BTreeMap<String, DiskState>,
}

impl MemoryBackend {
    /// Creates a backend without any disk
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a disk to the backend, replacing any disk with the same name
    #[must_use]
    pub fn with_disk(mut self, name: &str, disk: DiskState) -> Self {
        self.disks.insert(name.to_owned(), disk);
        self
    }

    /// Returns a disk state
    #[must_use]
    pub fn disk(&self, name: &str) -> Option<&DiskState> {
        self.disks.get(name)
    }

    /// Iterates over the disks, ordered by name
    pub fn disks(&self) -> impl Iterator<Item = (&str, &DiskState)> {
        self.disks.iter().map(|(name, disk)| (name.as_str(), disk))
    }

    fn get(&self, name: &str) -> Result<&DiskState, MemoryBackendError> {
        self.disks
            .get(name)
            .ok_or_else(|| MemoryBackendError::UnknownDisk(name.to_owned()))
    }
}

impl PartitionBackend for MemoryBackend {
    type Error = MemoryBackendError;

    fn partition_table(&self, disk: &str) -> Result<PartitionTableKind, Self::Error> {
        Ok(self.get(disk)?.table)
    }

    fn list_partitions(&self, disk: &str) -> Result<Vec<Partition>, Self::Error> {
        Ok(self.get(disk)?.partitions.clone())
    }

    fn free_space(&self, disk: &str) -> Result<u64, Self::Error> {
        Ok(self.get(disk)?.free_bytes)
    }

    fn create_partition(&mut self, disk: &str, step: &PlanStep) -> Result<(), Self::Error> {
        let state = self
            .disks
            .get_mut(disk)
            .ok_or_else(|| MemoryBackendError::UnknownDisk(disk.to_owned()))?;

        if state.partition(step.number).is_some() {
            return Err(MemoryBackendError::NumberInUse(step.number));
        }

        if step.size_bytes > state.free_bytes {
            return Err(MemoryBackendError::NoSpace {
                requested: step.size_bytes,
                available: state.free_bytes,
            });
        }

        state.record(step);

        debug!(
            "{disk}: Created partition {}, {} bytes left",
            step.number, state.free_bytes
        );

        Ok(())
    }
}
