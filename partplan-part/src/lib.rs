#![doc = include_str!("../README.md")]

use std::path::{Path, PathBuf};

use layout::{
    DiskState, Filesystem, PartitionFlag, PartitionRequest, PartitionTableKind, Plan, PlanStep,
    UnknownFilesystem,
};
use log::debug;

#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use test_log as _;

mod backend;
mod memory;

pub use crate::backend::{
    add_partition, disk_state, execute, AddPartitionError, BackendFailure, PartitionBackend,
};
pub use crate::memory::{MemoryBackend, MemoryBackendError};

/// Size of the partition holding the bootloader code on GPT disks booted
/// through a legacy BIOS
pub const BIOS_GRUB_SIZE_BYTES: u64 = 2 * 1024 * 1024;

/// Filesystem name meaning the partition is left unformatted
pub const NO_FILESYSTEM: &str = "none";

/// Reasons a [`PartitionRequest`] can't be planned, whatever the disk
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum RequestError {
    /// The requested size is zero
    #[error("Partition Size can't be zero")]
    NullSize,

    /// The filesystem gets mounted but no mount point was given
    #[error("Missing Mount Point for {0} Partition")]
    MissingMountpoint(Filesystem),

    /// The mount point isn't an absolute path
    #[error("Mount Point {} isn't absolute", .0.display())]
    RelativeMountpoint(PathBuf),

    /// Another partition of the disk is already mounted there
    #[error("Mount Point {} is already used by partition {number}", .mnt.display())]
    MountpointInUse {
        /// Requested Mount Point
        mnt: PathBuf,

        /// Partition already using it
        number: u32,
    },

    /// The filesystem name isn't known
    #[error(transparent)]
    UnknownFilesystem(#[from] UnknownFilesystem),
}

/// Planning Errors
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
pub enum PlanError {
    /// The request is invalid
    #[error("Invalid Partition Request")]
    InvalidRequest(#[from] RequestError),

    /// Nothing is left of the requested size once the BIOS boot partition
    /// has been carved out of it
    #[error("Insufficient Space: {requested} bytes requested, {reserved} bytes needed by the BIOS boot partition")]
    InsufficientSpace {
        /// Size Requested, in bytes
        requested: u64,

        /// Size Reserved, in bytes
        reserved: u64,
    },

    /// The partition table can't hold another partition
    #[error("Partition Table Full: {kind} tables hold at most {max} partitions")]
    TableFull {
        /// Partition Table Type
        kind: PartitionTableKind,

        /// Maximum number of partitions
        max: u32,
    },

    /// The disk already holds the highest possible partition number
    #[error("No Partition Number Left")]
    NumbersExhausted,
}

/// Builds a [`PartitionRequest`] out of raw user input.
///
/// An empty filesystem name or [`NO_FILESYSTEM`] leaves the partition
/// unformatted.
///
/// # Errors
///
/// Returns [`PlanError::InvalidRequest`] if the filesystem name is unknown.
pub fn request_from_input(
    size_bytes: u64,
    fs_name: &str,
    mnt: Option<&Path>,
) -> Result<PartitionRequest, PlanError> {
    let fs = if fs_name.is_empty() || fs_name.eq_ignore_ascii_case(NO_FILESYSTEM) {
        None
    } else {
        Some(
            fs_name
                .parse::<Filesystem>()
                .map_err(RequestError::from)?,
        )
    };

    Ok(PartitionRequest {
        size_bytes,
        fs,
        mnt: mnt.map(Path::to_path_buf),
    })
}

fn validate(disk: &DiskState, request: &PartitionRequest) -> Result<(), RequestError> {
    if request.size_bytes == 0 {
        return Err(RequestError::NullSize);
    }

    let Some(fs) = request.fs.filter(|fs| fs.is_mountable()) else {
        return Ok(());
    };

    let Some(mnt) = &request.mnt else {
        return Err(RequestError::MissingMountpoint(fs));
    };

    if !mnt.is_absolute() {
        return Err(RequestError::RelativeMountpoint(mnt.clone()));
    }

    if let Some(entry) = disk.mounts().iter().find(|m| m.mnt == mnt.as_path()) {
        return Err(RequestError::MountpointInUse {
            mnt: mnt.clone(),
            number: entry.number,
        });
    }

    Ok(())
}

/// Computes the partitions to create on a disk to fulfill a request.
///
/// A GPT disk without any partition gets a BIOS boot partition first,
/// numbered 1, and the requested partition is shrunk by
/// [`BIOS_GRUB_SIZE_BYTES`]. A disk with any partition at all never gets one.
///
/// Planning never touches the disk: the returned [`Plan`] is to be applied,
/// in order, by the caller.
///
/// # Errors
///
/// Returns [`PlanError::InvalidRequest`] if the request is invalid,
/// [`PlanError::InsufficientSpace`] if the requested size doesn't leave any
/// room once the BIOS boot partition is accounted for, and
/// [`PlanError::TableFull`] if the partition table can't hold the new
/// partition, and [`PlanError::NumbersExhausted`] if no partition number is
/// left after the highest one in use.
pub fn plan(disk: &DiskState, request: &PartitionRequest) -> Result<Plan, PlanError> {
    debug!("Planning {request:?} on a {} disk", disk.table);

    validate(disk, request)?;

    let mut steps = Vec::with_capacity(2);
    let mut request = request.clone();

    let number = if disk.table == PartitionTableKind::Gpt && disk.partitions.is_empty() {
        debug!("Empty GPT disk, adding a BIOS boot partition first");

        let size_bytes = request
            .size_bytes
            .checked_sub(BIOS_GRUB_SIZE_BYTES)
            .filter(|size| *size > 0)
            .ok_or(PlanError::InsufficientSpace {
                requested: request.size_bytes,
                reserved: BIOS_GRUB_SIZE_BYTES,
            })?;

        debug!(
            "Adjusting request down: {} - {} = {}",
            request.size_bytes, BIOS_GRUB_SIZE_BYTES, size_bytes
        );

        steps.push(PlanStep {
            number: 1,
            size_bytes: BIOS_GRUB_SIZE_BYTES,
            flag: Some(PartitionFlag::BiosGrub),
            fs: None,
            mnt: None,
        });

        request.size_bytes = size_bytes;
        2
    } else {
        disk.next_partition_number().ok_or(PlanError::NumbersExhausted)?
    };

    if let Some(max) = disk.table.max_partitions() {
        if number > max {
            return Err(PlanError::TableFull {
                kind: disk.table,
                max,
            });
        }
    }

    let mnt = request
        .fs
        .filter(|fs| fs.is_mountable())
        .and(request.mnt.clone());

    debug!("Partition {number}: {} bytes", request.size_bytes);

    steps.push(PlanStep {
        number,
        size_bytes: request.size_bytes,
        flag: None,
        fs: request.fs,
        mnt,
    });

    Ok(Plan::new(steps, request))
}
