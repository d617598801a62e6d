use core::error::Error as StdError;

use layout::{DiskState, Partition, PartitionRequest, PartitionTableKind, Plan, PlanStep};
use log::{debug, error, info, log_enabled, Level};

use crate::{plan, PlanError};

/// Something able to inspect a disk and physically create partitions on it
pub trait PartitionBackend {
    /// Backend Error Type
    type Error: StdError + Send + Sync + 'static;

    /// Returns the kind of partition table found on the disk
    ///
    /// # Errors
    ///
    /// If the disk can't be inspected
    fn partition_table(&self, disk: &str) -> Result<PartitionTableKind, Self::Error>;

    /// Returns the partitions currently on the disk
    ///
    /// # Errors
    ///
    /// If the disk can't be inspected
    fn list_partitions(&self, disk: &str) -> Result<Vec<Partition>, Self::Error>;

    /// Returns the unallocated space on the disk, in bytes
    ///
    /// # Errors
    ///
    /// If the disk can't be inspected
    fn free_space(&self, disk: &str) -> Result<u64, Self::Error>;

    /// Creates a partition on the disk
    ///
    /// # Errors
    ///
    /// If the partition couldn't be created
    fn create_partition(&mut self, disk: &str, step: &PlanStep) -> Result<(), Self::Error>;
}

/// A [`Plan`] step failed to be applied
///
/// The steps after the failed one have been abandoned. The disk has to be
/// inspected again before planning anything else on it.
#[derive(thiserror::Error, Debug)]
#[error("Couldn't create partition {}", .failed.number)]
pub struct BackendFailure<E>
where
    E: StdError + 'static,
{
    /// The step that failed
    pub failed: PlanStep,

    /// The steps applied before the failure, in order
    pub applied: Vec<PlanStep>,

    /// The backend error
    #[source]
    pub source: E,
}

/// Errors of the full refresh, plan and execute sequence
#[derive(thiserror::Error, Debug)]
pub enum AddPartitionError<E>
where
    E: StdError + 'static,
{
    /// The disk couldn't be inspected
    #[error("Couldn't inspect the disk")]
    Backend(#[source] E),

    /// The request couldn't be planned
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The plan was partially applied
    #[error(transparent)]
    Execution(#[from] BackendFailure<E>),
}

/// Retrieves a fresh snapshot of a disk from the backend
///
/// # Errors
///
/// If the backend fails to inspect the disk
pub fn disk_state<B>(backend: &B, disk: &str) -> Result<DiskState, B::Error>
where
    B: PartitionBackend + ?Sized,
{
    Ok(DiskState {
        table: backend.partition_table(disk)?,
        partitions: backend.list_partitions(disk)?,
        free_bytes: backend.free_space(disk)?,
    })
}

/// Applies every step of a [`Plan`] to a disk, in order.
///
/// Returns the applied steps.
///
/// # Errors
///
/// Stops at the first step the backend fails to create, and returns a
/// [`BackendFailure`] holding the steps applied so far.
pub fn execute<B>(
    backend: &mut B,
    disk: &str,
    plan: &Plan,
) -> Result<Vec<PlanStep>, BackendFailure<B::Error>>
where
    B: PartitionBackend + ?Sized,
{
    let mut applied = Vec::with_capacity(plan.len());

    for step in plan.steps() {
        debug!(
            "Creating partition {} on {disk}: {} bytes",
            step.number, step.size_bytes
        );

        if let Err(e) = backend.create_partition(disk, step) {
            error!("Couldn't create partition {} on {disk}: {e}", step.number);

            return Err(BackendFailure {
                failed: step.clone(),
                applied,
                source: e,
            });
        }

        applied.push(step.clone());
    }

    Ok(applied)
}

/// Adds a partition to a disk: inspects the disk, plans the request and
/// applies the plan.
///
/// Returns the applied plan.
///
/// # Errors
///
/// If the disk can't be inspected, if the request can't be planned, or if the
/// plan fails to be applied. Nothing is retried.
pub fn add_partition<B>(
    backend: &mut B,
    disk: &str,
    request: &PartitionRequest,
) -> Result<Plan, AddPartitionError<B::Error>>
where
    B: PartitionBackend + ?Sized,
{
    debug!("Adding partition to {disk}");

    let state = disk_state(backend, disk).map_err(AddPartitionError::Backend)?;
    debug!("{disk} free space: {} bytes", state.free_bytes);

    let plan = plan(&state, request)?;
    execute(backend, disk, &plan)?;

    info!("Successfully added partition");

    if log_enabled!(Level::Debug) {
        match disk_state(backend, disk) {
            Ok(state) => {
                for entry in state.mounts() {
                    debug!(
                        "FS Table: {} on partition {}",
                        entry.mnt.display(),
                        entry.number
                    );
                }
            }
            Err(e) => debug!("Couldn't retrieve the {disk} FS Table: {e}"),
        }
    }

    Ok(plan)
}
