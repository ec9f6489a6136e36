//! # Error Types
//!
//! Every fallible operation in the crate reports a [`VoxelError`]. Addressing faults,
//! queue misuse, collaborator failures and worker-pool faults all share this one enum so
//! the scheduler can treat any stage failure as a batch-level failure.

use thiserror::Error;

/// Errors raised by the voxel world, the update queue and the meshing pipeline.
#[derive(Error, Debug)]
pub enum VoxelError {
    /// `dequeue` was called on an empty update queue.
    #[error("dequeue called on an empty update queue")]
    EmptyQueue,

    /// A chunk-local index outside `[0, CHUNK_VOLUME)`.
    #[error("local index {index} is outside the chunk volume")]
    IndexOutOfRange {
        /// The rejected index.
        index: usize,
    },

    /// A chunk-local coordinate outside `[0, CHUNK_SIZE)` on some axis.
    #[error("local coordinate ({x}, {y}, {z}) is outside the chunk bounds")]
    CoordOutOfRange {
        /// X component.
        x: i32,
        /// Y component.
        y: i32,
        /// Z component.
        z: i32,
    },

    /// A world position that cannot be floored onto the integer lattice.
    #[error("world position ({x}, {y}, {z}) is not addressable")]
    InvalidWorldPosition {
        /// X component.
        x: f32,
        /// Y component.
        y: f32,
        /// Z component.
        z: f32,
    },

    /// A voxel slice handed to the mesher did not hold exactly one chunk.
    #[error("expected {expected} voxels for a chunk, got {actual}")]
    InvalidChunkData {
        /// Required length.
        expected: usize,
        /// Length that was provided.
        actual: usize,
    },

    /// The world's placement validator refused a write.
    #[error("voxel placement rejected: {0}")]
    PlacementRejected(String),

    /// A packed mesh failed validation.
    #[error("malformed mesh {mesh_id}: {reason}")]
    MalformedMesh {
        /// Identifier of the offending mesh.
        mesh_id: u64,
        /// What was wrong with it.
        reason: String,
    },

    /// The mesh commit collaborator refused a batch.
    #[error("mesh commit failed: {0}")]
    CommitFailed(String),

    /// Collider baking failed for one mesh.
    #[error("collider bake failed for mesh {mesh_id}: {reason}")]
    BakeFailed {
        /// Identifier of the mesh being baked.
        mesh_id: u64,
        /// Reason given by the collaborator.
        reason: String,
    },

    /// A job panicked on a worker thread.
    #[error("worker task panicked: {0}")]
    TaskPanicked(String),

    /// A worker hung up before reporting its result.
    #[error("worker thread disconnected before completing its task")]
    WorkerDisconnected,

    /// The worker pool could not start a thread.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Batch scratch was still shared with a worker when a new batch needed it.
    #[error("batch scratch buffers are still referenced by outstanding work")]
    ScratchInUse,

    /// Configuration values failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The configuration file is not valid JSON for [`crate::MesherConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type VoxelResult<T> = Result<T, VoxelError>;
