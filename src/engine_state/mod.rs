//! # Engine State Module
//!
//! The subsystems of the mesher.
//!
//! ## Key Components
//!
//! * `voxels` - voxel values, chunk addressing, chunks and the sparse world
//! * `meshing` - the update queue, face extraction, buffer packing and the batch scheduler
//! * `task_management` - the worker pool the scheduler distributes per-chunk work to
//!
//! ## Architecture
//!
//! Data flows one way: the `World` marks chunks dirty, the `MeshManager` drains them in
//! batches on the `TaskManager`'s workers, and finished meshes leave through a
//! `MeshBackend`. Nothing in `voxels` depends on the scheduler beyond the shared queue
//! handle it is given at construction.

pub mod meshing;
pub mod task_management;
pub mod voxels;
