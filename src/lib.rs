#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Chunk Mesher
//!
//! Incremental surface meshing for sparse, chunked voxel volumes.
//!
//! The crate keeps a sparse [`World`] of `32³` chunks, tracks which chunks changed, and
//! rebuilds their render and collision meshes in bounded batches on a worker pool. Mesh
//! installation and collider baking are delegated to a host through the [`MeshBackend`]
//! and [`ChunkFactory`] traits.
//!
//! ## Key Modules
//!
//! * `core` - the shared, lockable chunk handle
//! * `engine_state` - voxels, meshing and task management
//! * `config` - scheduler configuration
//! * `error` - the crate error type
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use cgmath::Point3;
//! use voxel_chunk_mesher::{InMemoryBackend, MeshManager, MesherConfig, Voxel, World};
//!
//! let backend = Arc::new(InMemoryBackend::new());
//! let mut mesher = MeshManager::new(MesherConfig::default(), backend.clone()).unwrap();
//! let mut world = World::new(mesher.update_sender(), backend.clone());
//!
//! world.set_voxel(Point3::new(0.0, 0.0, 0.0), Voxel::new(1)).unwrap();
//! mesher.flush();
//!
//! let chunk = world.chunk_at(Point3::new(0, 0, 0)).unwrap();
//! assert_eq!(chunk.get().mesh().vertex_count(), 24);
//! ```
//!
//! A host drives [`MeshManager::tick`] once per fixed time step instead of `flush`.

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

pub use config::MesherConfig;
pub use engine_state::meshing::{
    ChunkFactory, CountPair, DrainStage, InMemoryBackend, MeshBackend, MeshCommit, MeshId,
    MeshBounds, MeshManager, MeshPools, MeshSection, MeshingStats, PackedMesh, SharedUpdateQueue,
    UniqueQueue, Vertex,
};
pub use engine_state::voxels::{
    addressing::{
        coord_to_local_index, local_index_to_coord, world_to_chunk_and_local, CHUNK_SIZE,
        CHUNK_VOLUME,
    },
    block_side::BlockSide,
    chunk::{Chunk, ChunkRef, ColliderState},
    voxel::Voxel,
    world::World,
};
pub use error::{VoxelError, VoxelResult};

/// Installs the `env_logger` backend, writing to stdout and filtered by `RUST_LOG`.
///
/// Calling it more than once is harmless; later calls leave the first logger in place.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    let installed = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init()
        .is_ok();

    if installed {
        log::info!("Logger initialized");
    }
}
