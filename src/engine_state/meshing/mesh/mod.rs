//! Mesh generation and packing for chunk rendering and collision.
//!
//! # Architecture
//! - [`generation`]: culled face extraction from a dense voxel array
//! - [`packing`]: the shared per-batch pools and their per-chunk destination buffers
//!
//! # Usage
//! ```
//! use voxel_chunk_mesher::{MeshPools, Voxel, CHUNK_VOLUME};
//!
//! let mut voxels = vec![Voxel::EMPTY; CHUNK_VOLUME];
//! voxels[0] = Voxel::new(1);
//!
//! let mut pools = MeshPools::new();
//! pools.generate_batch(&voxels).unwrap();
//! let ranges = pools.slice_ranges();
//! let mesh = pools.pack(0, &ranges[0]).unwrap();
//! assert_eq!(mesh.vertex_count(), 24);
//! ```

pub mod generation;
pub mod packing;

pub use generation::{generate_chunk_mesh, CountPair, MeshSection, QUAD_INDICES, QUAD_UVS};
pub use packing::{
    compute_slice_ranges, IndexFormat, MeshBounds, MeshPools, PackedMesh, SliceRange, SubMesh,
};
