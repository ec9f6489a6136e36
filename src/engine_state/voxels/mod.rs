//! # Voxel Storage
//!
//! This module contains the data side of the mesher: voxel values, the addressing math
//! that maps world positions onto chunks, the chunks themselves and the sparse world
//! that owns them.
//!
//! ## Architecture
//!
//! * **Voxel**: a one-byte content id, zero meaning empty
//! * **Addressing**: pure conversions between world positions, chunk coordinates and
//!   local indices, using floored division so negative positions land in negative chunks
//! * **Block sides**: the six face directions and the unit-cube corner table used when
//!   emitting quads
//! * **Chunk**: a dense `CHUNK_SIZE`³ voxel array plus its latest mesh and collider state
//! * **World**: the sparse chunk map; routes reads and writes and reports dirty chunks
//!
//! ## Data Flow
//!
//! 1. `World::set_voxel` resolves the chunk coordinate and local index
//! 2. The chunk is created through the `ChunkFactory` on first write
//! 3. A write that changes the stored value submits the chunk to the update queue
//! 4. The `MeshManager` later snapshots the chunk and regenerates its mesh
//!
//! ## Thread Safety
//!
//! Chunks are shared as `MtResource<Chunk>`. Each chunk has its own lock, so the
//! scheduler's snapshot and a concurrent write never observe a half-written array.

pub mod addressing;
pub mod block_side;
pub mod chunk;
pub mod voxel;
pub mod world;
