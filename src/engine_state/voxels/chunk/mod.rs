//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a dense `CHUNK_SIZE`³ voxel array for one cube
//! of the world, plus the geometry most recently generated from it.
//!
//! ## Storage
//!
//! Voxels are stored in a boxed slice of exactly `CHUNK_VOLUME` entries, indexed by local
//! index (x fastest, then y, then z). A dense layout keeps snapshotting a chunk into a
//! batch a single `memcpy`, which is the hot path of the scheduler.
//!
//! ## Sharing
//!
//! Chunks are handed around as [`ChunkRef`] (`MtResource<Chunk>`). The world owns the
//! primary handle; the update queue and the in-flight batch hold clones. The per-chunk
//! lock is the exclusive-access discipline for concurrent writers.

use cgmath::Point3;

use crate::core::MtResource;
use crate::engine_state::meshing::{MeshId, PackedMesh};
use crate::error::{VoxelError, VoxelResult};

use super::addressing::{chunk_world_origin, index_in_bounds, CHUNK_VOLUME};
use super::voxel::Voxel;

/// Shared handle to a chunk. Equality and hashing are by identity.
pub type ChunkRef = MtResource<Chunk>;

/// State of the collider attached to a chunk's container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColliderState {
    /// Mesh the collider was last pointed at, `None` until the first bake completes.
    pub mesh_id: Option<MeshId>,
    /// Incremented every time the collider is refreshed.
    pub revision: u64,
}

/// A `CHUNK_SIZE`³ block of voxels located at one chunk coordinate.
#[derive(Debug)]
pub struct Chunk {
    /// Position of this chunk in chunk coordinates (not voxel coordinates).
    position: Point3<i32>,
    /// Dense voxel storage, `CHUNK_VOLUME` entries.
    voxels: Box<[Voxel]>,
    /// Stable identifier of the mesh owned by this chunk's container.
    mesh_id: MeshId,
    /// Geometry from the most recent completed regeneration.
    mesh: PackedMesh,
    collider: ColliderState,
}

impl Chunk {
    /// Creates an all-empty chunk at `position` whose container owns mesh `mesh_id`.
    pub fn new(position: Point3<i32>, mesh_id: MeshId) -> Self {
        Chunk {
            position,
            voxels: vec![Voxel::EMPTY; CHUNK_VOLUME].into_boxed_slice(),
            mesh_id,
            mesh: PackedMesh::default(),
            collider: ColliderState::default(),
        }
    }

    /// Chunk coordinate of this chunk.
    pub fn position(&self) -> Point3<i32> {
        self.position
    }

    /// World-space position of the chunk's minimum corner.
    pub fn world_origin(&self) -> Point3<i32> {
        chunk_world_origin(self.position)
    }

    /// Identifier of the mesh this chunk's geometry is committed to.
    pub fn mesh_id(&self) -> MeshId {
        self.mesh_id
    }

    /// All voxels, indexed by local index.
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    /// Reads the voxel at a local index.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `index >= CHUNK_VOLUME`.
    pub fn get_voxel(&self, index: usize) -> VoxelResult<Voxel> {
        self.voxels
            .get(index)
            .copied()
            .ok_or(VoxelError::IndexOutOfRange { index })
    }

    /// Stores `voxel` at a local index, returning `true` if the stored value changed.
    ///
    /// # Errors
    /// `IndexOutOfRange` if `index >= CHUNK_VOLUME`.
    pub fn set_voxel(&mut self, index: usize, voxel: Voxel) -> VoxelResult<bool> {
        if !index_in_bounds(index) {
            return Err(VoxelError::IndexOutOfRange { index });
        }
        let slot = &mut self.voxels[index];
        if *slot == voxel {
            return Ok(false);
        }
        *slot = voxel;
        Ok(true)
    }

    /// Copies the voxel array into `destination`, which must hold exactly one chunk.
    pub fn copy_voxels_into(&self, destination: &mut [Voxel]) -> VoxelResult<()> {
        if destination.len() != CHUNK_VOLUME {
            return Err(VoxelError::InvalidChunkData {
                expected: CHUNK_VOLUME,
                actual: destination.len(),
            });
        }
        destination.copy_from_slice(&self.voxels);
        Ok(())
    }

    /// Returns `true` if every voxel is empty.
    pub fn is_empty(&self) -> bool {
        self.voxels.iter().all(|voxel| voxel.is_empty())
    }

    /// Geometry from the most recent completed regeneration.
    pub fn mesh(&self) -> &PackedMesh {
        &self.mesh
    }

    /// Replaces the chunk's geometry after a successful commit.
    pub(crate) fn set_mesh(&mut self, mesh: PackedMesh) {
        self.mesh = mesh;
    }

    /// Current collider state.
    pub fn collider(&self) -> ColliderState {
        self.collider
    }

    /// Points the collider at the freshly baked mesh.
    pub(crate) fn update_collider(&mut self) {
        self.collider.mesh_id = Some(self.mesh_id);
        self.collider.revision += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn new_chunk_is_empty() {
        let chunk = Chunk::new(Point3::new(1, -2, 3), MeshId(9));
        assert_eq!(chunk.voxels().len(), CHUNK_VOLUME);
        assert!(chunk.is_empty());
        assert_eq!(chunk.world_origin(), Point3::new(32, -64, 96));
        assert_eq!(chunk.mesh().vertex_count(), 0);
        assert_eq!(chunk.collider(), ColliderState::default());
    }

    #[test]
    fn set_voxel_reports_change() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), MeshId(0));
        assert!(chunk.set_voxel(10, Voxel::new(1)).unwrap());
        assert!(!chunk.set_voxel(10, Voxel::new(1)).unwrap());
        assert!(chunk.set_voxel(10, Voxel::new(2)).unwrap());
        assert_eq!(chunk.get_voxel(10).unwrap(), Voxel::new(2));
        assert!(!chunk.is_empty());
    }

    #[test]
    fn out_of_range_access_fails() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), MeshId(0));
        assert!(chunk.get_voxel(CHUNK_VOLUME).is_err());
        assert!(chunk.set_voxel(CHUNK_VOLUME, Voxel::new(1)).is_err());
    }

    #[test]
    fn snapshot_requires_exact_length() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), MeshId(0));
        chunk.set_voxel(5, Voxel::new(4)).unwrap();

        let mut too_small = vec![Voxel::EMPTY; 10];
        assert!(chunk.copy_voxels_into(&mut too_small).is_err());

        let mut snapshot = vec![Voxel::EMPTY; CHUNK_VOLUME];
        chunk.copy_voxels_into(&mut snapshot).unwrap();
        assert_eq!(snapshot[5], Voxel::new(4));
    }

    #[test]
    fn collider_refresh_tracks_revisions() {
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), MeshId(3));
        chunk.update_collider();
        chunk.update_collider();
        assert_eq!(
            chunk.collider(),
            ColliderState {
                mesh_id: Some(MeshId(3)),
                revision: 2
            }
        );
    }
}
