//! # World Module
//!
//! This module provides the `World` struct which manages the sparse collection of chunks
//! making up the voxel volume. All voxel reads and writes go through it.
//!
//! ## Architecture
//!
//! The world uses a sparse storage approach: a chunk exists at a coordinate only once a
//! voxel write has targeted it, and chunks are never removed. Chunk containers are
//! created through a [`ChunkFactory`], which also assigns each chunk the mesh id its
//! geometry is committed under.
//!
//! ## Dirty Tracking
//!
//! Every write that changes a stored voxel submits the chunk to the shared update queue.
//! Writes that store the value already present are no-ops and do not touch the queue.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cgmath::{EuclideanSpace, Point3, Vector3};
use log::trace;

use crate::core::MtResource;
use crate::engine_state::meshing::{ChunkFactory, SharedUpdateQueue};
use crate::error::VoxelResult;

use super::addressing::{chunk_world_origin, expand, world_to_chunk_and_local};
use super::chunk::{Chunk, ChunkRef};
use super::voxel::Voxel;

/// Hook deciding whether a voxel may be stored at a world lattice position.
pub type PlacementValidator = Box<dyn Fn(Point3<i32>, Voxel) -> VoxelResult<()> + Send + Sync>;

/// A voxel world composed of lazily created chunks.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cgmath::Point3;
/// use voxel_chunk_mesher::{InMemoryBackend, SharedUpdateQueue, Voxel, World};
///
/// let updates = SharedUpdateQueue::new();
/// let mut world = World::new(updates.clone(), Arc::new(InMemoryBackend::new()));
///
/// assert!(world.set_voxel(Point3::new(-1.5, 2.0, 0.0), Voxel::new(3)).unwrap());
/// assert!(!world.set_voxel(Point3::new(-1.5, 2.0, 0.0), Voxel::new(3)).unwrap());
/// assert_eq!(updates.len(), 1);
///
/// assert_eq!(world.try_get_voxel(Point3::new(-1.2, 2.9, 0.5)).unwrap(), Some(Voxel::new(3)));
/// assert_eq!(world.try_get_voxel(Point3::new(500.0, 0.0, 0.0)).unwrap(), None);
/// ```
pub struct World {
    /// A mapping from chunk coordinates to chunk data.
    chunks: HashMap<Point3<i32>, ChunkRef>,
    updates: SharedUpdateQueue,
    factory: Arc<dyn ChunkFactory>,
    validator: Option<PlacementValidator>,
}

impl World {
    /// Creates an empty world that reports dirty chunks to `updates`.
    pub fn new(updates: SharedUpdateQueue, factory: Arc<dyn ChunkFactory>) -> Self {
        World {
            chunks: HashMap::new(),
            updates,
            factory,
            validator: None,
        }
    }

    /// Installs a hook run before every write, ahead of chunk creation.
    ///
    /// A rejected write neither creates a chunk nor changes any voxel.
    pub fn with_placement_validator(
        mut self,
        validator: impl Fn(Point3<i32>, Voxel) -> VoxelResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Reads the voxel at a world position.
    ///
    /// Returns `Ok(None)` if no chunk exists there, which is distinct from an empty voxel.
    ///
    /// # Errors
    /// `InvalidWorldPosition` if the position cannot be floored onto the lattice.
    pub fn try_get_voxel(&self, position: Point3<f32>) -> VoxelResult<Option<Voxel>> {
        let (chunk_position, index) = world_to_chunk_and_local(position)?;
        match self.chunks.get(&chunk_position) {
            Some(chunk) => Ok(Some(chunk.get().get_voxel(index)?)),
            None => Ok(None),
        }
    }

    /// Stores `voxel` at a world position, creating the chunk if needed.
    ///
    /// Returns `true` if the stored value changed, in which case the chunk is queued for
    /// remeshing. Storing the value already present returns `false` and queues nothing.
    ///
    /// # Errors
    /// `InvalidWorldPosition` for an unaddressable position, or whatever the placement
    /// validator returns.
    pub fn set_voxel(&mut self, position: Point3<f32>, voxel: Voxel) -> VoxelResult<bool> {
        let (chunk_position, index) = world_to_chunk_and_local(position)?;

        if let Some(validator) = &self.validator {
            let lattice = chunk_world_origin(chunk_position) + expand(index).to_vec();
            validator(lattice, voxel)?;
        }

        let chunk = self.get_or_create_chunk(chunk_position);
        let changed = chunk.get_mut().set_voxel(index, voxel)?;
        if changed {
            self.updates.submit(chunk);
        }
        Ok(changed)
    }

    fn get_or_create_chunk(&mut self, position: Point3<i32>) -> ChunkRef {
        let factory = &self.factory;
        self.chunks
            .entry(position)
            .or_insert_with(|| {
                let mesh_id = factory.create_chunk_container(position);
                trace!("Created chunk {:?} with {}", position, mesh_id);
                MtResource::new(Chunk::new(position, mesh_id))
            })
            .clone()
    }

    /// The chunk at a chunk coordinate, if one has been created.
    pub fn chunk_at(&self, position: Point3<i32>) -> Option<ChunkRef> {
        self.chunks.get(&position).cloned()
    }

    /// Number of chunks created so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Coordinates of every chunk, in no particular order.
    pub fn chunk_positions(&self) -> impl Iterator<Item = Point3<i32>> + '_ {
        self.chunks.keys().copied()
    }

    /// Offset from the world origin to the minimum corner of a chunk.
    pub fn chunk_offset(position: Point3<i32>) -> Vector3<i32> {
        chunk_world_origin(position).to_vec()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("chunks", &self.chunks.len())
            .field("pending_updates", &self.updates.len())
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine_state::meshing::InMemoryBackend;
    use crate::engine_state::voxels::addressing::coord_to_local_index;
    use crate::error::VoxelError;

    fn world() -> (World, SharedUpdateQueue, Arc<InMemoryBackend>) {
        let updates = SharedUpdateQueue::new();
        let backend = Arc::new(InMemoryBackend::new());
        (World::new(updates.clone(), backend.clone()), updates, backend)
    }

    #[test]
    fn missing_chunk_is_not_found() {
        let (world, _, _) = world();
        assert_eq!(world.try_get_voxel(Point3::new(0.0, 0.0, 0.0)).unwrap(), None);
        assert_eq!(world.chunk_count(), 0);
    }

    #[test]
    fn empty_voxel_in_existing_chunk_is_found() {
        let (mut world, _, _) = world();
        world
            .set_voxel(Point3::new(1.0, 1.0, 1.0), Voxel::new(1))
            .unwrap();
        assert_eq!(
            world.try_get_voxel(Point3::new(2.0, 1.0, 1.0)).unwrap(),
            Some(Voxel::EMPTY)
        );
    }

    #[test]
    fn writing_the_same_value_is_idempotent() {
        let (mut world, updates, _) = world();
        let position = Point3::new(4.2, -3.7, 10.0);
        assert!(world.set_voxel(position, Voxel::new(7)).unwrap());
        assert!(!world.set_voxel(position, Voxel::new(7)).unwrap());
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn writing_empty_into_fresh_chunk_creates_it_without_enqueue() {
        let (mut world, updates, backend) = world();
        assert!(!world
            .set_voxel(Point3::new(0.0, 0.0, 0.0), Voxel::EMPTY)
            .unwrap());
        assert_eq!(world.chunk_count(), 1);
        assert_eq!(backend.container_count(), 1);
        assert!(updates.is_empty());
    }

    #[test]
    fn negative_positions_route_to_negative_chunks() {
        let (mut world, _, backend) = world();
        world
            .set_voxel(Point3::new(-1.0, -1.0, -1.0), Voxel::new(1))
            .unwrap();

        let chunk = world.chunk_at(Point3::new(-1, -1, -1)).unwrap();
        let index = coord_to_local_index(Point3::new(31, 31, 31)).unwrap();
        assert_eq!(chunk.get().get_voxel(index).unwrap(), Voxel::new(1));
        assert_eq!(
            backend.container_position(chunk.get().mesh_id()),
            Some(Point3::new(-1, -1, -1))
        );
        assert_eq!(World::chunk_offset(Point3::new(-1, 0, 2)), Vector3::new(-32, 0, 64));
    }

    #[test]
    fn edits_to_one_chunk_enqueue_it_once() {
        let (mut world, updates, _) = world();
        for x in 0..10 {
            world
                .set_voxel(Point3::new(x as f32, 0.0, 0.0), Voxel::new(1))
                .unwrap();
        }
        world
            .set_voxel(Point3::new(40.0, 0.0, 0.0), Voxel::new(1))
            .unwrap();
        assert_eq!(world.chunk_count(), 2);
        assert_eq!(updates.len(), 2);
    }

    #[test]
    fn rejected_placement_creates_nothing() {
        let (world, updates, backend) = world();
        let mut world = world.with_placement_validator(|position, _| {
            if position.y < 0 {
                Err(VoxelError::PlacementRejected(format!(
                    "{:?} is below bedrock",
                    position
                )))
            } else {
                Ok(())
            }
        });

        let err = world
            .set_voxel(Point3::new(0.0, -0.5, 0.0), Voxel::new(1))
            .unwrap_err();
        assert!(matches!(err, VoxelError::PlacementRejected(_)));
        assert_eq!(world.chunk_count(), 0);
        assert_eq!(backend.container_count(), 0);
        assert!(updates.is_empty());

        assert!(world
            .set_voxel(Point3::new(0.0, 0.5, 0.0), Voxel::new(1))
            .unwrap());
    }

    #[test]
    fn validator_sees_lattice_position() {
        let (world, _, _) = world();
        let mut world = world.with_placement_validator(|position, _| {
            assert_eq!(position, Point3::new(-33, 5, 0));
            Ok(())
        });
        world
            .set_voxel(Point3::new(-32.5, 5.9, 0.0), Voxel::new(2))
            .unwrap();
    }

    #[test]
    fn non_finite_position_is_rejected() {
        let (mut world, _, _) = world();
        assert!(world
            .set_voxel(Point3::new(f32::NAN, 0.0, 0.0), Voxel::new(1))
            .is_err());
        assert!(world
            .try_get_voxel(Point3::new(0.0, f32::INFINITY, 0.0))
            .is_err());
    }
}
