//! # Mesh Collaborators
//!
//! The mesher hands finished geometry to a host through two capability traits:
//!
//! * [`MeshBackend`] installs packed buffers as drawable/collidable surfaces and bakes
//!   colliders for them
//! * [`ChunkFactory`] creates the host-side container of a chunk the first time a
//!   coordinate is written, and hands back the stable mesh identifier it owns
//!
//! [`InMemoryBackend`] implements both without any rendering or physics engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use cgmath::Point3;
use log::{debug, trace};

use crate::error::{VoxelError, VoxelResult};

use super::mesh::{MeshBounds, PackedMesh};

/// Stable identifier of the mesh owned by one chunk container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshId(pub u64);

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// One chunk's packed geometry, addressed to its container's mesh.
#[derive(Clone, Copy, Debug)]
pub struct MeshCommit<'a> {
    /// Mesh receiving the geometry.
    pub mesh_id: MeshId,
    /// Chunk coordinate the geometry belongs to.
    pub chunk_position: Point3<i32>,
    /// Chunk-local bounds to install with the geometry.
    pub bounds: MeshBounds,
    /// The packed buffers.
    pub mesh: &'a PackedMesh,
}

/// Host capability that installs meshes and bakes their colliders.
pub trait MeshBackend: Send + Sync {
    /// Installs a batch of packed meshes. Returns once the batch is committed.
    fn commit_meshes(&self, commits: &[MeshCommit<'_>]) -> VoxelResult<()>;

    /// Bakes the collider of a committed mesh. Called from worker threads.
    fn bake_collider(&self, mesh_id: MeshId, convex: bool) -> VoxelResult<()>;
}

/// Host capability that creates chunk containers.
pub trait ChunkFactory: Send + Sync {
    /// Creates the container for the chunk at `position` and returns its mesh id.
    fn create_chunk_container(&self, position: Point3<i32>) -> MeshId;
}

/// Bake bookkeeping for one mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BakeRecord {
    /// Number of completed bakes.
    pub count: u32,
    /// Flag passed to the latest bake.
    pub convex: bool,
}

/// A [`MeshBackend`] and [`ChunkFactory`] that keeps everything in memory.
///
/// Commits are validated (every index must address a vertex of the same mesh, and the
/// index count must form whole triangles) and rejected as a whole if any mesh fails.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    next_mesh_id: AtomicU64,
    containers: RwLock<HashMap<MeshId, Point3<i32>>>,
    meshes: RwLock<HashMap<MeshId, PackedMesh>>,
    bakes: RwLock<HashMap<MeshId, BakeRecord>>,
    commit_calls: AtomicU64,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of containers created so far.
    pub fn container_count(&self) -> usize {
        self.containers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Chunk coordinate of a container.
    pub fn container_position(&self, mesh_id: MeshId) -> Option<Point3<i32>> {
        self.containers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&mesh_id)
            .copied()
    }

    /// The geometry most recently committed to `mesh_id`.
    pub fn mesh(&self, mesh_id: MeshId) -> Option<PackedMesh> {
        self.meshes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&mesh_id)
            .cloned()
    }

    /// Bake bookkeeping for `mesh_id`.
    pub fn bake_record(&self, mesh_id: MeshId) -> BakeRecord {
        self.bakes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&mesh_id)
            .copied()
            .unwrap_or_default()
    }

    /// Number of accepted `commit_meshes` calls.
    pub fn commit_calls(&self) -> u64 {
        self.commit_calls.load(Ordering::SeqCst)
    }
}

impl ChunkFactory for InMemoryBackend {
    fn create_chunk_container(&self, position: Point3<i32>) -> MeshId {
        let mesh_id = MeshId(self.next_mesh_id.fetch_add(1, Ordering::SeqCst));
        self.containers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(mesh_id, position);
        trace!("Created container {} for chunk {:?}", mesh_id, position);
        mesh_id
    }
}

impl MeshBackend for InMemoryBackend {
    fn commit_meshes(&self, commits: &[MeshCommit<'_>]) -> VoxelResult<()> {
        {
            let containers = self.containers.read().unwrap_or_else(PoisonError::into_inner);
            for commit in commits {
                if !containers.contains_key(&commit.mesh_id) {
                    return Err(VoxelError::CommitFailed(format!(
                        "{} has no container",
                        commit.mesh_id
                    )));
                }
                if commit.bounds != commit.mesh.bounds() {
                    return Err(VoxelError::CommitFailed(format!(
                        "{} committed with bounds {:?} that differ from its mesh",
                        commit.mesh_id, commit.bounds
                    )));
                }
                commit.mesh.validate(commit.mesh_id.0)?;
            }
        }

        let mut meshes = self.meshes.write().unwrap_or_else(PoisonError::into_inner);
        for commit in commits {
            meshes.insert(commit.mesh_id, commit.mesh.clone());
        }
        self.commit_calls.fetch_add(1, Ordering::SeqCst);
        debug!("Committed {} meshes", commits.len());
        Ok(())
    }

    fn bake_collider(&self, mesh_id: MeshId, convex: bool) -> VoxelResult<()> {
        if !self
            .meshes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&mesh_id)
        {
            return Err(VoxelError::BakeFailed {
                mesh_id: mesh_id.0,
                reason: "no committed mesh".to_string(),
            });
        }
        let mut bakes = self.bakes.write().unwrap_or_else(PoisonError::into_inner);
        let record = bakes.entry(mesh_id).or_default();
        record.count += 1;
        record.convex = convex;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn factory_hands_out_distinct_ids() {
        let backend = InMemoryBackend::new();
        let a = backend.create_chunk_container(Point3::new(0, 0, 0));
        let b = backend.create_chunk_container(Point3::new(-1, 0, 0));
        assert_ne!(a, b);
        assert_eq!(backend.container_count(), 2);
        assert_eq!(backend.container_position(b), Some(Point3::new(-1, 0, 0)));
    }

    #[test]
    fn commit_requires_a_container() {
        let backend = InMemoryBackend::new();
        let mesh = PackedMesh::default();
        let commit = MeshCommit {
            mesh_id: MeshId(42),
            chunk_position: Point3::new(0, 0, 0),
            bounds: MeshBounds::CHUNK,
            mesh: &mesh,
        };
        assert!(matches!(
            backend.commit_meshes(&[commit]),
            Err(VoxelError::CommitFailed(_))
        ));
        assert_eq!(backend.commit_calls(), 0);
    }

    #[test]
    fn bake_needs_committed_mesh() {
        let backend = InMemoryBackend::new();
        let mesh_id = backend.create_chunk_container(Point3::new(0, 0, 0));
        assert!(backend.bake_collider(mesh_id, false).is_err());

        let mesh = PackedMesh::default();
        backend
            .commit_meshes(&[MeshCommit {
                mesh_id,
                chunk_position: Point3::new(0, 0, 0),
                bounds: mesh.bounds(),
                mesh: &mesh,
            }])
            .unwrap();
        backend.bake_collider(mesh_id, true).unwrap();
        assert_eq!(
            backend.bake_record(mesh_id),
            BakeRecord {
                count: 1,
                convex: true
            }
        );
        assert_eq!(backend.mesh(mesh_id), Some(mesh));
    }

    #[test]
    fn commit_rejects_foreign_bounds() {
        let backend = InMemoryBackend::new();
        let mesh_id = backend.create_chunk_container(Point3::new(0, 0, 0));
        let mesh = PackedMesh::default();
        let shifted = MeshBounds {
            center: [0.0; 3],
            ..MeshBounds::CHUNK
        };
        let result = backend.commit_meshes(&[MeshCommit {
            mesh_id,
            chunk_position: Point3::new(0, 0, 0),
            bounds: shifted,
            mesh: &mesh,
        }]);
        assert!(matches!(result, Err(VoxelError::CommitFailed(_))));
        assert_eq!(backend.mesh(mesh_id), None);
    }
}
