//! Buffer packing.
//!
//! A batch's geometry lives in two shared pools, one chunk after another. Generation
//! appends every chunk of the batch straight into the pools; each chunk's slice is then
//! located with exclusive prefix sums over the per-chunk [`CountPair`]s and copied into a
//! freshly sized [`PackedMesh`]. Slices never overlap and appear in batch order, so the
//! packed meshes of a batch add up to exactly the pools' contents.

use crate::engine_state::meshing::vertex::Vertex;
use crate::engine_state::voxels::{
    addressing::{CHUNK_SIZE, CHUNK_VOLUME},
    voxel::Voxel,
};
use crate::error::{VoxelError, VoxelResult};

use super::generation::{generate_chunk_mesh, CountPair};

const CHUNK_EDGE: f32 = CHUNK_SIZE as f32;

/// Index width used by packed meshes.
///
/// A single chunk can emit up to `6 * 6 * CHUNK_VOLUME / 2` indices, far past the 16-bit
/// range, so indices are always 32-bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexFormat {
    /// 32-bit unsigned indices.
    U32,
}

/// Axis-aligned bounds of a chunk mesh, in chunk-local space.
///
/// Every chunk mesh gets the same fixed box covering the whole chunk, so hosts can skip
/// recomputing bounds from the vertices on commit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshBounds {
    /// Centre of the box.
    pub center: [f32; 3],
    /// Edge lengths of the box.
    pub size: [f32; 3],
}

impl MeshBounds {
    /// The box spanning one chunk: centre `CHUNK_SIZE / 2`, size `CHUNK_SIZE`.
    pub const CHUNK: MeshBounds = MeshBounds {
        center: [CHUNK_EDGE / 2.0; 3],
        size: [CHUNK_EDGE; 3],
    };

    /// Minimum corner.
    pub fn min(&self) -> [f32; 3] {
        [0, 1, 2].map(|axis| self.center[axis] - self.size[axis] / 2.0)
    }

    /// Maximum corner.
    pub fn max(&self) -> [f32; 3] {
        [0, 1, 2].map(|axis| self.center[axis] + self.size[axis] / 2.0)
    }

    /// Returns `true` if `point` lies inside the box or on its surface.
    pub fn contains(&self, point: [f32; 3]) -> bool {
        let (min, max) = (self.min(), self.max());
        (0..3).all(|axis| (min[axis]..=max[axis]).contains(&point[axis]))
    }
}

impl Default for MeshBounds {
    fn default() -> Self {
        MeshBounds::CHUNK
    }
}

/// A contiguous triangle range within a packed mesh's index buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubMesh {
    /// First index of the range.
    pub index_start: u32,
    /// Number of indices in the range.
    pub index_count: u32,
}

/// Where one chunk's geometry sits inside the shared pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SliceRange {
    /// First vertex of the chunk's slice.
    pub vertex_start: usize,
    /// Number of vertices in the slice.
    pub vertex_count: usize,
    /// First index of the chunk's slice.
    pub index_start: usize,
    /// Number of indices in the slice.
    pub index_count: usize,
}

/// Computes each chunk's slice from the ordered per-chunk counts.
pub fn compute_slice_ranges(counts: &[CountPair]) -> Vec<SliceRange> {
    let mut vertex_start = 0;
    let mut index_start = 0;
    counts
        .iter()
        .map(|count| {
            let range = SliceRange {
                vertex_start,
                vertex_count: count.vertex_count as usize,
                index_start,
                index_count: count.index_count as usize,
            };
            vertex_start += range.vertex_count;
            index_start += range.index_count;
            range
        })
        .collect()
}

/// Shared, monotonically growing vertex and index pools for one batch.
///
/// The pools are long-lived scratch: they are cleared between batches, never shrunk.
#[derive(Debug, Default)]
pub struct MeshPools {
    counts: Vec<CountPair>,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl MeshPools {
    /// Creates empty pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the pools while keeping their allocations.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.vertices.clear();
        self.indices.clear();
    }

    /// Meshes one chunk's voxels straight into the pools and records its counts.
    ///
    /// # Errors
    /// `InvalidChunkData` if `voxels` does not hold exactly one chunk. Nothing is appended
    /// in that case.
    pub fn append_chunk(&mut self, voxels: &[Voxel]) -> VoxelResult<CountPair> {
        let count = generate_chunk_mesh(voxels, &mut self.vertices, &mut self.indices)?;
        self.counts.push(count);
        Ok(count)
    }

    /// Clears the pools and meshes every chunk of a contiguous batch buffer, in order.
    pub fn generate_batch(&mut self, batch_voxels: &[Voxel]) -> VoxelResult<()> {
        self.clear();
        batch_voxels
            .chunks(CHUNK_VOLUME)
            .try_for_each(|voxels| self.append_chunk(voxels).map(|_| ()))
    }

    /// Per-chunk counts, in batch order.
    pub fn counts(&self) -> &[CountPair] {
        &self.counts
    }

    /// All vertices of the batch.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All indices of the batch.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Slice of every chunk in the pools.
    pub fn slice_ranges(&self) -> Vec<SliceRange> {
        compute_slice_ranges(&self.counts)
    }

    /// Copies one chunk's slice into its own mesh buffer.
    ///
    /// # Errors
    /// `MalformedMesh` if the range reaches past the end of the pools.
    pub fn pack(&self, mesh_id: u64, range: &SliceRange) -> VoxelResult<PackedMesh> {
        let vertices = self
            .vertices
            .get(range.vertex_start..range.vertex_start + range.vertex_count)
            .ok_or_else(|| VoxelError::MalformedMesh {
                mesh_id,
                reason: format!("vertex range {:?} exceeds pool", range),
            })?;
        let indices = self
            .indices
            .get(range.index_start..range.index_start + range.index_count)
            .ok_or_else(|| VoxelError::MalformedMesh {
                mesh_id,
                reason: format!("index range {:?} exceeds pool", range),
            })?;

        Ok(PackedMesh {
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
            sub_mesh: SubMesh {
                index_start: 0,
                index_count: range.index_count as u32,
            },
            bounds: MeshBounds::CHUNK,
        })
    }
}

/// The destination buffer for one chunk: an interleaved vertex stream, a 32-bit index
/// stream, a single triangle sub-range covering all indices and the chunk's fixed bounds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PackedMesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    sub_mesh: SubMesh,
    bounds: MeshBounds,
}

impl PackedMesh {
    /// Index width of [`PackedMesh::indices`].
    pub const INDEX_FORMAT: IndexFormat = IndexFormat::U32;

    /// The vertex stream.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// The index stream.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The vertex stream as raw bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The index stream as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// The mesh's single triangle range.
    pub fn sub_mesh(&self) -> SubMesh {
        self.sub_mesh
    }

    /// Chunk-local bounds, fixed to the chunk's box.
    pub fn bounds(&self) -> MeshBounds {
        self.bounds
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of indices.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if the mesh holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Checks that the mesh forms whole triangles over existing vertices inside its bounds.
    pub fn validate(&self, mesh_id: u64) -> VoxelResult<()> {
        let malformed = |reason: String| VoxelError::MalformedMesh { mesh_id, reason };
        if self.indices.len() % 3 != 0 {
            return Err(malformed(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        if let Some(index) = self
            .indices
            .iter()
            .find(|index| **index as usize >= self.vertices.len())
        {
            return Err(malformed(format!(
                "index {} addresses one of only {} vertices",
                index,
                self.vertices.len()
            )));
        }
        if self.sub_mesh.index_start as usize + self.sub_mesh.index_count as usize
            > self.indices.len()
        {
            return Err(malformed("sub-mesh exceeds index buffer".to_string()));
        }
        if let Some(vertex) = self
            .vertices
            .iter()
            .find(|vertex| !self.bounds.contains(vertex.position()))
        {
            return Err(malformed(format!(
                "vertex at {:?} lies outside the mesh bounds",
                vertex.position()
            )));
        }
        Ok(())
    }
}
