//! Culled face extraction.
//!
//! For every non-empty voxel, each of its six faces is emitted as a quad unless the
//! neighbour across that face is inside the chunk and non-empty. Faces on the chunk
//! boundary are always emitted: neighbouring chunks are not consulted, so two solid
//! voxels touching across a chunk border both keep their shared face.

use crate::engine_state::voxels::{
    addressing::{coord_in_bounds, expand, flatten, CHUNK_VOLUME},
    block_side::BlockSide,
    voxel::Voxel,
};
use crate::error::{VoxelError, VoxelResult};

use super::super::vertex::Vertex;

/// UV corners assigned to the four vertices of every quad, in emission order.
pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [0.0, 0.0], [1.0, 0.0]];

/// Index pattern of a quad: two triangles sharing the `v1`-`v2` diagonal.
pub const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 1, 3];

/// Number of vertices and indices a chunk contributed to the shared pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountPair {
    /// Vertices emitted for the chunk.
    pub vertex_count: u32,
    /// Indices emitted for the chunk.
    pub index_count: u32,
}

impl CountPair {
    fn add_quad(&mut self) {
        self.vertex_count += 4;
        self.index_count += 6;
    }
}

/// Geometry generated for a single chunk, with indices relative to its own vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshSection {
    /// Emitted vertices.
    pub vertices: Vec<Vertex>,
    /// Emitted indices, each addressing `vertices`.
    pub indices: Vec<u32>,
}

impl MeshSection {
    /// Meshes one chunk's voxels into a fresh section.
    pub fn generate(voxels: &[Voxel]) -> VoxelResult<Self> {
        let mut section = MeshSection::default();
        generate_chunk_mesh(voxels, &mut section.vertices, &mut section.indices)?;
        Ok(section)
    }

    /// Vertex and index totals of this section.
    pub fn counts(&self) -> CountPair {
        CountPair {
            vertex_count: self.vertices.len() as u32,
            index_count: self.indices.len() as u32,
        }
    }

    /// Number of quads in this section.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }
}

/// Scans one chunk and appends its exposed faces to `vertices` and `indices`.
///
/// Indices are relative to the first vertex appended by this call, so each chunk's
/// slice of the pools is self-contained. Voxels are visited in local-index order and
/// faces in [`BlockSide`] order, which fixes the output order.
///
/// # Errors
/// `InvalidChunkData` if `voxels` does not hold exactly `CHUNK_VOLUME` entries.
pub fn generate_chunk_mesh(
    voxels: &[Voxel],
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
) -> VoxelResult<CountPair> {
    if voxels.len() != CHUNK_VOLUME {
        return Err(VoxelError::InvalidChunkData {
            expected: CHUNK_VOLUME,
            actual: voxels.len(),
        });
    }

    let mut count = CountPair::default();
    for (index, voxel) in voxels.iter().enumerate() {
        if voxel.is_empty() {
            continue;
        }
        let position = expand(index);

        for side in BlockSide::all() {
            let neighbor = side.neighbor(position);
            if coord_in_bounds(neighbor) && !voxels[flatten(neighbor)].is_empty() {
                continue;
            }

            let normal = side.normal();
            for (corner, uv) in side.corners(position).into_iter().zip(QUAD_UVS) {
                vertices.push(Vertex::new(corner, normal, uv));
            }
            indices.extend(QUAD_INDICES.iter().map(|i| count.vertex_count + i));
            count.add_quad();
        }
    }

    Ok(count)
}

#[cfg(test)]
mod test {
    use super::*;
    use cgmath::Point3;

    use crate::engine_state::voxels::addressing::coord_to_local_index;

    fn chunk_with(solid: &[Point3<i32>]) -> Vec<Voxel> {
        let mut voxels = vec![Voxel::EMPTY; CHUNK_VOLUME];
        for coord in solid {
            voxels[coord_to_local_index(*coord).unwrap()] = Voxel::new(1);
        }
        voxels
    }

    #[test]
    fn empty_chunk_has_no_geometry() {
        let section = MeshSection::generate(&chunk_with(&[])).unwrap();
        assert_eq!(section.counts(), CountPair::default());
    }

    #[test]
    fn lone_voxel_is_a_full_cube() {
        let section = MeshSection::generate(&chunk_with(&[Point3::new(4, 5, 6)])).unwrap();
        assert_eq!(
            section.counts(),
            CountPair {
                vertex_count: 24,
                index_count: 36
            }
        );
        for vertex in &section.vertices {
            let p = vertex.position();
            assert!((4.0..=5.0).contains(&p[0]));
            assert!((5.0..=6.0).contains(&p[1]));
            assert!((6.0..=7.0).contains(&p[2]));
        }
    }

    #[test]
    fn shared_face_is_culled_on_both_sides() {
        let section =
            MeshSection::generate(&chunk_with(&[Point3::new(1, 1, 1), Point3::new(2, 1, 1)]))
                .unwrap();
        assert_eq!(section.quad_count(), 10);
        assert_eq!(section.counts().vertex_count, 40);
        assert_eq!(section.counts().index_count, 60);
    }

    #[test]
    fn boundary_faces_are_exposed() {
        let section = MeshSection::generate(&chunk_with(&[Point3::new(0, 0, 0)])).unwrap();
        assert_eq!(section.quad_count(), 6);

        // A fully solid chunk only shows its outer shell.
        let solid = vec![Voxel::new(2); CHUNK_VOLUME];
        let section = MeshSection::generate(&solid).unwrap();
        assert_eq!(section.quad_count(), 6 * 32 * 32);
    }

    #[test]
    fn quads_use_fixed_index_pattern_and_uvs() {
        let section = MeshSection::generate(&chunk_with(&[Point3::new(0, 0, 0)])).unwrap();
        assert_eq!(&section.indices[..6], &[0, 1, 2, 2, 1, 3]);
        assert_eq!(&section.indices[6..12], &[4, 5, 6, 6, 5, 7]);
        for (vertex, uv) in section.vertices[..4].iter().zip(QUAD_UVS) {
            assert_eq!(vertex.uv(), uv);
            assert_eq!(vertex.normal(), [-1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn appends_after_existing_pool_contents() {
        let mut vertices = vec![Vertex::default(); 3];
        let mut indices = vec![99];
        let count = generate_chunk_mesh(
            &chunk_with(&[Point3::new(3, 3, 3)]),
            &mut vertices,
            &mut indices,
        )
        .unwrap();
        assert_eq!(count.vertex_count, 24);
        assert_eq!(vertices.len(), 27);
        assert_eq!(indices.len(), 37);
        // Indices stay chunk-relative.
        assert_eq!(indices[1], 0);
        assert_eq!(*indices.last().unwrap(), 23);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = MeshSection::generate(&[Voxel::new(1); 8]).unwrap_err();
        assert!(matches!(
            err,
            VoxelError::InvalidChunkData { expected, actual: 8 } if expected == CHUNK_VOLUME
        ));
    }

    #[test]
    fn random_fill_matches_exposed_face_count() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let mut voxels = vec![Voxel::EMPTY; CHUNK_VOLUME];
        for voxel in voxels.iter_mut() {
            if rng.f32() < 0.3 {
                *voxel = Voxel::new(rng.u8(1..=255));
            }
        }

        let mut expected = 0;
        for (index, voxel) in voxels.iter().enumerate() {
            if voxel.is_empty() {
                continue;
            }
            let position = expand(index);
            expected += BlockSide::all()
                .iter()
                .filter(|side| {
                    let n = side.neighbor(position);
                    !coord_in_bounds(n) || voxels[flatten(n)].is_empty()
                })
                .count();
        }

        let section = MeshSection::generate(&voxels).unwrap();
        assert_eq!(section.quad_count(), expected);
        assert_eq!(section.indices.len(), expected * 6);
        assert!(section
            .indices
            .iter()
            .all(|i| (*i as usize) < section.vertices.len()));
    }
}
