//! # Block Side Module
//!
//! This module defines the six faces of a voxel and the fixed geometry used to emit a
//! quad for each of them: the neighbour offset checked for culling, the face normal, and
//! the four unit-cube corners of the face in emission order.

use cgmath::{Point3, Vector3};

/// The eight corners of a unit cube, relative to the voxel's minimum corner.
pub const CUBE_CORNERS: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, 1.0, 0.0],
];

/// Indices into [`CUBE_CORNERS`] for each face, four per face in `BlockSide` order.
///
/// Combined with the quad index pattern `0, 1, 2, 2, 1, 3`, both triangles of every face
/// have `(v1 - v0) x (v2 - v0)` pointing along the outward normal.
const FACE_CORNERS: [[usize; 4]; 6] = [
    [5, 4, 1, 0], // X-
    [7, 6, 3, 2], // X+
    [2, 1, 3, 0], // Y-
    [7, 4, 6, 5], // Y+
    [4, 7, 0, 3], // Z-
    [6, 5, 2, 1], // Z+
];

/// Represents the six possible faces of a voxel block.
///
/// The discriminants are the order in which the mesher visits faces, so they also fix
/// the order of emitted quads for a voxel.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The left face (facing negative X)
    LEFT = 0,

    /// The right face (facing positive X)
    RIGHT = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The back face (facing negative Z)
    BACK = 4,

    /// The front face (facing positive Z)
    FRONT = 5,
}

impl BlockSide {
    /// Returns all six faces in emission order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::LEFT,
            BlockSide::RIGHT,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::BACK,
            BlockSide::FRONT,
        ]
    }

    /// Offset from a voxel to the neighbour sharing this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::BACK => Vector3::new(0, 0, -1),
            BlockSide::FRONT => Vector3::new(0, 0, 1),
        }
    }

    /// Outward unit normal of this face.
    pub fn normal(self) -> [f32; 3] {
        let offset = self.offset();
        [offset.x as f32, offset.y as f32, offset.z as f32]
    }

    /// The neighbouring voxel coordinate across this face. May lie outside the chunk.
    #[inline]
    pub fn neighbor(self, position: Point3<i32>) -> Point3<i32> {
        position + self.offset()
    }

    /// The four corners of this face for a voxel at `position`, in emission order.
    pub fn corners(self, position: Point3<i32>) -> [[f32; 3]; 4] {
        let base = [position.x as f32, position.y as f32, position.z as f32];
        FACE_CORNERS[self as usize].map(|corner| {
            let offset = CUBE_CORNERS[corner];
            [
                base[0] + offset[0],
                base[1] + offset[1],
                base[2] + offset[2],
            ]
        })
    }
}
