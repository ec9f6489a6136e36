//! # Voxel Module
//!
//! The minimal value stored in every cell of a chunk.

use bytemuck::{Pod, Zeroable};

/// A single voxel value.
///
/// `id == 0` means empty (air). Any other id is occupied; the mesher only distinguishes
/// empty from non-empty, the id itself is opaque to it. Voxels are plain values: they are
/// copied in and out of chunks and compared by value.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Voxel {
    /// Content identifier. Zero is reserved for empty space.
    pub id: u8,
}

impl Voxel {
    /// The empty voxel.
    pub const EMPTY: Voxel = Voxel { id: 0 };

    /// Creates a voxel with the given content id.
    pub const fn new(id: u8) -> Self {
        Voxel { id }
    }

    /// Returns `true` for air.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.id == 0
    }
}
