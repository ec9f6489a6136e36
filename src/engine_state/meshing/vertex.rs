//! Vertex data structures and layouts for chunk meshes.
//!
//! This module defines the vertex format emitted by the mesher and the attribute layout
//! description handed to the mesh commit collaborator alongside the raw bytes.

/// Semantic of one vertex attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexAttribute {
    /// Object-space position.
    Position,
    /// Surface normal.
    Normal,
    /// First texture coordinate set.
    TexCoord0,
}

/// Placement of one attribute inside the interleaved vertex stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VertexAttributeDescriptor {
    /// What the attribute holds.
    pub attribute: VertexAttribute,
    /// Number of `f32` components.
    pub dimension: u32,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
}

/// A vertex in a chunk mesh.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Normal: 3x f32 (12 bytes)
/// - Texture Coordinates: 2x f32 (8 bytes)
///
/// Total size: 32 bytes, single interleaved stream.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in chunk-local space
    position: [f32; 3],
    /// Face normal
    normal: [f32; 3],
    /// UV texture coordinates (0.0 or 1.0 on each axis)
    uv: [f32; 2],
}

impl Vertex {
    /// Attribute layout of the vertex stream.
    pub const ATTRIBUTES: [VertexAttributeDescriptor; 3] = [
        VertexAttributeDescriptor {
            attribute: VertexAttribute::Position,
            dimension: 3,
            offset: 0,
        },
        VertexAttributeDescriptor {
            attribute: VertexAttribute::Normal,
            dimension: 3,
            offset: std::mem::size_of::<[f32; 3]>() as u32,
        },
        VertexAttributeDescriptor {
            attribute: VertexAttribute::TexCoord0,
            dimension: 2,
            offset: std::mem::size_of::<[f32; 6]>() as u32,
        },
    ];

    /// Byte stride between consecutive vertices.
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();

    /// Creates a new vertex.
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Vertex {
            position,
            normal,
            uv,
        }
    }

    /// Position in chunk-local space.
    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    /// Face normal.
    pub fn normal(&self) -> [f32; 3] {
        self.normal
    }

    /// Texture coordinate.
    pub fn uv(&self) -> [f32; 2] {
        self.uv
    }
}
