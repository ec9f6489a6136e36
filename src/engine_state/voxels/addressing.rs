//! # Chunk Grid Addressing
//!
//! Pure functions translating between the three coordinate spaces of the voxel world:
//!
//! * **World space**: continuous `f32` positions.
//! * **Chunk space**: integer chunk coordinates, one unit per `CHUNK_SIZE` voxels.
//! * **Local space**: a voxel's coordinate inside its chunk, in `[0, CHUNK_SIZE)` per axis,
//!   or equivalently its flat local index in `[0, CHUNK_VOLUME)`.
//!
//! Local indices are laid out x-fastest: `index = x + y * CHUNK_SIZE + z * CHUNK_SIZE²`.
//!
//! Every voxel read or write in the crate is resolved through
//! [`world_to_chunk_and_local`]. Out-of-range inputs are rejected with an error rather
//! than wrapped or clamped.

use cgmath::Point3;

use crate::error::{VoxelError, VoxelResult};

/// The length of each edge of a chunk, in voxels.
pub const CHUNK_SIZE: i32 = 32;
/// The number of voxels in one z-slice of a chunk (CHUNK_SIZE²).
pub const CHUNK_PLANE_SIZE: i32 = CHUNK_SIZE * CHUNK_SIZE;
/// The number of voxels in a chunk (CHUNK_SIZE³).
pub const CHUNK_VOLUME: usize = (CHUNK_PLANE_SIZE * CHUNK_SIZE) as usize;

/// Returns `true` if every component lies in `[0, CHUNK_SIZE)`.
#[inline]
pub fn coord_in_bounds(coord: Point3<i32>) -> bool {
    (0..CHUNK_SIZE).contains(&coord.x)
        && (0..CHUNK_SIZE).contains(&coord.y)
        && (0..CHUNK_SIZE).contains(&coord.z)
}

/// Returns `true` if the index lies in `[0, CHUNK_VOLUME)`.
#[inline]
pub fn index_in_bounds(index: usize) -> bool {
    index < CHUNK_VOLUME
}

/// Flattens a local coordinate. Callers must have checked [`coord_in_bounds`].
#[inline]
pub(crate) fn flatten(coord: Point3<i32>) -> usize {
    (coord.x + coord.y * CHUNK_SIZE + coord.z * CHUNK_PLANE_SIZE) as usize
}

/// Expands a local index. Callers must have checked [`index_in_bounds`].
#[inline]
pub(crate) fn expand(index: usize) -> Point3<i32> {
    let index = index as i32;
    Point3::new(
        index % CHUNK_SIZE,
        index / CHUNK_SIZE % CHUNK_SIZE,
        index / CHUNK_PLANE_SIZE,
    )
}

/// Converts a local coordinate to its flat index.
///
/// # Errors
/// `CoordOutOfRange` if any component falls outside the chunk.
pub fn coord_to_local_index(coord: Point3<i32>) -> VoxelResult<usize> {
    if !coord_in_bounds(coord) {
        return Err(VoxelError::CoordOutOfRange {
            x: coord.x,
            y: coord.y,
            z: coord.z,
        });
    }
    Ok(flatten(coord))
}

/// Converts a flat local index back to its local coordinate.
///
/// # Errors
/// `IndexOutOfRange` if `index >= CHUNK_VOLUME`.
pub fn local_index_to_coord(index: usize) -> VoxelResult<Point3<i32>> {
    if !index_in_bounds(index) {
        return Err(VoxelError::IndexOutOfRange { index });
    }
    Ok(expand(index))
}

/// Floors a world-space component onto the integer lattice.
fn floor_component(value: f32) -> Option<i32> {
    let floored = value.floor();
    // i32::MAX is not representable as f32; 2^31 is the first value past the range.
    if floored.is_finite() && floored >= i32::MIN as f32 && floored < 2_147_483_648.0 {
        Some(floored as i32)
    } else {
        None
    }
}

/// Resolves a world-space position to the chunk that contains it and the voxel's
/// local index within that chunk.
///
/// The position is floored first; the chunk coordinate is then the floored division by
/// `CHUNK_SIZE` and the local coordinate the true (non-negative) modulo, so
/// `(-1, -1, -1)` lands in chunk `(-1, -1, -1)` at local `(31, 31, 31)`.
///
/// # Errors
/// `InvalidWorldPosition` for NaN, infinite, or out-of-`i32` components.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_chunk_mesher::{world_to_chunk_and_local, coord_to_local_index};
///
/// let (chunk, index) = world_to_chunk_and_local(Point3::new(-1.0, -1.0, -1.0)).unwrap();
/// assert_eq!(chunk, Point3::new(-1, -1, -1));
/// assert_eq!(index, coord_to_local_index(Point3::new(31, 31, 31)).unwrap());
/// ```
pub fn world_to_chunk_and_local(position: Point3<f32>) -> VoxelResult<(Point3<i32>, usize)> {
    let invalid = || VoxelError::InvalidWorldPosition {
        x: position.x,
        y: position.y,
        z: position.z,
    };
    let floored = Point3::new(
        floor_component(position.x).ok_or_else(invalid)?,
        floor_component(position.y).ok_or_else(invalid)?,
        floor_component(position.z).ok_or_else(invalid)?,
    );

    let local = Point3::new(
        floored.x.rem_euclid(CHUNK_SIZE),
        floored.y.rem_euclid(CHUNK_SIZE),
        floored.z.rem_euclid(CHUNK_SIZE),
    );
    let chunk = Point3::new(
        floored.x.div_euclid(CHUNK_SIZE),
        floored.y.div_euclid(CHUNK_SIZE),
        floored.z.div_euclid(CHUNK_SIZE),
    );

    Ok((chunk, flatten(local)))
}

/// World-space position of the minimum corner of a chunk.
pub fn chunk_world_origin(chunk: Point3<i32>) -> Point3<i32> {
    Point3::new(
        chunk.x.saturating_mul(CHUNK_SIZE),
        chunk.y.saturating_mul(CHUNK_SIZE),
        chunk.z.saturating_mul(CHUNK_SIZE),
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn index_round_trip_over_whole_volume() {
        for index in 0..CHUNK_VOLUME {
            let coord = local_index_to_coord(index).unwrap();
            assert!(coord_in_bounds(coord));
            assert_eq!(coord_to_local_index(coord).unwrap(), index);
        }
    }

    #[test]
    fn index_layout_is_x_fastest() {
        assert_eq!(coord_to_local_index(Point3::new(1, 0, 0)).unwrap(), 1);
        assert_eq!(coord_to_local_index(Point3::new(0, 1, 0)).unwrap(), 32);
        assert_eq!(coord_to_local_index(Point3::new(0, 0, 1)).unwrap(), 1024);
        assert_eq!(
            coord_to_local_index(Point3::new(31, 31, 31)).unwrap(),
            CHUNK_VOLUME - 1
        );
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(matches!(
            local_index_to_coord(CHUNK_VOLUME),
            Err(VoxelError::IndexOutOfRange { index }) if index == CHUNK_VOLUME
        ));
        assert!(coord_to_local_index(Point3::new(-1, 0, 0)).is_err());
        assert!(coord_to_local_index(Point3::new(0, 32, 0)).is_err());
        assert!(!coord_in_bounds(Point3::new(0, 0, 32)));
        assert!(!index_in_bounds(CHUNK_VOLUME));
        assert!(index_in_bounds(0));
    }

    #[test]
    fn origin_maps_to_first_chunk() {
        let (chunk, index) = world_to_chunk_and_local(Point3::new(0.0, 0.0, 0.0)).unwrap();
        assert_eq!(chunk, Point3::new(0, 0, 0));
        assert_eq!(index, 0);
    }

    #[test]
    fn negative_positions_floor_into_negative_chunks() {
        let (chunk, index) = world_to_chunk_and_local(Point3::new(-1.0, -1.0, -1.0)).unwrap();
        assert_eq!(chunk, Point3::new(-1, -1, -1));
        assert_eq!(local_index_to_coord(index).unwrap(), Point3::new(31, 31, 31));

        let (chunk, index) = world_to_chunk_and_local(Point3::new(-0.5, 0.5, -32.0)).unwrap();
        assert_eq!(chunk, Point3::new(-1, 0, -1));
        assert_eq!(local_index_to_coord(index).unwrap(), Point3::new(31, 0, 0));

        let (chunk, index) = world_to_chunk_and_local(Point3::new(-33.0, 0.0, 0.0)).unwrap();
        assert_eq!(chunk, Point3::new(-2, 0, 0));
        assert_eq!(local_index_to_coord(index).unwrap(), Point3::new(31, 0, 0));
    }

    #[test]
    fn chunk_edges_split_correctly() {
        let (chunk, index) = world_to_chunk_and_local(Point3::new(31.9, 32.0, 64.5)).unwrap();
        assert_eq!(chunk, Point3::new(0, 1, 2));
        assert_eq!(local_index_to_coord(index).unwrap(), Point3::new(31, 0, 0));
    }

    #[test]
    fn non_finite_positions_are_rejected() {
        assert!(world_to_chunk_and_local(Point3::new(f32::NAN, 0.0, 0.0)).is_err());
        assert!(world_to_chunk_and_local(Point3::new(0.0, f32::INFINITY, 0.0)).is_err());
        assert!(world_to_chunk_and_local(Point3::new(0.0, 0.0, 1.0e12)).is_err());
    }

    #[test]
    fn chunk_origin_scales_by_chunk_size() {
        assert_eq!(chunk_world_origin(Point3::new(-1, 0, 2)), Point3::new(-32, 0, 64));
    }
}
