use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Integer address of one square chunk on the XZ ground plane.
///
/// Ordered so chunk tables iterate deterministically.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a world position, flooring on both axes.
    pub fn from_position(pos: Vec3, chunk_size: f32) -> Self {
        Self {
            x: (pos.x / chunk_size).floor() as i32,
            z: (pos.z / chunk_size).floor() as i32,
        }
    }

    /// Coordinate shifted by a whole number of chunks, pinned at the
    /// edges of the addressable grid.
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }

    /// World-space origin (minimum corner of the footprint) at ground height.
    pub fn origin(self, chunk_size: f32) -> Vec3 {
        Vec3::new(self.x as f32 * chunk_size, 0.0, self.z as f32 * chunk_size)
    }

    /// World-space center of the footprint at ground height.
    pub fn center(self, chunk_size: f32) -> Vec3 {
        self.origin(chunk_size) + Vec3::new(chunk_size * 0.5, 0.0, chunk_size * 0.5)
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// An axis-aligned box of the given size centered at `position`.
    pub fn boxed(position: Vec3, size: Vec3) -> Self {
        Self {
            position,
            scale: size,
            ..Self::default()
        }
    }

    /// Rotate about +Y so local +Z points along the horizontal part of `dir`.
    pub fn facing(mut self, dir: Vec3) -> Self {
        let flat = Vec3::new(dir.x, 0.0, dir.z);
        if flat.length_squared() > f32::EPSILON {
            self.rotation = Quat::from_rotation_y(flat.x.atan2(flat.z));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_position_floors_negative_axes() {
        let c = ChunkCoord::from_position(Vec3::new(-0.5, 3.0, 39.9), 20.0);
        assert_eq!(c, ChunkCoord::new(-1, 1));

        let c = ChunkCoord::from_position(Vec3::new(-20.0, 0.0, -20.01), 20.0);
        assert_eq!(c, ChunkCoord::new(-1, -2));
    }

    #[test]
    fn far_positions_pin_to_grid_edge() {
        let far = ChunkCoord::from_position(Vec3::new(2.0e12, 0.0, -2.0e12), 20.0);
        assert_eq!(far, ChunkCoord::new(i32::MAX, i32::MIN));
        assert_eq!(far.offset(2, -2), far);
        assert_eq!(far.offset(-1, 1), ChunkCoord::new(i32::MAX - 1, i32::MIN + 1));
    }

    #[test]
    fn origin_and_center() {
        let c = ChunkCoord::new(2, -1);
        assert_eq!(c.origin(20.0), Vec3::new(40.0, 0.0, -20.0));
        assert_eq!(c.center(20.0), Vec3::new(50.0, 0.0, -10.0));
    }

    #[test]
    fn coords_order_by_x_then_z() {
        let mut v = vec![
            ChunkCoord::new(1, 0),
            ChunkCoord::new(0, 5),
            ChunkCoord::new(0, -1),
        ];
        v.sort();
        assert_eq!(
            v,
            vec![
                ChunkCoord::new(0, -1),
                ChunkCoord::new(0, 5),
                ChunkCoord::new(1, 0)
            ]
        );
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn facing_points_local_z_along_direction() {
        let t = Transform::default().facing(Vec3::new(1.0, 0.0, 0.0));
        let fwd = t.rotation * Vec3::Z;
        assert!((fwd - Vec3::X).length() < 1e-5);

        // Vertical-only directions leave the rotation untouched.
        let t = Transform::default().facing(Vec3::Y);
        assert_eq!(t.rotation, Quat::IDENTITY);
    }
}
