//! Spatial primitives
//!
//! Transforms, look rotations and rays shared by the layer model and the
//! interaction engine. Conventions: +Y is up, an object's forward axis is +Z,
//! and an angle of 0 degrees around Y points along +Z.

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation and scale of an object in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a transform at `position` with no rotation and unit scale
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Affine matrix for this transform
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Decompose an affine matrix back into a transform
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation: rotation.normalize(),
            scale,
        }
    }

    /// World transform of `child` when parented under `self`
    pub fn compose(&self, child: &Transform) -> Transform {
        Self::from_matrix(&(self.to_matrix() * child.to_matrix()))
    }

    /// Express this world transform relative to `parent`
    ///
    /// Returns `None` when the parent collapses space (zero scale), in which
    /// case no meaningful local transform exists.
    pub fn relative_to(&self, parent: &Transform) -> Option<Transform> {
        let parent_matrix = parent.to_matrix();
        if parent_matrix.determinant().abs() <= f32::EPSILON {
            return None;
        }
        Some(Self::from_matrix(&(parent_matrix.inverse() * self.to_matrix())))
    }

    /// Rotate so the forward axis points at `target`
    ///
    /// Leaves the rotation untouched when `target` coincides with the
    /// position.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        if let Some(rotation) = look_rotation(target - self.position, up) {
            self.rotation = rotation;
        }
    }

    /// Forward (+Z) axis in world space
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }
}

/// Rotation whose forward axis is `forward` and whose up axis is as close to
/// `up` as possible
///
/// Returns `None` for a zero-length forward vector. When `up` is parallel to
/// `forward` an arbitrary perpendicular up is used.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let z = forward.try_normalize()?;
    let x = up
        .cross(z)
        .try_normalize()
        .unwrap_or_else(|| z.any_orthonormal_vector());
    let y = z.cross(x);
    Some(Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize())
}

/// Point on a horizontal circle at `angle_degrees` around `center`
///
/// Angle 0 lies on +Z; angles grow toward +X.
pub fn circle_point(center: Vec3, radius: f32, angle_degrees: f32) -> Vec3 {
    let angle = angle_degrees.to_radians();
    Vec3::new(
        center.x + radius * angle.sin(),
        center.y,
        center.z + radius * angle.cos(),
    )
}

/// Half-line used for gaze and pointer picking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction (zero when constructed from a zero vector)
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Distance along the ray to the first intersection with a sphere
    ///
    /// A ray starting inside the sphere reports the exit point.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        if self.direction == Vec3::ZERO || radius <= 0.0 {
            return None;
        }

        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        if far < 0.0 {
            None
        } else if near >= 0.0 {
            Some(near)
        } else {
            Some(far)
        }
    }
}
