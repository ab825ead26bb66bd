#![warn(missing_docs)]

//! Math types for the snapfit assembly solver.
//!
//! nalgebra aliases for points, vectors and rotations, an affine node
//! transform, axis helpers used by the detectors and the box fallback, and
//! the two interpolants the camera paths need.

mod aabb;

pub use aabb::Aabb3;

use nalgebra::{Matrix4, UnitQuaternion, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit quaternion rotation.
pub type Quat = UnitQuaternion<f64>;

/// An affine node transform stored as a 4x4 matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vec3::new(dx, dy, dz)),
        }
    }

    /// Translation * rotation * scale, the scene-node composition.
    pub fn from_trs(translation: &Vec3, rotation: &Quat, scale: &Vec3) -> Self {
        Self {
            matrix: Matrix4::new_translation(translation)
                * rotation.to_homogeneous()
                * Matrix4::new_nonuniform_scaling(scale),
        }
    }

    /// `self * other`: applies `other` first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a displacement; translation does not apply.
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Inverse, or `None` for a singular transform (zero scale).
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// The X axis.
    X,
    /// The Y axis.
    #[default]
    Y,
    /// The Z axis.
    Z,
}

impl Axis {
    /// All three axes in index order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index (0, 1, 2).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// The axis carrying the largest absolute component of `v`, with the
    /// sign of that component (+1.0 or -1.0). Ties go to the lower index.
    pub fn dominant(v: &Vec3) -> (Axis, f64) {
        let mut best = Axis::X;
        for axis in [Axis::Y, Axis::Z] {
            if v[axis.index()].abs() > v[best.index()].abs() {
                best = axis;
            }
        }
        let sign = if v[best.index()] < 0.0 { -1.0 } else { 1.0 };
        (best, sign)
    }

    /// A secondary axis perpendicular to `self`, used to split a probe
    /// into left/right sub-regions.
    pub fn secondary(self) -> Axis {
        match self {
            Axis::X => Axis::Z,
            Axis::Y => Axis::X,
            Axis::Z => Axis::X,
        }
    }
}

/// Linear interpolation between two points.
pub fn lerp_point(a: &Point3, b: &Point3, t: f64) -> Point3 {
    a + (b - a) * t
}

/// Evaluate a quadratic Bezier curve with a single control point.
pub fn quadratic_bezier(p0: &Point3, control: &Point3, p1: &Point3, t: f64) -> Point3 {
    let u = 1.0 - t;
    Point3::from(p0.coords * (u * u) + control.coords * (2.0 * u * t) + p1.coords * (t * t))
}

/// Convert a `[x, y, z]` array (the serialized form) to a vector.
pub fn vec3_from_array(v: [f64; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}
