//! Perspective camera state.

use std::cell::RefCell;
use std::rc::Rc;

use snapfit_math::{Point3, Vec3};

/// Camera shared between the director and the host renderer.
pub type SharedCamera = Rc<RefCell<CameraRig>>;

/// A look-at perspective camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    /// Eye position, world space.
    pub position: Point3,
    /// Look-at point, world space.
    pub target: Point3,
    /// Vertical field of view in degrees.
    pub fov_deg: f64,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 10.0),
            target: Point3::origin(),
            fov_deg: 50.0,
        }
    }
}

impl CameraRig {
    /// A camera at `position` looking at `target`.
    pub fn new(position: Point3, target: Point3, fov_deg: f64) -> Self {
        Self {
            position,
            target,
            fov_deg,
        }
    }

    /// Wrap in a [`SharedCamera`].
    pub fn shared(self) -> SharedCamera {
        Rc::new(RefCell::new(self))
    }

    /// Unit vector from eye to look-at point; `-Z` when they coincide.
    pub fn view_direction(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize(1e-12)
            .unwrap_or_else(|| -Vec3::z())
    }

    /// Eye-to-target distance.
    pub fn distance(&self) -> f64 {
        (self.target - self.position).norm()
    }

    /// Distance at which a sphere of diameter `diagonal` fills the vertical
    /// field of view, scaled by `zoom` (above 1 leaves a margin).
    pub fn fit_distance(&self, diagonal: f64, zoom: f64) -> f64 {
        let half_fov = self.fov_deg.to_radians() / 2.0;
        (diagonal / 2.0) / half_fov.tan() * zoom
    }

    /// Up vector for a look-at matrix that does not flip when looking
    /// straight up or down.
    pub fn stable_up(&self) -> Vec3 {
        let dir = self.view_direction();
        if dir.y.abs() > 0.99 {
            if dir.y > 0.0 {
                Vec3::z()
            } else {
                -Vec3::z()
            }
        } else {
            Vec3::y()
        }
    }
}
