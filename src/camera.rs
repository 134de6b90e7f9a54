use glam::{Mat4, Vec3, Vec4};

pub const DEFAULT_POSITION: Vec3 = Vec3::ZERO;
pub const DEFAULT_TARGET: Vec3 = Vec3::new(0.0, 0.0, -1.0);
pub const DEFAULT_UP: Vec3 = Vec3::Y;

/// Look-at camera.
///
/// `up` must not be parallel to `position - target`; a degenerate basis
/// produces NaN in [`Camera::view`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: DEFAULT_POSITION,
            target: DEFAULT_TARGET,
            up: DEFAULT_UP,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Basis of the camera in world space: right, true up, backward
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let z_axis = (self.position - self.target).normalize();
        let x_axis = self.up.cross(z_axis).normalize();
        let y_axis = z_axis.cross(x_axis).normalize();
        (x_axis, y_axis, z_axis)
    }

    /// World-to-view matrix
    pub fn view(&self) -> Mat4 {
        let (x_axis, y_axis, z_axis) = self.basis();
        let camera = Mat4::from_cols(
            x_axis.extend(0.0),
            y_axis.extend(0.0),
            z_axis.extend(0.0),
            Vec4::new(self.position.x, self.position.y, self.position.z, 1.0),
        );
        camera.inverse()
    }
}
