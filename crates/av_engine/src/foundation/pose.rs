//! Pose, lens, and viewpoint value types
//!
//! A pose is a position plus a unit-quaternion orientation; a lens holds
//! the perspective parameters. Together they describe a viewpoint. All
//! three are plain value types, copied freely.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Quat, Vec3};

/// Position and orientation in 3D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Position
    pub position: Vec3,

    /// Orientation as a unit quaternion
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Quat::identity(),
        }
    }
}

impl Pose {
    /// Create a pose at a position with identity orientation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Local -z axis: the direction this pose faces
    pub fn forward(&self) -> Vec3 {
        self.orientation * -Vec3::z()
    }

    /// Local +x axis
    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::x()
    }

    /// Local +y axis
    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::y()
    }

    /// Rigid-body matrix placing local coordinates into the world
    pub fn matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position) * self.orientation.to_homogeneous()
    }

    /// View matrix: the inverse of `matrix()`, for use as a camera
    pub fn view_matrix(&self) -> Mat4 {
        let inv_orientation = self.orientation.inverse();
        inv_orientation.to_homogeneous() * Mat4::new_translation(&-self.position)
    }

    /// Map a world-space point into this pose's local frame
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.orientation.inverse() * (world - self.position)
    }

    /// Turn to face a target point, keeping the given up direction
    pub fn face_toward(&mut self, target: Vec3, up: Vec3) {
        let dir = target - self.position;
        if dir.norm_squared() > f32::EPSILON {
            self.orientation = Quat::face_towards(&-dir, &up);
        }
    }
}

/// Perspective lens parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    /// Vertical field of view in degrees
    pub fovy_deg: f32,

    /// Near clip plane distance
    pub near: f32,

    /// Far clip plane distance
    pub far: f32,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fovy_deg: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Lens {
    /// Create a lens
    pub fn new(fovy_deg: f32, near: f32, far: f32) -> Self {
        Self { fovy_deg, near, far }
    }

    /// Projection matrix for the given aspect ratio (width / height)
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(utils::deg_to_rad(self.fovy_deg), aspect.max(1e-6), self.near, self.far)
    }
}

/// A pose looked through a lens
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewpoint {
    /// Where the viewpoint sits and faces
    pub pose: Pose,

    /// Perspective parameters
    pub lens: Lens,
}

impl Viewpoint {
    /// Create a viewpoint
    pub fn new(pose: Pose, lens: Lens) -> Self {
        Self { pose, lens }
    }

    /// View matrix of the pose
    pub fn view_matrix(&self) -> Mat4 {
        self.pose.view_matrix()
    }

    /// Projection matrix of the lens
    pub fn projection(&self, aspect: f32) -> Mat4 {
        self.lens.projection(aspect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::foundation::math::Vec4;

    #[test]
    fn default_pose_faces_negative_z() {
        let pose = Pose::default();
        let fwd = pose.forward();
        assert_relative_eq!(fwd.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn view_matrix_inverts_pose_matrix() {
        let mut pose = Pose::from_position(Vec3::new(1.0, 2.0, 3.0));
        pose.face_toward(Vec3::new(4.0, 2.0, 3.0), Vec3::y());

        let round_trip = pose.matrix() * pose.view_matrix();
        let p = round_trip * Vec4::new(0.5, -0.25, 2.0, 1.0);
        assert_relative_eq!(p.x, 0.5, epsilon = 1e-4);
        assert_relative_eq!(p.y, -0.25, epsilon = 1e-4);
        assert_relative_eq!(p.z, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn to_local_recenters_on_pose() {
        let pose = Pose::from_position(Vec3::new(0.0, 0.0, -5.0));
        let local = pose.to_local(Vec3::new(3.0, 0.0, -5.0));
        assert_relative_eq!(local.x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(local.z, 0.0, epsilon = 1e-5);
    }
}
