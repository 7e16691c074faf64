use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Perspective camera looking down -Z, the header's fixed point of view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub fov_y_radians: f32,
    pub aspect_ratio: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, width: u32, height: u32) -> Self {
        Self {
            position: config.position,
            fov_y_radians: config.fov_y_degrees.to_radians(),
            aspect_ratio: aspect(width, height),
            znear: config.znear,
            zfar: config.zfar,
        }
    }

    /// Update aspect ratio for a resize
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = aspect(width, height);
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect_ratio, self.znear, self.zfar)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space right and up axes, used to face billboards toward the camera
    pub fn billboard_axes(&self) -> (Vec3, Vec3) {
        let inverse = self.view_matrix().inverse();
        (inverse.x_axis.truncate(), inverse.y_axis.truncate())
    }
}

fn aspect(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_updates_aspect() {
        let mut camera = Camera::new(&CameraConfig::default(), 800, 200);
        assert_eq!(camera.aspect_ratio, 4.0);
        camera.resize(300, 300);
        assert_eq!(camera.aspect_ratio, 1.0);
        camera.resize(0, 300);
        assert_eq!(camera.aspect_ratio, 1.0);
    }

    #[test]
    fn test_point_ahead_projects_inside_clip_volume() {
        let camera = Camera::new(&CameraConfig::default(), 800, 200);
        let clip = camera.view_projection() * glam::Vec4::new(0.0, 6.0, -12.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn test_billboard_axes_for_default_orientation() {
        let camera = Camera::new(&CameraConfig::default(), 100, 100);
        let (right, up) = camera.billboard_axes();
        assert!((right - Vec3::X).length() < 1e-5);
        assert!((up - Vec3::Y).length() < 1e-5);
    }
}
