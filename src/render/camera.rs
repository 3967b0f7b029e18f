use glam::{Mat4, Vec3};

/// Fixed-orientation perspective camera looking down −Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,
}

impl PerspectiveCamera {
    pub fn new(position: Vec3, fov_y_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            fov_y: fov_y_degrees.to_radians(),
            near,
            far,
            aspect: 1.0,
        }
    }

    /// Camera used by the viewer scene.
    pub fn viewer() -> Self {
        Self::new(Vec3::new(0.0, 1.4, 3.0), 45.0, 0.1, 100.0)
    }

    #[cfg(test)]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Scale that letterboxes `media` into `view` (both in pixels), as a fraction of the
/// view on each axis. A unit quad spanning clip space scaled by this keeps the media
/// aspect ratio.
pub fn contain_scale(media: (u32, u32), view: (u32, u32)) -> (f32, f32) {
    if media.0 == 0 || media.1 == 0 || view.0 == 0 || view.1 == 0 {
        return (1.0, 1.0);
    }
    let media_aspect = media.0 as f32 / media.1 as f32;
    let view_aspect = view.0 as f32 / view.1 as f32;
    if media_aspect > view_aspect {
        (1.0, view_aspect / media_aspect)
    } else {
        (media_aspect / view_aspect, 1.0)
    }
}
