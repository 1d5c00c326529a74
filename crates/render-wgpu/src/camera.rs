use glam::{Mat4, Vec3};
use skyrealm_render::CameraRig;

const MIN_POLAR: f32 = 1e-3;
const ZOOM_STEP: f32 = 0.95;
const PAN_SPEED: f32 = 0.001;

/// Orbit camera around a target, in spherical coordinates.
///
/// Polar angle is measured from straight up; azimuth from +Z toward +X.
/// Camera motion lives outside the overlay session entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_polar: f32,
    pub auto_rotate: bool,
    /// 1.0 is one full turn per minute.
    pub auto_rotate_speed: f32,
    pub sensitivity: f32,
    pub enable_pan: bool,
    pub enable_zoom: bool,
}

impl OrbitCamera {
    pub fn from_rig(rig: &CameraRig) -> Self {
        let offset = rig.position - rig.target;
        let distance = offset.length();
        let polar = (offset.y / distance).clamp(-1.0, 1.0).acos();
        let azimuth = offset.x.atan2(offset.z);
        let mut camera = Self {
            target: rig.target,
            distance,
            azimuth,
            polar,
            fov: rig.fov_degrees.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 3000.0,
            min_distance: rig.min_distance,
            max_distance: rig.max_distance,
            max_polar: rig.max_polar_angle,
            auto_rotate: rig.auto_rotate,
            auto_rotate_speed: rig.auto_rotate_speed,
            sensitivity: 0.005,
            enable_pan: rig.enable_pan,
            enable_zoom: rig.enable_zoom,
        };
        camera.clamp();
        camera
    }

    fn clamp(&mut self) {
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);
        self.polar = self.polar.clamp(MIN_POLAR, self.max_polar);
    }

    pub fn position(&self) -> Vec3 {
        let sin_polar = self.polar.sin();
        self.target
            + self.distance
                * Vec3::new(
                    sin_polar * self.azimuth.sin(),
                    self.polar.cos(),
                    sin_polar * self.azimuth.cos(),
                )
    }

    /// Advance auto-rotation. Returns true if the camera moved.
    pub fn update(&mut self, dt: f32) -> bool {
        if !self.auto_rotate || dt <= 0.0 {
            return false;
        }
        self.azimuth -= std::f32::consts::TAU / 60.0 * self.auto_rotate_speed * dt;
        true
    }

    /// Drag-orbit by a pointer delta in pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.azimuth -= dx * self.sensitivity;
        self.polar -= dy * self.sensitivity;
        self.clamp();
    }

    /// Dolly toward (positive) or away from (negative) the target.
    pub fn zoom(&mut self, steps: f32) {
        if !self.enable_zoom {
            return;
        }
        self.distance *= ZOOM_STEP.powf(steps);
        self.clamp();
    }

    /// Slide the target in the view plane by a pointer delta in pixels.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        if !self.enable_pan {
            return;
        }
        let scale = self.distance * PAN_SPEED;
        self.target += (-self.right() * dx + self.up() * dy) * scale;
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
