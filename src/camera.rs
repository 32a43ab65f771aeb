use glam::{Mat4, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_SPEED: f32 = 2.5;
pub const DEFAULT_SENSITIVITY: f32 = 0.1;
pub const DEFAULT_ZOOM: f32 = 45.0;

/// Constrained pitch stays in the closed range `[-PITCH_LIMIT, PITCH_LIMIT]`.
pub const PITCH_LIMIT: f32 = 89.0;
pub const MIN_ZOOM: f32 = 1.0;
pub const MAX_ZOOM: f32 = 45.0;

/// Direction of a keyboard driven camera translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Initial values used to build a [`Camera`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    pub zoom: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 10.0, 50.0),
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            movement_speed: DEFAULT_SPEED,
            mouse_sensitivity: DEFAULT_SENSITIVITY,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// First-person free-fly camera.
///
/// `front`, `right` and `up` are derived from `yaw` and `pitch` and are
/// rebuilt after every orientation change; nothing else writes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    front: Vec3,
    up: Vec3,
    right: Vec3,
    world_up: Vec3,
    yaw: f32,
    pitch: f32,
    movement_speed: f32,
    mouse_sensitivity: f32,
    zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}

impl Camera {
    /// Creates a camera at `position` with the default orientation, looking down -Z.
    pub fn new(position: Vec3) -> Self {
        Self::from_settings(&CameraSettings {
            position,
            ..CameraSettings::default()
        })
    }

    pub fn from_settings(settings: &CameraSettings) -> Self {
        let mut camera = Self {
            position: settings.position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: settings.yaw,
            pitch: settings.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            movement_speed: settings.movement_speed,
            mouse_sensitivity: settings.mouse_sensitivity,
            zoom: settings.zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        };
        camera.update_vectors();
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn front(&self) -> Vec3 {
        self.front
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn movement_speed(&self) -> f32 {
        self.movement_speed
    }

    pub fn mouse_sensitivity(&self) -> f32 {
        self.mouse_sensitivity
    }

    /// Field of view in degrees, used by the perspective projection.
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Translates the camera along its basis by `movement_speed * delta_time`.
    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        if !delta_time.is_finite() {
            debug!("ignoring non-finite frame delta {delta_time}");
            return;
        }
        let velocity = self.movement_speed * delta_time;
        let offset = match direction {
            CameraMovement::Forward => self.front,
            CameraMovement::Backward => -self.front,
            CameraMovement::Left => -self.right,
            CameraMovement::Right => self.right,
            CameraMovement::Up => self.world_up,
            CameraMovement::Down => -self.world_up,
        };
        self.position += offset * velocity;
    }

    /// Applies a cursor offset to yaw and pitch and rebuilds the basis.
    pub fn process_mouse_movement(&mut self, xoffset: f32, yoffset: f32, constrain_pitch: bool) {
        if !xoffset.is_finite() || !yoffset.is_finite() {
            debug!("ignoring non-finite mouse offset ({xoffset}, {yoffset})");
            return;
        }
        self.yaw += xoffset * self.mouse_sensitivity;
        self.pitch += yoffset * self.mouse_sensitivity;

        if constrain_pitch {
            self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }

        self.update_vectors();
    }

    /// Narrows or widens the field of view, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn process_mouse_scroll(&mut self, yoffset: f32) {
        if !yoffset.is_finite() {
            return;
        }
        self.zoom = (self.zoom - yoffset).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    fn update_vectors(&mut self) {
        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.to_radians().sin_cos();
        let front = Vec3::new(pitch_cos * yaw_cos, pitch_sin, pitch_cos * yaw_sin);
        self.front = front.normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const EPSILON: f32 = 1e-4;

    fn assert_orthonormal(camera: &Camera) {
        let (front, right, up) = (camera.front(), camera.right(), camera.up());
        assert!((front.length() - 1.0).abs() < EPSILON, "front {front}");
        assert!((right.length() - 1.0).abs() < EPSILON, "right {right}");
        assert!((up.length() - 1.0).abs() < EPSILON, "up {up}");
        assert!(front.dot(right).abs() < EPSILON);
        assert!(front.dot(up).abs() < EPSILON);
        assert!(right.dot(up).abs() < EPSILON);
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = Camera::new(Vec3::new(0.0, 10.0, 50.0));
        assert!(camera.front().abs_diff_eq(Vec3::NEG_Z, EPSILON));
        assert!(camera.right().abs_diff_eq(Vec3::X, EPSILON));
        assert!(camera.up().abs_diff_eq(Vec3::Y, EPSILON));
        assert_eq!(camera.zoom(), DEFAULT_ZOOM);
    }

    #[test]
    fn forward_movement_follows_front() {
        let mut camera = Camera::new(Vec3::new(0.0, 10.0, 50.0));
        camera.process_keyboard(CameraMovement::Forward, 1.0);
        assert!(camera
            .position()
            .abs_diff_eq(Vec3::new(0.0, 10.0, 47.5), EPSILON));
    }

    #[test]
    fn vertical_movement_uses_world_up() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.process_mouse_movement(0.0, 300.0, true);
        camera.process_keyboard(CameraMovement::Up, 2.0);
        assert!(camera.position().abs_diff_eq(Vec3::new(0.0, 5.0, 0.0), EPSILON));
        camera.process_keyboard(CameraMovement::Down, 2.0);
        assert!(camera.position().abs_diff_eq(Vec3::ZERO, EPSILON));
    }

    #[test]
    fn strafing_moves_along_right() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.process_keyboard(CameraMovement::Right, 1.0);
        assert!(camera.position().abs_diff_eq(Vec3::new(2.5, 0.0, 0.0), EPSILON));
        camera.process_keyboard(CameraMovement::Left, 2.0);
        assert!(camera.position().abs_diff_eq(Vec3::new(-2.5, 0.0, 0.0), EPSILON));
        camera.process_keyboard(CameraMovement::Backward, 1.0);
        assert!(camera.position().abs_diff_eq(Vec3::new(-2.5, 0.0, 2.5), EPSILON));
    }

    #[test]
    fn basis_stays_orthonormal_over_mouse_sequences() {
        let mut camera = Camera::default();
        let offsets = [
            (13.0, -7.5),
            (-450.0, 900.0),
            (0.0, 0.0),
            (1234.5, -3000.0),
            (-0.25, 0.125),
            (89.0, 89.0),
            (-720.0, -45.0),
        ];
        for _ in 0..20 {
            for (x, y) in offsets {
                camera.process_mouse_movement(x, y, true);
                assert_orthonormal(&camera);
            }
        }
    }

    #[test]
    fn pitch_is_clamped_when_constrained() {
        let mut camera = Camera::default();
        camera.process_mouse_movement(0.0, 10_000.0, true);
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        camera.process_mouse_movement(0.0, -50_000.0, true);
        assert_eq!(camera.pitch(), -PITCH_LIMIT);
        for step in [-3.0, 700.0, -1400.0, 12.0] {
            camera.process_mouse_movement(5.0, step, true);
            assert!(camera.pitch() >= -PITCH_LIMIT && camera.pitch() <= PITCH_LIMIT);
        }
    }

    #[test]
    fn unconstrained_pitch_is_free() {
        let mut camera = Camera::default();
        camera.process_mouse_movement(0.0, 1000.0, false);
        assert!((camera.pitch() - 100.0).abs() < EPSILON);
    }

    #[test]
    fn zero_offset_keeps_orientation() {
        let mut camera = Camera::default();
        let before = camera.clone();
        camera.process_mouse_movement(0.0, 0.0, true);
        assert_eq!(camera, before);
    }

    #[test]
    fn non_finite_input_is_ignored() {
        let mut camera = Camera::default();
        let before = camera.clone();
        camera.process_mouse_movement(f32::NAN, 1.0, true);
        camera.process_keyboard(CameraMovement::Forward, f32::INFINITY);
        camera.process_mouse_scroll(f32::NAN);
        assert_eq!(camera, before);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = Camera::default();
        camera.process_mouse_scroll(-10.0);
        assert_eq!(camera.zoom(), MAX_ZOOM);
        camera.process_mouse_scroll(30.0);
        assert_eq!(camera.zoom(), 15.0);
        camera.process_mouse_scroll(100.0);
        assert_eq!(camera.zoom(), MIN_ZOOM);
        for delta in [3.5, -80.0, 0.5, 44.0, -1.0] {
            camera.process_mouse_scroll(delta);
            assert!(camera.zoom() >= MIN_ZOOM && camera.zoom() <= MAX_ZOOM);
        }
    }

    #[test]
    fn view_matrix_places_camera_at_origin() {
        let mut camera = Camera::new(Vec3::new(3.0, -2.0, 17.0));
        camera.process_mouse_movement(120.0, -35.0, true);
        camera.process_keyboard(CameraMovement::Forward, 0.75);
        let eye = camera.view_matrix() * camera.position().extend(1.0);
        assert!(eye.abs_diff_eq(Vec4::new(0.0, 0.0, 0.0, 1.0), EPSILON));
    }

    #[test]
    fn view_matrix_looks_down_negative_z() {
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0));
        let ahead = camera.view_matrix() * (camera.position() + camera.front() * 5.0).extend(1.0);
        assert!(ahead.abs_diff_eq(Vec4::new(0.0, 0.0, -5.0, 1.0), EPSILON));
    }

    #[test]
    fn settings_are_clamped_on_construction() {
        let camera = Camera::from_settings(&CameraSettings {
            pitch: 120.0,
            zoom: 90.0,
            ..CameraSettings::default()
        });
        assert_eq!(camera.pitch(), PITCH_LIMIT);
        assert_eq!(camera.zoom(), MAX_ZOOM);
        assert_orthonormal(&camera);
    }
}
