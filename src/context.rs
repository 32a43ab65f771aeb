//! Per-window viewer state.
//!
//! `RenderContext` owns everything the event loop mutates: the camera, the
//! light rig, the projection mode and the polled input. Window callbacks
//! feed it raw events and the renderer reads a [`FrameParams`] snapshot once
//! per frame.

use glam::{Mat4, Vec2, Vec3};
use log::{debug, info};

use crate::camera::Camera;
use crate::config::{AppConfig, ConfigError};
use crate::input::{Action, InputState, KeyBindings, KeyCode, MouseButton, MouseTracker};
use crate::lighting::{LightDescriptor, LightRig, ShadingParams};
use crate::projection::ProjectionMode;
use crate::scene::Scene;

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameParams {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_proj: Mat4,
    pub camera_position: Vec3,
    pub sun: LightDescriptor,
    pub lamps: Vec<LightDescriptor>,
    pub shading: ShadingParams,
}

#[derive(Debug)]
pub struct RenderContext {
    camera: Camera,
    lights: LightRig,
    shading: ShadingParams,
    projection: ProjectionMode,
    wireframe: bool,
    bindings: KeyBindings,
    input: InputState,
    mouse: MouseTracker,
    cursor_captured: bool,
    exit_requested: bool,
}

impl RenderContext {
    pub fn new(scene: &Scene, config: &AppConfig) -> Result<Self, ConfigError> {
        let bindings = config.key_bindings()?;
        Ok(Self::with_parts(
            Camera::from_settings(&config.camera),
            scene,
            config.shading,
            bindings,
        ))
    }

    pub fn with_parts(camera: Camera, scene: &Scene, shading: ShadingParams, bindings: KeyBindings) -> Self {
        Self {
            camera,
            lights: LightRig::new(scene.sun_position(), scene.lamp_positions(), &shading),
            shading,
            projection: ProjectionMode::default(),
            wireframe: false,
            bindings,
            input: InputState::new(),
            mouse: MouseTracker::new(),
            cursor_captured: false,
            exit_requested: false,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn lights(&self) -> &LightRig {
        &self.lights
    }

    pub fn shading(&self) -> &ShadingParams {
        &self.shading
    }

    pub fn set_shading(&mut self, shading: ShadingParams) {
        self.shading = shading;
        self.lights.apply_params(&shading);
    }

    pub fn projection(&self) -> ProjectionMode {
        self.projection
    }

    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn key_pressed(&mut self, key: KeyCode) {
        if self.bindings.actions_for(key).next().is_none() {
            debug!("no action bound to {key:?}");
        }
        self.input.set_key_down(key);
    }

    pub fn key_released(&mut self, key: KeyCode) {
        self.input.set_key_up(key);
    }

    /// Applies every held action once; movement is scaled by `delta_time`.
    pub fn update(&mut self, delta_time: f32) {
        let held: Vec<Action> = self.input.held_actions(&self.bindings).collect();
        for action in held {
            self.apply(action, delta_time);
        }
    }

    fn apply(&mut self, action: Action, delta_time: f32) {
        match action {
            Action::Move(direction) => self.camera.process_keyboard(direction, delta_time),
            Action::Exit => {
                if !self.exit_requested {
                    info!("exit requested");
                }
                self.exit_requested = true;
            }
            Action::Perspective => self.set_projection(ProjectionMode::Perspective),
            Action::Orthographic => self.set_projection(ProjectionMode::Orthographic),
            Action::Wireframe => self.set_wireframe(true),
            Action::Fill => self.set_wireframe(false),
            Action::LampsOn => self.lights.lamps_on(),
            Action::SunOn => self.lights.sun_on(),
        }
    }

    pub fn set_projection(&mut self, mode: ProjectionMode) {
        if self.projection != mode {
            info!("projection: {}", mode.label());
            self.projection = mode;
        }
    }

    pub fn set_wireframe(&mut self, enabled: bool) {
        if self.wireframe != enabled {
            info!("polygon mode: {}", if enabled { "wireframe" } else { "fill" });
            self.wireframe = enabled;
        }
    }

    pub fn cursor_captured(&self) -> bool {
        self.cursor_captured
    }

    /// While the cursor is captured, only raw motion turns the camera.
    pub fn set_cursor_captured(&mut self, captured: bool) {
        if self.cursor_captured != captured {
            debug!("cursor {}", if captured { "captured" } else { "released" });
            self.cursor_captured = captured;
            self.mouse.reset();
        }
    }

    /// Feeds an absolute cursor position; the first one only seeds the tracker.
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let position = Vec2::new(x, y);
        self.input.set_mouse_position(position);
        if self.cursor_captured {
            return;
        }
        let offset = self.mouse.offset(position);
        self.camera.process_mouse_movement(offset.x, offset.y, true);
    }

    /// Feeds raw pointer motion in device units, y growing downwards.
    /// Ignored unless the cursor is captured.
    pub fn mouse_motion(&mut self, dx: f32, dy: f32) {
        if self.cursor_captured {
            self.camera.process_mouse_movement(dx, -dy, true);
        }
    }

    /// Drops the last cursor position, e.g. when the cursor leaves the window.
    pub fn reset_cursor(&mut self) {
        self.mouse.reset();
    }

    pub fn scrolled(&mut self, delta_y: f32) {
        self.camera.process_mouse_scroll(delta_y);
    }

    pub fn mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.input.set_mouse_button_down(button);
            match button.label() {
                "unhandled" => debug!("unhandled mouse button {} pressed", button.index()),
                label => debug!("{label} mouse button pressed"),
            }
        } else {
            self.input.set_mouse_button_up(button);
            match button.label() {
                "unhandled" => debug!("unhandled mouse button {} released", button.index()),
                label => debug!("{label} mouse button released"),
            }
        }
    }

    pub fn frame_params(&self, aspect: f32) -> FrameParams {
        let view = self.camera.view_matrix();
        let projection = self.projection.matrix(self.camera.zoom(), aspect);
        FrameParams {
            view,
            projection,
            view_proj: projection * view,
            camera_position: self.camera.position(),
            sun: *self.lights.sun(),
            lamps: self.lights.lamps().to_vec(),
            shading: self.shading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraSettings;
    use crate::input::NamedKey;
    use crate::lighting::{LAMP_ON_COLOR, SUN_ON_COLOR};

    fn context() -> RenderContext {
        RenderContext::new(&Scene::garden(), &AppConfig::default()).unwrap()
    }

    #[test]
    fn held_forward_moves_camera() {
        let mut ctx = context();
        ctx.key_pressed(KeyCode::Character('W'));
        ctx.update(1.0);
        assert!(ctx.camera().position().abs_diff_eq(Vec3::new(0.0, 10.0, 47.5), 1e-4));
        ctx.key_released(KeyCode::Character('W'));
        ctx.update(1.0);
        assert!(ctx.camera().position().abs_diff_eq(Vec3::new(0.0, 10.0, 47.5), 1e-4));
    }

    #[test]
    fn bracket_keys_switch_lights() {
        let mut ctx = context();
        assert_eq!(ctx.lights().sun().color(), SUN_ON_COLOR);

        ctx.key_pressed(KeyCode::Named(NamedKey::LeftBracket));
        ctx.update(0.016);
        ctx.update(0.016);
        assert!(ctx.lights().sun().is_off());
        assert_eq!(ctx.lights().lamp_color(), LAMP_ON_COLOR);

        ctx.key_released(KeyCode::Named(NamedKey::LeftBracket));
        ctx.key_pressed(KeyCode::Named(NamedKey::RightBracket));
        ctx.update(0.016);
        assert_eq!(ctx.lights().sun().color(), SUN_ON_COLOR);
        assert_eq!(ctx.lights().lamp_color(), Vec3::ZERO);
    }

    #[test]
    fn projection_and_polygon_mode_follow_keys() {
        let mut ctx = context();
        ctx.key_pressed(KeyCode::Character('O'));
        ctx.key_pressed(KeyCode::Named(NamedKey::Right));
        ctx.update(0.016);
        assert_eq!(ctx.projection(), ProjectionMode::Orthographic);
        assert!(ctx.wireframe());

        ctx.key_released(KeyCode::Character('O'));
        ctx.key_released(KeyCode::Named(NamedKey::Right));
        ctx.key_pressed(KeyCode::Character('P'));
        ctx.key_pressed(KeyCode::Named(NamedKey::Left));
        ctx.update(0.016);
        assert_eq!(ctx.projection(), ProjectionMode::Perspective);
        assert!(!ctx.wireframe());
    }

    #[test]
    fn escape_requests_exit() {
        let mut ctx = context();
        assert!(!ctx.exit_requested());
        ctx.key_pressed(KeyCode::Named(NamedKey::Escape));
        ctx.update(0.016);
        assert!(ctx.exit_requested());
    }

    #[test]
    fn first_cursor_event_does_not_turn_camera() {
        let mut ctx = context();
        let yaw = ctx.camera().yaw();
        ctx.cursor_moved(400.0, 300.0);
        assert_eq!(ctx.camera().yaw(), yaw);
        ctx.cursor_moved(410.0, 290.0);
        assert!((ctx.camera().yaw() - (yaw + 1.0)).abs() < 1e-4);
        assert!((ctx.camera().pitch() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn captured_motion_keeps_turning_past_the_window_edge() {
        let mut ctx = context();
        ctx.set_cursor_captured(true);
        let yaw = ctx.camera().yaw();
        // A confined cursor pinned at the right edge reports the same position.
        ctx.cursor_moved(1279.0, 360.0);
        ctx.cursor_moved(1279.0, 360.0);
        for _ in 0..30 {
            ctx.mouse_motion(10.0, 0.0);
        }
        assert!((ctx.camera().yaw() - (yaw + 30.0)).abs() < 1e-3);

        ctx.mouse_motion(0.0, -20.0);
        assert!((ctx.camera().pitch() - 2.0).abs() < 1e-4);
        ctx.mouse_motion(0.0, -2000.0);
        assert_eq!(ctx.camera().pitch(), 89.0);
    }

    #[test]
    fn cursor_positions_only_turn_the_camera_when_released() {
        let mut ctx = context();
        ctx.set_cursor_captured(true);
        let yaw = ctx.camera().yaw();
        ctx.cursor_moved(400.0, 300.0);
        ctx.cursor_moved(500.0, 300.0);
        assert_eq!(ctx.camera().yaw(), yaw);
        assert_eq!(ctx.input().mouse_position(), Vec2::new(500.0, 300.0));

        ctx.set_cursor_captured(false);
        ctx.mouse_motion(50.0, 0.0);
        assert_eq!(ctx.camera().yaw(), yaw);
        ctx.cursor_moved(500.0, 300.0);
        assert_eq!(ctx.camera().yaw(), yaw);
        ctx.cursor_moved(510.0, 300.0);
        assert!((ctx.camera().yaw() - (yaw + 1.0)).abs() < 1e-4);
    }

    #[test]
    fn scroll_narrows_field_of_view() {
        let mut ctx = context();
        let wide = ctx.frame_params(1.0).projection;
        ctx.scrolled(20.0);
        assert_eq!(ctx.camera().zoom(), 25.0);
        let narrow = ctx.frame_params(1.0).projection;
        assert!(narrow.y_axis.y > wide.y_axis.y);
    }

    #[test]
    fn frame_params_combine_view_and_projection() {
        let ctx = context();
        let frame = ctx.frame_params(16.0 / 9.0);
        assert_eq!(frame.view_proj, frame.projection * frame.view);
        assert_eq!(frame.camera_position, CameraSettings::default().position);
        assert_eq!(frame.lamps.len(), 4);
        assert_eq!(frame.sun.position, Scene::garden().sun_position());
    }

    #[test]
    fn mouse_buttons_are_tracked() {
        let mut ctx = context();
        ctx.mouse_button(MouseButton::RIGHT, true);
        assert!(ctx.input().is_mouse_button_down(MouseButton::RIGHT));
        ctx.mouse_button(MouseButton::RIGHT, false);
        assert!(!ctx.input().is_mouse_button_down(MouseButton::RIGHT));
    }

    #[test]
    fn shading_changes_reach_the_light_rig() {
        let mut ctx = context();
        let shading = ShadingParams {
            key_light_strength: 0.1,
            ..ShadingParams::default()
        };
        ctx.set_shading(shading);
        assert!(ctx.lights().lamps().iter().all(|lamp| lamp.strength == 0.1));
    }
}
