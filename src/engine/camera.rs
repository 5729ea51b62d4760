//! Editor camera: free look, fly, orbit and zoom driven by mouse and keyboard.

use glam::{Mat4, Quat, Vec3};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use winit::keyboard::KeyCode;

use crate::engine::context::EngineContext;
use crate::engine::error::EngineError;
use crate::engine::input::{InputState, MouseButton};
use crate::engine::module::{parse_section, to_section, Module, UpdateStatus};

const MIN_DISTANCE: f32 = 0.1;

#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub reference: Vec3,
    x: Vec3,
    y: Vec3,
    z: Vec3,
}

impl Default for Camera3D {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            reference: Vec3::ZERO,
            x: Vec3::X,
            y: Vec3::Y,
            z: Vec3::Z,
        };
        camera.look_at(Vec3::ZERO);
        camera
    }
}

impl Camera3D {
    pub fn new() -> Self {
        Self::default()
    }

    /// Right, up and backward axes of the camera.
    pub fn axes(&self) -> (Vec3, Vec3, Vec3) {
        (self.x, self.y, self.z)
    }

    pub fn forward(&self) -> Vec3 {
        -self.z
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.reference)
    }

    /// Places the camera at `position` looking at `reference`.
    pub fn look(&mut self, position: Vec3, reference: Vec3) {
        self.position = position;
        self.look_at(reference);
    }

    pub fn look_at(&mut self, spot: Vec3) {
        self.reference = spot;
        let z = (self.position - spot).try_normalize().unwrap_or(Vec3::Z);
        let x = Vec3::Y.cross(z).try_normalize().unwrap_or(Vec3::X);
        self.z = z;
        self.x = x;
        self.y = z.cross(x);
    }

    pub fn move_by(&mut self, delta: Vec3) {
        self.position += delta;
        self.reference += delta;
    }

    /// Rotates around the camera position, dragging the reference along.
    pub fn look_around(&mut self, yaw: f32, pitch: f32) {
        let distance = self.distance().max(MIN_DISTANCE);
        self.rotate_axes(yaw, pitch);
        self.reference = self.position - self.z * distance;
    }

    /// Rotates around the reference point at a constant distance.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let distance = self.distance().max(MIN_DISTANCE);
        self.rotate_axes(yaw, pitch);
        self.position = self.reference + self.z * distance;
    }

    /// Moves towards the reference. Never goes past it.
    pub fn zoom(&mut self, amount: f32) {
        let distance = (self.distance() - amount).max(MIN_DISTANCE);
        self.position = self.reference + self.z * distance;
    }

    /// Frames a sphere of `radius` around `center` keeping the view direction.
    pub fn focus(&mut self, center: Vec3, radius: f32) {
        let distance = (radius * 2.5).max(2.0);
        self.reference = center;
        self.position = center + self.z * distance;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position - self.z, self.y)
    }

    fn rotate_axes(&mut self, yaw: f32, pitch: f32) {
        let yaw = Quat::from_axis_angle(Vec3::Y, yaw);
        let (x, y, z) = (yaw * self.x, yaw * self.y, yaw * self.z);
        let pitch = Quat::from_axis_angle(x, pitch);
        let (pitched_y, pitched_z) = (pitch * y, pitch * z);

        self.x = x.normalize();
        // Stop at the poles instead of flipping upside down.
        if pitched_y.y > 0.0 {
            self.y = pitched_y.normalize();
            self.z = pitched_z.normalize();
        } else {
            self.y = y.normalize();
            self.z = z.normalize();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Units per second.
    pub move_speed: f32,
    /// Degrees per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    /// Units per wheel line.
    pub wheel_speed: f32,
    pub fov_y_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            mouse_sensitivity: 0.25,
            wheel_speed: 1.0,
            fov_y_degrees: 60.0,
        }
    }
}

#[derive(Default)]
pub struct ModuleCamera3D {
    pub camera: Camera3D,
    pub config: CameraConfig,
}

impl ModuleCamera3D {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle_keys(&mut self, input: &InputState, dt: f32) {
        let mut speed = self.config.move_speed * dt;
        if input.shift() {
            speed *= 2.0;
        }
        let (x, _, z) = self.camera.axes();
        let mut delta = Vec3::ZERO;
        if input.key_pressed(KeyCode::KeyW) {
            delta -= z;
        }
        if input.key_pressed(KeyCode::KeyS) {
            delta += z;
        }
        if input.key_pressed(KeyCode::KeyA) {
            delta -= x;
        }
        if input.key_pressed(KeyCode::KeyD) {
            delta += x;
        }
        if input.key_pressed(KeyCode::KeyR) {
            delta += Vec3::Y;
        }
        if input.key_pressed(KeyCode::KeyF) {
            delta -= Vec3::Y;
        }
        if delta != Vec3::ZERO {
            self.camera.move_by(delta * speed);
        }
    }

    fn focus_selected(&mut self, ctx: &EngineContext) {
        let Some(selected) = ctx.scene.selected() else {
            return;
        };
        let (center, radius) = match ctx.scene.world_bounds(selected) {
            Some(bounds) => (bounds.center(), bounds.size().length() * 0.5),
            None => match ctx.scene.get(selected) {
                Some(object) => (object.transform().world_position(), 1.0),
                None => return,
            },
        };
        debug!("Focusing camera on {} at {:?}", selected, center);
        self.camera.focus(center, radius);
    }

    fn publish(&self, ctx: &mut EngineContext) {
        ctx.camera.position = self.camera.position;
        ctx.camera.reference = self.camera.reference;
        ctx.camera.view = self.camera.view_matrix();
        ctx.camera.fov_y_degrees = self.config.fov_y_degrees;
    }
}

impl Module for ModuleCamera3D {
    fn name(&self) -> &str {
        "camera"
    }

    fn start(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        info!("Setting up the camera");
        self.publish(ctx);
        Ok(())
    }

    fn update(&mut self, ctx: &mut EngineContext, dt: f32) -> UpdateStatus {
        if let Some(request) = ctx.camera.request.take() {
            self.camera.look(request.position, request.reference);
        }

        let input = &ctx.input;
        let sensitivity = self.config.mouse_sensitivity.to_radians();
        let motion = input.mouse_motion();
        let looking = input.mouse_button(MouseButton::Right).is_pressed();
        let orbiting = input.alt() && input.mouse_button(MouseButton::Left).is_pressed();

        if !input.ui_wants_keyboard {
            if looking {
                self.handle_keys(input, dt);
            } else if input.key_down(KeyCode::KeyF) {
                self.focus_selected(ctx);
            }
        }

        let input = &ctx.input;
        if !input.ui_wants_pointer {
            if looking {
                self.camera.look_around(-motion.x * sensitivity, -motion.y * sensitivity);
            } else if orbiting {
                self.camera.orbit(-motion.x * sensitivity, -motion.y * sensitivity);
            }
            if input.wheel() != 0.0 {
                self.camera.zoom(input.wheel() * self.config.wheel_speed);
            }
        }

        self.publish(ctx);
        UpdateStatus::Continue
    }

    fn load_config(&mut self, _ctx: &mut EngineContext, section: &Value) -> Result<(), EngineError> {
        self.config = parse_section(self.name(), section)?;
        Ok(())
    }

    fn save_config(&self, _ctx: &EngineContext) -> Result<Option<Value>, EngineError> {
        to_section(&self.config)
    }
}
