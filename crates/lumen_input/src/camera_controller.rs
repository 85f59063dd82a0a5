//! Fly camera driven by an [`EventSnapshot`]
//!
//! Controls:
//! - W/S: Forward/backward
//! - A/D: Left/right strafe
//! - Space/Shift: Up/down
//! - Mouse: look around (always while the cursor is locked, otherwise
//!   while the left button is held)

use lumen_core::Transform;
use lumen_math::Vec3;

use crate::event::{EventFlag, EventSnapshot, MouseButtons};

/// Anything the controller can steer
pub trait CameraControl {
    /// Move along the camera's own axes
    fn move_local(&mut self, forward: f32, right: f32, up: f32);
    /// Turn right by `yaw` and down by `pitch`, in radians
    fn turn(&mut self, yaw: f32, pitch: f32);
    fn position(&self) -> Vec3;
}

impl CameraControl for Transform {
    fn move_local(&mut self, forward: f32, right: f32, up: f32) {
        let offset = self.forward() * forward + self.right() * right + Vec3::Y * up;
        self.translate(offset);
    }

    fn turn(&mut self, yaw: f32, pitch: f32) {
        // Yaw about world up so the horizon stays level
        self.rotate_world(Vec3::Y, yaw);
        self.rotate_pitch(pitch);
    }

    fn position(&self) -> Vec3 {
        self.position
    }
}

pub struct CameraController {
    // Input smoothing state
    smooth_yaw: f32,
    smooth_pitch: f32,

    // Configuration
    pub move_speed: f32,
    pub mouse_sensitivity: f32,
    pub smoothing_half_life: f32,
    pub smoothing_enabled: bool,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            smooth_yaw: 0.0,
            smooth_pitch: 0.0,
            move_speed: 3.0,
            mouse_sensitivity: 0.002,
            smoothing_half_life: 0.05,
            smoothing_enabled: false,
        }
    }

    /// Movement input as (forward, right, up), each in -1..=1
    pub fn movement_input(events: &EventSnapshot) -> (f32, f32, f32) {
        let axis = |pos: EventFlag, neg: EventFlag| {
            (events.is_pressed(pos) as i32 - events.is_pressed(neg) as i32) as f32
        };
        let down = events.is_pressed(EventFlag::KeyLShift) || events.is_pressed(EventFlag::KeyRShift);
        (
            axis(EventFlag::KeyW, EventFlag::KeyS),
            axis(EventFlag::KeyD, EventFlag::KeyA),
            events.is_pressed(EventFlag::KeySpace) as i32 as f32 - down as i32 as f32,
        )
    }

    /// Steer `camera` from this frame's input
    ///
    /// Returns the camera position after the update.
    pub fn update<C: CameraControl>(
        &mut self,
        camera: &mut C,
        events: &EventSnapshot,
        dt: f32,
        cursor_locked: bool,
    ) -> Vec3 {
        let (forward, right, up) = Self::movement_input(events);
        let step = self.move_speed * dt;
        camera.move_local(forward * step, right * step, up * step);

        let (yaw_input, pitch_input) = if self.smoothing_enabled && dt > 0.0 {
            // factor = 2^(-dt / half_life)
            let smooth_factor = 2.0f32.powf(-dt / self.smoothing_half_life);
            self.smooth_yaw = self.smooth_yaw * smooth_factor + events.mouse.rel_x * (1.0 - smooth_factor);
            self.smooth_pitch = self.smooth_pitch * smooth_factor + events.mouse.rel_y * (1.0 - smooth_factor);
            (self.smooth_yaw, self.smooth_pitch)
        } else {
            (events.mouse.rel_x, events.mouse.rel_y)
        };

        if cursor_locked || events.mouse.held.contains(MouseButtons::LEFT) {
            // Mouse right turns right, mouse down looks down
            camera.turn(yaw_input * self.mouse_sensitivity, pitch_input * self.mouse_sensitivity);
        }

        camera.position()
    }

    /// Toggle input smoothing on/off
    pub fn toggle_smoothing(&mut self) -> bool {
        self.smoothing_enabled = !self.smoothing_enabled;
        self.smooth_yaw = 0.0;
        self.smooth_pitch = 0.0;
        self.smoothing_enabled
    }

    /// Builder: set movement speed
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Builder: set mouse sensitivity
    pub fn with_mouse_sensitivity(mut self, sensitivity: f32) -> Self {
        self.mouse_sensitivity = sensitivity;
        self
    }

    /// Builder: enable or disable smoothing
    pub fn with_smoothing(mut self, enabled: bool) -> Self {
        self.smoothing_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InputEvent;

    const EPSILON: f32 = 0.0001;

    fn press(events: &mut EventSnapshot, flag: EventFlag) {
        events.apply(InputEvent::Key { flag, pressed: true });
    }

    #[test]
    fn test_forward_moves_along_view() {
        let mut events = EventSnapshot::new();
        press(&mut events, EventFlag::KeyW);
        let mut camera = Transform::identity();
        let mut controller = CameraController::new().with_move_speed(2.0);

        let position = controller.update(&mut camera, &events, 0.5, false);
        assert!((position - Vec3::new(0.0, 0.0, 1.0)).length() < EPSILON, "Expected (0,0,1), got {:?}", position);
    }

    #[test]
    fn test_opposite_keys_cancel() {
        let mut events = EventSnapshot::new();
        press(&mut events, EventFlag::KeyA);
        press(&mut events, EventFlag::KeyD);
        press(&mut events, EventFlag::KeySpace);
        assert_eq!(CameraController::movement_input(&events), (0.0, 0.0, 1.0));
    }

    #[test]
    fn test_released_key_does_not_move() {
        let mut events = EventSnapshot::new();
        events.apply(InputEvent::Key { flag: EventFlag::KeyW, pressed: false });
        assert_eq!(CameraController::movement_input(&events), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_look_requires_lock_or_button() {
        let mut events = EventSnapshot::new();
        events.apply(InputEvent::MouseMotion { dx: 100.0, dy: 0.0 });
        let mut controller = CameraController::new();

        let mut camera = Transform::identity();
        controller.update(&mut camera, &events, 0.016, false);
        assert!((camera.forward() - Vec3::Z).length() < EPSILON);

        controller.update(&mut camera, &events, 0.016, true);
        assert!(camera.forward().x > 0.0, "Expected a turn to the right, got {:?}", camera.forward());
    }

    #[test]
    fn test_yaw_keeps_horizon_level() {
        let mut camera = Transform::identity();
        camera.turn(0.0, 0.3);
        camera.turn(1.0, 0.0);
        assert!(camera.right().y.abs() < EPSILON, "Expected level right axis, got {:?}", camera.right());
    }

    #[test]
    fn test_toggle_smoothing() {
        let mut controller = CameraController::new();
        assert!(controller.toggle_smoothing());
        assert!(!controller.toggle_smoothing());
    }
}
