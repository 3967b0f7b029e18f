use super::{Transform, ViewerMode};

/// Radians of yaw per pixel of horizontal drag.
pub const DRAG_SENSITIVITY: f32 = 0.002;
/// Per-frame velocity multiplier while coasting.
pub const INERTIA_DAMPING: f32 = 0.92;

/// Values exposed on the debug panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugSettings {
    pub mode: ViewerMode,
    pub rot_x: f32,
    /// Mirror of the model's yaw, rewritten every frame. Editing it has no effect.
    pub rot_y: f32,
    pub rot_z: f32,
    pub inertia: bool,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            mode: ViewerMode::Image,
            rot_x: 0.0,
            rot_y: std::f32::consts::PI,
            rot_z: 0.0,
            inertia: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    pub dragging: bool,
    pub last_x: f32,
    pub velocity: f32,
}

/// Drag-to-rotate with inertial coasting around the model's yaw axis.
#[derive(Debug, Clone, Default)]
pub struct RotationEngine {
    drag: DragState,
}

impl RotationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub fn pointer_down(&mut self, x: f32) {
        self.drag.dragging = true;
        self.drag.last_x = x;
    }

    /// Applies the drag delta to yaw right away instead of waiting for the next frame.
    pub fn pointer_move(&mut self, x: f32, model: Option<&mut Transform>) {
        if !self.drag.dragging {
            return;
        }
        let Some(model) = model else {
            return;
        };
        let dx = x - self.drag.last_x;
        self.drag.velocity = dx * DRAG_SENSITIVITY;
        model.rotation.y += self.drag.velocity;
        self.drag.last_x = x;
    }

    /// Ends the drag. The last velocity is kept so the model coasts from there.
    pub fn pointer_up(&mut self) {
        self.drag.dragging = false;
    }

    pub fn frame(&mut self, settings: &mut DebugSettings, model: Option<&mut Transform>) {
        let Some(model) = model else {
            return;
        };
        model.rotation.x = settings.rot_x;
        model.rotation.z = settings.rot_z;

        if !self.drag.dragging && settings.inertia {
            model.rotation.y += self.drag.velocity;
            self.drag.velocity *= INERTIA_DAMPING;
        }

        settings.rot_y = model.rotation.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coasting(velocity: f32) -> RotationEngine {
        RotationEngine {
            drag: DragState {
                dragging: false,
                last_x: 0.0,
                velocity,
            },
        }
    }

    #[test]
    fn velocity_decays_geometrically() {
        let v0 = 0.05f32;
        let mut engine = coasting(v0);
        let mut settings = DebugSettings::default();
        let mut model = Transform::model_default();

        let mut previous = v0;
        for k in 1..=200 {
            engine.frame(&mut settings, Some(&mut model));
            let expected = v0 as f64 * (INERTIA_DAMPING as f64).powi(k);
            let actual = engine.drag().velocity as f64;
            assert!(
                ((actual - expected) / expected).abs() < 1e-4,
                "frame {k}: {actual} vs {expected}"
            );
            assert!(engine.drag().velocity < previous);
            assert!(engine.drag().velocity > 0.0);
            previous = engine.drag().velocity;
        }
    }

    #[test]
    fn coasting_adds_velocity_before_decay() {
        let mut engine = coasting(0.1);
        let mut settings = DebugSettings::default();
        let mut model = Transform::default();

        engine.frame(&mut settings, Some(&mut model));
        assert!((model.rotation.y - 0.1).abs() < 1e-6);
        engine.frame(&mut settings, Some(&mut model));
        assert!((model.rotation.y - (0.1 + 0.1 * INERTIA_DAMPING)).abs() < 1e-6);
    }

    #[test]
    fn inertia_off_holds_velocity_and_yaw() {
        let mut engine = coasting(0.1);
        let mut settings = DebugSettings {
            inertia: false,
            ..DebugSettings::default()
        };
        let mut model = Transform::default();
        for _ in 0..5 {
            engine.frame(&mut settings, Some(&mut model));
        }
        assert_eq!(model.rotation.y, 0.0);
        assert_eq!(engine.drag().velocity, 0.1);
    }

    #[test]
    fn drag_move_rotates_immediately() {
        let mut engine = RotationEngine::new();
        let mut model = Transform::default();
        engine.pointer_down(200.0);
        engine.pointer_move(260.0, Some(&mut model));
        assert!((model.rotation.y - 60.0 * DRAG_SENSITIVITY).abs() < 1e-6);
        engine.pointer_move(250.0, Some(&mut model));
        assert!((model.rotation.y - 50.0 * DRAG_SENSITIVITY).abs() < 1e-6);
        assert!((engine.drag().velocity + 10.0 * DRAG_SENSITIVITY).abs() < 1e-6);
        assert_eq!(engine.drag().last_x, 250.0);
    }

    #[test]
    fn frames_while_dragging_do_not_coast() {
        let mut engine = RotationEngine::new();
        let mut settings = DebugSettings::default();
        let mut model = Transform::default();
        engine.pointer_down(0.0);
        engine.pointer_move(100.0, Some(&mut model));
        let yaw = model.rotation.y;
        engine.frame(&mut settings, Some(&mut model));
        assert_eq!(model.rotation.y, yaw);
        assert_eq!(engine.drag().velocity, 100.0 * DRAG_SENSITIVITY);
    }

    #[test]
    fn release_keeps_velocity_for_coasting() {
        let mut engine = RotationEngine::new();
        let mut settings = DebugSettings::default();
        let mut model = Transform::default();
        engine.pointer_down(0.0);
        engine.pointer_move(30.0, Some(&mut model));
        engine.pointer_up();
        assert_eq!(engine.drag().velocity, 30.0 * DRAG_SENSITIVITY);

        let yaw = model.rotation.y;
        engine.frame(&mut settings, Some(&mut model));
        assert!((model.rotation.y - (yaw + 30.0 * DRAG_SENSITIVITY)).abs() < 1e-6);
    }

    #[test]
    fn move_without_press_is_ignored() {
        let mut engine = RotationEngine::new();
        let mut model = Transform::default();
        engine.pointer_move(500.0, Some(&mut model));
        assert_eq!(model.rotation.y, 0.0);
        assert_eq!(engine.drag().last_x, 0.0);
    }

    #[test]
    fn press_does_not_reset_velocity() {
        let mut engine = coasting(0.3);
        engine.pointer_down(12.0);
        assert_eq!(engine.drag().velocity, 0.3);
        assert!(engine.drag().dragging);
    }

    #[test]
    fn sliders_overwrite_pitch_and_roll_and_yaw_is_mirrored() {
        let mut engine = RotationEngine::new();
        let mut settings = DebugSettings {
            rot_x: 0.4,
            rot_y: -2.0,
            rot_z: -0.7,
            ..DebugSettings::default()
        };
        let mut model = Transform::model_default();
        model.rotation.x = 3.0;
        engine.frame(&mut settings, Some(&mut model));

        assert_eq!(model.rotation.x, 0.4);
        assert_eq!(model.rotation.z, -0.7);
        assert_eq!(model.rotation.y, std::f32::consts::PI);
        assert_eq!(settings.rot_y, std::f32::consts::PI);
    }

    #[test]
    fn frame_without_model_keeps_everything() {
        let mut engine = coasting(0.2);
        let mut settings = DebugSettings::default();
        engine.frame(&mut settings, None);
        assert_eq!(engine.drag().velocity, 0.2);
        assert_eq!(settings, DebugSettings::default());
    }

    #[test]
    fn yaw_is_not_normalized() {
        let mut engine = RotationEngine::new();
        let mut model = Transform::default();
        engine.pointer_down(0.0);
        for step in 1..=20 {
            engine.pointer_move(step as f32 * 500.0, Some(&mut model));
        }
        assert!(model.rotation.y > std::f32::consts::TAU * 3.0);
    }
}
