mod mode;
mod rotation;

pub use mode::ModeController;
pub use rotation::{DebugSettings, RotationEngine};

use crate::video::VideoPlayback;
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::fmt;
use std::str::FromStr;

/// Which surface category the viewer displays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ViewerMode {
    #[default]
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "3d")]
    Model,
    #[serde(rename = "video")]
    Video,
}

impl ViewerMode {
    pub const ALL: [ViewerMode; 3] = [ViewerMode::Image, ViewerMode::Model, ViewerMode::Video];

    pub fn label(self) -> &'static str {
        match self {
            ViewerMode::Image => "image",
            ViewerMode::Model => "3d",
            ViewerMode::Video => "video",
        }
    }

    /// The surface that represents this mode in the scene root.
    pub fn surface(self) -> SurfaceKind {
        match self {
            ViewerMode::Image => SurfaceKind::ImagePlane,
            ViewerMode::Model => SurfaceKind::Model,
            ViewerMode::Video => SurfaceKind::VideoPlane,
        }
    }
}

impl fmt::Display for ViewerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown viewer mode '{0}' (expected image, 3d or video)")]
pub struct ParseModeError(String);

impl FromStr for ViewerMode {
    type Err = ParseModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(ViewerMode::Image),
            "3d" | "model" => Ok(ViewerMode::Model),
            "video" => Ok(ViewerMode::Video),
            _ => Err(ParseModeError(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    ImagePlane,
    VideoPlane,
    Model,
}

/// The visible root container. Holds at most one surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneRoot {
    child: Option<SurfaceKind>,
}

impl SceneRoot {
    pub fn new() -> Self {
        Self { child: None }
    }

    pub fn clear(&mut self) {
        self.child = None;
    }

    /// Replaces whatever is attached with `surface`.
    pub fn attach(&mut self, surface: SurfaceKind) {
        self.child = Some(surface);
    }

    pub fn child(&self) -> Option<SurfaceKind> {
        self.child
    }

    #[cfg(test)]
    pub fn contains(&self, surface: SurfaceKind) -> bool {
        self.child == Some(surface)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        usize::from(self.child.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.child.is_none()
    }
}

/// Position, Euler rotation (XYZ order, radians) and scale of a scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Placement of a freshly loaded model: dropped one unit and turned to face the camera.
    pub fn model_default() -> Self {
        Self {
            position: Vec3::new(0.0, -1.0, 0.0),
            rotation: Vec3::new(0.0, std::f32::consts::PI, 0.0),
            scale: Vec3::ONE,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// Everything that can happen to the viewer, dispatched through [`ViewerState::handle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    SetMode(ViewerMode),
    PointerDown { x: f32 },
    PointerMove { x: f32 },
    PointerUp,
    PlayVideo,
    PauseVideo,
    ModelLoaded,
    Frame,
}

/// Viewer state owned by the application handler.
#[derive(Debug, Clone)]
pub struct ViewerState {
    modes: ModeController,
    rotation: RotationEngine,
    settings: DebugSettings,
    model: Option<Transform>,
}

impl ViewerState {
    pub fn new(attach_model_on_load: bool) -> Self {
        Self {
            modes: ModeController::new(attach_model_on_load),
            rotation: RotationEngine::new(),
            settings: DebugSettings::default(),
            model: None,
        }
    }

    pub fn handle<V: VideoPlayback + ?Sized>(&mut self, event: ViewerEvent, video: &mut V) {
        match event {
            ViewerEvent::SetMode(mode) => {
                self.settings.mode = mode;
                self.modes.set_mode(mode, video);
            }
            ViewerEvent::PointerDown { x } => self.rotation.pointer_down(x),
            ViewerEvent::PointerMove { x } => self.rotation.pointer_move(x, self.model.as_mut()),
            ViewerEvent::PointerUp => self.rotation.pointer_up(),
            ViewerEvent::PlayVideo => video.play(),
            ViewerEvent::PauseVideo => video.pause(),
            ViewerEvent::ModelLoaded => {
                if self.model.is_none() {
                    self.model = Some(Transform::model_default());
                }
                self.modes.model_loaded();
            }
            ViewerEvent::Frame => self.rotation.frame(&mut self.settings, self.model.as_mut()),
        }
    }

    pub fn mode(&self) -> ViewerMode {
        self.modes.mode()
    }

    pub fn root(&self) -> &SceneRoot {
        self.modes.root()
    }

    #[cfg(test)]
    pub fn settings(&self) -> &DebugSettings {
        &self.settings
    }

    /// Panel-side edits (rotation sliders, inertia toggle).
    pub fn settings_mut(&mut self) -> &mut DebugSettings {
        &mut self.settings
    }

    #[cfg(test)]
    pub fn drag(&self) -> &rotation::DragState {
        self.rotation.drag()
    }

    pub fn model_transform(&self) -> Option<&Transform> {
        self.model.as_ref()
    }
}
