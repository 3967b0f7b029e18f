use super::{SceneRoot, SurfaceKind, ViewerMode};
use crate::video::VideoPlayback;

/// Display-mode state machine. Keeps the scene root in step with the mode.
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: ViewerMode,
    root: SceneRoot,
    model_available: bool,
    attach_model_on_load: bool,
}

impl ModeController {
    pub fn new(attach_model_on_load: bool) -> Self {
        let mut root = SceneRoot::new();
        root.attach(SurfaceKind::ImagePlane);
        Self {
            mode: ViewerMode::Image,
            root,
            model_available: false,
            attach_model_on_load,
        }
    }

    pub fn mode(&self) -> ViewerMode {
        self.mode
    }

    pub fn root(&self) -> &SceneRoot {
        &self.root
    }

    #[cfg(test)]
    pub fn model_available(&self) -> bool {
        self.model_available
    }

    pub fn set_mode<V: VideoPlayback + ?Sized>(&mut self, target: ViewerMode, video: &mut V) {
        log::debug!("viewer mode {} -> {}", self.mode, target);
        self.mode = target;
        self.root.clear();

        match target {
            ViewerMode::Image => {
                self.root.attach(SurfaceKind::ImagePlane);
                video.pause();
            }
            ViewerMode::Model => {
                // Root stays empty until a later set_mode once the model arrives.
                if self.model_available {
                    self.root.attach(SurfaceKind::Model);
                    video.pause();
                }
            }
            ViewerMode::Video => {
                self.root.attach(SurfaceKind::VideoPlane);
                video.play();
            }
        }
    }

    /// Records that the model finished loading.
    pub fn model_loaded(&mut self) {
        self.model_available = true;
        if self.attach_model_on_load && self.mode == ViewerMode::Model && self.root.is_empty() {
            self.root.attach(SurfaceKind::Model);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::{PlaybackCall, RecordingPlayback};

    fn assert_root_matches(controller: &ModeController) {
        let root = controller.root();
        assert!(root.len() <= 1);
        if let Some(child) = root.child() {
            assert_eq!(child, controller.mode().surface());
        } else {
            assert_eq!(controller.mode(), ViewerMode::Model);
            assert!(!controller.model_available());
        }
    }

    #[test]
    fn starts_on_image_plane() {
        let controller = ModeController::new(false);
        assert_eq!(controller.mode(), ViewerMode::Image);
        assert_eq!(controller.root().child(), Some(SurfaceKind::ImagePlane));
    }

    #[test]
    fn video_then_image_plays_then_pauses() {
        let mut controller = ModeController::new(false);
        let mut video = RecordingPlayback::default();

        controller.set_mode(ViewerMode::Video, &mut video);
        assert_eq!(controller.root().child(), Some(SurfaceKind::VideoPlane));
        assert_eq!(video.calls, vec![PlaybackCall::Play]);

        controller.set_mode(ViewerMode::Image, &mut video);
        assert_eq!(controller.root().child(), Some(SurfaceKind::ImagePlane));
        assert_eq!(video.calls, vec![PlaybackCall::Play, PlaybackCall::Pause]);
    }

    #[test]
    fn model_mode_before_load_leaves_root_empty() {
        let mut controller = ModeController::new(false);
        let mut video = RecordingPlayback::default();
        controller.set_mode(ViewerMode::Video, &mut video);
        controller.set_mode(ViewerMode::Model, &mut video);

        assert!(controller.root().is_empty());
        // Nothing to show, so the video is left alone.
        assert_eq!(video.calls, vec![PlaybackCall::Play]);
    }

    #[test]
    fn model_load_does_not_attach_by_default() {
        let mut controller = ModeController::new(false);
        let mut video = RecordingPlayback::default();
        controller.set_mode(ViewerMode::Model, &mut video);
        controller.model_loaded();
        assert!(controller.root().is_empty());

        controller.set_mode(ViewerMode::Model, &mut video);
        assert_eq!(controller.root().child(), Some(SurfaceKind::Model));
        assert_eq!(video.calls, vec![PlaybackCall::Pause]);
    }

    #[test]
    fn model_load_attaches_when_opted_in() {
        let mut controller = ModeController::new(true);
        let mut video = RecordingPlayback::default();
        controller.set_mode(ViewerMode::Model, &mut video);
        controller.model_loaded();
        assert_eq!(controller.root().child(), Some(SurfaceKind::Model));
    }

    #[test]
    fn opted_in_load_leaves_other_modes_alone() {
        let mut controller = ModeController::new(true);
        controller.model_loaded();
        assert_eq!(controller.root().child(), Some(SurfaceKind::ImagePlane));
    }

    #[test]
    fn every_transition_keeps_at_most_one_matching_child() {
        let mut controller = ModeController::new(false);
        let mut video = RecordingPlayback::default();
        for step in 0..12 {
            if step == 6 {
                controller.model_loaded();
            }
            let target = ViewerMode::ALL[(step * 7) % 3];
            controller.set_mode(target, &mut video);
            if controller.model_available() || target != ViewerMode::Model {
                assert_eq!(controller.root().child(), Some(target.surface()));
            }
            assert_root_matches(&controller);
        }
    }
}
