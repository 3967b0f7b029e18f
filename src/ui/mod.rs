//! egui panels. Panels never touch controllers directly; they return actions
//! that the app dispatches.

use crate::carousel::CarouselCommand;
use crate::scene::{DebugSettings, ViewerMode};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiAction {
    SetMode(ViewerMode),
    PlayVideo,
    PauseVideo,
}

const ROTATION_STEP: f64 = 0.01;

/// Viewer debug panel: mode selector, rotation sliders, inertia toggle and video buttons.
#[derive(Debug, Default)]
pub struct DebugPanel;

impl DebugPanel {
    pub fn new() -> Self {
        Self
    }

    pub fn show(&mut self, ctx: &egui::Context, settings: &mut DebugSettings) -> Vec<UiAction> {
        let mut actions = Vec::new();

        egui::Window::new("debug")
            .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
            .resizable(false)
            .default_width(240.0)
            .show(ctx, |ui| {
                let mut selected = settings.mode;
                egui::ComboBox::from_label("mode")
                    .selected_text(selected.label())
                    .show_ui(ui, |ui| {
                        for mode in ViewerMode::ALL {
                            ui.selectable_value(&mut selected, mode, mode.label());
                        }
                    });
                actions.extend(mode_change(settings.mode, selected));

                egui::CollapsingHeader::new("rotation")
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.add(rotation_slider(&mut settings.rot_x, "rotX"));
                        let mut rot_y = settings.rot_y;
                        ui.add_enabled(false, rotation_slider(&mut rot_y, "rotY"));
                        ui.add(rotation_slider(&mut settings.rot_z, "rotZ"));
                    });

                ui.checkbox(&mut settings.inertia, "inertia");

                egui::CollapsingHeader::new("video")
                    .default_open(true)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            if ui.button("play").clicked() {
                                actions.push(UiAction::PlayVideo);
                            }
                            if ui.button("pause").clicked() {
                                actions.push(UiAction::PauseVideo);
                            }
                        });
                    });
            });

        actions
    }
}

fn rotation_slider<'a>(value: &'a mut f32, label: &str) -> egui::Slider<'a> {
    // Only user edits are clamped and stepped; values written by code are shown as-is.
    egui::Slider::new(value, -PI..=PI)
        .clamping(egui::SliderClamping::Edits)
        .step_by(ROTATION_STEP)
        .text(label.to_string())
}

fn mode_change(current: ViewerMode, selected: ViewerMode) -> Option<UiAction> {
    (selected != current).then_some(UiAction::SetMode(selected))
}

/// "‹ Prev" / "Next ›" buttons along the bottom of the carousel window.
#[derive(Debug, Default)]
pub struct CarouselControls;

impl CarouselControls {
    pub fn new() -> Self {
        Self
    }

    pub fn show(&mut self, ctx: &egui::Context, position: (usize, usize)) -> Option<CarouselCommand> {
        let mut command = None;
        egui::Area::new(egui::Id::new("carousel-controls"))
            .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -16.0])
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("‹ Prev").clicked() {
                            command = Some(CarouselCommand::Previous);
                        }
                        ui.label(format!("{} / {}", position.0 + 1, position.1));
                        if ui.button("Next ›").clicked() {
                            command = Some(CarouselCommand::Next);
                        }
                    });
                });
            });
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_frame(ctx: &egui::Context, mut body: impl FnMut(&egui::Context)) {
        let _ = ctx.run(egui::RawInput::default(), |ctx| body(ctx));
    }

    #[test]
    fn idle_panel_emits_nothing_and_keeps_settings() {
        let ctx = egui::Context::default();
        let mut panel = DebugPanel::new();
        let mut settings = DebugSettings {
            rot_x: 0.5,
            ..DebugSettings::default()
        };
        let before = settings;
        let mut actions = Vec::new();
        for _ in 0..2 {
            run_frame(&ctx, |ctx| actions = panel.show(ctx, &mut settings));
        }
        assert!(actions.is_empty());
        assert_eq!(settings, before);
    }

    #[test]
    fn rot_y_mirror_is_not_clamped_by_the_panel() {
        let ctx = egui::Context::default();
        let mut panel = DebugPanel::new();
        let mut settings = DebugSettings {
            rot_y: 7.5,
            ..DebugSettings::default()
        };
        run_frame(&ctx, |ctx| {
            panel.show(ctx, &mut settings);
        });
        assert_eq!(settings.rot_y, 7.5);
    }

    #[test]
    fn selecting_a_new_mode_emits_set_mode() {
        assert_eq!(
            mode_change(ViewerMode::Image, ViewerMode::Video),
            Some(UiAction::SetMode(ViewerMode::Video))
        );
        assert_eq!(mode_change(ViewerMode::Model, ViewerMode::Model), None);
    }

    #[test]
    fn idle_controls_emit_nothing() {
        let ctx = egui::Context::default();
        let mut controls = CarouselControls::new();
        let mut command = Some(CarouselCommand::Tick);
        run_frame(&ctx, |ctx| command = controls.show(ctx, (0, 4)));
        assert_eq!(command, None);
    }
}
