use super::{AppError, AppEvent, Graphics};
use crate::assets;
use crate::carousel::{AutoAdvance, Carousel, CarouselCommand, MediaKind, MediaSurfaces};
use crate::config::{resolve_asset, AppConfig, WindowConfig};
use crate::render::{contain_scale, DrawPart, Geometry, Lighting, TexturedQuad};
use crate::ui::CarouselControls;
use crate::video::{self, VideoSource};
use glam::{Mat4, Vec3};
use image::RgbaImage;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

const BACKGROUND: [u8; 3] = [0, 0, 0];

/// CPU side of the carousel's two media elements.
///
/// The carousel drives this through [`MediaSurfaces`]; the app picks up the
/// changes on the next redraw and mirrors them onto the GPU.
pub struct CarouselSurfaces {
    asset_root: PathBuf,
    autoplay_video: bool,
    visible: Option<MediaKind>,
    image: Option<RgbaImage>,
    image_changed: bool,
    video: Box<dyn VideoSource>,
    video_changed: bool,
}

impl CarouselSurfaces {
    pub fn new(asset_root: PathBuf, autoplay_video: bool) -> Self {
        Self {
            asset_root,
            autoplay_video,
            visible: None,
            image: None,
            image_changed: false,
            video: Box::new(video::BlankVideo::default()),
            video_changed: false,
        }
    }

    pub fn visible(&self) -> Option<MediaKind> {
        self.visible
    }

    pub fn video(&self) -> &dyn VideoSource {
        self.video.as_ref()
    }

    /// The still loaded since the last call: `Some(None)` when it failed to load.
    pub fn take_image_update(&mut self) -> Option<Option<RgbaImage>> {
        std::mem::take(&mut self.image_changed).then(|| self.image.take())
    }

    /// True once after a new video source was opened.
    pub fn take_video_changed(&mut self) -> bool {
        std::mem::take(&mut self.video_changed)
    }
}

impl MediaSurfaces for CarouselSurfaces {
    fn hide_all(&mut self) {
        self.visible = None;
    }

    fn pause_video(&mut self) {
        self.video.pause();
    }

    fn show_image(&mut self, source: &str) {
        let path = resolve_asset(&self.asset_root, source);
        self.image = match assets::load_image(&path) {
            Ok(image) => Some(image),
            Err(err) => {
                log::warn!("{}", err);
                None
            }
        };
        self.image_changed = true;
        self.visible = Some(MediaKind::Image);
    }

    fn show_video(&mut self, source: &str) {
        let path = resolve_asset(&self.asset_root, source);
        self.video = video::open_video_or_blank(&path);
        if self.autoplay_video {
            self.video.play();
        }
        self.video_changed = true;
        self.visible = Some(MediaKind::Video);
    }
}

/// Full-window slideshow of images and videos with a repeating auto-advance.
pub struct CarouselApp {
    window_config: WindowConfig,
    carousel: Carousel,
    surfaces: CarouselSurfaces,
    interval: Duration,
    timer: Option<AutoAdvance>,
    controls: CarouselControls,
    gfx: Option<Graphics>,
    image_quad: Option<TexturedQuad>,
    video_quad: Option<TexturedQuad>,
    error: Option<AppError>,
}

impl CarouselApp {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let settings = &config.carousel;
        let carousel = Carousel::new(settings.items.clone())?;
        log::info!("Carousel with {} items", carousel.len());
        Ok(Self {
            window_config: settings.window.clone(),
            carousel,
            surfaces: CarouselSurfaces::new(config.asset_root.clone(), settings.autoplay_video),
            interval: settings.interval(),
            timer: None,
            controls: CarouselControls::new(),
            gfx: None,
            image_quad: None,
            video_quad: None,
            error: None,
        })
    }

    pub fn into_result(self) -> Result<(), AppError> {
        self.error.map_or(Ok(()), Err)
    }

    fn command(&mut self, command: CarouselCommand) {
        let index = self.carousel.handle(command, &mut self.surfaces);
        log::debug!("{:?} -> #{} {}", command, index, self.carousel.current_item());
    }

    fn redraw(&mut self) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        let started = Instant::now();

        if let Some(image) = self.surfaces.take_image_update() {
            self.image_quad = image.map(|image| {
                TexturedQuad::new(
                    &gfx.render,
                    "carousel image",
                    &Geometry::fullscreen_quad(),
                    image.width(),
                    image.height(),
                    image.as_raw(),
                )
            });
        }
        if self.surfaces.take_video_changed() {
            self.video_quad = None;
        }
        if let Some(frame) = self.surfaces.video.poll_frame(started) {
            match self.video_quad.as_mut() {
                Some(quad) => quad.upload(&gfx.render, frame.width, frame.height, &frame.rgba),
                None => {
                    self.video_quad = Some(TexturedQuad::new(
                        &gfx.render,
                        "carousel video",
                        &Geometry::fullscreen_quad(),
                        frame.width,
                        frame.height,
                        &frame.rgba,
                    ));
                }
            }
        }

        let controls = &mut self.controls;
        let position = (self.carousel.current_index(), self.carousel.len());
        let mut command = None;
        let ui = gfx
            .egui
            .run_ui(&gfx.window, |ctx| command = controls.show(ctx, position));

        let quad = match self.surfaces.visible() {
            Some(MediaKind::Image) => self.image_quad.as_ref(),
            Some(MediaKind::Video) => self.video_quad.as_ref(),
            None => None,
        };
        let mut parts: Vec<&DrawPart> = Vec::new();
        if let Some(quad) = quad {
            let (sx, sy) = contain_scale(quad.size(), gfx.render.size());
            let model = Mat4::from_scale(Vec3::new(sx, sy, 1.0));
            quad.part()
                .update(gfx.render.queue(), Mat4::IDENTITY, model, &Lighting::default());
            parts.push(quad.part());
        }

        if let Err(err) = gfx.render.render(&parts, Some(&ui.paint())) {
            log::error!("Render failed: {}", err);
        }
        let render_ms = started.elapsed().as_secs_f32() * 1000.0;
        gfx.timing.record_frame(&gfx.window, Instant::now(), render_ms);

        if let Some(command) = command {
            self.command(command);
        }
    }
}

impl ApplicationHandler<AppEvent> for CarouselApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }

        match Graphics::create(event_loop, &self.window_config, BACKGROUND) {
            Ok(gfx) => {
                gfx.window.request_redraw();
                self.gfx = Some(gfx);
            }
            Err(err) => {
                log::error!("Failed to start carousel: {}", err);
                self.error = Some(err);
                event_loop.exit();
                return;
            }
        }

        self.carousel.show_at(0, &mut self.surfaces);
        let timer = AutoAdvance::start(self.interval, Instant::now());
        log::info!("Auto-advance every {:?}", timer.period());
        self.timer = Some(timer);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        gfx.egui.on_window_event(&gfx.window, &event);

        let mut command = None;
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                    _ if event.repeat || gfx.egui.wants_keyboard() => {}
                    PhysicalKey::Code(KeyCode::ArrowRight) => {
                        command = Some(CarouselCommand::Next);
                    }
                    PhysicalKey::Code(KeyCode::ArrowLeft) => {
                        command = Some(CarouselCommand::Previous);
                    }
                    _ => {}
                }
            }
            WindowEvent::Resized(size) => gfx.render.resize(size),
            WindowEvent::ScaleFactorChanged { .. } | WindowEvent::Moved(_) => {
                gfx.timing.refresh_interval(&gfx.window);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }

        if let Some(command) = command {
            self.command(command);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let fired = self.timer.as_mut().is_some_and(|timer| timer.poll(now));
        if fired {
            self.command(CarouselCommand::Tick);
        }

        let deadline = self.timer.as_ref().map(AutoAdvance::next_due);
        if let Some(gfx) = self.gfx.as_mut() {
            gfx.schedule(event_loop, deadline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::carousel::MediaItem;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mediaview_carousel_{}_{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_image_is_shown_as_a_failed_update() {
        let mut surfaces = CarouselSurfaces::new(temp_dir("missing"), true);
        surfaces.show_image("nope.png");
        assert_eq!(surfaces.visible(), Some(MediaKind::Image));
        assert!(matches!(surfaces.take_image_update(), Some(None)));
        assert!(surfaces.take_image_update().is_none());
    }

    #[test]
    fn loaded_image_is_handed_over_once() {
        let dir = temp_dir("loaded");
        RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]))
            .save(dir.join("still.png"))
            .unwrap();

        let mut surfaces = CarouselSurfaces::new(dir.clone(), true);
        surfaces.show_image("still.png");
        let image = surfaces.take_image_update().flatten().unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn video_autoplay_follows_config() {
        let mut autoplay = CarouselSurfaces::new(temp_dir("autoplay"), true);
        autoplay.show_video("missing.mp4");
        assert_eq!(autoplay.visible(), Some(MediaKind::Video));
        assert!(autoplay.video().is_playing());
        assert!(autoplay.take_video_changed());
        assert!(!autoplay.take_video_changed());

        let mut manual = CarouselSurfaces::new(temp_dir("manual"), false);
        manual.show_video("missing.mp4");
        assert!(!manual.video().is_playing());
    }

    #[test]
    fn advancing_past_a_video_pauses_it() {
        let mut carousel = Carousel::new(vec![
            MediaItem::video("clip.mp4"),
            MediaItem::image("still.png"),
        ])
        .unwrap();
        let mut surfaces = CarouselSurfaces::new(temp_dir("advance"), true);

        carousel.show_at(0, &mut surfaces);
        assert!(surfaces.video().is_playing());

        carousel.handle(CarouselCommand::Tick, &mut surfaces);
        assert_eq!(carousel.current_index(), 1);
        assert_eq!(surfaces.visible(), Some(MediaKind::Image));
        assert!(!surfaces.video().is_playing());
    }
}
