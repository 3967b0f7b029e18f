use super::input::{PointerAction, PointerTracker};
use super::{AppError, AppEvent, Graphics};
use crate::assets::{self, ModelData};
use crate::config::{AppConfig, WindowConfig};
use crate::render::{
    DrawPart, Geometry, GpuMesh, GpuTexture, Lighting, PerspectiveCamera, RenderContext,
    TexturedQuad,
};
use crate::scene::{SurfaceKind, ViewerEvent, ViewerState};
use crate::ui::{DebugPanel, UiAction};
use crate::video::{self, VideoSource};
use glam::Mat4;
use std::path::PathBuf;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

const BACKGROUND: [u8; 3] = [0xee, 0xee, 0xee];
const PLANE_WIDTH: f32 = 1.5;
const PLANE_HEIGHT: f32 = 2.0;

/// GPU copy of a loaded model. Textures are kept alive for the bind groups.
struct ModelParts {
    parts: Vec<DrawPart>,
    _textures: Vec<GpuTexture>,
}

impl ModelParts {
    fn upload(render: &RenderContext, model: &ModelData) -> Self {
        let device = render.device();
        let queue = render.queue();
        let mut textures: Vec<GpuTexture> = model
            .textures
            .iter()
            .map(|image| {
                GpuTexture::from_rgba(
                    device,
                    queue,
                    "model texture",
                    image.width(),
                    image.height(),
                    image.as_raw(),
                )
            })
            .collect();
        let white = GpuTexture::white(device, queue);

        let parts = model
            .meshes
            .iter()
            .map(|mesh| {
                let gpu_mesh = GpuMesh::upload(device, &model.name, &mesh.vertices, &mesh.indices);
                let texture = mesh
                    .texture
                    .and_then(|index| textures.get(index))
                    .unwrap_or(&white);
                render
                    .pipeline()
                    .create_part(device, gpu_mesh, texture, mesh.base_color, true)
            })
            .collect();

        log::info!(
            "Uploaded model '{}': {} parts, {} triangles, bounds {:?}",
            model.name,
            model.meshes.len(),
            model.triangle_count(),
            model.bounds()
        );
        textures.push(white);
        Self {
            parts,
            _textures: textures,
        }
    }
}

/// Drag-to-rotate viewer with image, video and model modes.
pub struct ViewerApp {
    window_config: WindowConfig,
    image_path: PathBuf,
    state: ViewerState,
    video: Box<dyn VideoSource>,
    panel: DebugPanel,
    pointer: PointerTracker,
    camera: PerspectiveCamera,
    lighting: Lighting,
    gfx: Option<Graphics>,
    image_plane: Option<TexturedQuad>,
    // Created on the first decoded frame.
    video_plane: Option<TexturedQuad>,
    model: Option<ModelParts>,
    pending_model: Option<ModelData>,
    error: Option<AppError>,
}

impl ViewerApp {
    pub fn new(config: &AppConfig, proxy: EventLoopProxy<AppEvent>) -> Self {
        let viewer = &config.viewer;
        let video = video::open_video_or_blank(&config.resolve(&viewer.video));

        let model_path = config.resolve(&viewer.model);
        log::info!("Loading model {}", model_path.display());
        let spawned = assets::spawn_model_load(model_path, move |result| {
            if proxy.send_event(AppEvent::ModelLoaded(result)).is_err() {
                log::debug!("Event loop closed before the model finished loading");
            }
        });
        if let Err(err) = spawned {
            log::warn!("Failed to start model loader: {}", err);
        }

        Self {
            window_config: viewer.window.clone(),
            image_path: config.resolve(&viewer.image),
            state: ViewerState::new(viewer.attach_model_on_load),
            video,
            panel: DebugPanel::new(),
            pointer: PointerTracker::new(),
            camera: PerspectiveCamera::viewer(),
            lighting: Lighting::viewer(),
            gfx: None,
            image_plane: None,
            video_plane: None,
            model: None,
            pending_model: None,
            error: None,
        }
    }

    pub fn into_result(self) -> Result<(), AppError> {
        self.error.map_or(Ok(()), Err)
    }

    fn dispatch_pointer(&mut self, action: PointerAction) {
        let event = match action {
            PointerAction::Down { x } => ViewerEvent::PointerDown { x },
            PointerAction::Move { x } => ViewerEvent::PointerMove { x },
            PointerAction::Up => ViewerEvent::PointerUp,
        };
        self.state.handle(event, self.video.as_mut());
    }

    fn redraw(&mut self) {
        let Some(gfx) = self.gfx.as_mut() else {
            return;
        };
        let started = Instant::now();

        self.state.handle(ViewerEvent::Frame, self.video.as_mut());

        if let Some(frame) = self.video.poll_frame(started) {
            match self.video_plane.as_mut() {
                Some(plane) => plane.upload(&gfx.render, frame.width, frame.height, &frame.rgba),
                None => {
                    self.video_plane = Some(TexturedQuad::new(
                        &gfx.render,
                        "video plane",
                        &Geometry::plane(PLANE_WIDTH, PLANE_HEIGHT),
                        frame.width,
                        frame.height,
                        &frame.rgba,
                    ));
                }
            }
        }

        let panel = &mut self.panel;
        let settings = self.state.settings_mut();
        let mut actions = Vec::new();
        let ui = gfx
            .egui
            .run_ui(&gfx.window, |ctx| actions = panel.show(ctx, settings));
        for action in actions {
            match action {
                UiAction::SetMode(mode) => {
                    self.state.handle(ViewerEvent::SetMode(mode), self.video.as_mut());
                    log::info!("Mode: {}", self.state.mode());
                }
                UiAction::PlayVideo => self.state.handle(ViewerEvent::PlayVideo, self.video.as_mut()),
                UiAction::PauseVideo => {
                    self.state.handle(ViewerEvent::PauseVideo, self.video.as_mut())
                }
            }
        }

        let view_proj = self.camera.view_projection();
        let queue = gfx.render.queue();
        let mut parts: Vec<&DrawPart> = Vec::new();
        match self.state.root().child() {
            Some(SurfaceKind::ImagePlane) => {
                if let Some(plane) = &self.image_plane {
                    plane
                        .part()
                        .update(queue, view_proj, Mat4::IDENTITY, &self.lighting);
                    parts.push(plane.part());
                }
            }
            Some(SurfaceKind::VideoPlane) => {
                if let Some(plane) = &self.video_plane {
                    plane
                        .part()
                        .update(queue, view_proj, Mat4::IDENTITY, &self.lighting);
                    parts.push(plane.part());
                }
            }
            Some(SurfaceKind::Model) => {
                if let (Some(model), Some(transform)) = (&self.model, self.state.model_transform()) {
                    let matrix = transform.matrix();
                    for part in &model.parts {
                        part.update(queue, view_proj, matrix, &self.lighting);
                        parts.push(part);
                    }
                }
            }
            None => {}
        }

        if let Err(err) = gfx.render.render(&parts, Some(&ui.paint())) {
            log::error!("Render failed: {}", err);
        }

        let render_ms = started.elapsed().as_secs_f32() * 1000.0;
        gfx.timing.record_frame(&gfx.window, Instant::now(), render_ms);
    }
}

impl ApplicationHandler<AppEvent> for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }

        let gfx = match Graphics::create(event_loop, &self.window_config, BACKGROUND) {
            Ok(gfx) => gfx,
            Err(err) => {
                log::error!("Failed to start viewer: {}", err);
                self.error = Some(err);
                event_loop.exit();
                return;
            }
        };

        let (width, height) = gfx.render.size();
        self.camera.resize(width, height);

        self.image_plane = match assets::load_image(&self.image_path) {
            Ok(image) => Some(TexturedQuad::new(
                &gfx.render,
                "image plane",
                &Geometry::plane(PLANE_WIDTH, PLANE_HEIGHT),
                image.width(),
                image.height(),
                image.as_raw(),
            )),
            Err(err) => {
                log::warn!("{}", err);
                None
            }
        };

        if let Some(model) = self.pending_model.take() {
            self.model = Some(ModelParts::upload(&gfx.render, &model));
        }

        gfx.window.request_redraw();
        self.gfx = Some(gfx);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::ModelLoaded(Ok(model)) => {
                match &self.gfx {
                    Some(gfx) => self.model = Some(ModelParts::upload(&gfx.render, &model)),
                    None => self.pending_model = Some(model),
                }
                self.state.handle(ViewerEvent::ModelLoaded, self.video.as_mut());
            }
            AppEvent::ModelLoaded(Err(err)) => {
                log::warn!("Model unavailable, 3d mode stays empty: {}", err);
            }
        }
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
        let consumed = gfx.egui.on_window_event(&gfx.window, &event);

        let mut redraw = false;
        let action = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                None
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    event_loop.exit();
                }
                None
            }
            WindowEvent::Resized(size) => {
                gfx.render.resize(size);
                self.camera.resize(size.width, size.height);
                None
            }
            WindowEvent::ScaleFactorChanged { .. } | WindowEvent::Moved(_) => {
                gfx.timing.refresh_interval(&gfx.window);
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.cursor_moved(position.x as f32)
            }
            WindowEvent::CursorLeft { .. } => self.pointer.cursor_left(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let over_ui = consumed || gfx.egui.wants_pointer();
                self.pointer
                    .left_button(state == ElementState::Pressed, over_ui)
            }
            WindowEvent::Touch(touch) => {
                let over_ui = consumed || gfx.egui.wants_pointer();
                self.pointer
                    .touch(touch.id, touch.phase, touch.location.x as f32, over_ui)
            }
            WindowEvent::RedrawRequested => {
                redraw = true;
                None
            }
            _ => None,
        };

        if let Some(action) = action {
            self.dispatch_pointer(action);
        }
        if redraw {
            self.redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(gfx) = self.gfx.as_mut() {
            gfx.schedule(event_loop, None);
        }
    }
}
