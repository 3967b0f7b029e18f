mod carousel;
mod egui_host;
mod input;
mod timing;
mod viewer;

use crate::assets::{AssetError, ModelData};
use crate::carousel::CarouselError;
use crate::config::{AppConfig, WindowConfig};
use crate::render::{RenderContext, RenderError};
use carousel::CarouselApp;
use egui_host::EguiHost;
use std::sync::Arc;
use std::time::Instant;
use timing::FrameTiming;
use viewer::ViewerApp;
use winit::dpi::PhysicalSize;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Carousel(#[from] CarouselError),
}

/// Events posted into the loop from background threads.
#[derive(Debug)]
pub enum AppEvent {
    ModelLoaded(Result<ModelData, AssetError>),
}

/// Window plus everything needed to draw into it.
struct Graphics {
    window: Arc<Window>,
    render: RenderContext,
    egui: EguiHost,
    timing: FrameTiming,
}

impl Graphics {
    fn create(
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
        background: [u8; 3],
    ) -> Result<Self, AppError> {
        let attributes = WindowAttributes::default()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(true);
        let window = Arc::new(event_loop.create_window(attributes)?);
        let render = RenderContext::new(window.clone(), background)?;
        let egui = EguiHost::new(&window);
        let timing = FrameTiming::new(config.title.clone(), &window);
        Ok(Self {
            window,
            render,
            egui,
            timing,
        })
    }

    /// Requests a redraw when due and sleeps until the next frame or `deadline`.
    fn schedule(&mut self, event_loop: &ActiveEventLoop, deadline: Option<Instant>) {
        if self.timing.frame_due(Instant::now()) {
            self.window.request_redraw();
        }
        let wake = match deadline {
            Some(deadline) => deadline.min(self.timing.next_frame_at()),
            None => self.timing.next_frame_at(),
        };
        event_loop.set_control_flow(ControlFlow::WaitUntil(wake));
    }
}

pub fn run_viewer(config: &AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ViewerApp::new(config, event_loop.create_proxy());
    event_loop.run_app(&mut app)?;
    app.into_result()
}

pub fn run_carousel(config: &AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = CarouselApp::new(config)?;
    event_loop.run_app(&mut app)?;
    app.into_result()
}
