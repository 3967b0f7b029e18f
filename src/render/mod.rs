mod camera;
mod egui_overlay;
mod mesh;
mod pipeline;
mod quad;
mod texture;

pub use camera::{contain_scale, PerspectiveCamera};
pub use egui_overlay::{EguiOverlay, UiPaint};
pub use mesh::{Geometry, GpuMesh};
pub use pipeline::{DrawPart, Lighting, ScenePipeline};
pub use quad::TexturedQuad;
pub use texture::GpuTexture;

use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::window::Window;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub struct RenderContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    formats: SurfaceFormats,
    depth_view: wgpu::TextureView,
    pipeline: ScenePipeline,
    overlay: EguiOverlay,
    clear_color: wgpu::Color,
}

impl RenderContext {
    pub fn new(window: Arc<Window>, background: [u8; 3]) -> Result<Self, RenderError> {
        pollster::block_on(Self::new_async(window, background))
    }

    async fn new_async(window: Arc<Window>, background: [u8; 3]) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        let info = adapter.get_info();
        log::info!("Using GPU: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("mediaview device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let formats = SurfaceFormats::choose(&caps.formats).ok_or(RenderError::NoSurfaceFormat)?;
        log::info!(
            "Surface format: {:?} (scene {:?}, overlay {:?})",
            formats.surface,
            formats.scene,
            formats.overlay
        );

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: formats.surface,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: formats.view_formats(),
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_view = create_depth_view(&device, config.width, config.height);
        let pipeline = ScenePipeline::new(&device, formats.scene);
        let overlay = EguiOverlay::new(&device, formats.overlay);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            formats,
            depth_view,
            pipeline,
            overlay,
            clear_color: clear_color(background),
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn pipeline(&self) -> &ScenePipeline {
        &self.pipeline
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);
    }

    /// Clears to the background, draws `parts` and then the UI overlay.
    ///
    /// Uniforms for `parts` must already be written. A lost or outdated surface is
    /// reconfigured and the frame skipped.
    pub fn render(&mut self, parts: &[&DrawPart], ui: Option<&UiPaint<'_>>) -> Result<(), RenderError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("surface timeout, skipping frame");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(self.formats.scene),
            ..Default::default()
        });
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.pipeline.draw(&mut pass, parts);
        }

        let mut commands = match ui {
            Some(ui) => {
                let overlay_view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
                    format: Some(self.formats.overlay),
                    ..Default::default()
                });
                self.overlay
                    .paint(&self.device, &self.queue, &mut encoder, &overlay_view, ui)
            }
            None => Vec::new(),
        };
        commands.push(encoder.finish());
        self.queue.submit(commands);
        frame.present();
        Ok(())
    }
}

/// Formats for one swapchain texture. The scene is drawn through an sRGB view so
/// lighting happens in linear space; egui-wgpu blends in gamma space and wants
/// the plain `Unorm` view of the same texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SurfaceFormats {
    surface: wgpu::TextureFormat,
    scene: wgpu::TextureFormat,
    overlay: wgpu::TextureFormat,
}

impl SurfaceFormats {
    fn choose(available: &[wgpu::TextureFormat]) -> Option<Self> {
        let surface = available
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .or_else(|| available.first().copied())?;
        Some(Self {
            surface,
            scene: surface.add_srgb_suffix(),
            overlay: surface.remove_srgb_suffix(),
        })
    }

    /// Extra view formats the surface must be configured with.
    fn view_formats(&self) -> Vec<wgpu::TextureFormat> {
        let mut formats = Vec::new();
        for format in [self.scene, self.overlay] {
            if format != self.surface && !formats.contains(&format) {
                formats.push(format);
            }
        }
        formats
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Converts an sRGB byte color to the linear clear color an sRGB surface expects.
pub fn clear_color(rgb: [u8; 3]) -> wgpu::Color {
    let [r, g, b] = rgb.map(srgb_to_linear);
    wgpu::Color { r, g, b, a: 1.0 }
}

fn srgb_to_linear(value: u8) -> f64 {
    let c = value as f64 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srgb_endpoints_are_exact() {
        assert_eq!(srgb_to_linear(0), 0.0);
        assert!((srgb_to_linear(255) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn srgb_surface_gives_the_overlay_a_linear_view() {
        let formats = SurfaceFormats::choose(&[
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ])
        .unwrap();
        assert_eq!(formats.surface, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(formats.scene, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(formats.overlay, wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(formats.view_formats(), vec![wgpu::TextureFormat::Bgra8Unorm]);
    }

    #[test]
    fn linear_only_surface_still_draws_the_scene_through_srgb() {
        let formats = SurfaceFormats::choose(&[wgpu::TextureFormat::Rgba8Unorm]).unwrap();
        assert_eq!(formats.surface, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(formats.scene, wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(formats.overlay, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(formats.view_formats(), vec![wgpu::TextureFormat::Rgba8UnormSrgb]);
    }

    #[test]
    fn formats_without_srgb_variant_are_used_as_is() {
        let formats = SurfaceFormats::choose(&[wgpu::TextureFormat::Rgba16Float]).unwrap();
        assert_eq!(formats.scene, wgpu::TextureFormat::Rgba16Float);
        assert_eq!(formats.overlay, wgpu::TextureFormat::Rgba16Float);
        assert!(formats.view_formats().is_empty());
        assert_eq!(SurfaceFormats::choose(&[]), None);
    }

    #[test]
    fn light_grey_background_is_linearized() {
        let color = clear_color([0xee, 0xee, 0xee]);
        assert!((color.r - 0.855).abs() < 1e-3);
        assert_eq!(color.r, color.g);
        assert_eq!(color.a, 1.0);
    }
}
