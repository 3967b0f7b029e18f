/// Tessellated egui output for one frame.
pub struct UiPaint<'a> {
    pub clipped_primitives: &'a [egui::ClippedPrimitive],
    pub textures_delta: &'a egui::TexturesDelta,
    pub pixels_per_point: f32,
    pub screen_size_px: [u32; 2],
}

/// Draws egui on top of the scene in its own pass, without depth.
pub struct EguiOverlay {
    renderer: egui_wgpu::Renderer,
}

impl EguiOverlay {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        Self {
            renderer: egui_wgpu::Renderer::new(device, format, None, 1, false),
        }
    }

    /// Records the overlay pass into `encoder`. Returns extra command buffers
    /// egui needs submitted ahead of `encoder`.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        ui: &UiPaint<'_>,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, image_delta) in &ui.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: ui.screen_size_px,
            pixels_per_point: ui.pixels_per_point,
        };
        let extra = self.renderer.update_buffers(
            device,
            queue,
            encoder,
            ui.clipped_primitives,
            &screen_descriptor,
        );

        {
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut pass = pass.forget_lifetime();
            self.renderer
                .render(&mut pass, ui.clipped_primitives, &screen_descriptor);
        }

        for id in &ui.textures_delta.free {
            self.renderer.free_texture(id);
        }
        extra
    }
}
