use super::{DrawPart, Geometry, GpuMesh, GpuTexture, RenderContext};

/// A mesh whose texture is replaced wholesale: stills, or video frames that may
/// change size mid-stream.
pub struct TexturedQuad {
    texture: GpuTexture,
    part: DrawPart,
}

impl TexturedQuad {
    pub fn new(
        render: &RenderContext,
        label: &str,
        geometry: &Geometry,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Self {
        let device = render.device();
        let texture = GpuTexture::from_rgba(device, render.queue(), label, width, height, rgba);
        let mesh = GpuMesh::from_geometry(device, label, geometry);
        let part = render
            .pipeline()
            .create_part(device, mesh, &texture, [1.0; 4], false);
        Self { texture, part }
    }

    pub fn size(&self) -> (u32, u32) {
        self.texture.size()
    }

    pub fn part(&self) -> &DrawPart {
        &self.part
    }

    pub fn upload(&mut self, render: &RenderContext, width: u32, height: u32, rgba: &[u8]) {
        if self.texture.size() == (width.max(1), height.max(1)) {
            self.texture.write(render.queue(), rgba);
            return;
        }
        log::debug!(
            "texture resized {:?} -> {}x{}",
            self.texture.size(),
            width,
            height
        );
        self.texture =
            GpuTexture::from_rgba(render.device(), render.queue(), "media", width, height, rgba);
        render
            .pipeline()
            .rebind(render.device(), &mut self.part, &self.texture);
    }
}
