use glam::{Mat3, Mat4, Vec3};
use image::RgbaImage;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to import glTF {path}: {source}")]
    Gltf {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("glTF {path} has no triangle geometry")]
    NoGeometry { path: String },
}

pub fn load_image(path: &Path) -> Result<RgbaImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let image = image::load_from_memory(&bytes).map_err(|source| AssetError::Image {
        path: path.display().to_string(),
        source,
    })?;
    Ok(image.into_rgba8())
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// One glTF primitive with its node transform baked in.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub base_color: [f32; 4],
    /// Index into [`ModelData::textures`].
    pub texture: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ModelData {
    pub name: String,
    pub meshes: Vec<MeshData>,
    pub textures: Vec<RgbaImage>,
}

impl ModelData {
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut positions = self
            .meshes
            .iter()
            .flat_map(|mesh| mesh.vertices.iter())
            .map(|vertex| Vec3::from(vertex.position));
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.indices.len() / 3).sum()
    }
}

pub fn load_model(path: &Path) -> Result<ModelData, AssetError> {
    let display = path.display().to_string();
    let (document, buffers, images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        path: display.clone(),
        source,
    })?;

    let textures: Vec<Option<RgbaImage>> = images.into_iter().map(image_to_rgba).collect();
    let mut meshes = Vec::new();
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next());
    if let Some(scene) = scene {
        for node in scene.nodes() {
            collect_node(&node, Mat4::IDENTITY, &buffers, &textures, &mut meshes);
        }
    }

    if meshes.is_empty() {
        return Err(AssetError::NoGeometry { path: display });
    }

    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("model")
        .to_string();
    Ok(ModelData {
        name,
        meshes,
        // Slots that failed conversion become 1x1 white so indices stay valid.
        textures: textures
            .into_iter()
            .map(|texture| {
                texture.unwrap_or_else(|| RgbaImage::from_pixel(1, 1, image::Rgba([255; 4])))
            })
            .collect(),
    })
}

/// Loads `path` on a background thread and hands the result to `on_done` there.
pub fn spawn_model_load<F>(path: PathBuf, on_done: F) -> std::io::Result<()>
where
    F: FnOnce(Result<ModelData, AssetError>) + Send + 'static,
{
    std::thread::Builder::new()
        .name("model-load".to_string())
        .spawn(move || {
            let started = std::time::Instant::now();
            let result = load_model(&path);
            if let Ok(model) = &result {
                log::info!(
                    "Loaded {}: {} mesh(es), {} triangles in {:.1} ms",
                    model.name,
                    model.meshes.len(),
                    model.triangle_count(),
                    started.elapsed().as_secs_f64() * 1000.0
                );
            }
            on_done(result);
        })
        .map(|_| ())
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    textures: &[Option<RgbaImage>],
    out: &mut Vec<MeshData>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("skipping non-triangle primitive in mesh {:?}", mesh.name());
                continue;
            }
            if let Some(data) = read_primitive(&primitive, world, buffers, textures) {
                out.push(data);
            }
        }
    }

    for child in node.children() {
        collect_node(&child, world, buffers, textures, out);
    }
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    world: Mat4,
    buffers: &[gltf::buffer::Data],
    textures: &[Option<RgbaImage>],
) -> Option<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(normals) => normals.collect(),
        None => compute_normals(&positions, &indices),
    };
    let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(uvs) => uvs.into_f32().collect(),
        None => vec![[0.0, 0.0]; positions.len()],
    };

    let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
    let vertices = positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let normal = normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]);
            MeshVertex {
                position: world.transform_point3(Vec3::from(*position)).into(),
                normal: (normal_matrix * Vec3::from(normal))
                    .normalize_or_zero()
                    .into(),
                uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            }
        })
        .collect();

    let pbr = primitive.material().pbr_metallic_roughness();
    let texture = pbr
        .base_color_texture()
        .map(|info| info.texture().source().index())
        .filter(|index| textures.get(*index).is_some_and(Option::is_some));

    Some(MeshData {
        vertices,
        indices,
        base_color: pbr.base_color_factor(),
        texture,
    })
}

/// Area-weighted vertex normals for primitives that ship without them.
pub fn compute_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = Vec3::from(positions[a]);
        let face = (Vec3::from(positions[b]) - pa).cross(Vec3::from(positions[c]) - pa);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|normal| {
            let normal = normal.normalize_or_zero();
            if normal == Vec3::ZERO {
                [0.0, 1.0, 0.0]
            } else {
                normal.into()
            }
        })
        .collect()
}

fn image_to_rgba(data: gltf::image::Data) -> Option<RgbaImage> {
    use gltf::image::Format;

    let pixels = match data.format {
        Format::R8G8B8A8 => data.pixels,
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        other => {
            log::warn!("unsupported glTF texture format {:?}", other);
            return None;
        }
    };
    RgbaImage::from_raw(data.width, data.height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mediaview-{}-{}", std::process::id(), name))
    }

    #[test]
    fn normals_follow_winding() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = compute_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals, vec![[0.0, 0.0, 1.0]; 3]);
    }

    #[test]
    fn degenerate_triangles_get_up_normal() {
        let positions = [[0.0, 0.0, 0.0]; 3];
        let normals = compute_normals(&positions, &[0, 1, 2, 0, 1, 9]);
        assert_eq!(normals, vec![[0.0, 1.0, 0.0]; 3]);
    }

    #[test]
    fn load_image_reads_png() {
        let path = temp_path("image.png");
        RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let image = load_image(&path).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [10, 20, 30, 255]);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_image_is_a_read_error() {
        let err = load_image(Path::new("/no/such/image.jpg")).unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
    }

    #[test]
    fn load_model_bakes_node_transform() {
        let bin_name = format!("mediaview-{}-tri.bin", std::process::id());
        let bin_path = std::env::temp_dir().join(&bin_name);
        let gltf_path = temp_path("tri.gltf");

        let mut buffer = Vec::new();
        for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            buffer.extend_from_slice(&value.to_le_bytes());
        }
        for index in [0u16, 1, 2] {
            buffer.extend_from_slice(&index.to_le_bytes());
        }
        std::fs::write(&bin_path, &buffer).unwrap();

        let json = format!(
            r#"{{
                "asset": {{ "version": "2.0" }},
                "scene": 0,
                "scenes": [{{ "nodes": [0] }}],
                "nodes": [{{ "mesh": 0, "translation": [0.0, 1.0, 0.0] }}],
                "meshes": [{{ "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }}] }}],
                "buffers": [{{ "uri": "{bin}", "byteLength": {len} }}],
                "bufferViews": [
                    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
                    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
                ],
                "accessors": [
                    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                       "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
                    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
                ]
            }}"#,
            bin = bin_name,
            len = buffer.len()
        );
        std::fs::write(&gltf_path, json).unwrap();

        let model = load_model(&gltf_path).unwrap();
        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[2].position, [0.0, 2.0, 0.0]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.base_color, [1.0, 1.0, 1.0, 1.0]);
        assert!(mesh.texture.is_none());
        assert_eq!(model.triangle_count(), 1);

        let (min, max) = model.bounds().unwrap();
        assert_eq!(min, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 2.0, 0.0));

        let _ = std::fs::remove_file(bin_path);
        let _ = std::fs::remove_file(gltf_path);
    }

    #[test]
    fn spawned_load_reports_failure() {
        let (tx, rx) = std::sync::mpsc::channel();
        spawn_model_load(PathBuf::from("/no/such/model.glb"), move |result| {
            let _ = tx.send(result.is_err());
        })
        .unwrap();
        assert!(rx.recv_timeout(std::time::Duration::from_secs(10)).unwrap());
    }
}
