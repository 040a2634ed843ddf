use crate::error::BackendError;
use panorama_common::TextureId;
use panorama_render::Face;
use std::collections::BTreeMap;

/// Fallback texture: 2x2 magenta/black checker.
const FALLBACK_PIXELS: [u8; 16] = [
    255, 0, 255, 255, 0, 0, 0, 255, //
    0, 0, 0, 255, 255, 0, 255, 255, //
];

struct GpuTexture {
    bind_group: wgpu::BindGroup,
    // Kept alive for the bind group.
    _texture: wgpu::Texture,
}

/// Face textures uploaded to the GPU, keyed by id, plus the fallback.
pub struct TextureRegistry {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: BTreeMap<TextureId, GpuTexture>,
    fallback: GpuTexture,
}

impl TextureRegistry {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("face_texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("face_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let fallback = create_texture(
            device,
            queue,
            &layout,
            &sampler,
            "fallback_texture",
            2,
            2,
            &FALLBACK_PIXELS,
        );

        Self {
            layout,
            sampler,
            textures: BTreeMap::new(),
            fallback,
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    /// Upload (or replace) `id` from tightly packed RGBA8 pixels.
    pub fn upload_rgba8(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: TextureId,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<(), BackendError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(BackendError::TextureSize {
                id: id.0,
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        let texture = create_texture(
            device,
            queue,
            &self.layout,
            &self.sampler,
            id.as_str(),
            width,
            height,
            pixels,
        );
        tracing::debug!(texture = %id, width, height, "uploaded face texture");
        self.textures.insert(id, texture);
        Ok(())
    }

    pub fn contains(&self, id: &TextureId) -> bool {
        self.textures.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub(crate) fn bind_group(&self, id: Option<&TextureId>) -> &wgpu::BindGroup {
        id.and_then(|id| self.textures.get(id))
            .map_or(&self.fallback.bind_group, |t| &t.bind_group)
    }
}

#[allow(clippy::too_many_arguments)]
fn create_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    width: u32,
    height: u32,
    pixels: &[u8],
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    let view = texture.create_view(&Default::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuTexture {
        bind_group,
        _texture: texture,
    }
}

/// Deterministic RGBA8 image for `face`: a vertical sky gradient tinted per
/// face, with a grid every eighth of the edge so rotation is visible.
pub fn procedural_face(face: Face, size: u32) -> Vec<u8> {
    let tint: [f32; 3] = match face {
        Face::Front => [0.45, 0.65, 1.0],
        Face::Right => [0.55, 0.75, 0.95],
        Face::Back => [0.65, 0.6, 0.95],
        Face::Left => [0.5, 0.8, 0.85],
        Face::Top => [0.35, 0.55, 1.0],
        Face::Bottom => [0.35, 0.45, 0.3],
    };
    let size = size.max(1);
    let cell = (size / 8).max(1);
    let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
    for y in 0..size {
        let shade = 0.55 + 0.45 * (1.0 - y as f32 / size as f32);
        for x in 0..size {
            let grid = x % cell == 0 || y % cell == 0;
            let k = if grid { shade * 0.6 } else { shade };
            for channel in tint {
                pixels.push((channel * k * 255.0).round().clamp(0.0, 255.0) as u8);
            }
            pixels.push(255);
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procedural_face_has_rgba8_size() {
        for face in Face::ALL {
            assert_eq!(procedural_face(face, 16).len(), 16 * 16 * 4);
        }
    }

    #[test]
    fn procedural_faces_are_deterministic_and_distinct() {
        assert_eq!(procedural_face(Face::Left, 32), procedural_face(Face::Left, 32));
        assert_ne!(procedural_face(Face::Left, 32), procedural_face(Face::Right, 32));
    }

    #[test]
    fn procedural_face_is_opaque() {
        let pixels = procedural_face(Face::Top, 8);
        assert!(pixels.chunks(4).all(|p| p[3] == 255));
    }

    #[test]
    fn fallback_is_two_by_two_checker() {
        assert_eq!(FALLBACK_PIXELS.len(), 2 * 2 * 4);
        assert_eq!(&FALLBACK_PIXELS[0..4], &FALLBACK_PIXELS[12..16]);
        assert_eq!(&FALLBACK_PIXELS[4..8], &FALLBACK_PIXELS[8..12]);
    }
}
