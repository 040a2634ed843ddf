use crate::gpu::GpuVertex;
use bytemuck::{Pod, Zeroable};
use panorama_common::TextureId;
use panorama_render::{Batch, DrawBackend, DrawState, RenderError, ShaderProgram};

/// The only texture unit the skybox pipeline has.
pub const TEXTURE_SLOT: u32 = 0;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
}

pub(crate) const UNIFORM_SIZE: u64 = std::mem::size_of::<Uniforms>() as u64;

/// Byte distance between per-draw uniform slots for a device whose dynamic
/// offsets must be multiples of `alignment`.
pub fn uniform_stride(alignment: u32) -> u64 {
    let align = u64::from(alignment.max(1));
    UNIFORM_SIZE.div_ceil(align) * align
}

#[derive(Debug, Clone, PartialEq)]
enum Binding {
    Texture(TextureId),
    Fallback,
}

/// One queued draw call. `texture: None` samples the fallback texture.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueuedDraw {
    pub texture: Option<TextureId>,
    pub first_index: u32,
    pub index_count: u32,
    pub uniform_offset: u32,
}

/// CPU side of the wgpu backend: vertex, index and uniform bytes for every
/// draw since the last flush, plus the current program and texture binding.
///
/// As a [`DrawBackend`] it takes every texture id as resolved; the wgpu
/// backend checks its registry before forwarding a bind.
#[derive(Debug)]
pub(crate) struct DrawQueue {
    uniform_stride: u64,
    program: Option<ShaderProgram>,
    binding: Option<Binding>,
    vertices: Vec<GpuVertex>,
    indices: Vec<u32>,
    uniforms: Vec<u8>,
    draws: Vec<QueuedDraw>,
}

impl DrawQueue {
    pub fn new(uniform_stride: u64) -> Self {
        Self {
            uniform_stride,
            program: None,
            binding: None,
            vertices: Vec::new(),
            indices: Vec::new(),
            uniforms: Vec::new(),
            draws: Vec::new(),
        }
    }

    pub fn vertices(&self) -> &[GpuVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Uniform bytes, one `uniform_stride` slot per draw.
    pub fn uniforms(&self) -> &[u8] {
        &self.uniforms
    }

    pub fn draws(&self) -> &[QueuedDraw] {
        &self.draws
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Drop queued geometry. Program and binding carry over.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.uniforms.clear();
        self.draws.clear();
    }
}

impl DrawBackend for DrawQueue {
    fn use_program(&mut self, program: ShaderProgram) {
        self.program = Some(program);
    }

    fn bind_texture(&mut self, slot: u32, texture: &TextureId) -> Result<(), RenderError> {
        if slot != TEXTURE_SLOT {
            return Err(RenderError::UnsupportedSlot(slot));
        }
        self.binding = Some(Binding::Texture(texture.clone()));
        Ok(())
    }

    fn bind_fallback_texture(&mut self, slot: u32) {
        if slot != TEXTURE_SLOT {
            tracing::debug!(slot, "fallback texture bound to slot {TEXTURE_SLOT}");
        }
        self.binding = Some(Binding::Fallback);
    }

    fn draw(&mut self, batch: &Batch, state: &DrawState) -> Result<(), RenderError> {
        if self.program.is_none() {
            return Err(RenderError::SubmissionFailure("no program selected".into()));
        }
        let texture = match &self.binding {
            Some(Binding::Texture(id)) => Some(id.clone()),
            Some(Binding::Fallback) => None,
            None => {
                return Err(RenderError::SubmissionFailure("no texture bound".into()));
            }
        };

        let base = self.vertices.len() as u32;
        let first_index = self.indices.len() as u32;
        let slot = self.draws.len() as u64;

        self.vertices.extend(batch.vertices.iter().map(GpuVertex::from));
        self.indices.extend(batch.indices().into_iter().map(|i| base + i));

        let offset = (slot * self.uniform_stride) as usize;
        self.uniforms.resize(offset + self.uniform_stride as usize, 0);
        let uniforms = Uniforms {
            view_proj: state.view_projection().to_cols_array_2d(),
        };
        let bytes = bytemuck::bytes_of(&uniforms);
        self.uniforms[offset..offset + bytes.len()].copy_from_slice(bytes);

        self.draws.push(QueuedDraw {
            texture,
            first_index,
            index_count: self.indices.len() as u32 - first_index,
            uniform_offset: offset as u32,
        });
        Ok(())
    }
}
