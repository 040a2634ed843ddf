use crate::builder::Batch;
use crate::context::DrawState;
use crate::error::RenderError;
use panorama_common::TextureId;
use serde::{Deserialize, Serialize};

/// GPU programs a backend can be asked to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderProgram {
    /// Position, texture coordinate and packed color per vertex.
    PositionTexColor,
}

/// Draw submission boundary: program selection, texture binding and
/// per-batch draw calls.
///
/// Implementations own the GPU (or recording) side. The skybox core only
/// talks to a backend through this trait.
pub trait DrawBackend {
    fn use_program(&mut self, program: ShaderProgram);

    /// Bind `texture` to `slot`. Returns [`RenderError::ResourceUnavailable`]
    /// when the id cannot be resolved, or [`RenderError::UnsupportedSlot`]
    /// when the backend has no such slot; the previous binding is left as is.
    fn bind_texture(&mut self, slot: u32, texture: &TextureId) -> Result<(), RenderError>;

    /// Bind the backend's placeholder texture to `slot`. Must leave the next
    /// draw with a texture even when `slot` was rejected by `bind_texture`.
    fn bind_fallback_texture(&mut self, slot: u32);

    /// Issue one draw call for `batch` using the transforms in `state`.
    fn draw(&mut self, batch: &Batch, state: &DrawState) -> Result<(), RenderError>;
}
