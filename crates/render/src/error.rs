use panorama_common::TextureId;

/// Errors from skybox drawing and the draw backend boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    /// The face set does not hold exactly six textures. Raised before any
    /// render state is touched.
    #[error("face set must hold exactly 6 textures, got {0}")]
    InvalidFaceSet(usize),
    #[error("viewport aspect ratio must be positive and finite, got {0}")]
    InvalidAspect(f32),
    /// A texture id could not be resolved. Recovered per face by drawing
    /// with the fallback texture.
    #[error("texture unavailable: {0}")]
    ResourceUnavailable(TextureId),
    /// The backend has no texture unit for this slot.
    #[error("texture slot {0} is not supported by this backend")]
    UnsupportedSlot(u32),
    #[error("draw submission failed: {0}")]
    SubmissionFailure(String),
    #[error("model-view stack underflow: cannot pop the base transform")]
    StackUnderflow,
    #[error("buffer builder misuse: {0}")]
    Builder(&'static str),
}
