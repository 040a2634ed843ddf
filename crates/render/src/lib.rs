//! Skybox rendering core, independent of any GPU API.
//!
//! # Invariants
//! - Render state (projection, model-view stack) is owned by an explicit
//!   [`RenderContext`] and only changed through scopes that restore it.
//! - A skybox draw leaves the context exactly as it found it, whatever the
//!   backend does.
//! - Face geometry comes from one constant table, never from branching code.
//!
//! Backends plug in through [`DrawBackend`]. [`RecordingBackend`] records
//! commands instead of drawing and is what tests and the CLI trace run on.

mod backend;
mod builder;
mod config;
mod context;
mod error;
mod faces;
mod panorama;
mod recording;
mod skybox;

pub use backend::{DrawBackend, ShaderProgram};
pub use builder::{Batch, BufferBuilder, DrawMode, Vertex};
pub use config::{ConfigError, PanoramaConfig, SkyboxConfig};
pub use context::{DrawState, ModelViewScope, ProjectionScope, RenderContext};
pub use error::RenderError;
pub use faces::{FACE_COUNT, FACE_TABLE, Face, FaceCorner, FaceSet, UV_ORDER};
pub use panorama::RotatingPanorama;
pub use recording::{DrawCommand, RecordingBackend};
pub use skybox::{DrawReport, SkyboxRenderer, alpha_byte};

pub fn crate_info() -> &'static str {
    "panorama-render v0.1.0"
}
