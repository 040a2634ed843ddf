//! wgpu backend for the skybox core.
//!
//! [`WgpuSkyboxBackend`] implements [`panorama_render::DrawBackend`]: every
//! face draw becomes one indexed draw call with its own view-projection slot.
//! Face textures live in a [`TextureRegistry`]; unknown ids sample a 2x2
//! magenta/black checker.
//!
//! # Invariants
//! - Queued draws are recorded in submission order.
//! - The backend never touches the caller's `RenderContext`.

mod error;
mod gpu;
mod headless;
mod queue;
mod shaders;
mod textures;

pub use error::BackendError;
pub use gpu::{GpuVertex, WgpuSkyboxBackend};
pub use headless::{HeadlessGpu, OFFSCREEN_FORMAT};
pub use queue::{TEXTURE_SLOT, uniform_stride};
pub use shaders::SKYBOX_SHADER;
pub use textures::{TextureRegistry, procedural_face};
