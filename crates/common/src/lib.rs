//! Shared value types for the panorama workspace.
//!
//! Kept free of math and GPU dependencies so every crate, including tooling,
//! can name textures and colors the same way.

mod types;

pub use types::{Rgba8, TextureId};
