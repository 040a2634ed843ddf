use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a texture resource, resolved by whichever backend draws it.
///
/// Identifiers are opaque strings such as
/// `textures/gui/title/background/panorama_0.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub String);

impl TextureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TextureId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// 8-bit straight-alpha RGBA color, the per-vertex color format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Pack into a single word as `0xAARRGGBB`.
    ///
    /// The RGB layout matches what the GPU program unpacks:
    /// red at bits 16..24, green at 8..16, blue at 0..8.
    pub const fn pack(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub const fn from_packed(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xff) as u8,
            g: ((packed >> 8) & 0xff) as u8,
            b: (packed & 0xff) as u8,
            a: ((packed >> 24) & 0xff) as u8,
        }
    }

    /// Channels normalized to `[0, 1]`, in R, G, B, A order.
    pub fn to_normalized(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Self::WHITE
    }
}
