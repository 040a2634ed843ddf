use crate::error::RenderError;
use glam::{Vec2, Vec3};
use panorama_common::Rgba8;
use serde::{Deserialize, Serialize};

/// Primitive kind accumulated by a [`BufferBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawMode {
    Quads,
    Triangles,
}

impl DrawMode {
    /// Vertices per primitive.
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            DrawMode::Quads => 4,
            DrawMode::Triangles => 3,
        }
    }
}

/// Position + texture coordinate + color, the layout of the
/// position/texture/color program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub color: Rgba8,
}

/// A finished run of vertices ready for one draw call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub mode: DrawMode,
    pub vertices: Vec<Vertex>,
}

impl Batch {
    pub fn primitive_count(&self) -> usize {
        self.vertices.len() / self.mode.vertices_per_primitive()
    }

    /// Triangle-list indices for this batch. Each quad `a b c d` becomes
    /// `a b c` and `a c d`.
    pub fn indices(&self) -> Vec<u32> {
        match self.mode {
            DrawMode::Triangles => (0..self.vertices.len() as u32).collect(),
            DrawMode::Quads => (0..self.primitive_count() as u32)
                .flat_map(|q| {
                    let base = q * 4;
                    [base, base + 1, base + 2, base, base + 2, base + 3]
                })
                .collect(),
        }
    }
}

/// Immediate-mode vertex accumulator: `begin`, any number of `vertex`
/// calls, then `end` to take the finished [`Batch`].
///
/// The builder keeps its allocation between batches.
#[derive(Debug, Default)]
pub struct BufferBuilder {
    mode: Option<DrawMode>,
    vertices: Vec<Vertex>,
    stray_vertex: bool,
}

impl BufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_building(&self) -> bool {
        self.mode.is_some()
    }

    pub fn begin(&mut self, mode: DrawMode) -> Result<(), RenderError> {
        if self.mode.is_some() {
            return Err(RenderError::Builder("begin called while already building"));
        }
        self.mode = Some(mode);
        self.vertices.clear();
        Ok(())
    }

    pub fn vertex(&mut self, position: Vec3, uv: Vec2, color: Rgba8) -> &mut Self {
        if self.mode.is_none() {
            // Reported by the next `end`, even across a later `begin`.
            self.stray_vertex = true;
            return self;
        }
        self.vertices.push(Vertex {
            position,
            uv,
            color,
        });
        self
    }

    pub fn end(&mut self) -> Result<Batch, RenderError> {
        let Some(mode) = self.mode.take() else {
            self.stray_vertex = false;
            return Err(RenderError::Builder("end called without begin"));
        };
        if self.stray_vertex {
            self.stray_vertex = false;
            self.vertices.clear();
            return Err(RenderError::Builder("vertex emitted outside begin/end"));
        }
        if self.vertices.len() % mode.vertices_per_primitive() != 0 {
            self.vertices.clear();
            return Err(RenderError::Builder("incomplete primitive"));
        }
        let vertices = self.vertices.drain(..).collect();
        Ok(Batch { mode, vertices })
    }
}
