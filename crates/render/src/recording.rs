use crate::backend::{DrawBackend, ShaderProgram};
use crate::builder::Batch;
use crate::context::DrawState;
use crate::error::RenderError;
use panorama_common::TextureId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// One call received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    UseProgram(ShaderProgram),
    BindTexture { slot: u32, texture: TextureId },
    BindFallback { slot: u32 },
    Draw { batch: Batch, state: DrawState },
}

/// Backend that records commands instead of talking to a GPU.
///
/// Used by tests and the CLI trace. Failures can be injected per texture id
/// (unresolvable) or per draw index (error or panic).
#[derive(Debug, Default)]
pub struct RecordingBackend {
    commands: Vec<DrawCommand>,
    missing: BTreeSet<TextureId>,
    fail_draw: Option<usize>,
    panic_draw: Option<usize>,
    draws: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `texture` unresolvable.
    pub fn with_missing_texture(mut self, texture: TextureId) -> Self {
        self.missing.insert(texture);
        self
    }

    /// Fail the draw call with zero-based index `index`.
    pub fn fail_on_draw(mut self, index: usize) -> Self {
        self.fail_draw = Some(index);
        self
    }

    /// Panic inside the draw call with zero-based index `index`.
    pub fn panic_on_draw(mut self, index: usize) -> Self {
        self.panic_draw = Some(index);
        self
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Draw commands only, in submission order.
    pub fn draws(&self) -> impl Iterator<Item = (&Batch, &DrawState)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Draw { batch, state } => Some((batch, state)),
            _ => None,
        })
    }

    pub fn draw_count(&self) -> usize {
        self.draws().count()
    }

    /// Human-readable listing of the recorded commands.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, cmd) in self.commands.iter().enumerate() {
            let _ = match cmd {
                DrawCommand::UseProgram(p) => writeln!(out, "{i:3} use_program {p:?}"),
                DrawCommand::BindTexture { slot, texture } => {
                    writeln!(out, "{i:3} bind_texture slot={slot} {texture}")
                }
                DrawCommand::BindFallback { slot } => {
                    writeln!(out, "{i:3} bind_fallback slot={slot}")
                }
                DrawCommand::Draw { batch, .. } => {
                    let alpha = batch.vertices.first().map_or(0, |v| v.color.a);
                    writeln!(
                        out,
                        "{i:3} draw {:?} vertices={} alpha={alpha}",
                        batch.mode,
                        batch.vertices.len()
                    )
                }
            };
        }
        out
    }
}

impl DrawBackend for RecordingBackend {
    fn use_program(&mut self, program: ShaderProgram) {
        self.commands.push(DrawCommand::UseProgram(program));
    }

    fn bind_texture(&mut self, slot: u32, texture: &TextureId) -> Result<(), RenderError> {
        if self.missing.contains(texture) {
            return Err(RenderError::ResourceUnavailable(texture.clone()));
        }
        self.commands.push(DrawCommand::BindTexture {
            slot,
            texture: texture.clone(),
        });
        Ok(())
    }

    fn bind_fallback_texture(&mut self, slot: u32) {
        self.commands.push(DrawCommand::BindFallback { slot });
    }

    fn draw(&mut self, batch: &Batch, state: &DrawState) -> Result<(), RenderError> {
        let index = self.draws;
        self.draws += 1;
        if self.panic_draw == Some(index) {
            panic!("recording backend: injected panic on draw {index}");
        }
        if self.fail_draw == Some(index) {
            return Err(RenderError::SubmissionFailure(format!(
                "injected failure on draw {index}"
            )));
        }
        self.commands.push(DrawCommand::Draw {
            batch: batch.clone(),
            state: *state,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DrawMode;

    #[test]
    fn records_in_call_order() {
        let mut backend = RecordingBackend::new();
        backend.use_program(ShaderProgram::PositionTexColor);
        backend.bind_texture(0, &TextureId::from("a")).unwrap();
        backend.bind_fallback_texture(0);
        assert_eq!(
            backend.commands(),
            &[
                DrawCommand::UseProgram(ShaderProgram::PositionTexColor),
                DrawCommand::BindTexture {
                    slot: 0,
                    texture: TextureId::from("a")
                },
                DrawCommand::BindFallback { slot: 0 },
            ]
        );
    }

    #[test]
    fn missing_texture_is_unavailable_and_not_recorded() {
        let mut backend = RecordingBackend::new().with_missing_texture(TextureId::from("gone"));
        let err = backend.bind_texture(0, &TextureId::from("gone")).unwrap_err();
        assert_eq!(err, RenderError::ResourceUnavailable(TextureId::from("gone")));
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn injected_draw_failure() {
        let mut backend = RecordingBackend::new().fail_on_draw(1);
        let batch = Batch {
            mode: DrawMode::Quads,
            vertices: Vec::new(),
        };
        let state = crate::RenderContext::new().draw_state();
        assert!(backend.draw(&batch, &state).is_ok());
        assert!(matches!(
            backend.draw(&batch, &state),
            Err(RenderError::SubmissionFailure(_))
        ));
        assert!(backend.draw(&batch, &state).is_ok());
        assert_eq!(backend.draw_count(), 2);
    }

    #[test]
    fn dump_lists_commands() {
        let mut backend = RecordingBackend::new();
        backend.use_program(ShaderProgram::PositionTexColor);
        backend.bind_fallback_texture(3);
        let dump = backend.dump();
        assert!(dump.contains("use_program PositionTexColor"));
        assert!(dump.contains("bind_fallback slot=3"));
    }
}
