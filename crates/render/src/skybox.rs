use crate::backend::{DrawBackend, ShaderProgram};
use crate::builder::{BufferBuilder, DrawMode};
use crate::config::SkyboxConfig;
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::faces::{FACE_TABLE, FaceSet};
use glam::Mat4;
use panorama_common::Rgba8;
use std::f32::consts::PI;

/// Outcome of a successful skybox draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawReport {
    /// Batches submitted, one per face.
    pub batches: usize,
    /// Face indices drawn with the fallback texture.
    pub fallback_faces: Vec<usize>,
}

/// Alpha channel byte for a blend factor: clamped to `[0, 1]`, scaled by 255
/// and rounded half away from zero. NaN maps to 0.
pub fn alpha_byte(alpha: f32) -> u8 {
    let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
    (255.0 * alpha).round() as u8
}

/// Draws six textured faces around the viewer.
///
/// # Invariants
/// - Model-view depth and the active projection are the same after `draw` as
///   before it, on success, on error and during unwinding.
/// - Exactly one batch per face, in face-index order.
/// - The vertex stream depends only on the face table, `yaw` and `alpha`.
#[derive(Debug, Default)]
pub struct SkyboxRenderer {
    config: SkyboxConfig,
    builder: BufferBuilder,
}

impl SkyboxRenderer {
    pub fn new(config: SkyboxConfig) -> Self {
        Self {
            config,
            builder: BufferBuilder::new(),
        }
    }

    pub fn config(&self) -> &SkyboxConfig {
        &self.config
    }

    /// Draw `faces` rotated by `yaw` degrees about Y, blended with `alpha`.
    ///
    /// `pitch` is accepted for callers that animate it but is not applied:
    /// the panorama only spins about Y.
    ///
    /// Fails with [`RenderError::InvalidFaceSet`] or
    /// [`RenderError::InvalidAspect`] before touching `ctx`. Unresolvable face
    /// textures are drawn with the backend's fallback texture. A failed draw
    /// submission is returned after `ctx` has been restored.
    #[allow(clippy::too_many_arguments)]
    pub fn draw<B: DrawBackend + ?Sized>(
        &mut self,
        ctx: &mut RenderContext,
        backend: &mut B,
        faces: &FaceSet,
        yaw: f32,
        pitch: f32,
        alpha: f32,
        aspect: f32,
    ) -> Result<DrawReport, RenderError> {
        let textures = faces.validated()?;
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(RenderError::InvalidAspect(aspect));
        }
        tracing::trace!(yaw, pitch, alpha, aspect, "drawing skybox");

        let mut projection = ctx.swap_projection(self.config.projection(aspect));

        let mut flipped = projection.push_scope();
        flipped.load_identity();
        // Face textures are stored Y-down.
        flipped.multiply(Mat4::from_rotation_x(PI));
        flipped.apply_model_view();

        backend.use_program(ShaderProgram::PositionTexColor);

        let mut spun = flipped.push_scope();
        spun.multiply(Mat4::from_rotation_y(yaw.to_radians()));
        spun.apply_model_view();

        let slot = self.config.texture_slot;
        let color = Rgba8::WHITE.with_alpha(alpha_byte(alpha));
        let mut report = DrawReport::default();

        for (index, texture) in textures.iter().enumerate() {
            if let Err(err) = backend.bind_texture(slot, texture) {
                tracing::warn!(face = index, %texture, error = %err, "skybox face unavailable, using fallback");
                backend.bind_fallback_texture(slot);
                report.fallback_faces.push(index);
            }

            self.builder.begin(DrawMode::Quads)?;
            for corner in &FACE_TABLE[index] {
                self.builder.vertex(corner.position, corner.uv, color);
            }
            let batch = self.builder.end()?;

            if let Err(err) = backend.draw(&batch, &spun.draw_state()) {
                tracing::error!(face = index, error = %err, "skybox draw submission failed");
                return Err(err);
            }
            report.batches += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DrawState;
    use crate::faces::FACE_COUNT;
    use crate::recording::{DrawCommand, RecordingBackend};
    use glam::Vec3;
    use panorama_common::TextureId;

    fn faces() -> FaceSet {
        FaceSet::panorama("panorama")
    }

    fn scene_context() -> RenderContext {
        let mut ctx = RenderContext::with_projection(Mat4::orthographic_rh(
            0.0, 800.0, 600.0, 0.0, 1000.0, 3000.0,
        ));
        ctx.multiply(Mat4::from_translation(Vec3::new(0.0, 0.0, -2000.0)));
        ctx.apply_model_view();
        ctx
    }

    fn draw(
        ctx: &mut RenderContext,
        backend: &mut RecordingBackend,
        yaw: f32,
        alpha: f32,
    ) -> Result<DrawReport, RenderError> {
        SkyboxRenderer::default().draw(ctx, backend, &faces(), yaw, 25.0, alpha, 16.0 / 9.0)
    }

    fn alphas(backend: &RecordingBackend) -> Vec<u8> {
        backend
            .draws()
            .flat_map(|(b, _)| b.vertices.iter().map(|v| v.color.a))
            .collect()
    }

    #[test]
    fn state_is_balanced_after_draw() {
        let mut ctx = scene_context();
        let before = ctx.clone();
        let mut backend = RecordingBackend::new();
        draw(&mut ctx, &mut backend, 30.0, 1.0).unwrap();
        assert_eq!(ctx, before);
    }

    #[test]
    fn issues_one_batch_per_face_in_order() {
        let mut ctx = RenderContext::new();
        let mut backend = RecordingBackend::new();
        let report = draw(&mut ctx, &mut backend, 0.0, 1.0).unwrap();
        assert_eq!(report.batches, FACE_COUNT);
        assert!(report.fallback_faces.is_empty());

        let cmds = backend.commands();
        assert_eq!(cmds[0], DrawCommand::UseProgram(ShaderProgram::PositionTexColor));
        assert_eq!(cmds.len(), 1 + 2 * FACE_COUNT);
        for (i, pair) in cmds[1..].chunks(2).enumerate() {
            assert_eq!(
                pair[0],
                DrawCommand::BindTexture {
                    slot: 0,
                    texture: TextureId(format!("panorama_{i}.png")),
                }
            );
            let DrawCommand::Draw { batch, .. } = &pair[1] else {
                panic!("expected draw after bind, got {:?}", pair[1]);
            };
            assert_eq!(batch.mode, DrawMode::Quads);
            let positions: Vec<Vec3> = batch.vertices.iter().map(|v| v.position).collect();
            let expected: Vec<Vec3> = FACE_TABLE[i].iter().map(|c| c.position).collect();
            assert_eq!(positions, expected);
        }
    }

    #[test]
    fn draws_use_skybox_projection_and_flip_yaw_transform() {
        let mut ctx = scene_context();
        let mut backend = RecordingBackend::new();
        draw(&mut ctx, &mut backend, 90.0, 1.0).unwrap();

        let expected = DrawState {
            projection: SkyboxConfig::default().projection(16.0 / 9.0),
            model_view: Mat4::from_rotation_x(PI) * Mat4::from_rotation_y(90f32.to_radians()),
        };
        for (_, state) in backend.draws() {
            assert_eq!(*state, expected);
        }
    }

    #[test]
    fn pitch_is_not_applied() {
        let mut a = RecordingBackend::new();
        let mut b = RecordingBackend::new();
        let mut renderer = SkyboxRenderer::default();
        renderer
            .draw(&mut RenderContext::new(), &mut a, &faces(), 10.0, 0.0, 1.0, 1.0)
            .unwrap();
        renderer
            .draw(&mut RenderContext::new(), &mut b, &faces(), 10.0, 45.0, 1.0, 1.0)
            .unwrap();
        assert_eq!(a.commands(), b.commands());
    }

    #[test]
    fn alpha_maps_to_rounded_byte() {
        for (alpha, expected) in [(0.0, 0u8), (1.0, 255), (0.5, 128)] {
            let mut backend = RecordingBackend::new();
            draw(&mut RenderContext::new(), &mut backend, 0.0, alpha).unwrap();
            let got = alphas(&backend);
            assert_eq!(got.len(), 4 * FACE_COUNT);
            assert!(got.iter().all(|&a| a == expected), "alpha {alpha}: {got:?}");
        }
    }

    #[test]
    fn alpha_is_clamped() {
        assert_eq!(alpha_byte(-0.5), 0);
        assert_eq!(alpha_byte(3.0), 255);
        assert_eq!(alpha_byte(f32::NAN), 0);
        assert_eq!(alpha_byte(0.25), 64);
    }

    #[test]
    fn color_is_white_with_alpha() {
        let mut backend = RecordingBackend::new();
        draw(&mut RenderContext::new(), &mut backend, 0.0, 0.5).unwrap();
        for (batch, _) in backend.draws() {
            for v in &batch.vertices {
                assert_eq!(v.color, Rgba8::new(255, 255, 255, 128));
            }
        }
    }

    #[test]
    fn missing_texture_falls_back_and_continues() {
        let mut ctx = scene_context();
        let before = ctx.clone();
        let mut backend =
            RecordingBackend::new().with_missing_texture(TextureId::from("panorama_3.png"));
        let report = draw(&mut ctx, &mut backend, 0.0, 1.0).unwrap();

        assert_eq!(report.batches, FACE_COUNT);
        assert_eq!(report.fallback_faces, vec![3]);
        assert_eq!(backend.draw_count(), FACE_COUNT);
        assert!(backend.commands().contains(&DrawCommand::BindFallback { slot: 0 }));
        assert_eq!(ctx, before);
    }

    #[test]
    fn short_face_set_is_rejected_without_mutation() {
        let mut ctx = scene_context();
        let before = ctx.clone();
        let mut backend = RecordingBackend::new();
        let five = FaceSet::new((0..5).map(|i| TextureId(format!("f{i}"))).collect());

        let err = SkyboxRenderer::default()
            .draw(&mut ctx, &mut backend, &five, 0.0, 0.0, 1.0, 1.0)
            .unwrap_err();
        assert_eq!(err, RenderError::InvalidFaceSet(5));
        assert_eq!(ctx, before);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn bad_aspect_is_rejected_without_mutation() {
        let mut ctx = scene_context();
        let before = ctx.clone();
        let mut backend = RecordingBackend::new();
        for aspect in [0.0, -1.0, f32::INFINITY] {
            let err = SkyboxRenderer::default()
                .draw(&mut ctx, &mut backend, &faces(), 0.0, 0.0, 1.0, aspect)
                .unwrap_err();
            assert!(matches!(err, RenderError::InvalidAspect(_)));
        }
        assert_eq!(ctx, before);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn submission_failure_propagates_after_restore() {
        for failing in 0..FACE_COUNT {
            let mut ctx = scene_context();
            let before = ctx.clone();
            let mut backend = RecordingBackend::new().fail_on_draw(failing);
            let err = draw(&mut ctx, &mut backend, 45.0, 1.0).unwrap_err();
            assert!(matches!(err, RenderError::SubmissionFailure(_)));
            assert_eq!(backend.draw_count(), failing);
            assert_eq!(ctx, before, "state leaked when draw {failing} failed");
        }
    }

    #[test]
    fn panic_in_backend_restores_state() {
        let mut ctx = scene_context();
        let before = ctx.clone();
        let mut backend = RecordingBackend::new().panic_on_draw(2);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            draw(&mut ctx, &mut backend, 45.0, 1.0)
        }));
        assert!(result.is_err());
        assert_eq!(ctx, before);
    }

    #[test]
    fn identical_inputs_give_identical_streams() {
        let mut a = RecordingBackend::new();
        let mut b = RecordingBackend::new();
        draw(&mut scene_context(), &mut a, 123.4, 0.7).unwrap();
        draw(&mut scene_context(), &mut b, 123.4, 0.7).unwrap();
        assert_eq!(a.commands(), b.commands());
    }

    #[test]
    fn renderer_is_reusable_across_frames() {
        let mut renderer = SkyboxRenderer::default();
        let mut ctx = RenderContext::new();
        let mut backend = RecordingBackend::new().fail_on_draw(1);
        assert!(renderer
            .draw(&mut ctx, &mut backend, &faces(), 0.0, 0.0, 1.0, 1.0)
            .is_err());
        let report = renderer
            .draw(&mut ctx, &mut backend, &faces(), 0.0, 0.0, 1.0, 1.0)
            .unwrap();
        assert_eq!(report.batches, FACE_COUNT);
    }
}
