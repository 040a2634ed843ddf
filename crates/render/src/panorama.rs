use crate::backend::DrawBackend;
use crate::config::SkyboxConfig;
use crate::context::RenderContext;
use crate::error::RenderError;
use crate::faces::FaceSet;
use crate::skybox::{DrawReport, SkyboxRenderer};

/// Slowly spinning title-screen panorama.
///
/// Time is counted in ticks and only moves forward through [`advance`];
/// the same time always yields the same angles.
///
/// [`advance`]: RotatingPanorama::advance
#[derive(Debug)]
pub struct RotatingPanorama {
    renderer: SkyboxRenderer,
    faces: FaceSet,
    time: f32,
}

impl RotatingPanorama {
    /// Panorama over the faces named by `config.panorama.texture_prefix`.
    pub fn new(config: SkyboxConfig) -> Self {
        let faces = FaceSet::panorama(&config.panorama.texture_prefix);
        Self::with_faces(config, faces)
    }

    pub fn with_faces(config: SkyboxConfig, faces: FaceSet) -> Self {
        Self {
            renderer: SkyboxRenderer::new(config),
            faces,
            time: 0.0,
        }
    }

    pub fn faces(&self) -> &FaceSet {
        &self.faces
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Move time forward. Negative or non-finite deltas are ignored.
    pub fn advance(&mut self, delta_ticks: f32) {
        if delta_ticks.is_finite() && delta_ticks > 0.0 {
            self.time += delta_ticks;
        }
    }

    /// `(yaw, pitch)` in degrees at the current time.
    pub fn angles(&self) -> (f32, f32) {
        let p = &self.renderer.config().panorama;
        let yaw = -self.time * p.spin_speed;
        let pitch = (self.time * p.wobble_frequency).sin() * p.wobble_amplitude + p.base_pitch;
        (yaw, pitch)
    }

    pub fn render<B: DrawBackend + ?Sized>(
        &mut self,
        ctx: &mut RenderContext,
        backend: &mut B,
        alpha: f32,
        aspect: f32,
    ) -> Result<DrawReport, RenderError> {
        let (yaw, pitch) = self.angles();
        self.renderer.draw(
            ctx,
            backend,
            &self.faces,
            yaw,
            pitch,
            alpha.clamp(0.0, 1.0),
            aspect,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingBackend;
    use glam::Mat4;
    use std::f32::consts::PI;

    #[test]
    fn starts_at_base_pitch_facing_forward() {
        let panorama = RotatingPanorama::new(SkyboxConfig::default());
        let (yaw, pitch) = panorama.angles();
        assert_eq!(yaw, 0.0);
        assert_eq!(pitch, 25.0);
    }

    #[test]
    fn advance_spins_backwards() {
        let mut panorama = RotatingPanorama::new(SkyboxConfig::default());
        panorama.advance(100.0);
        let (yaw, pitch) = panorama.angles();
        assert!((yaw + 10.0).abs() < 1e-4);
        assert!((pitch - (0.1f32.sin() * 5.0 + 25.0)).abs() < 1e-4);
    }

    #[test]
    fn advance_ignores_bad_deltas() {
        let mut panorama = RotatingPanorama::new(SkyboxConfig::default());
        panorama.advance(-1.0);
        panorama.advance(f32::NAN);
        assert_eq!(panorama.time(), 0.0);
    }

    #[test]
    fn render_applies_current_yaw() {
        let mut panorama = RotatingPanorama::new(SkyboxConfig::default());
        panorama.advance(900.0);
        let mut ctx = RenderContext::new();
        let mut backend = RecordingBackend::new();
        let report = panorama.render(&mut ctx, &mut backend, 2.0, 1.0).unwrap();
        assert_eq!(report.batches, 6);

        let (yaw, _) = panorama.angles();
        let expected = Mat4::from_rotation_x(PI) * Mat4::from_rotation_y(yaw.to_radians());
        let (batch, state) = backend.draws().next().unwrap();
        assert_eq!(state.model_view, expected);
        assert_eq!(batch.vertices[0].color.a, 255);
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn faces_follow_configured_prefix() {
        let mut config = SkyboxConfig::default();
        config.panorama.texture_prefix = "custom/sky".into();
        let panorama = RotatingPanorama::new(config);
        assert_eq!(
            panorama.faces().iter().next().map(|t| t.as_str()),
            Some("custom/sky_0.png")
        );
    }
}
