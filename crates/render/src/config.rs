//! Skybox and panorama configuration.
//!
//! Loaded from YAML or JSON depending on the file extension. Every field has
//! a default, so a config file only needs the values it changes.

use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Projection and texture binding parameters of the skybox draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyboxConfig {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Texture slot face textures are bound to.
    pub texture_slot: u32,
    pub panorama: PanoramaConfig,
}

impl Default for SkyboxConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 85.0,
            near: 0.05,
            far: 10.0,
            texture_slot: 0,
            panorama: PanoramaConfig::default(),
        }
    }
}

/// Motion of the rotating title-screen panorama. Angles are in degrees,
/// time is in ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoramaConfig {
    /// Face textures are `{texture_prefix}_0.png` .. `{texture_prefix}_5.png`.
    pub texture_prefix: String,
    /// Yaw change per tick.
    pub spin_speed: f32,
    pub wobble_amplitude: f32,
    /// Radians of wobble phase per tick.
    pub wobble_frequency: f32,
    pub base_pitch: f32,
}

impl Default for PanoramaConfig {
    fn default() -> Self {
        Self {
            texture_prefix: "textures/gui/title/background/panorama".into(),
            spin_speed: 0.1,
            wobble_amplitude: 5.0,
            wobble_frequency: 0.001,
            base_pitch: 25.0,
        }
    }
}

impl SkyboxConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text)?,
            Some("json") => serde_json::from_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded skybox config");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.panorama;
        let finite = [
            self.fov_degrees,
            self.near,
            self.far,
            p.spin_speed,
            p.wobble_amplitude,
            p.wobble_frequency,
            p.base_pitch,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::Invalid("values must be finite".into()));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees must be in (0, 180), got {}",
                self.fov_degrees
            )));
        }
        if self.near <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "near must be positive, got {}",
                self.near
            )));
        }
        if self.far <= self.near {
            return Err(ConfigError::Invalid(format!(
                "far ({}) must be greater than near ({})",
                self.far, self.near
            )));
        }
        Ok(())
    }

    /// Skybox projection for the given viewport aspect ratio.
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_skybox_constants() {
        let c = SkyboxConfig::default();
        assert_eq!(c.fov_degrees, 85.0);
        assert_eq!(c.near, 0.05);
        assert_eq!(c.far, 10.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let c = SkyboxConfig::from_yaml_str("fov_degrees: 70\npanorama:\n  spin_speed: 0.5\n")
            .unwrap();
        assert_eq!(c.fov_degrees, 70.0);
        assert_eq!(c.far, 10.0);
        assert_eq!(c.panorama.spin_speed, 0.5);
        assert_eq!(c.panorama.base_pitch, 25.0);
    }

    #[test]
    fn load_json_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("skybox.json");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, r#"{{ "near": 0.1, "far": 20.0 }}"#).unwrap();

        let c = SkyboxConfig::load(&path).unwrap();
        assert_eq!(c.near, 0.1);
        assert_eq!(c.far, 20.0);
        assert_eq!(c.fov_degrees, 85.0);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("skybox.yaml");
        std::fs::write(&path, "near: 5.0\nfar: 1.0\n").unwrap();
        assert!(matches!(
            SkyboxConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("skybox.toml");
        std::fs::write(&path, "near = 1").unwrap();
        assert!(matches!(
            SkyboxConfig::load(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_fov() {
        let c = SkyboxConfig {
            fov_degrees: 180.0,
            ..SkyboxConfig::default()
        };
        assert!(c.validate().is_err());
        let c = SkyboxConfig {
            fov_degrees: f32::NAN,
            ..SkyboxConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn projection_matches_perspective() {
        let c = SkyboxConfig::default();
        let expected = Mat4::perspective_rh(85f32.to_radians(), 1.5, 0.05, 10.0);
        assert_eq!(c.projection(1.5), expected);
    }
}
