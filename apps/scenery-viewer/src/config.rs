use anyhow::Context;
use glam::Vec3;
use scenery_camera::{CameraRig, OrbitConstraints, OrbitSettings};
use scenery_render::RendererConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Scenery".into(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(6.0, 4.0, 8.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraConfig {
    pub fn rig(&self) -> CameraRig {
        CameraRig::perspective(
            self.position,
            self.target,
            self.fov_degrees.to_radians(),
            self.near,
            self.far,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub settings: OrbitSettings,
    pub constraints: OrbitConstraints,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            settings: OrbitSettings {
                damping_enabled: true,
                ..OrbitSettings::default()
            },
            constraints: OrbitConstraints {
                min_distance: 1.0,
                max_distance: 100.0,
                ..OrbitConstraints::default()
            },
        }
    }
}

/// Everything the viewer reads from its YAML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub renderer: RendererConfig,
}

impl ViewerConfig {
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("invalid viewer config")
    }

    /// Read `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_yaml(&text)?;
        tracing::info!(path = %path.display(), "loaded viewer config");
        Ok(config)
    }
}

/// Command-line values that replace individual config fields.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fov: Option<f32>,
    pub auto_rotate: bool,
    pub no_damping: bool,
}

impl ViewerConfig {
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(width) = overrides.width {
            self.window.width = width;
        }
        if let Some(height) = overrides.height {
            self.window.height = height;
        }
        if let Some(fov) = overrides.fov {
            self.camera.fov_degrees = fov;
        }
        if overrides.auto_rotate {
            self.orbit.settings.auto_rotate = true;
        }
        if overrides.no_damping {
            self.orbit.settings.damping_enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = ViewerConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = r#"
window:
  width: 640
camera:
  position: [0.0, 2.0, 10.0]
orbit:
  settings:
    auto_rotate: true
    auto_rotate_speed: 4.0
  constraints:
    max_polar_angle: 1.5
renderer:
  clear_color: [0.0, 0.0, 0.0, 1.0]
"#;
        let config = ViewerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.camera.position, Vec3::new(0.0, 2.0, 10.0));
        assert!(config.orbit.settings.auto_rotate);
        assert_eq!(config.orbit.settings.auto_rotate_speed, 4.0);
        assert_eq!(config.orbit.constraints.max_polar_angle, 1.5);
        assert_eq!(config.renderer.clear_color, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(ViewerConfig::from_yaml("window: [1, 2").is_err());
    }

    #[test]
    fn overrides_replace_fields() {
        let mut config = ViewerConfig::default();
        config.apply(&Overrides {
            width: Some(320),
            height: None,
            fov: Some(45.0),
            auto_rotate: true,
            no_damping: true,
        });
        assert_eq!(config.window.width, 320);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.camera.fov_degrees, 45.0);
        assert!(config.orbit.settings.auto_rotate);
        assert!(!config.orbit.settings.damping_enabled);
    }

    #[test]
    fn camera_config_builds_rig() {
        let rig = CameraConfig::default().rig();
        assert_eq!(rig.position(), Vec3::new(6.0, 4.0, 8.0));
        assert_eq!(rig.target(), Vec3::ZERO);
    }
}
