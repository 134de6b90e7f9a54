use std::path::Path;

use anyhow::{Context, Result};
use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::scene::Projection;

/// Initial placement of a shape: translation, rotation in degrees, color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    pub translation: [f32; 3],
    pub rotation: [f32; 3],
    pub color: [f32; 4],
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0; 3],
            color: [1.0; 4],
        }
    }
}

impl ShapeConfig {
    pub fn translation(&self) -> Vec3 {
        Vec3::from_array(self.translation)
    }

    pub fn rotation(&self) -> Vec3 {
        Vec3::from_array(self.rotation)
    }

    pub fn color(&self) -> Vec4 {
        Vec4::from_array(self.color)
    }
}

/// Everything the demo needs to build its scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub width: u32,
    pub height: u32,
    pub depth: f32,
    pub projection: Projection,
    /// Degrees
    pub field_of_view: f32,
    pub clear_color: [f64; 4],
    pub letter: ShapeConfig,
    pub backdrop: ShapeConfig,
    /// Rotation is ignored for the light
    pub light: ShapeConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            depth: 1000.0,
            projection: Projection::Perspective,
            field_of_view: 60.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            letter: ShapeConfig {
                translation: [0.0, 0.0, -600.0],
                rotation: [30.0, 30.0, 30.0],
                color: [1.0, 0.5, 0.5, 1.0],
            },
            backdrop: ShapeConfig {
                translation: [0.0, 0.0, -900.0],
                rotation: [0.0; 3],
                color: [1.0, 1.0, 1.0, 1.0],
            },
            light: ShapeConfig {
                translation: [-50.0, -50.0, -200.0],
                rotation: [0.0; 3],
                color: [0.8, 0.0, 1.0, 0.5],
            },
        }
    }
}

impl DemoConfig {
    /// Read a JSON config; missing fields keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Defaults, then the `--config` file, then individual flags
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(width) = cli.width {
            self.width = width;
        }
        if let Some(height) = cli.height {
            self.height = height;
        }
        if let Some(depth) = cli.depth {
            self.depth = depth;
        }
        if let Some(projection) = cli.projection {
            self.projection = projection;
        }
        if let Some(fov) = cli.fov {
            self.field_of_view = fov;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: DemoConfig =
            serde_json::from_str(r#"{ "depth": 2000.0, "letter": { "translation": [10.0, 0.0, -550.0] } }"#)
                .unwrap();

        assert_eq!(config.depth, 2000.0);
        assert_eq!(config.letter.translation, [10.0, 0.0, -550.0]);
        // Unlisted shape fields fall back to the shape default, not the demo one
        assert_eq!(config.letter.rotation, [0.0; 3]);
        assert_eq!(config.backdrop, DemoConfig::default().backdrop);
        assert_eq!(config.width, 800);
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut config = DemoConfig {
            width: 640,
            ..Default::default()
        };
        let cli = Cli {
            height: Some(480),
            projection: Some(Projection::Orthographic),
            fov: Some(45.0),
            ..Default::default()
        };
        config.apply_cli(&cli);

        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.projection, Projection::Orthographic);
        assert_eq!(config.field_of_view, 45.0);
    }

    #[test]
    fn test_load_reports_path() {
        let err = DemoConfig::load("/nonexistent/shadow.json").unwrap_err();
        assert!(format!("{err:#}").contains("shadow.json"));
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = DemoConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let parsed: DemoConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
