use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data_structures::{bounds::RADIUS_DIVISOR, texture::WrapMode},
    error::ConfigError,
    resources::ParseOptions,
};

/// Tunables of the loading pipeline, usually read from a TOML file:
///
/// ```toml
/// wrap_mode = "clamp"
/// radius_divisor = 2.0
/// flip_texcoords_v = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    #[serde(default)]
    pub wrap_mode: WrapMode,
    #[serde(default = "PipelineSettings::default_radius_divisor")]
    pub radius_divisor: f32,
    #[serde(default = "PipelineSettings::default_flip_texcoords_v")]
    pub flip_texcoords_v: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            wrap_mode: WrapMode::default(),
            radius_divisor: Self::default_radius_divisor(),
            flip_texcoords_v: Self::default_flip_texcoords_v(),
        }
    }
}

impl PipelineSettings {
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&contents)?;
        info!("Loaded pipeline settings from {:?}", path);
        Ok(settings)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: PipelineSettings = toml::from_str(contents)?;
        Ok(settings.validate())
    }

    pub fn validate(mut self) -> Self {
        if !(self.radius_divisor.is_finite() && self.radius_divisor > 0.0) {
            warn!(
                "Radius divisor must be a positive number, got {}. Using {} instead.",
                self.radius_divisor, RADIUS_DIVISOR
            );
            self.radius_divisor = Self::default_radius_divisor();
        }
        self
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            flip_texcoords_v: self.flip_texcoords_v,
        }
    }

    const fn default_radius_divisor() -> f32 {
        RADIUS_DIVISOR
    }

    const fn default_flip_texcoords_v() -> bool {
        true
    }
}
