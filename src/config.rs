// config.rs - Viewer configuration loaded from JSON and overridden by CLI flags
use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::traits::FacingMode;

/// Whether the decode stream keeps running after a payload is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Keep decoding every frame; repeat scans re-trigger the pipeline
    #[default]
    Continuous,
    /// Stop decoding after the first accepted payload
    OneShot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Location relative payloads resolve against
    pub base_url: String,
    pub model_scale: f32,
    /// Place new models in front of the camera at load time
    pub place_in_front: bool,
    pub placement_distance: f32,
    /// Radians per pixel of horizontal drag
    pub drag_sensitivity: f64,
    /// Radians added per frame while auto-rotating
    pub auto_rotate_step: f64,
    pub decode_mode: DecodeMode,
    pub stop_camera_on_accept: bool,
    pub facing: FacingMode,
    /// Zero disables the timeout
    pub fetch_timeout_secs: u64,
    pub history_limit: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/".to_string(),
            model_scale: 0.07,
            place_in_front: true,
            placement_distance: 2.0,
            drag_sensitivity: 0.01,
            auto_rotate_step: 0.01,
            decode_mode: DecodeMode::Continuous,
            stop_camera_on_accept: false,
            facing: FacingMode::Environment,
            fetch_timeout_secs: 30,
            history_limit: 20,
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: ViewerConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.model_scale.is_finite() || self.model_scale <= 0.0 {
            bail!("model_scale must be a positive number, got {}", self.model_scale);
        }
        if !self.placement_distance.is_finite() || self.placement_distance < 0.0 {
            bail!(
                "placement_distance must be zero or positive, got {}",
                self.placement_distance
            );
        }
        if !self.drag_sensitivity.is_finite() {
            bail!("drag_sensitivity must be finite");
        }
        if !self.auto_rotate_step.is_finite() {
            bail!("auto_rotate_step must be finite");
        }
        self.base_url()?;
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).with_context(|| format!("Invalid base_url: {}", self.base_url))
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.decode_mode, DecodeMode::Continuous);
        assert_eq!(config.drag_sensitivity, 0.01);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"model_scale": 0.3, "decode_mode": "one_shot"}"#).unwrap();
        assert_eq!(config.model_scale, 0.3);
        assert_eq!(config.decode_mode, DecodeMode::OneShot);
        assert_eq!(config.placement_distance, 2.0);
        assert_eq!(config.facing, FacingMode::Environment);
    }

    #[test]
    fn test_rejects_bad_scale() {
        let config = ViewerConfig {
            model_scale: 0.0,
            ..ViewerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ViewerConfig {
            model_scale: f32::NAN,
            ..ViewerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = ViewerConfig {
            base_url: "not a url".to_string(),
            ..ViewerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fetch_timeout_zero_disables() {
        let config = ViewerConfig {
            fetch_timeout_secs: 0,
            ..ViewerConfig::default()
        };
        assert_eq!(config.fetch_timeout(), None);
        assert_eq!(
            ViewerConfig::default().fetch_timeout(),
            Some(Duration::from_secs(30))
        );
    }
}
