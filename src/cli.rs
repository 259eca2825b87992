// cli.rs - Command-line interface configuration
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::{DecodeMode, ViewerConfig};
use crate::traits::FacingMode;

#[derive(Parser, Debug, Clone)]
#[command(name = "qr-model-viewer")]
#[command(about = "Scan a QR code, show the 3D model it points to", long_about = None)]
pub struct Cli {
    /// JSON configuration file; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Payload to process instead of reading stdin (repeatable)
    #[arg(long = "payload")]
    pub payloads: Vec<String>,

    /// Location relative payloads resolve against
    #[arg(long)]
    pub base_url: Option<String>,

    /// Uniform scale applied to loaded models
    #[arg(long)]
    pub scale: Option<f32>,

    /// Distance in front of the camera to place models
    #[arg(long)]
    pub distance: Option<f32>,

    /// Radians per pixel of horizontal drag
    #[arg(long)]
    pub sensitivity: Option<f64>,

    /// Radians per frame while auto-rotating
    #[arg(long = "auto-step")]
    pub auto_rotate_step: Option<f64>,

    #[arg(long, value_enum)]
    pub decode_mode: Option<DecodeMode>,

    /// Stop the camera after the first accepted payload
    #[arg(long = "stop-camera", default_value = "false")]
    pub stop_camera: bool,

    #[arg(long, value_enum)]
    pub facing: Option<FacingMode>,

    /// Network timeout in seconds (0 disables)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Simulate a device without a camera
    #[arg(long = "no-camera", default_value = "false")]
    pub no_camera: bool,

    /// Run this many frames without opening a window
    #[arg(long)]
    pub headless: Option<u64>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Load the config file (if any) and apply flag overrides
    pub fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut ViewerConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(scale) = self.scale {
            config.model_scale = scale;
        }
        if let Some(distance) = self.distance {
            config.placement_distance = distance;
        }
        if let Some(sensitivity) = self.sensitivity {
            config.drag_sensitivity = sensitivity;
        }
        if let Some(step) = self.auto_rotate_step {
            config.auto_rotate_step = step;
        }
        if let Some(mode) = self.decode_mode {
            config.decode_mode = mode;
        }
        if self.stop_camera {
            config.stop_camera_on_accept = true;
        }
        if let Some(facing) = self.facing {
            config.facing = facing;
        }
        if let Some(timeout) = self.timeout {
            config.fetch_timeout_secs = timeout;
        }
    }
}
