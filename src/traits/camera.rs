use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// Preferred camera direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Rear camera
    #[default]
    Environment,
    /// Front camera
    User,
}

/// Video source a decoder reads frames from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSource {
    pub label: String,
}

impl VideoSource {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

/// Live camera stream bound to a video source
pub trait VideoStream {
    fn source(&self) -> VideoSource;

    /// Stop capturing. Idempotent.
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

/// Camera access
pub trait CameraProvider {
    /// Fails with `PermissionDenied` or `NoDevice`
    fn request_stream(&mut self, facing: FacingMode) -> Result<Box<dyn VideoStream>, ViewerError>;
}
