use thiserror::Error;

/// Failures surfaced by the scan-to-scene pipeline.
///
/// Only the camera variants end the scan phase; everything else leaves the
/// current scene in place and keeps the viewer ready for another scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    /// Camera access was refused.
    #[error("camera permission denied")]
    PermissionDenied,
    /// No camera is available.
    #[error("no camera device available")]
    NoDevice,
    /// Decoded text does not match any recognised payload form.
    #[error("unsupported payload: {payload}")]
    UnsupportedPayload { payload: String },
    /// Metadata document could not be fetched or parsed.
    #[error("failed to resolve {target}: {reason}")]
    ResolutionFailed { target: String, reason: String },
    /// Asset could not be fetched or parsed.
    #[error("failed to load model {url}: {reason}")]
    LoadError { url: String, reason: String },
}

impl ViewerError {
    /// Text shown to the user through the presentation sink
    pub fn user_message(&self) -> String {
        match self {
            ViewerError::PermissionDenied => "Camera access was denied".to_string(),
            ViewerError::NoDevice => "No camera found on this device".to_string(),
            ViewerError::UnsupportedPayload { .. } => {
                "This QR code does not point to a supported model".to_string()
            }
            ViewerError::ResolutionFailed { .. } => {
                "Could not load information from this QR code".to_string()
            }
            ViewerError::LoadError { .. } => "Could not load the 3D model".to_string(),
        }
    }

    /// False for camera-acquisition failures, which disable scanning.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ViewerError::PermissionDenied | ViewerError::NoDevice)
    }

    pub(crate) fn resolution(target: impl Into<String>, err: &anyhow::Error) -> Self {
        ViewerError::ResolutionFailed {
            target: target.into(),
            reason: format!("{:#}", err),
        }
    }

    pub(crate) fn load(url: impl Into<String>, err: &anyhow::Error) -> Self {
        ViewerError::LoadError {
            url: url.into(),
            reason: format!("{:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_camera_errors_not_recoverable() {
        assert!(!ViewerError::PermissionDenied.is_recoverable());
        assert!(!ViewerError::NoDevice.is_recoverable());
    }

    #[test]
    fn test_pipeline_errors_recoverable() {
        let errors = [
            ViewerError::UnsupportedPayload { payload: "x".into() },
            ViewerError::ResolutionFailed { target: "x".into(), reason: "y".into() },
            ViewerError::LoadError { url: "x".into(), reason: "y".into() },
        ];
        for err in errors {
            assert!(err.is_recoverable(), "{err} should be recoverable");
        }
    }

    #[test]
    fn test_user_message_distinguishes_unsupported_from_failed() {
        let unsupported = ViewerError::UnsupportedPayload { payload: "a.txt".into() };
        let failed = ViewerError::ResolutionFailed { target: "a.json".into(), reason: "404".into() };
        assert_ne!(unsupported.user_message(), failed.user_message());
    }

    #[test]
    fn test_cause_chain_kept_in_reason() {
        let err: anyhow::Error = Err::<(), _>(anyhow::anyhow!("connection reset"))
            .context("fetching document")
            .unwrap_err();
        match ViewerError::resolution("https://x/card.json", &err) {
            ViewerError::ResolutionFailed { target, reason } => {
                assert_eq!(target, "https://x/card.json");
                assert!(reason.contains("fetching document"));
                assert!(reason.contains("connection reset"));
            }
            other => panic!("unexpected variant {other:?}"),
        }
    }
}
