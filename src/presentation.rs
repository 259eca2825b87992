use log::{info, warn};
use std::cell::RefCell;

use crate::traits::PresentationSink;
use crate::types::ContentDescriptor;

/// What the overlay currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentationState {
    pub content: Option<ContentDescriptor>,
    pub error: Option<String>,
    /// Elapsed seconds while the loading indicator is up
    pub loading: Option<u64>,
    pub last_payload: Option<String>,
}

impl PresentationState {
    /// One-line summary suitable for a window title
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        match &self.content {
            Some(content) if !content.is_bare() => {
                let mut line = content.name.clone();
                if !content.price.is_empty() {
                    line.push_str(&format!(" - {}", content.price));
                }
                if !content.origin.is_empty() {
                    line.push_str(&format!(" ({})", content.origin));
                }
                parts.push(line);
            }
            Some(content) => parts.push(content.model_url.to_string()),
            None => parts.push("Point the camera at a QR code".to_string()),
        }
        if let Some(seconds) = self.loading {
            parts.push(format!("loading {}s", seconds));
        }
        if let Some(error) = &self.error {
            parts.push(error.clone());
        }
        parts.join(" | ")
    }
}

/// Presentation sink that logs and keeps the latest overlay state
#[derive(Debug, Default)]
pub struct LogPresenter {
    state: RefCell<PresentationState>,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PresentationState {
        self.state.borrow().clone()
    }
}

impl PresentationSink for LogPresenter {
    fn show_content(&self, descriptor: &ContentDescriptor) {
        if descriptor.is_bare() {
            info!("Model: {}", descriptor.model_url);
        } else {
            info!(
                "{}: {} | price: {} | origin: {}",
                descriptor.name, descriptor.description, descriptor.price, descriptor.origin
            );
        }
        let mut state = self.state.borrow_mut();
        state.content = Some(descriptor.clone());
        state.error = None;
    }

    fn show_error(&self, message: &str) {
        warn!("{}", message);
        self.state.borrow_mut().error = Some(message.to_string());
    }

    fn show_loading(&self, elapsed_seconds: u64) {
        info!("Loading... {}s", elapsed_seconds);
        self.state.borrow_mut().loading = Some(elapsed_seconds);
    }

    fn hide_loading(&self) {
        self.state.borrow_mut().loading = None;
    }

    fn show_payload(&self, payload: &str) {
        self.state.borrow_mut().last_payload = Some(payload.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Url;

    fn vase() -> ContentDescriptor {
        ContentDescriptor {
            name: "Vase".into(),
            description: "Clay".into(),
            price: "10".into(),
            origin: "Thailand".into(),
            model_url: Url::parse("https://x/vase.glb").unwrap(),
        }
    }

    #[test]
    fn test_summary_idle() {
        assert_eq!(
            PresentationState::default().summary(),
            "Point the camera at a QR code"
        );
    }

    #[test]
    fn test_content_clears_error() {
        let presenter = LogPresenter::new();
        presenter.show_error("Could not load the 3D model");
        presenter.show_content(&vase());
        let state = presenter.state();
        assert_eq!(state.error, None);
        assert_eq!(state.summary(), "Vase - 10 (Thailand)");
    }

    #[test]
    fn test_loading_in_summary() {
        let presenter = LogPresenter::new();
        presenter.show_loading(3);
        assert!(presenter.state().summary().ends_with("loading 3s"));
        presenter.hide_loading();
        assert_eq!(presenter.state().loading, None);
    }
}
