use crate::types::ContentDescriptor;

/// Overlay that shows metadata, errors and the loading indicator
pub trait PresentationSink {
    fn show_content(&self, descriptor: &ContentDescriptor);

    fn show_error(&self, message: &str);

    fn show_loading(&self, elapsed_seconds: u64);

    fn hide_loading(&self);

    /// Raw decoded text, before resolution
    fn show_payload(&self, _payload: &str) {}
}
