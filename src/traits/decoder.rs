use futures::stream::LocalBoxStream;

use super::camera::VideoSource;

/// Continuous stream of decoded QR payloads
pub type DecodeStream = LocalBoxStream<'static, String>;

/// QR/barcode decoder reading from a video source
pub trait QrDecoder {
    /// Begin decoding. Each successful decode yields its text on the stream.
    fn start_decoding(&mut self, source: &VideoSource) -> DecodeStream;

    /// Stop decoding; the stream ends once buffered payloads drain
    fn stop_decoding(&mut self);
}
