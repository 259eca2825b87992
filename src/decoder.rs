// decoder.rs - Stand-in camera and decoder collaborators for the host binary
use futures::channel::{mpsc, oneshot};
use futures::stream::{self, StreamExt};
use log::{debug, warn};
use std::cell::Cell;
use std::io::BufRead;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::error::ViewerError;
use crate::traits::{CameraProvider, DecodeStream, FacingMode, QrDecoder, VideoSource, VideoStream};

/// Camera that grants a labelled stream, or reports that no device exists
pub struct SimulatedCamera {
    label: String,
    available: bool,
}

impl SimulatedCamera {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            label: String::new(),
            available: false,
        }
    }
}

impl CameraProvider for SimulatedCamera {
    fn request_stream(&mut self, facing: FacingMode) -> Result<Box<dyn VideoStream>, ViewerError> {
        if !self.available {
            return Err(ViewerError::NoDevice);
        }
        debug!("Opening {:?} camera '{}'", facing, self.label);
        Ok(Box::new(SimulatedStream {
            label: self.label.clone(),
            live: Rc::new(Cell::new(true)),
        }))
    }
}

pub struct SimulatedStream {
    label: String,
    live: Rc<Cell<bool>>,
}

impl VideoStream for SimulatedStream {
    fn source(&self) -> VideoSource {
        VideoSource::new(self.label.clone())
    }

    fn stop(&mut self) {
        self.live.set(false);
    }

    fn is_live(&self) -> bool {
        self.live.get()
    }
}

/// Decoder fed with a fixed list of payloads
pub struct ScriptedDecoder {
    payloads: Vec<String>,
    stop: Option<oneshot::Sender<()>>,
}

impl ScriptedDecoder {
    pub fn new(payloads: Vec<String>) -> Self {
        Self {
            payloads,
            stop: None,
        }
    }
}

impl QrDecoder for ScriptedDecoder {
    fn start_decoding(&mut self, source: &VideoSource) -> DecodeStream {
        debug!("Decoding {} scripted payloads from '{}'", self.payloads.len(), source.label);
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop = Some(stop_tx);
        stream::iter(std::mem::take(&mut self.payloads))
            .take_until(stop_rx)
            .boxed_local()
    }

    fn stop_decoding(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// Decoder that treats every non-empty stdin line as a decoded payload
#[derive(Default)]
pub struct StdinDecoder {
    stop: Option<oneshot::Sender<()>>,
    reader_stop: Arc<AtomicBool>,
}

impl StdinDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QrDecoder for StdinDecoder {
    fn start_decoding(&mut self, source: &VideoSource) -> DecodeStream {
        debug!("Decoding payloads from stdin ('{}')", source.label);
        let (tx, rx) = mpsc::unbounded();
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop = Some(stop_tx);
        self.reader_stop.store(false, Ordering::Relaxed);

        let reader_stop = Arc::clone(&self.reader_stop);
        let spawned = thread::Builder::new()
            .name("stdin-decoder".to_string())
            .spawn(move || {
                for line in std::io::stdin().lock().lines() {
                    if reader_stop.load(Ordering::Relaxed) {
                        break;
                    }
                    match line {
                        Ok(line) if line.trim().is_empty() => continue,
                        Ok(line) => {
                            if tx.unbounded_send(line.trim().to_string()).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            warn!("Failed to read stdin: {}", err);
                            break;
                        }
                    }
                }
            });
        if let Err(err) = spawned {
            warn!("Failed to start stdin decoder: {}", err);
        }

        rx.take_until(stop_rx).boxed_local()
    }

    fn stop_decoding(&mut self) {
        self.reader_stop.store(true, Ordering::Relaxed);
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}
