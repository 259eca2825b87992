use chrono::{DateTime, Utc};
use futures::{FutureExt, StreamExt};
use log::{debug, error, info, warn};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::clock::Stopwatch;
use super::resolver::ContentResolver;
use super::scene_manager::{ReplaceOutcome, SceneModelManager};
use crate::config::{DecodeMode, ViewerConfig};
use crate::error::ViewerError;
use crate::traits::{
    CameraProvider, FacingMode, PresentationSink, QrDecoder, RenderBackend, VideoStream,
};

/// Scan behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub decode_mode: DecodeMode,
    /// Stop the camera once a payload is accepted and show a loading indicator
    pub stop_camera_on_accept: bool,
    pub facing: FacingMode,
    pub history_limit: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            decode_mode: DecodeMode::Continuous,
            stop_camera_on_accept: false,
            facing: FacingMode::Environment,
            history_limit: 20,
        }
    }
}

impl From<&ViewerConfig> for ScanOptions {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            decode_mode: config.decode_mode,
            stop_camera_on_accept: config.stop_camera_on_accept,
            facing: config.facing,
            history_limit: config.history_limit,
        }
    }
}

/// What happened to one decoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Content shown and model committed
    Displayed,
    /// A newer scan took over before this one finished
    Superseded,
    /// Decoding was already stopped; the payload was not processed
    Ignored,
    /// Same payload as the scan still resolving or loading; left to finish
    InProgress,
    Failed(ViewerError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub payload: String,
    pub scanned_at: DateTime<Utc>,
    pub outcome: ScanOutcome,
}

struct LoadingSession {
    scan: u64,
    watch: Stopwatch,
}

/// Top-level coordinator from decoded text to displayed model
pub struct ScanOrchestrator<B: RenderBackend> {
    resolver: ContentResolver,
    scenes: SceneModelManager<B>,
    presenter: Rc<dyn PresentationSink>,
    decoder: RefCell<Box<dyn QrDecoder>>,
    options: ScanOptions,
    camera: RefCell<Option<Box<dyn VideoStream>>>,
    /// Cleared once decoding has been stopped
    accepting: Cell<bool>,
    latest_scan: Cell<u64>,
    /// Payload of the newest scan while it resolves or loads
    in_flight: RefCell<Option<(u64, String)>>,
    loading: RefCell<Option<LoadingSession>>,
    history: RefCell<VecDeque<ScanRecord>>,
}

impl<B: RenderBackend> ScanOrchestrator<B> {
    pub fn new(
        resolver: ContentResolver,
        scenes: SceneModelManager<B>,
        presenter: Rc<dyn PresentationSink>,
        decoder: Box<dyn QrDecoder>,
        options: ScanOptions,
    ) -> Self {
        Self {
            resolver,
            scenes,
            presenter,
            decoder: RefCell::new(decoder),
            options,
            camera: RefCell::new(None),
            accepting: Cell::new(true),
            latest_scan: Cell::new(0),
            in_flight: RefCell::new(None),
            loading: RefCell::new(None),
            history: RefCell::new(VecDeque::new()),
        }
    }

    /// Acquire the camera and process decoded payloads until decoding stops.
    ///
    /// Camera failures are reported and returned; the scene is unaffected.
    pub async fn run(&self, cameras: &mut dyn CameraProvider) -> Result<(), ViewerError> {
        let stream = cameras.request_stream(self.options.facing).map_err(|err| {
            error!("Camera unavailable: {}", err);
            self.presenter.show_error(&err.user_message());
            err
        })?;
        let source = stream.source();
        info!("Camera stream started: {}", source.label);
        *self.camera.borrow_mut() = Some(stream);

        let payloads = self.decoder.borrow_mut().start_decoding(&source);
        payloads
            .for_each_concurrent(None, |payload| self.handle_payload(payload).map(drop))
            .await;

        info!("Decode stream ended");
        Ok(())
    }

    /// Run one decoded payload through resolution and model replacement
    pub async fn handle_payload(&self, payload: String) -> ScanOutcome {
        if !self.accepting.get() {
            debug!("Decoding stopped, ignoring payload: {}", payload);
            return ScanOutcome::Ignored;
        }

        info!("QR detected: {}", payload);
        self.presenter.show_payload(&payload);

        let target = match self.resolver.classify(&payload) {
            Ok(target) => target,
            Err(err) => {
                warn!("{}", err);
                self.presenter.show_error(&err.user_message());
                return self.record(payload, ScanOutcome::Failed(err));
            }
        };
        debug!("Payload classified as {:?}", target);

        if self.is_in_flight(&payload) {
            debug!("Same payload already in progress: {}", payload);
            return self.record(payload, ScanOutcome::InProgress);
        }

        let scan = self.latest_scan.get() + 1;
        self.latest_scan.set(scan);
        *self.in_flight.borrow_mut() = Some((scan, payload.clone()));
        self.accept(scan);

        let descriptor = match self.resolver.resolve_target(target).await {
            Ok(descriptor) => descriptor,
            Err(err) => {
                warn!("{}", err);
                if self.is_latest(scan) {
                    self.presenter.show_error(&err.user_message());
                }
                self.finish(scan);
                return self.record(payload, ScanOutcome::Failed(err));
            }
        };

        if !self.is_latest(scan) {
            debug!("Scan #{} superseded before display: {}", scan, descriptor);
            return self.record(payload, ScanOutcome::Superseded);
        }

        info!("Showing {}", descriptor);
        self.presenter.show_content(&descriptor);

        let outcome = match self.scenes.replace(&descriptor.model_url).await {
            Ok(ReplaceOutcome::Committed) => ScanOutcome::Displayed,
            Ok(ReplaceOutcome::Superseded) => ScanOutcome::Superseded,
            Err(err) => {
                warn!("{}", err);
                if self.is_latest(scan) {
                    self.presenter.show_error(&err.user_message());
                }
                ScanOutcome::Failed(err)
            }
        };
        self.finish(scan);
        self.record(payload, outcome)
    }

    /// Push the elapsed-seconds counter; call once per frame
    pub fn refresh_loading(&self) {
        if let Some(session) = self.loading.borrow_mut().as_mut() {
            if let Some(seconds) = session.watch.next_report() {
                self.presenter.show_loading(seconds);
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.borrow().is_some()
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.get()
    }

    /// Stop decoding and release the camera
    pub fn stop(&self) {
        self.stop_decoding();
        self.stop_camera();
    }

    /// Most recent scans, oldest first
    pub fn history(&self) -> Vec<ScanRecord> {
        self.history.borrow().iter().cloned().collect()
    }

    fn accept(&self, scan: u64) {
        if self.options.decode_mode == DecodeMode::OneShot {
            self.stop_decoding();
        }
        if self.options.stop_camera_on_accept {
            self.stop_decoding();
            self.stop_camera();
            *self.loading.borrow_mut() = Some(LoadingSession {
                scan,
                watch: Stopwatch::start(),
            });
            self.presenter.show_loading(0);
        }
    }

    fn finish(&self, scan: u64) {
        let mut in_flight = self.in_flight.borrow_mut();
        if in_flight.as_ref().is_some_and(|(current, _)| *current == scan) {
            *in_flight = None;
        }
        drop(in_flight);
        self.end_loading(scan);
    }

    fn is_in_flight(&self, payload: &str) -> bool {
        self.in_flight
            .borrow()
            .as_ref()
            .is_some_and(|(_, current)| current == payload)
    }

    fn end_loading(&self, scan: u64) {
        let mut loading = self.loading.borrow_mut();
        if loading.as_ref().is_some_and(|session| session.scan == scan) {
            *loading = None;
            self.presenter.hide_loading();
        }
    }

    fn is_latest(&self, scan: u64) -> bool {
        self.latest_scan.get() == scan
    }

    fn stop_decoding(&self) {
        if self.accepting.replace(false) {
            self.decoder.borrow_mut().stop_decoding();
            info!("Decoding stopped");
        }
    }

    fn stop_camera(&self) {
        if let Some(mut stream) = self.camera.borrow_mut().take() {
            stream.stop();
            info!("Camera stream stopped");
        }
    }

    fn record(&self, payload: String, outcome: ScanOutcome) -> ScanOutcome {
        let mut history = self.history.borrow_mut();
        history.push_back(ScanRecord {
            payload,
            scanned_at: Utc::now(),
            outcome: outcome.clone(),
        });
        while history.len() > self.options.history_limit {
            history.pop_front();
        }
        outcome
    }
}
