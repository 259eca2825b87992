#![allow(dead_code)]

use anyhow::anyhow;
use futures::channel::oneshot;
use futures::future::{self, FutureExt, LocalBoxFuture};
use glam::{Mat4, Vec3};
use qr_model_viewer::traits::{DocumentFetcher, PresentationSink, RenderBackend, WindowContext, WindowDimensions};
use qr_model_viewer::ContentDescriptor;
use reqwest::Url;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

pub const TRIANGLE_GLTF: &str = include_str!("../fixtures/triangle.gltf");
/// Same triangle with its buffer in a sibling `triangle.bin`
pub const TRIANGLE_EXTERNAL_GLTF: &str = include_str!("../fixtures/triangle_external.gltf");
pub const TRIANGLE_BIN: &[u8] = include_bytes!("../fixtures/triangle.bin");

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

// ============================================================================
// Backend
// ============================================================================

/// Model handle handed out by the mock backend
#[derive(Debug, PartialEq, Eq)]
pub struct MockModel {
    pub id: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Load(String),
    Add(u64),
    Remove(u64),
    Dispose(u64),
    Transform(u64, f32, Vec3),
    Render,
    Aspect(f32),
    Output(u32, u32, f64),
}

/// Backend whose loads complete only when the test says so,
/// unless `auto_complete` is set
#[derive(Default)]
pub struct MockBackend {
    pub events: Vec<BackendEvent>,
    pub visible: Vec<u64>,
    pub rotations: HashMap<u64, f32>,
    pub auto_complete: bool,
    pub failing: HashSet<String>,
    pub camera_world: Mat4,
    next_id: Cell<u64>,
    pending: RefCell<Vec<(String, oneshot::Sender<anyhow::Result<MockModel>>)>>,
    load_log: RefCell<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            camera_world: Mat4::IDENTITY,
            ..Self::default()
        }
    }

    pub fn auto() -> Self {
        Self {
            auto_complete: true,
            ..Self::new()
        }
    }

    fn next_model(&self, url: &str) -> MockModel {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        MockModel {
            id,
            url: url.to_string(),
        }
    }

    /// Complete the oldest pending load of `url`
    pub fn complete(&self, url: &str, succeed: bool) {
        let index = self
            .pending
            .borrow()
            .iter()
            .position(|(pending, _)| pending == url)
            .unwrap_or_else(|| panic!("no pending load for {url}"));
        let (pending_url, sender) = self.pending.borrow_mut().remove(index);
        let result = if succeed {
            Ok(self.next_model(&pending_url))
        } else {
            Err(anyhow!("404 for {}", pending_url))
        };
        let _ = sender.send(result);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn loads(&self) -> Vec<String> {
        self.load_log.borrow().clone()
    }

    pub fn dispose_count(&self, id: u64) -> usize {
        self.events
            .iter()
            .filter(|event| **event == BackendEvent::Dispose(id))
            .count()
    }

    pub fn position_of(&self, wanted: &BackendEvent) -> Option<usize> {
        self.events.iter().position(|event| event == wanted)
    }

    pub fn renders(&self) -> usize {
        self.events
            .iter()
            .filter(|event| **event == BackendEvent::Render)
            .count()
    }
}

impl RenderBackend for MockBackend {
    type Model = MockModel;

    fn load_asset(&self, url: &Url) -> LocalBoxFuture<'static, anyhow::Result<MockModel>> {
        let url = url.to_string();
        self.load_log.borrow_mut().push(url.clone());

        if self.auto_complete {
            let result = if self.failing.contains(&url) {
                Err(anyhow!("404 for {}", url))
            } else {
                Ok(self.next_model(&url))
            };
            return future::ready(result).boxed_local();
        }

        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push((url, tx));
        async move { rx.await.map_err(|_| anyhow!("load dropped"))? }.boxed_local()
    }

    fn add_to_scene(&mut self, model: &MockModel) {
        self.events.push(BackendEvent::Add(model.id));
        self.visible.push(model.id);
    }

    fn remove_from_scene(&mut self, model: &MockModel) {
        self.events.push(BackendEvent::Remove(model.id));
        self.visible.retain(|&id| id != model.id);
    }

    fn dispose_resources(&mut self, model: MockModel) {
        self.events.push(BackendEvent::Dispose(model.id));
    }

    fn set_rotation_y(&mut self, model: &MockModel, angle: f32) {
        self.rotations.insert(model.id, angle);
    }

    fn set_world_transform(&mut self, model: &MockModel, scale: f32, position: Vec3) {
        self.events
            .push(BackendEvent::Transform(model.id, scale, position));
    }

    fn camera_world_transform(&self) -> Mat4 {
        self.camera_world
    }

    fn render(&mut self) {
        self.events.push(BackendEvent::Render);
    }

    fn set_projection_aspect(&mut self, aspect: f32) {
        self.events.push(BackendEvent::Aspect(aspect));
    }

    fn set_output_size(&mut self, width: u32, height: u32, pixel_ratio: f64) {
        self.events
            .push(BackendEvent::Output(width, height, pixel_ratio));
    }
}

// ============================================================================
// Fetcher
// ============================================================================

/// Serves canned documents and records every request
#[derive(Default)]
pub struct MockFetcher {
    documents: HashMap<String, Vec<u8>>,
    requests: RefCell<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.documents.insert(url.to_string(), body.into());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl DocumentFetcher for MockFetcher {
    fn fetch(&self, url: &Url) -> LocalBoxFuture<'static, anyhow::Result<Vec<u8>>> {
        self.requests.borrow_mut().push(url.to_string());
        let result = self
            .documents
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("404 Not Found: {}", url));
        future::ready(result).boxed_local()
    }
}

// ============================================================================
// Presentation
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Payload(String),
    Content(ContentDescriptor),
    Error(String),
    Loading(u64),
    HideLoading,
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub shown: RefCell<Vec<Shown>>,
}

impl RecordingPresenter {
    pub fn contents(&self) -> Vec<ContentDescriptor> {
        self.shown
            .borrow()
            .iter()
            .filter_map(|shown| match shown {
                Shown::Content(descriptor) => Some(descriptor.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.shown
            .borrow()
            .iter()
            .filter_map(|shown| match shown {
                Shown::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Shown) -> usize {
        self.shown.borrow().iter().filter(|s| *s == wanted).count()
    }
}

impl PresentationSink for RecordingPresenter {
    fn show_content(&self, descriptor: &ContentDescriptor) {
        self.shown.borrow_mut().push(Shown::Content(descriptor.clone()));
    }

    fn show_error(&self, message: &str) {
        self.shown.borrow_mut().push(Shown::Error(message.to_string()));
    }

    fn show_loading(&self, elapsed_seconds: u64) {
        self.shown.borrow_mut().push(Shown::Loading(elapsed_seconds));
    }

    fn hide_loading(&self) {
        self.shown.borrow_mut().push(Shown::HideLoading);
    }

    fn show_payload(&self, payload: &str) {
        self.shown.borrow_mut().push(Shown::Payload(payload.to_string()));
    }
}

// ============================================================================
// Window
// ============================================================================

pub struct MockWindow {
    pub dims: Cell<WindowDimensions>,
    pub scale: Cell<f64>,
    pub redraws: Cell<usize>,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            dims: Cell::new(WindowDimensions::new(width, height)),
            scale: Cell::new(1.0),
            redraws: Cell::new(0),
        }
    }
}

impl WindowContext for MockWindow {
    fn dimensions(&self) -> WindowDimensions {
        self.dims.get()
    }

    fn scale_factor(&self) -> f64 {
        self.scale.get()
    }

    fn request_redraw(&self) {
        self.redraws.set(self.redraws.get() + 1);
    }
}
