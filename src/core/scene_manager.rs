use glam::Vec3;
use log::{debug, info, warn};
use reqwest::Url;
use std::cell::RefCell;
use std::rc::Rc;

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::traits::RenderBackend;

/// Where and how big a freshly loaded model appears
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementPolicy {
    pub scale: f32,
    /// Translate the model in front of the camera at load time
    pub place_in_front: bool,
    /// Distance along the camera's forward axis
    pub distance: f32,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            scale: 0.07,
            place_in_front: true,
            distance: 2.0,
        }
    }
}

impl From<&ViewerConfig> for PlacementPolicy {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            scale: config.model_scale,
            place_in_front: config.place_in_front,
            distance: config.placement_distance,
        }
    }
}

/// Result of a replace that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// The new model is now current
    Committed,
    /// A newer request was made while loading; the result was discarded
    Superseded,
}

struct ManagerState<M> {
    current: Option<M>,
    /// Token of the most recently initiated request
    latest_request: u64,
}

/// Owns the current scene model and swaps it atomically
///
/// Clones share the same state; all clones must live on one thread.
pub struct SceneModelManager<B: RenderBackend> {
    backend: Rc<RefCell<B>>,
    state: Rc<RefCell<ManagerState<B::Model>>>,
    placement: PlacementPolicy,
}

impl<B: RenderBackend> Clone for SceneModelManager<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            state: Rc::clone(&self.state),
            placement: self.placement,
        }
    }
}

impl<B: RenderBackend> SceneModelManager<B> {
    pub fn new(backend: Rc<RefCell<B>>, placement: PlacementPolicy) -> Self {
        Self {
            backend,
            state: Rc::new(RefCell::new(ManagerState {
                current: None,
                latest_request: 0,
            })),
            placement,
        }
    }

    /// Load `url` and make it current once ready.
    ///
    /// The previous model stays visible until the new one has loaded. On
    /// failure the previous model is left untouched. If another replace is
    /// started before this one finishes, this result is discarded.
    pub async fn replace(&self, url: &Url) -> Result<ReplaceOutcome, ViewerError> {
        let request = {
            let mut state = self.state.borrow_mut();
            state.latest_request += 1;
            state.latest_request
        };
        debug!("Loading model #{}: {}", request, url);

        let load = self.backend.borrow().load_asset(url);
        let result = load.await;

        if self.state.borrow().latest_request != request {
            debug!("Discarding stale load #{}: {}", request, url);
            if let Ok(model) = result {
                // Never added to the scene, only its resources need releasing
                self.backend.borrow_mut().dispose_resources(model);
            }
            return Ok(ReplaceOutcome::Superseded);
        }

        let model = result.map_err(|err| {
            warn!("Failed to load model {}: {:#}", url, err);
            ViewerError::load(url.as_str(), &err)
        })?;

        self.commit(model);
        info!("Model #{} is now current: {}", request, url);
        Ok(ReplaceOutcome::Committed)
    }

    fn commit(&self, model: B::Model) {
        let mut backend = self.backend.borrow_mut();
        let mut state = self.state.borrow_mut();

        let position = if self.placement.place_in_front {
            backend
                .camera_world_transform()
                .transform_point3(Vec3::new(0.0, 0.0, -self.placement.distance))
        } else {
            Vec3::ZERO
        };
        backend.set_world_transform(&model, self.placement.scale, position);

        if let Some(previous) = state.current.take() {
            backend.remove_from_scene(&previous);
            backend.dispose_resources(previous);
        }
        backend.add_to_scene(&model);
        state.current = Some(model);
    }

    /// Apply a Y rotation to the current model, if there is one
    pub fn apply_rotation_y(&self, angle: f64) {
        let state = self.state.borrow();
        if let Some(model) = state.current.as_ref() {
            self.backend.borrow_mut().set_rotation_y(model, angle as f32);
        }
    }

    pub fn has_model(&self) -> bool {
        self.state.borrow().current.is_some()
    }

    /// Run `f` against the current model
    pub fn with_current<R>(&self, f: impl FnOnce(&B::Model) -> R) -> Option<R> {
        self.state.borrow().current.as_ref().map(f)
    }

    /// Remove and dispose the current model; in-flight loads become stale
    pub fn teardown(&self) {
        let mut state = self.state.borrow_mut();
        state.latest_request += 1;
        if let Some(previous) = state.current.take() {
            let mut backend = self.backend.borrow_mut();
            backend.remove_from_scene(&previous);
            backend.dispose_resources(previous);
            info!("Scene model disposed on teardown");
        }
    }
}
