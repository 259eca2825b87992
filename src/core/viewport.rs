use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

use crate::traits::{RenderBackend, WindowContext};

/// Output geometry derived from the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl ViewportGeometry {
    /// None for a zero-sized (e.g. minimised) window
    pub fn from_window(window: &dyn WindowContext) -> Option<Self> {
        let dims = window.dimensions();
        (dims.width > 0 && dims.height > 0).then(|| Self {
            width: dims.width,
            height: dims.height,
            pixel_ratio: window.scale_factor(),
        })
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Keeps the backend's projection and output surface in sync with the window
pub struct ViewportBinder<B: RenderBackend> {
    backend: Rc<RefCell<B>>,
    current: Option<ViewportGeometry>,
}

impl<B: RenderBackend> ViewportBinder<B> {
    pub fn new(backend: Rc<RefCell<B>>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    /// Apply the window's current size. Safe to call redundantly.
    pub fn on_resize(&mut self, window: &dyn WindowContext) -> Option<ViewportGeometry> {
        let Some(geometry) = ViewportGeometry::from_window(window) else {
            debug!("Ignoring resize to an empty window");
            return self.current;
        };

        let mut backend = self.backend.borrow_mut();
        backend.set_projection_aspect(geometry.aspect());
        backend.set_output_size(geometry.width, geometry.height, geometry.pixel_ratio);

        if self.current != Some(geometry) {
            debug!(
                "Viewport {}x{} @{}x (aspect {:.3})",
                geometry.width,
                geometry.height,
                geometry.pixel_ratio,
                geometry.aspect()
            );
        }
        self.current = Some(geometry);
        Some(geometry)
    }

    pub fn geometry(&self) -> Option<ViewportGeometry> {
        self.current
    }
}
