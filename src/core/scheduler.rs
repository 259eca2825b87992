use log::{debug, trace};
use std::cell::RefCell;
use std::rc::Rc;

use super::clock::Clock;
use super::interaction::InteractionStateMachine;
use super::scene_manager::SceneModelManager;
use crate::traits::{RenderBackend, WindowContext};

/// Drives the per-frame update: rotate, draw, re-arm
pub struct RenderScheduler<B: RenderBackend> {
    backend: Rc<RefCell<B>>,
    scenes: SceneModelManager<B>,
    interaction: Rc<RefCell<InteractionStateMachine>>,
    auto_rotate_step: f64,
    clock: Clock,
    frame: u64,
    running: bool,
}

impl<B: RenderBackend> RenderScheduler<B> {
    pub fn new(
        backend: Rc<RefCell<B>>,
        scenes: SceneModelManager<B>,
        interaction: Rc<RefCell<InteractionStateMachine>>,
        auto_rotate_step: f64,
    ) -> Self {
        Self {
            backend,
            scenes,
            interaction,
            auto_rotate_step,
            clock: Clock::default(),
            frame: 0,
            running: true,
        }
    }

    /// Run one frame and request the next one while running
    pub fn tick(&mut self, window: &dyn WindowContext) {
        if !self.running {
            return;
        }

        let angle = self
            .interaction
            .borrow_mut()
            .advance_frame(self.auto_rotate_step);
        self.scenes.apply_rotation_y(angle);
        self.backend.borrow_mut().render();

        self.frame += 1;
        trace!("Frame {} drawn at angle {:.4}", self.frame, angle);
        if let Some(fps) = self.clock.tick() {
            debug!("FPS: {:.1}", fps);
        }

        window.request_redraw();
    }

    /// Stop re-arming; further ticks are no-ops
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}
