use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent};

use super::interaction::PointerEvent;

/// Adapter that folds Winit mouse and touch events into one pointer
///
/// Only the first finger of a single-touch gesture drives the pointer;
/// while more than one finger is down, touch moves are ignored.
#[derive(Debug, Clone, Default)]
pub struct PointerInputAdapter {
    /// Last known cursor x (relative to window)
    cursor_x: Option<f64>,
    /// Left mouse button held
    mouse_down: bool,
    /// Touch ids currently on the surface
    active_touches: HashSet<u64>,
    /// Touch that started the gesture
    primary_touch: Option<u64>,
}

impl PointerInputAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a Winit WindowEvent into a pointer event, if it is one
    pub fn process_event(&mut self, event: &WindowEvent) -> Option<PointerEvent> {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.process_mouse_button(*state == ElementState::Pressed),
            WindowEvent::CursorMoved { position, .. } => self.process_cursor_moved(position.x),
            WindowEvent::CursorLeft { .. } => self.process_cursor_left(),
            WindowEvent::Touch(Touch {
                phase, id, location, ..
            }) => self.process_touch(*phase, *id, location.x),
            _ => None,
        }
    }

    pub fn process_mouse_button(&mut self, pressed: bool) -> Option<PointerEvent> {
        match (pressed, self.mouse_down) {
            (true, false) => {
                self.mouse_down = true;
                Some(PointerEvent::Down {
                    x: self.cursor_x.unwrap_or_default(),
                })
            }
            (false, true) => {
                self.mouse_down = false;
                Some(PointerEvent::Up)
            }
            _ => None,
        }
    }

    pub fn process_cursor_moved(&mut self, x: f64) -> Option<PointerEvent> {
        self.cursor_x = Some(x);
        self.mouse_down.then_some(PointerEvent::Move { x })
    }

    pub fn process_cursor_left(&mut self) -> Option<PointerEvent> {
        self.cursor_x = None;
        if self.mouse_down {
            self.mouse_down = false;
            Some(PointerEvent::Leave)
        } else {
            None
        }
    }

    pub fn process_touch(&mut self, phase: TouchPhase, id: u64, x: f64) -> Option<PointerEvent> {
        match phase {
            TouchPhase::Started => {
                self.active_touches.insert(id);
                if self.active_touches.len() == 1 {
                    self.primary_touch = Some(id);
                    Some(PointerEvent::Down { x })
                } else {
                    None
                }
            }
            TouchPhase::Moved => {
                let single = self.active_touches.len() == 1;
                (single && self.primary_touch == Some(id)).then_some(PointerEvent::Move { x })
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                self.active_touches.remove(&id);
                if self.primary_touch == Some(id) {
                    self.primary_touch = None;
                    Some(PointerEvent::Up)
                } else {
                    None
                }
            }
        }
    }

    /// Number of fingers currently down
    pub fn active_touch_count(&self) -> usize {
        self.active_touches.len()
    }
}
