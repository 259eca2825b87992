/// Rotation mode of the displayed model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    AutoRotating,
    Dragging,
}

/// Unified mouse/touch input, already filtered to a single pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64 },
    Move { x: f64 },
    Up,
    Leave,
}

/// Snapshot of the interaction state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionState {
    pub mode: InteractionMode,
    /// Y-axis rotation in radians
    pub angle: f64,
    pub last_pointer_x: f64,
}

/// Reconciles auto-rotation with user dragging
///
/// During a drag the angle is recomputed from the angle at drag start plus
/// the accumulated horizontal travel, so the result does not depend on how
/// the moves were batched.
#[derive(Debug, Clone)]
pub struct InteractionStateMachine {
    state: InteractionState,
    sensitivity: f64,
    drag_start_angle: f64,
    drag_travel: f64,
}

impl InteractionStateMachine {
    pub fn new(sensitivity: f64) -> Self {
        Self {
            state: InteractionState::default(),
            sensitivity,
            drag_start_angle: 0.0,
            drag_travel: 0.0,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn mode(&self) -> InteractionMode {
        self.state.mode
    }

    pub fn angle(&self) -> f64 {
        self.state.angle
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match (self.state.mode, event) {
            (InteractionMode::AutoRotating, PointerEvent::Down { x }) => {
                self.state.mode = InteractionMode::Dragging;
                self.state.last_pointer_x = x;
                self.drag_start_angle = self.state.angle;
                self.drag_travel = 0.0;
            }
            (InteractionMode::Dragging, PointerEvent::Move { x }) => {
                self.drag_travel += x - self.state.last_pointer_x;
                self.state.last_pointer_x = x;
                self.state.angle = self.drag_start_angle + self.drag_travel * self.sensitivity;
            }
            (InteractionMode::Dragging, PointerEvent::Up | PointerEvent::Leave) => {
                self.state.mode = InteractionMode::AutoRotating;
            }
            // Hover moves, stray ups, and a second down mid-drag change nothing
            _ => {}
        }
    }

    /// Per-frame update; advances the angle only while auto-rotating
    pub fn advance_frame(&mut self, step: f64) -> f64 {
        if self.state.mode == InteractionMode::AutoRotating {
            self.state.angle += step;
        }
        self.state.angle
    }
}

impl Default for InteractionStateMachine {
    fn default() -> Self {
        Self::new(0.01)
    }
}
