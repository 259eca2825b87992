pub mod clock;
pub mod input_adapter;
pub mod interaction;
pub mod orchestrator;
pub mod resolver;
pub mod scene_manager;
pub mod scheduler;
pub mod viewport;

pub use clock::{Clock, Stopwatch};
pub use input_adapter::PointerInputAdapter;
pub use interaction::{InteractionMode, InteractionState, InteractionStateMachine, PointerEvent};
pub use orchestrator::{ScanOptions, ScanOrchestrator, ScanOutcome, ScanRecord};
pub use resolver::{ContentResolver, PayloadTarget};
pub use scene_manager::{PlacementPolicy, ReplaceOutcome, SceneModelManager};
pub use scheduler::RenderScheduler;
pub use viewport::{ViewportBinder, ViewportGeometry};
