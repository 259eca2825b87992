pub mod backend;
pub mod camera;
pub mod decoder;
pub mod fetcher;
pub mod presentation;
pub mod window;

pub use backend::*;
pub use camera::*;
pub use decoder::*;
pub use fetcher::*;
pub use presentation::*;
pub use window::*;
