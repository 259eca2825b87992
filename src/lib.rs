pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod decoder;
pub mod error;
pub mod http;
pub mod loaders;
pub mod presentation;
pub mod scene;
pub mod traits;
pub mod types;

pub use config::{DecodeMode, ViewerConfig};
pub use error::ViewerError;
pub use types::ContentDescriptor;
